//! # Hardware Definitions
//!
//! Method offsets and payload encodings for the NV50 2D engine and the
//! small slice of the Tesla 3D engine used for compositing.

use nv50_cmd::Subchannel;

/// Subchannel the 2D engine object is bound to
pub const SUBC_2D: Subchannel = Subchannel(2);

/// Subchannel the Tesla 3D engine object is bound to
pub const SUBC_3D: Subchannel = Subchannel(3);

/// Largest render target or texture the 3D engine addresses
pub const MAX_3D_DIMENSION: u32 = 8192;

// =============================================================================
// 2D ENGINE
// =============================================================================

/// 2D engine methods
pub mod twod {
    /// Wait for outstanding 2D work
    pub const SERIALIZE: u32 = 0x0110;
    /// Destination surface format (then linear flag, ...)
    pub const DST_FORMAT: u32 = 0x0200;
    /// Source surface format
    pub const SRC_FORMAT: u32 = 0x0230;
    /// Offset from `*_FORMAT` to the linear pitch
    pub const SURFACE_PITCH: u32 = 0x14;
    /// Offset from `*_FORMAT` to width, height, address high, address low
    pub const SURFACE_WIDTH: u32 = 0x18;
    /// Clip rectangle x, y, w, h
    pub const CLIP_X: u32 = 0x0280;
    /// Raster operation
    pub const ROP: u32 = 0x02a0;
    /// Blend operation
    pub const OPERATION: u32 = 0x02ac;
    /// Plain copy
    pub const OPERATION_SRCCOPY: u32 = 3;
    /// Copy through the ROP and pattern
    pub const OPERATION_SRCCOPY_PREMULT: u32 = 5;
    /// Pattern colour format, then pattern selector
    pub const PATTERN_FORMAT: u32 = 0x02e8;
    /// Pattern colours 0 and 1, then pattern bitmaps 0 and 1
    pub const PATTERN_COLOR0: u32 = 0x02f0;
    /// Shape, colour format and colour of subsequent fills
    pub const DRAW_SHAPE: u32 = 0x0580;
    /// Filled rectangles
    pub const DRAW_SHAPE_RECTANGLES: u32 = 4;
    /// Two corner points of a rectangle fill
    pub const DRAW_POINT32_X0: u32 = 0x0600;
    /// Immediate-data bitmap enable, then colour format
    pub const SIFC_BITMAP_ENABLE: u32 = 0x0800;
    /// Immediate-data geometry (10 words)
    pub const SIFC_WIDTH: u32 = 0x0838;
    /// Immediate-data pixel stream
    pub const SIFC_DATA: u32 = 0x0860;
    /// Blit control
    pub const BLIT_CONTROL: u32 = 0x088c;
    /// Blit geometry (12 words)
    pub const BLIT_DST_X: u32 = 0x08b0;

    /// 8-bit single channel
    pub const FORMAT_R8_UNORM: u32 = 0xf3;
    /// 15-bit
    pub const FORMAT_X1R5G5B5_UNORM: u32 = 0xf8;
    /// 16-bit
    pub const FORMAT_R5G6B5_UNORM: u32 = 0xe8;
    /// 24-bit in 32
    pub const FORMAT_X8R8G8B8_UNORM: u32 = 0xe6;
    /// 30-bit in 32
    pub const FORMAT_A2B10G10R10_UNORM: u32 = 0xd1;
    /// 32-bit
    pub const FORMAT_A8R8G8B8_UNORM: u32 = 0xcf;
}

// =============================================================================
// TESLA 3D ENGINE
// =============================================================================

/// Tesla 3D engine methods
pub mod tesla {
    /// Render target 0 address high, low, format, tile mode, layer stride
    pub const RT_ADDRESS_HIGH0: u32 = 0x0200;
    /// Vertex attribute 8 as two floats
    pub const VTX_ATTR_2F_X8: u32 = 0x03c0;
    /// Position as two packed 16-bit integers
    pub const VTX_ATTR_2I0: u32 = 0x0900;
    /// Constant buffer definition address high, low, id and size
    pub const CB_DEF_ADDRESS_HIGH: u32 = 0x0f00;
    /// Constant buffer upload target
    pub const CB_ADDR: u32 = 0x0f10;
    /// Constant buffer upload data
    pub const CB_DATA0: u32 = 0x0f18;
    /// Vertex program address
    pub const VP_ADDRESS_HIGH: u32 = 0x0f7c;
    /// Fragment program address
    pub const FP_ADDRESS_HIGH: u32 = 0x0fa4;
    /// Scissor 0 horizontal bounds, then vertical
    pub const SCISSOR_HORIZ0: u32 = 0x0ff4;
    /// Render target array mode
    pub const RT_ARRAY_MODE: u32 = 0x121c;
    /// Render target 0 width, height
    pub const RT_HORIZ0: u32 = 0x1240;
    /// Undocumented; cleared before compositing
    pub const UNK1334: u32 = 0x1334;
    /// Colour equation, source, destination, alpha equation, alpha source
    pub const BLEND_EQUATION_RGB: u32 = 0x1340;
    /// Alpha destination factor
    pub const BLEND_FUNC_DST_ALPHA: u32 = 0x1358;
    /// Fragment program entry point
    pub const FP_START_ID: u32 = 0x1414;
    /// Texture binding for shader stage 2
    pub const BIND_TIC2: u32 = 0x1458;
    /// Texture image control table address high, low, limit
    pub const TIC_ADDRESS_HIGH: u32 = 0x155c;
    /// Sampler table address high, low, limit
    pub const TSC_ADDRESS_HIGH: u32 = 0x1574;
    /// Begin primitive
    pub const VERTEX_BEGIN: u32 = 0x15dc;
    /// End primitive
    pub const VERTEX_END: u32 = 0x15e0;
    /// Render target 0 blend enable
    pub const BLEND_ENABLE0: u32 = 0x19c4;

    /// Additive blend equation
    pub const BLEND_FUNC_ADD: u32 = 0x8006;
    /// Triangle fan primitive
    pub const PRIM_TRIANGLE_FAN: u32 = 0x6;

    /// Render target formats
    pub const RT_FORMAT_A8R8G8B8_UNORM: u32 = 0xcf;
    /// 24-bit render target
    pub const RT_FORMAT_X8R8G8B8_UNORM: u32 = 0xe6;
    /// 16-bit render target
    pub const RT_FORMAT_R5G6B5_UNORM: u32 = 0xe8;
    /// Alpha-only render target
    pub const RT_FORMAT_A8_UNORM: u32 = 0xf7;
    /// 10-bit render target
    pub const RT_FORMAT_A2B10G10R10_UNORM: u32 = 0xd1;

    /// Constant buffer holding sampler entries
    pub const CB_TSC: u32 = 0;
    /// Constant buffer holding texture image entries
    pub const CB_TIC: u32 = 1;
    /// Shift of the buffer id in `CB_DEF` set words
    pub const CB_DEF_BUFFER_SHIFT: u32 = 16;
    /// Shift of the entry id in `CB_ADDR`
    pub const CB_ADDR_ID_SHIFT: u32 = 8;
}

// =============================================================================
// SCRATCH BUFFER LAYOUT
// =============================================================================

/// Vertex program
pub const PVP_OFFSET: u64 = 0x0000;
/// Fragment programs
pub const PFP_OFFSET: u64 = 0x1000;
/// Texture image control entries
pub const TIC_OFFSET: u64 = 0x2000;
/// Sampler entries
pub const TSC_OFFSET: u64 = 0x3000;

/// Fragment program entry points inside the `PFP_OFFSET` block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FragmentProgram {
    /// Source only
    Source = 0x000,
    /// Source times mask alpha
    SourceMask = 0x100,
    /// Source times per-channel mask
    ComponentAlpha = 0x200,
    /// Source alpha times per-channel mask
    ComponentAlphaSrcAlpha = 0x300,
    /// Source only, alpha-only target
    SourceA8 = 0x400,
    /// Source times mask, alpha-only target
    SourceMaskA8 = 0x500,
}

// =============================================================================
// TEXTURE DESCRIPTORS
// =============================================================================

/// Texture image control word 0 fields
pub mod tic {
    /// 4x8-bit
    pub const FMT_8_8_8_8: u32 = 0x08;
    /// 2-10-10-10
    pub const FMT_2_10_10_10: u32 = 0x09;
    /// 5-6-5
    pub const FMT_5_6_5: u32 = 0x15;
    /// single 8-bit
    pub const FMT_8: u32 = 0x1d;

    /// Unsigned normalized component type
    pub const TYPE_UNORM: u32 = 2;
    /// Red component type shift
    pub const TYPER_SHIFT: u32 = 6;
    /// Green component type shift
    pub const TYPEG_SHIFT: u32 = 9;
    /// Blue component type shift
    pub const TYPEB_SHIFT: u32 = 12;
    /// Alpha component type shift
    pub const TYPEA_SHIFT: u32 = 15;

    /// Red swizzle shift
    pub const MAPR_SHIFT: u32 = 18;
    /// Green swizzle shift
    pub const MAPG_SHIFT: u32 = 21;
    /// Blue swizzle shift
    pub const MAPB_SHIFT: u32 = 24;
    /// Alpha swizzle shift
    pub const MAPA_SHIFT: u32 = 27;

    /// Swizzle sources
    pub const MAP_ZERO: u32 = 0;
    /// Component 0
    pub const MAP_C0: u32 = 2;
    /// Component 1
    pub const MAP_C1: u32 = 3;
    /// Component 2
    pub const MAP_C2: u32 = 4;
    /// Component 3
    pub const MAP_C3: u32 = 5;
    /// Constant one
    pub const MAP_ONE: u32 = 7;

    /// Word 2 constant part; tile mode goes in at bit 22
    pub const WORD2: u32 = 0xd000_5000;
    /// Tile mode shift in word 2
    pub const TILE_SHIFT: u32 = 22;
    /// Word 3
    pub const WORD3: u32 = 0x0030_0000;
    /// Depth shift in word 5
    pub const DEPTH_SHIFT: u32 = 16;
    /// Word 6
    pub const WORD6: u32 = 0x0300_0000;

    /// Assemble word 0 from a format and RGBA swizzle
    pub const fn word0(fmt: u32, r: u32, g: u32, b: u32, a: u32) -> u32 {
        let types = (TYPE_UNORM << TYPER_SHIFT)
            | (TYPE_UNORM << TYPEG_SHIFT)
            | (TYPE_UNORM << TYPEB_SHIFT)
            | (TYPE_UNORM << TYPEA_SHIFT);
        fmt | types | (r << MAPR_SHIFT) | (g << MAPG_SHIFT) | (b << MAPB_SHIFT) | (a << MAPA_SHIFT)
    }
}

/// Sampler words
pub mod tsc {
    /// Wrap S shift
    pub const WRAPS_SHIFT: u32 = 0;
    /// Wrap T shift
    pub const WRAPT_SHIFT: u32 = 3;
    /// Wrap R shift
    pub const WRAPR_SHIFT: u32 = 6;

    /// Tile
    pub const WRAP_REPEAT: u32 = 0;
    /// Mirror at edges
    pub const WRAP_MIRROR_REPEAT: u32 = 1;
    /// Clamp to edge texel
    pub const WRAP_CLAMP_TO_EDGE: u32 = 2;
    /// Clamp to border colour
    pub const WRAP_CLAMP_TO_BORDER: u32 = 3;
    /// Clamp, half-texel border
    pub const WRAP_CLAMP: u32 = 4;

    /// Word 0 constant part
    pub const WORD0: u32 = 0x0002_4000;

    /// Nearest magnification
    pub const MAGF_NEAREST: u32 = 0x1;
    /// Linear magnification
    pub const MAGF_LINEAR: u32 = 0x2;
    /// Nearest minification
    pub const MINF_NEAREST: u32 = 0x10;
    /// Linear minification
    pub const MINF_LINEAR: u32 = 0x20;
    /// No mipmapping
    pub const MIPF_NONE: u32 = 0x40;

    /// Word 0 with the same wrap mode on all three axes
    pub const fn word0(wrap: u32) -> u32 {
        (wrap << WRAPS_SHIFT) | (wrap << WRAPT_SHIFT) | (wrap << WRAPR_SHIFT) | WORD0
    }
}

static_assertions::const_assert!(tsc::WRAP_CLAMP_TO_EDGE < 8);
static_assertions::const_assert!(TSC_OFFSET > TIC_OFFSET);
