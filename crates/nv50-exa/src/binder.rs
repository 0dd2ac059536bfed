//! # Surface Binder
//!
//! Translates surface descriptors into the commands that bind them to the
//! 2D engine (source, destination) or the 3D engine (render target, texture
//! unit). Every bind validates completely before it writes, so a rejected
//! surface leaves the ring untouched.
//!
//! ## Budgets
//!
//! | bind           | words | relocations |
//! |----------------|-------|-------------|
//! | 2D source      | ≤ 11  | 2           |
//! | 2D destination | ≤ 16  | 2           |
//! | render target  | 11    | 2           |
//! | texture unit   | 38    | 10          |

use nv50_cmd::{PushDevice, RelocFlags, RelocPart, Resubmit, RingChannel};
use nv50_core::{BufferHandle, Error, Filter, Picture, Rect, Repeat, Result, Surface};

use crate::caps::Capabilities;
use crate::context::TextureUnit;
use crate::hw::{self, tesla, tic, tsc, twod, SUBC_2D, SUBC_3D};

/// Words a 2D destination bind may write
pub const BIND_2D_WORDS: usize = 16;
/// Words a render target bind writes
pub const RENDER_TARGET_WORDS: usize = 11;
/// Words a texture unit bind writes
pub const TEXTURE_WORDS: usize = 38;

/// Relocations a 2D bind emits
pub const BIND_2D_RELOCS: usize = 2;
/// Relocations a render target bind emits
pub const RENDER_TARGET_RELOCS: usize = 2;
/// Relocations a texture unit bind emits: table, sampler, two constant
/// buffer selects and the texel address
pub const TEXTURE_RELOCS: usize = 10;

/// 2D engine binding role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role2d {
    /// Blit source
    Source,
    /// Render destination, clipped to `clip` or the whole surface
    Destination {
        /// Clip override
        clip: Option<Rect>,
    },
}

/// Emits surface bindings against one capability set and scratch buffer
#[derive(Debug, Clone, Copy)]
pub struct Binder {
    caps: &'static Capabilities,
    scratch: BufferHandle,
}

impl Binder {
    /// Binder for a generation, with TIC/TSC tables in `scratch`
    pub fn new(caps: &'static Capabilities, scratch: BufferHandle) -> Self {
        Self { caps, scratch }
    }

    /// Capability set
    pub fn caps(&self) -> &'static Capabilities {
        self.caps
    }

    /// Buffer holding shader programs and descriptor tables
    pub fn scratch(&self) -> BufferHandle {
        self.scratch
    }

    // =========================================================================
    // 2D ENGINE
    // =========================================================================

    /// Bind `surface` as a 2D source or destination
    pub fn bind_2d<D, P>(&self, chan: &mut RingChannel<D, P>, surface: &Surface, role: Role2d) -> Result<()>
    where
        D: PushDevice,
        P: Resubmit<D>,
    {
        let fmt = self.caps.surface_2d_format(surface.depth)?;
        let (mthd, access) = match role {
            Role2d::Source => (twod::SRC_FORMAT, RelocFlags::READ),
            Role2d::Destination { .. } => (twod::DST_FORMAT, RelocFlags::WRITE),
        };

        if surface.is_tiled() {
            chan.method(SUBC_2D, mthd, 5);
            chan.emit_block(&[fmt, 0, surface.tile_mode() << 4, 1, 0]);
        } else {
            chan.method(SUBC_2D, mthd, 2);
            chan.emit(fmt);
            chan.emit(1);
            chan.method(SUBC_2D, mthd + twod::SURFACE_PITCH, 1);
            chan.emit(surface.pitch);
        }

        chan.method(SUBC_2D, mthd + twod::SURFACE_WIDTH, 4);
        chan.emit(surface.width);
        chan.emit(surface.height);
        chan.emit_address(surface.bo, surface.offset, RelocFlags::VRAM | access)?;

        if let Role2d::Destination { clip } = role {
            let clip = clip.unwrap_or(Rect::new(0, 0, surface.width as i32, surface.height as i32));
            set_clip(chan, &clip);
        }
        Ok(())
    }

    // =========================================================================
    // 3D ENGINE
    // =========================================================================

    /// Validate `picture` as a render target; returns its surface and format
    pub fn check_render_target(&self, picture: &Picture) -> Result<(Surface, u32)> {
        let surface = picture.drawable.ok_or(Error::UnsupportedSource)?;
        self.caps.fits_3d(surface.width, surface.height)?;
        let format = self.caps.render_target_format(picture.format)?;
        if !surface.is_tiled() {
            return Err(Error::UnsupportedLayout);
        }
        Ok((surface, format))
    }

    /// Bind `picture` as render target 0
    pub fn bind_render_target<D, P>(&self, chan: &mut RingChannel<D, P>, picture: &Picture) -> Result<()>
    where
        D: PushDevice,
        P: Resubmit<D>,
    {
        let (surface, format) = self.check_render_target(picture)?;

        chan.method(SUBC_3D, tesla::RT_ADDRESS_HIGH0, 5);
        chan.emit_address(surface.bo, surface.offset, RelocFlags::VRAM | RelocFlags::WRITE)?;
        chan.emit(format);
        chan.emit(surface.tile_mode() << 4);
        chan.emit(0);
        chan.method(SUBC_3D, tesla::RT_HORIZ0, 2);
        chan.emit(surface.width);
        chan.emit(surface.height);
        chan.method(SUBC_3D, tesla::RT_ARRAY_MODE, 1);
        chan.emit(1);
        Ok(())
    }

    /// Validate `picture` as a texture; returns its surface and TIC word 0
    pub fn check_texture(&self, picture: &Picture) -> Result<(Surface, u32)> {
        let surface = picture.drawable.ok_or(Error::UnsupportedSource)?;
        self.caps.fits_3d(surface.width, surface.height)?;
        let format = self.caps.texture_format(picture.format)?;
        match picture.filter {
            Filter::Nearest | Filter::Bilinear => {}
            _ => return Err(Error::UnsupportedFilter),
        }
        if !surface.is_tiled() {
            return Err(Error::UnsupportedLayout);
        }
        Ok((surface, format))
    }

    /// Bind `picture` to texture `unit` and load its sampler
    pub fn bind_texture<D, P>(
        &self,
        chan: &mut RingChannel<D, P>,
        picture: &Picture,
        unit: u32,
    ) -> Result<TextureUnit>
    where
        D: PushDevice,
        P: Resubmit<D>,
    {
        let (surface, format) = self.check_texture(picture)?;
        let table = RelocFlags::VRAM | RelocFlags::RDWR;
        let texel = RelocFlags::VRAM | RelocFlags::READ;

        // Texture image control entry
        chan.method(SUBC_3D, tesla::TIC_ADDRESS_HIGH, 3);
        chan.emit_address(self.scratch, hw::TIC_OFFSET, table)?;
        chan.emit(0x0000_0800);
        self.select_constbuf(chan, tesla::CB_TIC, hw::TIC_OFFSET, unit)?;
        chan.method_ni(SUBC_3D, tesla::CB_DATA0, 8);
        chan.emit(format);
        chan.emit_reloc(surface.bo, surface.offset, texel, RelocPart::Low)?;
        chan.emit(tic::WORD2 | (surface.tile_mode() << tic::TILE_SHIFT));
        chan.emit(tic::WORD3);
        chan.emit(surface.width);
        chan.emit((1 << tic::DEPTH_SHIFT) | surface.height);
        chan.emit(tic::WORD6);
        chan.emit_reloc(surface.bo, surface.offset, texel, RelocPart::High)?;

        // Sampler entry
        chan.method(SUBC_3D, tesla::TSC_ADDRESS_HIGH, 3);
        chan.emit_address(self.scratch, hw::TSC_OFFSET, table)?;
        chan.emit(0);
        self.select_constbuf(chan, tesla::CB_TSC, hw::TSC_OFFSET, unit)?;
        chan.method_ni(SUBC_3D, tesla::CB_DATA0, 8);
        chan.emit(tsc::word0(wrap_mode(picture.repeat)));
        chan.emit(filter_word(picture.filter));
        chan.emit_block(&[0; 6]);

        Ok(TextureUnit {
            transform: picture.transform,
            width: surface.width as f32,
            height: surface.height as f32,
        })
    }

    fn select_constbuf<D, P>(&self, chan: &mut RingChannel<D, P>, cb: u32, offset: u64, unit: u32) -> Result<()>
    where
        D: PushDevice,
        P: Resubmit<D>,
    {
        chan.method(SUBC_3D, tesla::CB_DEF_ADDRESS_HIGH, 3);
        chan.emit_address(self.scratch, offset, RelocFlags::VRAM | RelocFlags::RDWR)?;
        chan.emit((cb << tesla::CB_DEF_BUFFER_SHIFT) | 0x4000);
        chan.method(SUBC_3D, tesla::CB_ADDR, 1);
        chan.emit(cb | ((unit * 8) << tesla::CB_ADDR_ID_SHIFT));
        Ok(())
    }
}

/// Clip subsequent 2D rendering to `rect`; 5 words
pub fn set_clip<D, P>(chan: &mut RingChannel<D, P>, rect: &Rect)
where
    D: PushDevice,
    P: Resubmit<D>,
{
    chan.method(SUBC_2D, twod::CLIP_X, 4);
    chan.emit(rect.x as u32);
    chan.emit(rect.y as u32);
    chan.emit(rect.width as u32);
    chan.emit(rect.height as u32);
}

fn wrap_mode(repeat: Repeat) -> u32 {
    match repeat {
        Repeat::None => tsc::WRAP_CLAMP_TO_BORDER,
        Repeat::Normal => tsc::WRAP_REPEAT,
        Repeat::Pad => tsc::WRAP_CLAMP,
        Repeat::Reflect => tsc::WRAP_MIRROR_REPEAT,
    }
}

fn filter_word(filter: Filter) -> u32 {
    if filter == Filter::Bilinear {
        tsc::MAGF_LINEAR | tsc::MINF_LINEAR | tsc::MIPF_NONE
    } else {
        tsc::MAGF_NEAREST | tsc::MINF_NEAREST | tsc::MIPF_NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nv50_cmd::mock::MockDevice;
    use nv50_cmd::{Header, RingConfig};
    use nv50_core::{GpuAddr, PictFormat};

    const SCRATCH: BufferHandle = BufferHandle::new(1);
    const PIXMAP: BufferHandle = BufferHandle::new(2);

    fn setup() -> (Binder, RingChannel<MockDevice>) {
        let device = MockDevice::new()
            .with_buffer(1, GpuAddr::new(0x10_0000))
            .with_buffer(2, GpuAddr::new(0x2_0000_0000));
        let binder = Binder::new(Capabilities::for_chipset(0x50).unwrap(), SCRATCH);
        (binder, RingChannel::new(RingConfig::default(), device))
    }

    #[test]
    fn test_linear_source_layout() {
        let (binder, mut chan) = setup();
        let src = Surface::linear(640, 480, 32, PIXMAP, 2560);
        let _ = chan.reserve(BIND_2D_WORDS, BIND_2D_RELOCS).unwrap();
        binder.bind_2d(&mut chan, &src, Role2d::Source).unwrap();

        let b = chan.batch();
        assert_eq!(b.len(), 10);
        assert_eq!(b[0], Header::new(SUBC_2D, twod::SRC_FORMAT, 2).encode());
        assert_eq!(&b[1..3], &[twod::FORMAT_A8R8G8B8_UNORM, 1]);
        assert_eq!(b[3], Header::new(SUBC_2D, 0x0244, 1).encode());
        assert_eq!(b[4], 2560);
        assert_eq!(&b[6..8], &[640, 480]);
    }

    #[test]
    fn test_tiled_destination_clips_to_surface() {
        let (binder, mut chan) = setup();
        let dst = Surface::tiled(300, 200, 24, PIXMAP, 2).at_offset(0x100);
        let _ = chan.reserve(BIND_2D_WORDS, BIND_2D_RELOCS).unwrap();
        binder
            .bind_2d(&mut chan, &dst, Role2d::Destination { clip: None })
            .unwrap();

        let b = chan.batch();
        assert_eq!(b.len(), BIND_2D_WORDS);
        assert_eq!(&b[1..6], &[twod::FORMAT_X8R8G8B8_UNORM, 0, 0x20, 1, 0]);
        assert_eq!(b[11], Header::new(SUBC_2D, twod::CLIP_X, 4).encode());
        assert_eq!(&b[12..16], &[0, 0, 300, 200]);

        chan.flush().unwrap();
        let sent = chan.device().last_batch().unwrap();
        assert_eq!(&sent[9..11], &[0x2, 0x100]);
    }

    #[test]
    fn test_clip_override() {
        let (binder, mut chan) = setup();
        let dst = Surface::tiled(300, 200, 16, PIXMAP, 0);
        let _ = chan.reserve(BIND_2D_WORDS, BIND_2D_RELOCS).unwrap();
        let clip = Rect::new(10, 20, 30, 40);
        binder
            .bind_2d(&mut chan, &dst, Role2d::Destination { clip: Some(clip) })
            .unwrap();
        assert_eq!(&chan.batch()[12..16], &[10, 20, 30, 40]);
    }

    #[test]
    fn test_unsupported_depth_writes_nothing() {
        let (binder, mut chan) = setup();
        let dst = Surface::tiled(64, 64, 12, PIXMAP, 0);
        let _ = chan.reserve(BIND_2D_WORDS, BIND_2D_RELOCS).unwrap();
        let before = chan.cursor();
        assert_eq!(
            binder.bind_2d(&mut chan, &dst, Role2d::Destination { clip: None }),
            Err(Error::UnsupportedFormat)
        );
        assert_eq!(chan.cursor(), before);
    }

    #[test]
    fn test_render_target_checks() {
        let (binder, _) = setup();
        let big = Surface::tiled(8193, 16, 32, PIXMAP, 0);
        assert_eq!(
            binder.check_render_target(&Picture::new(big, PictFormat::A8R8G8B8)),
            Err(Error::DimensionExceeded)
        );
        let linear = Surface::linear(64, 64, 32, PIXMAP, 256);
        assert_eq!(
            binder.check_render_target(&Picture::new(linear, PictFormat::A8R8G8B8)),
            Err(Error::UnsupportedLayout)
        );
        let tiled = Surface::tiled(64, 64, 32, PIXMAP, 0);
        assert_eq!(
            binder.check_render_target(&Picture::new(tiled, PictFormat::A1R5G5B5)),
            Err(Error::UnsupportedFormat)
        );
    }

    #[test]
    fn test_render_target_words() {
        let (binder, mut chan) = setup();
        let rt = Surface::tiled(100, 50, 32, PIXMAP, 4);
        let _ = chan.reserve(RENDER_TARGET_WORDS, RENDER_TARGET_RELOCS).unwrap();
        binder
            .bind_render_target(&mut chan, &Picture::new(rt, PictFormat::A8R8G8B8))
            .unwrap();
        let b = chan.batch();
        assert_eq!(b.len(), RENDER_TARGET_WORDS);
        assert_eq!(&b[3..6], &[tesla::RT_FORMAT_A8R8G8B8_UNORM, 0x40, 0]);
        assert_eq!(&b[7..9], &[100, 50]);
        assert_eq!(b[10], 1);
    }

    #[test]
    fn test_texture_filter_rejected() {
        let (binder, _) = setup();
        let s = Surface::tiled(64, 64, 32, PIXMAP, 0);
        let p = Picture::new(s, PictFormat::A8R8G8B8).with_filter(Filter::Good);
        assert_eq!(binder.check_texture(&p), Err(Error::UnsupportedFilter));
        let solid = Picture::source_only(PictFormat::A8R8G8B8);
        assert_eq!(binder.check_texture(&solid), Err(Error::UnsupportedSource));
    }

    #[test]
    fn test_texture_unit_entries() {
        let (binder, mut chan) = setup();
        let s = Surface::tiled(64, 32, 32, PIXMAP, 1);
        let p = Picture::new(s, PictFormat::X8R8G8B8)
            .with_filter(Filter::Bilinear)
            .with_repeat(Repeat::Reflect);
        let _ = chan.reserve(TEXTURE_WORDS, TEXTURE_RELOCS).unwrap();
        let unit = binder.bind_texture(&mut chan, &p, 1).unwrap();
        assert_eq!(chan.free_relocs(), RingConfig::default().max_relocs - TEXTURE_RELOCS);
        assert_eq!(unit.width, 64.0);
        assert_eq!(unit.height, 32.0);

        let b = chan.batch();
        assert_eq!(b.len(), TEXTURE_WORDS);
        // CB_ADDR selects entry 8 of the TIC buffer for unit 1
        assert_eq!(b[9], tesla::CB_TIC | (8 << 8));
        assert_eq!(b[10], Header::non_incrementing(SUBC_3D, tesla::CB_DATA0, 8).encode());
        assert_eq!(b[13], tic::WORD2 | (1 << 22));
        assert_eq!(&b[15..17], &[64, (1 << 16) | 32]);
        // Sampler words
        assert_eq!(b[30], tsc::word0(tsc::WRAP_MIRROR_REPEAT));
        assert_eq!(b[31], tsc::MAGF_LINEAR | tsc::MINF_LINEAR | tsc::MIPF_NONE);
        assert_eq!(&b[32..38], &[0; 6]);
    }
}
