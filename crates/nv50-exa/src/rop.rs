//! # Raster Operations
//!
//! X11 raster ops for the 2D engine. With a solid plane mask the ROP code
//! combines source and destination directly; otherwise the plane mask is
//! loaded as a pattern and the planemask column of the table folds it in.

use nv50_cmd::{PushDevice, Resubmit, RingChannel};
use nv50_core::Surface;

use crate::caps::Capabilities;
use crate::hw::{twod, SUBC_2D};

/// Words `emit_rop` may write
pub const ROP_WORDS: usize = 12;

/// One of the sixteen X11 raster operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterOp(u8);

impl RasterOp {
    /// 0
    pub const CLEAR: Self = Self(0x0);
    /// src AND dst
    pub const AND: Self = Self(0x1);
    /// src AND NOT dst
    pub const AND_REVERSE: Self = Self(0x2);
    /// src
    pub const COPY: Self = Self(0x3);
    /// NOT src AND dst
    pub const AND_INVERTED: Self = Self(0x4);
    /// dst
    pub const NOOP: Self = Self(0x5);
    /// src XOR dst
    pub const XOR: Self = Self(0x6);
    /// src OR dst
    pub const OR: Self = Self(0x7);
    /// NOT src AND NOT dst
    pub const NOR: Self = Self(0x8);
    /// NOT src XOR dst
    pub const EQUIV: Self = Self(0x9);
    /// NOT dst
    pub const INVERT: Self = Self(0xa);
    /// src OR NOT dst
    pub const OR_REVERSE: Self = Self(0xb);
    /// NOT src
    pub const COPY_INVERTED: Self = Self(0xc);
    /// NOT src OR dst
    pub const OR_INVERTED: Self = Self(0xd);
    /// NOT src OR NOT dst
    pub const NAND: Self = Self(0xe);
    /// 1
    pub const SET: Self = Self(0xf);

    /// From an X11 `GX*` code
    pub const fn from_x11(alu: u8) -> Option<Self> {
        if alu < 16 {
            Some(Self(alu))
        } else {
            None
        }
    }

    /// X11 code
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Hardware ROP byte, with or without the pattern plane mask
    pub const fn hw(self, planemask: bool) -> u32 {
        let (copy, masked) = NVROP[self.0 as usize];
        if planemask {
            masked as u32
        } else {
            copy as u32
        }
    }
}

/// Hardware ROP bytes per X11 op: (plain, through pattern plane mask)
const NVROP: [(u8, u8); 16] = [
    (0x00, 0x0a), // Clear
    (0x88, 0x8a), // And
    (0x44, 0x4a), // AndReverse
    (0xcc, 0xca), // Copy
    (0x22, 0x2a), // AndInverted
    (0xaa, 0xaa), // Noop
    (0x66, 0x6a), // Xor
    (0xee, 0xea), // Or
    (0x11, 0x1a), // Nor
    (0x99, 0x9a), // Equiv
    (0x55, 0x5a), // Invert
    (0xdd, 0xda), // OrReverse
    (0x33, 0x3a), // CopyInverted
    (0xbb, 0xba), // OrInverted
    (0x77, 0x7a), // Nand
    (0xff, 0xfa), // Set
];

/// Bits a drawable of `depth` actually stores
pub const fn depth_mask(depth: u8) -> u32 {
    if depth >= 32 {
        u32::MAX
    } else {
        (1u32 << depth) - 1
    }
}

/// Whether `planemask` keeps every stored bit
pub const fn planemask_is_solid(planemask: u32, depth: u8) -> bool {
    let full = depth_mask(depth);
    planemask & full == full
}

/// Cache key for the raster-op state a fill or blit leaves behind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RopKey {
    rop: RasterOp,
    planemask: u32,
    depth: u8,
}

impl RopKey {
    /// Key for an op on a destination
    pub const fn new(rop: RasterOp, planemask: u32, depth: u8) -> Self {
        Self {
            rop,
            planemask,
            depth,
        }
    }

    /// Packed form stored on the channel
    pub const fn raw(self) -> u64 {
        ((self.depth as u64) << 40) | ((self.rop.0 as u64) << 32) | self.planemask as u64
    }
}

/// Configure operation, pattern and ROP for `dst`
///
/// Skipped when the channel already holds this configuration, unless
/// `force` is set. Up to [`ROP_WORDS`] words.
pub fn emit_rop<D, P>(
    chan: &mut RingChannel<D, P>,
    caps: &Capabilities,
    dst: &Surface,
    rop: RasterOp,
    planemask: u32,
    force: bool,
) where
    D: PushDevice,
    P: Resubmit<D>,
{
    let key = RopKey::new(rop, planemask, dst.depth).raw();
    if !force && chan.cached_rop() == Some(key) {
        log::trace!("rop 0x{:x} already current", key);
        return;
    }

    let solid = planemask_is_solid(planemask, dst.depth);

    chan.method(SUBC_2D, twod::OPERATION, 1);
    if rop == RasterOp::COPY && solid {
        chan.emit(twod::OPERATION_SRCCOPY);
    } else {
        chan.emit(twod::OPERATION_SRCCOPY_PREMULT);

        chan.method(SUBC_2D, twod::PATTERN_FORMAT, 2);
        chan.emit(caps.pattern_format(dst.depth));
        chan.emit(1);

        chan.method(SUBC_2D, twod::PATTERN_COLOR0, 4);
        if solid {
            chan.emit_block(&[!0, !0, !0, !0]);
        } else {
            chan.emit_block(&[0, planemask, !0, !0]);
        }

        chan.method(SUBC_2D, twod::ROP, 1);
        chan.emit(rop.hw(!solid));
    }

    chan.set_cached_rop(Some(key));
}

static_assertions::const_assert_eq!(NVROP.len(), 16);
