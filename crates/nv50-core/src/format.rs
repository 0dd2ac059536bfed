//! # Picture Formats
//!
//! Render picture formats use the packed encoding
//! `bpp << 24 | type << 16 | a << 12 | r << 8 | g << 4 | b`, where each
//! channel field holds the channel's bit width. Any `u32` is a valid tag;
//! whether the hardware can encode it is decided by the capability tables.

use core::fmt;

/// Channel-order type codes
pub mod kind {
    /// Alpha only
    pub const A: u32 = 1;
    /// ARGB channel order
    pub const ARGB: u32 = 2;
    /// ABGR channel order
    pub const ABGR: u32 = 3;
}

/// A packed picture format tag
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PictFormat(u32);

impl PictFormat {
    /// 32bpp ARGB with alpha
    pub const A8R8G8B8: Self = Self::pack(32, kind::ARGB, 8, 8, 8, 8);
    /// 32bpp ARGB, alpha ignored
    pub const X8R8G8B8: Self = Self::pack(32, kind::ARGB, 0, 8, 8, 8);
    /// 32bpp ABGR with alpha
    pub const A8B8G8R8: Self = Self::pack(32, kind::ABGR, 8, 8, 8, 8);
    /// 32bpp ABGR, alpha ignored
    pub const X8B8G8R8: Self = Self::pack(32, kind::ABGR, 0, 8, 8, 8);
    /// 30-bit colour with 2-bit alpha
    pub const A2B10G10R10: Self = Self::pack(32, kind::ABGR, 2, 10, 10, 10);
    /// 30-bit colour, alpha ignored
    pub const X2B10G10R10: Self = Self::pack(32, kind::ABGR, 0, 10, 10, 10);
    /// 24bpp packed RGB
    pub const R8G8B8: Self = Self::pack(24, kind::ARGB, 0, 8, 8, 8);
    /// 16bpp RGB 565
    pub const R5G6B5: Self = Self::pack(16, kind::ARGB, 0, 5, 6, 5);
    /// 16bpp ARGB 1555
    pub const A1R5G5B5: Self = Self::pack(16, kind::ARGB, 1, 5, 5, 5);
    /// 16bpp RGB 555, alpha ignored
    pub const X1R5G5B5: Self = Self::pack(16, kind::ARGB, 0, 5, 5, 5);
    /// 8bpp alpha only
    pub const A8: Self = Self::pack(8, kind::A, 8, 0, 0, 0);

    /// Pack a format tag from its fields
    pub const fn pack(bpp: u32, ty: u32, a: u32, r: u32, g: u32, b: u32) -> Self {
        Self((bpp << 24) | (ty << 16) | (a << 12) | (r << 8) | (g << 4) | b)
    }

    /// Wrap a raw tag
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw tag value
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Bits per pixel
    #[inline]
    pub const fn bpp(self) -> u32 {
        self.0 >> 24
    }

    /// Alpha channel width
    #[inline]
    pub const fn alpha_bits(self) -> u32 {
        (self.0 >> 12) & 0xf
    }

    /// Combined colour channel widths, zero for alpha-only formats
    #[inline]
    pub const fn rgb_bits(self) -> u32 {
        self.0 & 0xfff
    }

    /// Whether the format stores alpha
    #[inline]
    pub const fn has_alpha(self) -> bool {
        self.alpha_bits() != 0
    }

    /// Whether the format stores any colour channel
    #[inline]
    pub const fn has_rgb(self) -> bool {
        self.rgb_bits() != 0
    }
}

impl fmt::Debug for PictFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PictFormat(0x{:08x})", self.0)
    }
}
