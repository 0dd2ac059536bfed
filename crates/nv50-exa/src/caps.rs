//! # Capability Set
//!
//! Format tables and limits for one hardware generation, selected once from
//! the chipset id so nothing downstream branches on the chipset.

use nv50_core::{Error, PictFormat, Result};

use crate::hw::{self, tesla, tic, twod};

/// Formats, limits and encodings of a hardware generation
#[derive(Debug)]
pub struct Capabilities {
    /// Generation name
    pub name: &'static str,
    /// Largest 3D render target or texture edge
    pub max_3d_dimension: u32,
}

/// Tesla family (NV50, G8x, G9x, GT2xx)
static TESLA: Capabilities = Capabilities {
    name: "Tesla",
    max_3d_dimension: hw::MAX_3D_DIMENSION,
};

impl Capabilities {
    /// Capability set for `chipset`
    pub fn for_chipset(chipset: u32) -> Result<&'static Self> {
        match chipset {
            0x50 | 0x80..=0xaf => {
                log::debug!("chipset 0x{:02x}: {} acceleration", chipset, TESLA.name);
                Ok(&TESLA)
            }
            _ => {
                log::debug!("chipset 0x{:02x}: no acceleration", chipset);
                Err(Error::InvalidGeneration)
            }
        }
    }

    /// 2D engine colour format for a drawable depth
    pub fn surface_2d_format(&self, depth: u8) -> Result<u32> {
        match depth {
            8 => Ok(twod::FORMAT_R8_UNORM),
            15 => Ok(twod::FORMAT_X1R5G5B5_UNORM),
            16 => Ok(twod::FORMAT_R5G6B5_UNORM),
            24 => Ok(twod::FORMAT_X8R8G8B8_UNORM),
            30 => Ok(twod::FORMAT_A2B10G10R10_UNORM),
            32 => Ok(twod::FORMAT_A8R8G8B8_UNORM),
            _ => Err(Error::UnsupportedFormat),
        }
    }

    /// 2D pattern colour format for a drawable depth
    pub fn pattern_format(&self, depth: u8) -> u32 {
        match depth {
            8 => 3,
            15 => 1,
            16 => 0,
            _ => 2,
        }
    }

    /// Render target format for a picture format
    pub fn render_target_format(&self, format: PictFormat) -> Result<u32> {
        match format {
            PictFormat::A2B10G10R10 | PictFormat::X2B10G10R10 => {
                Ok(tesla::RT_FORMAT_A2B10G10R10_UNORM)
            }
            PictFormat::A8R8G8B8 => Ok(tesla::RT_FORMAT_A8R8G8B8_UNORM),
            PictFormat::X8R8G8B8 => Ok(tesla::RT_FORMAT_X8R8G8B8_UNORM),
            PictFormat::R5G6B5 => Ok(tesla::RT_FORMAT_R5G6B5_UNORM),
            PictFormat::A8 => Ok(tesla::RT_FORMAT_A8_UNORM),
            _ => Err(Error::UnsupportedFormat),
        }
    }

    /// Texture image control word 0 (format and swizzle) for a picture format
    pub fn texture_format(&self, format: PictFormat) -> Result<u32> {
        use tic::{MAP_C0 as C0, MAP_C1 as C1, MAP_C2 as C2, MAP_C3 as C3, MAP_ONE as ONE};

        let word = match format {
            PictFormat::A2B10G10R10 => tic::word0(tic::FMT_2_10_10_10, C2, C1, C0, C3),
            PictFormat::X2B10G10R10 => tic::word0(tic::FMT_2_10_10_10, C2, C1, C0, ONE),
            PictFormat::A8R8G8B8 => tic::word0(tic::FMT_8_8_8_8, C0, C1, C2, C3),
            PictFormat::A8B8G8R8 => tic::word0(tic::FMT_8_8_8_8, C2, C1, C0, C3),
            PictFormat::X8R8G8B8 => tic::word0(tic::FMT_8_8_8_8, C0, C1, C2, ONE),
            PictFormat::X8B8G8R8 => tic::word0(tic::FMT_8_8_8_8, C2, C1, C0, ONE),
            PictFormat::R5G6B5 => tic::word0(tic::FMT_5_6_5, C0, C1, C2, ONE),
            PictFormat::A8 => tic::word0(
                tic::FMT_8,
                tic::MAP_ZERO,
                tic::MAP_ZERO,
                tic::MAP_ZERO,
                C0,
            ),
            _ => return Err(Error::UnsupportedFormat),
        };
        Ok(word)
    }

    /// Whether a width and height fit the 3D engine
    pub fn fits_3d(&self, width: u32, height: u32) -> Result<()> {
        if width > self.max_3d_dimension || height > self.max_3d_dimension {
            return Err(Error::DimensionExceeded);
        }
        Ok(())
    }
}

static_assertions::assert_impl_all!(Capabilities: Send, Sync);
