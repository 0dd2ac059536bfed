//! # Surface Descriptors
//!
//! A surface is a read-only view onto a drawable whose backing buffer is
//! owned elsewhere. The engine never allocates or frees one.

use crate::types::BufferHandle;

/// Memory layout of a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tiling {
    /// Row-major with an explicit pitch
    Linear,
    /// Block-linear; the tile mode selects the block height
    Tiled {
        /// Hardware tile mode nibble
        mode: u8,
    },
}

/// Drawable surface descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Surface {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Colour depth in bits (8, 15, 16, 24, 30 or 32 are encodable)
    pub depth: u8,
    /// Memory layout
    pub tiling: Tiling,
    /// Backing buffer object
    pub bo: BufferHandle,
    /// Byte offset of the first pixel inside `bo`
    pub offset: u64,
    /// Bytes per row, only meaningful for linear surfaces
    pub pitch: u32,
}

impl Surface {
    /// Linear surface
    pub const fn linear(width: u32, height: u32, depth: u8, bo: BufferHandle, pitch: u32) -> Self {
        Self {
            width,
            height,
            depth,
            tiling: Tiling::Linear,
            bo,
            offset: 0,
            pitch,
        }
    }

    /// Tiled surface
    pub const fn tiled(width: u32, height: u32, depth: u8, bo: BufferHandle, mode: u8) -> Self {
        Self {
            width,
            height,
            depth,
            tiling: Tiling::Tiled { mode },
            bo,
            offset: 0,
            pitch: 0,
        }
    }

    /// Same surface at a byte offset inside its buffer
    pub const fn at_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Whether the surface is block-linear
    #[inline]
    pub const fn is_tiled(&self) -> bool {
        matches!(self.tiling, Tiling::Tiled { .. })
    }

    /// Tile mode nibble, zero for linear surfaces
    #[inline]
    pub const fn tile_mode(&self) -> u32 {
        match self.tiling {
            Tiling::Linear => 0,
            Tiling::Tiled { mode } => mode as u32,
        }
    }
}
