//! # Relocations
//!
//! A relocation is a payload word whose value is only known at flush time:
//! one half of a buffer object's device address plus a byte offset.

use nv50_core::{BufferHandle, GpuAddr};

bitflags::bitflags! {
    /// How the device will access a relocated buffer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RelocFlags: u32 {
        /// Device reads the buffer
        const READ = 1 << 0;
        /// Device writes the buffer
        const WRITE = 1 << 1;
        /// Buffer must live in VRAM
        const VRAM = 1 << 2;
        /// Buffer must live in the GART aperture
        const GART = 1 << 3;
        /// Read and write
        const RDWR = Self::READ.bits() | Self::WRITE.bits();
    }
}

/// Which half of the 40-bit device address a placeholder receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelocPart {
    /// Bits 32 and up
    High,
    /// Bits 0..32
    Low,
}

/// A placeholder word awaiting its buffer address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    /// Word index inside the current batch
    pub index: usize,
    /// Buffer object whose address is written
    pub bo: BufferHandle,
    /// Byte offset added to the buffer address
    pub delta: u64,
    /// Access flags
    pub flags: RelocFlags,
    /// Address half
    pub part: RelocPart,
}

impl Relocation {
    /// Value of the placeholder once the buffer resolved to `base`
    #[inline]
    pub fn apply(&self, base: GpuAddr) -> u32 {
        let addr = base.offset(self.delta);
        match self.part {
            RelocPart::High => addr.high(),
            RelocPart::Low => addr.low(),
        }
    }
}
