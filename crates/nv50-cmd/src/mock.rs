//! # Mock Device
//!
//! In-memory FIFO that records every submitted batch. Submitted words stay
//! in the backlog until `wait` drains them, so ring-full behaviour can be
//! exercised deterministically.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use nv50_core::{BufferHandle, Error, GpuAddr, Result};

use crate::reloc::RelocFlags;
use crate::ring::PushDevice;

/// Recording device for tests
#[derive(Debug, Clone)]
pub struct MockDevice {
    buffers: BTreeMap<u64, GpuAddr>,
    submitted: Vec<Vec<u32>>,
    resolved: Vec<(BufferHandle, RelocFlags)>,
    kicks: u64,
    waits: u64,
    backlog: usize,
    drain_per_wait: usize,
    consume_on_submit: bool,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevice {
    /// Device whose `wait` drains the whole backlog
    pub fn new() -> Self {
        Self {
            buffers: BTreeMap::new(),
            submitted: Vec::new(),
            resolved: Vec::new(),
            kicks: 0,
            waits: 0,
            backlog: 0,
            drain_per_wait: usize::MAX,
            consume_on_submit: false,
        }
    }

    /// Register a buffer object at a device address
    pub fn with_buffer(mut self, id: u64, addr: GpuAddr) -> Self {
        self.buffers.insert(id, addr);
        self
    }

    /// Words drained per `wait`; zero simulates a hung device
    pub fn with_drain(mut self, words: usize) -> Self {
        self.drain_per_wait = words;
        self
    }

    /// Consume batches as soon as they are submitted
    pub fn consuming(mut self) -> Self {
        self.consume_on_submit = true;
        self
    }

    /// Drop the whole backlog
    pub fn drain_all(&mut self) {
        self.backlog = 0;
    }

    /// Every batch submitted so far
    pub fn submitted(&self) -> &[Vec<u32>] {
        &self.submitted
    }

    /// Most recent batch
    pub fn last_batch(&self) -> Option<&[u32]> {
        self.submitted.last().map(Vec::as_slice)
    }

    /// All submitted words, concatenated
    pub fn words(&self) -> Vec<u32> {
        self.submitted.concat()
    }

    /// Every relocation resolved so far, with its access flags
    pub fn relocations(&self) -> &[(BufferHandle, RelocFlags)] {
        &self.resolved
    }

    /// Doorbell writes
    pub fn kicks(&self) -> u64 {
        self.kicks
    }

    /// Calls to `wait`
    pub fn waits(&self) -> u64 {
        self.waits
    }
}

impl PushDevice for MockDevice {
    fn resolve(&mut self, bo: BufferHandle, flags: RelocFlags) -> Option<GpuAddr> {
        self.resolved.push((bo, flags));
        self.buffers.get(&bo.id()).copied()
    }

    fn submit(&mut self, words: &[u32]) -> Result<()> {
        self.submitted.push(words.to_vec());
        if !self.consume_on_submit {
            self.backlog += words.len();
        }
        Ok(())
    }

    fn kick(&mut self) -> Result<()> {
        self.kicks += 1;
        Ok(())
    }

    fn backlog(&mut self) -> usize {
        self.backlog
    }

    fn wait(&mut self) -> Result<()> {
        self.waits += 1;
        if self.backlog > 0 && self.drain_per_wait == 0 {
            return Err(Error::DeviceHang);
        }
        self.backlog = self.backlog.saturating_sub(self.drain_per_wait);
        Ok(())
    }
}
