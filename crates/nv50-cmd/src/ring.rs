//! # Command Ring
//!
//! CPU-side batch of command words destined for the device FIFO.
//!
//! The ring has room for `capacity` words. Words already handed to the
//! device but not yet consumed (the backlog) and words in the current batch
//! both occupy that room. The relocation table is bounded per batch as
//! well. Writes are only legal inside a reservation covering both, so a
//! multi-word command can never straddle a flush.

use alloc::vec::Vec;

use nv50_core::{BufferHandle, ByteSize, Error, GpuAddr, Result};

use crate::method::{Header, Subchannel, MAX_COUNT};
use crate::reloc::{RelocFlags, RelocPart, Relocation};

// =============================================================================
// RING CONFIGURATION
// =============================================================================

/// Command ring configuration
#[derive(Debug, Clone)]
pub struct RingConfig {
    /// Ring size in bytes
    pub size: ByteSize,
    /// Maximum relocations per batch
    pub max_relocs: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            size: ByteSize::from_kib(256),
            max_relocs: 1024,
        }
    }
}

// =============================================================================
// DEVICE INTERFACE
// =============================================================================

/// The consumer side of the ring
pub trait PushDevice {
    /// Device address of a buffer object accessed as `flags`, `None` if it
    /// has none or can't be placed in the requested domain
    fn resolve(&mut self, bo: BufferHandle, flags: RelocFlags) -> Option<GpuAddr>;

    /// Append a finished batch (relocations applied) to the device FIFO
    fn submit(&mut self, words: &[u32]) -> Result<()>;

    /// Ring the doorbell so the device starts consuming right away
    fn kick(&mut self) -> Result<()>;

    /// Submitted words the device has not consumed yet
    fn backlog(&mut self) -> usize;

    /// Yield until the device makes progress; errors if it never will
    fn wait(&mut self) -> Result<()>;
}

// =============================================================================
// MARKS AND RESERVATIONS
// =============================================================================

/// A rollback point inside the current batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    position: usize,
    relocs: usize,
    epoch: u64,
}

impl Mark {
    /// Batch word index the mark points at
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Space guaranteed to be writable without an intervening flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Reservation {
    mark: Mark,
    words: usize,
    relocs: usize,
}

impl Reservation {
    /// Rollback point at the start of the reservation
    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// Reserved word count
    pub fn words(&self) -> usize {
        self.words
    }

    /// Reserved relocation count
    pub fn relocs(&self) -> usize {
        self.relocs
    }
}

/// Ring statistics
#[derive(Debug, Clone, Default)]
pub struct RingStats {
    /// Batches handed to the device
    pub flushes: u64,
    /// Doorbell writes
    pub kicks: u64,
    /// Resubmissions replayed after a flush
    pub replays: u64,
    /// Rolled back transactions
    pub rollbacks: u64,
    /// Waits for the device to drain
    pub stalls: u64,
    /// Words submitted in total
    pub words: u64,
}

// =============================================================================
// COMMAND RING
// =============================================================================

/// Command batch plus its relocation table
#[derive(Debug)]
pub struct CommandRing<D> {
    /// Ring configuration
    config: RingConfig,
    /// Consumer
    device: D,
    /// Words not yet handed to the device
    batch: Vec<u32>,
    /// Placeholders inside `batch`
    relocs: Vec<Relocation>,
    /// Words left in the current reservation
    reserved: usize,
    /// Relocations left in the current reservation
    reserved_relocs: usize,
    /// Incremented by every submission
    epoch: u64,
    /// Statistics
    stats: RingStats,
}

impl<D: PushDevice> CommandRing<D> {
    /// Create a ring in front of `device`
    pub fn new(config: RingConfig, device: D) -> Self {
        let capacity = config.size.as_words();
        Self {
            batch: Vec::with_capacity(capacity),
            relocs: Vec::with_capacity(config.max_relocs),
            config,
            device,
            reserved: 0,
            reserved_relocs: 0,
            epoch: 0,
            stats: RingStats::default(),
        }
    }

    /// Ring capacity in words
    pub fn capacity(&self) -> usize {
        self.config.size.as_words()
    }

    /// Relocation slots per batch
    pub fn max_relocs(&self) -> usize {
        self.config.max_relocs
    }

    /// Words written to the current batch
    pub fn cursor(&self) -> usize {
        self.batch.len()
    }

    /// Current batch, placeholders still unresolved
    pub fn batch(&self) -> &[u32] {
        &self.batch
    }

    /// Whether the current batch is empty
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Words still writable under the current reservation
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// Words that can be reserved right now without flushing or waiting
    pub fn free_words(&mut self) -> usize {
        let used = self.device.backlog() + self.batch.len();
        self.capacity().saturating_sub(used)
    }

    /// Relocation slots still free in the current batch
    pub fn free_relocs(&self) -> usize {
        self.config.max_relocs.saturating_sub(self.relocs.len())
    }

    /// Submitted words the device is still working through
    pub fn backlog(&mut self) -> usize {
        self.device.backlog()
    }

    /// Current rollback point
    pub fn mark(&self) -> Mark {
        Mark {
            position: self.batch.len(),
            relocs: self.relocs.len(),
            epoch: self.epoch,
        }
    }

    /// Open a reservation; the caller has checked `free_words` and
    /// `free_relocs`
    pub(crate) fn open_reservation(&mut self, words: usize, relocs: usize) -> Reservation {
        debug_assert!(words <= self.free_words());
        debug_assert!(relocs <= self.free_relocs());
        self.reserved = words;
        self.reserved_relocs = relocs;
        Reservation {
            mark: self.mark(),
            words,
            relocs,
        }
    }

    /// Block until the device drains some of the backlog
    pub(crate) fn stall(&mut self) -> Result<()> {
        self.stats.stalls += 1;
        log::warn!("ring full, waiting on {} words of backlog", self.device.backlog());
        self.device.wait()
    }

    // =========================================================================
    // EMISSION
    // =========================================================================

    /// Append one word
    #[inline]
    pub fn emit(&mut self, word: u32) {
        assert!(self.reserved > 0, "ring write outside of a reservation");
        self.reserved -= 1;
        self.batch.push(word);
    }

    /// Append a float payload word
    #[inline]
    pub fn emit_f32(&mut self, value: f32) {
        self.emit(value.to_bits());
    }

    /// Append a run of words
    pub fn emit_block(&mut self, words: &[u32]) {
        assert!(
            words.len() <= self.reserved,
            "ring write of {} words exceeds reservation of {}",
            words.len(),
            self.reserved
        );
        self.reserved -= words.len();
        self.batch.extend_from_slice(words);
    }

    /// Append a method header
    #[inline]
    pub fn method(&mut self, subc: Subchannel, method: u32, count: u32) {
        debug_assert!(count <= MAX_COUNT);
        self.emit(Header::new(subc, method, count).encode());
    }

    /// Append a non-incrementing method header
    #[inline]
    pub fn method_ni(&mut self, subc: Subchannel, method: u32, count: u32) {
        debug_assert!(count <= MAX_COUNT);
        self.emit(Header::non_incrementing(subc, method, count).encode());
    }

    /// Append a placeholder for half of `bo`'s address plus `delta`
    pub fn emit_reloc(
        &mut self,
        bo: BufferHandle,
        delta: u64,
        flags: RelocFlags,
        part: RelocPart,
    ) -> Result<()> {
        if bo.is_null() {
            return Err(Error::RelocationFailed);
        }
        assert!(self.reserved_relocs > 0, "relocation outside of a reservation");
        self.reserved_relocs -= 1;

        self.relocs.push(Relocation {
            index: self.batch.len(),
            bo,
            delta,
            flags,
            part,
        });
        self.emit(0);
        Ok(())
    }

    /// Discard everything written since `mark`
    pub fn rollback(&mut self, mark: Mark) {
        assert_eq!(
            mark.epoch, self.epoch,
            "rollback across a flush: the marked words were already submitted"
        );
        self.batch.truncate(mark.position);
        self.relocs.truncate(mark.relocs);
        self.reserved = 0;
        self.reserved_relocs = 0;
        self.stats.rollbacks += 1;
    }

    // =========================================================================
    // SUBMISSION
    // =========================================================================

    /// Resolve relocations and hand the batch to the device
    ///
    /// A relocation that doesn't resolve loses the whole batch.
    pub(crate) fn submit(&mut self) -> Result<()> {
        let result = self.patch_relocs().and_then(|()| self.device.submit(&self.batch));

        match result {
            Ok(()) => {
                log::trace!("flush: {} words, {} relocations", self.batch.len(), self.relocs.len());
                self.stats.flushes += 1;
                self.stats.words += self.batch.len() as u64;
            }
            Err(e) => log::error!("dropping {} word batch: {}", self.batch.len(), e),
        }

        self.batch.clear();
        self.relocs.clear();
        self.reserved = 0;
        self.reserved_relocs = 0;
        self.epoch += 1;
        result
    }

    fn patch_relocs(&mut self) -> Result<()> {
        for reloc in &self.relocs {
            let base = self
                .device
                .resolve(reloc.bo, reloc.flags)
                .ok_or(Error::RelocationFailed)?;
            self.batch[reloc.index] = reloc.apply(base);
        }
        Ok(())
    }

    /// Ring the doorbell
    pub(crate) fn kick(&mut self) -> Result<()> {
        log::trace!("kick");
        self.stats.kicks += 1;
        self.device.kick()
    }

    pub(crate) fn stats_mut(&mut self) -> &mut RingStats {
        &mut self.stats
    }

    /// Ring statistics
    pub fn stats(&self) -> &RingStats {
        &self.stats
    }

    /// Underlying device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Underlying device (mutable)
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}
