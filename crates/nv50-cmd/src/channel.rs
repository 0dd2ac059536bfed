//! # Ring Channel
//!
//! Transactional front end to the command ring. Owns the resubmission
//! registry and the cached 2D raster-op state, both of which are tied to
//! the lifetime of a single batch.

use nv50_core::{BufferHandle, Error, Result};

use crate::method::Subchannel;
use crate::reloc::{RelocFlags, RelocPart};
use crate::resubmit::{Registry, Resubmit};
use crate::ring::{CommandRing, Mark, PushDevice, Reservation, RingConfig, RingStats};

// =============================================================================
// RING CHANNEL
// =============================================================================

/// A command ring plus the per-batch state layered over it
#[derive(Debug)]
pub struct RingChannel<D, P = ()> {
    /// Command ring
    ring: CommandRing<D>,
    /// Operation replayed after every flush
    registry: Registry<P>,
    /// Raster-op configuration known to be current in the batch
    rop: Option<u64>,
}

impl<D: PushDevice, P: Resubmit<D>> RingChannel<D, P> {
    /// Create a channel in front of `device`
    pub fn new(config: RingConfig, device: D) -> Self {
        log::debug!(
            "ring channel: {} words, {} relocations per batch",
            config.size.as_words(),
            config.max_relocs
        );
        Self {
            ring: CommandRing::new(config, device),
            registry: Registry::new(),
            rop: None,
        }
    }

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================

    /// Guarantee `words` contiguous words and `relocs` relocation slots
    /// without an intervening flush
    ///
    /// Flushes once if the current batch is in the way, then waits for the
    /// device to drain its backlog.
    pub fn reserve(&mut self, words: usize, relocs: usize) -> Result<Reservation> {
        if words > self.ring.capacity() {
            log::warn!(
                "reservation of {} words exceeds ring capacity {}",
                words,
                self.ring.capacity()
            );
            return Err(Error::RingExhausted);
        }
        if relocs > self.ring.max_relocs() {
            log::warn!(
                "reservation of {} relocations exceeds batch limit {}",
                relocs,
                self.ring.max_relocs()
            );
            return Err(Error::RelocationFailed);
        }

        let mut flushed = false;
        loop {
            let relocs_fit = self.ring.free_relocs() >= relocs;
            if relocs_fit && self.ring.free_words() >= words {
                return Ok(self.ring.open_reservation(words, relocs));
            }

            if !flushed && !self.ring.is_empty() {
                self.flush()?;
                flushed = true;
            } else if !relocs_fit {
                // Only a replayed setup can hold slots in a fresh batch.
                return Err(Error::RelocationFailed);
            } else if self.ring.backlog() == 0 {
                return Err(Error::RingExhausted);
            } else {
                self.ring.stall()?;
            }
        }
    }

    /// Discard everything written since `mark`
    pub fn rollback(&mut self, mark: Mark) {
        log::trace!("rollback to word {}", mark.position());
        self.ring.rollback(mark);
    }

    /// Submit the current batch, then replay the armed operation
    ///
    /// The raster-op cache does not survive the flush.
    pub fn flush(&mut self) -> Result<()> {
        if self.ring.is_empty() {
            return Ok(());
        }

        let submitted = self.ring.submit();
        self.rop = None;
        submitted?;

        self.replay_pending()
    }

    /// Flush and ring the doorbell
    pub fn kick(&mut self) -> Result<()> {
        self.flush()?;
        self.ring.kick()
    }

    /// Re-emit the armed operation's configuration into the current batch
    pub fn replay_pending(&mut self) -> Result<()> {
        let Some(op) = self.registry.take_armed() else {
            return Ok(());
        };

        self.ring.stats_mut().replays += 1;
        let result = op.replay(self);
        self.registry.restore(op);

        if let Err(e) = result {
            log::warn!("replay after flush failed: {}", e);
        }
        result
    }

    // =========================================================================
    // EMISSION
    // =========================================================================

    /// Append one word
    #[inline]
    pub fn emit(&mut self, word: u32) {
        self.ring.emit(word);
    }

    /// Append a float payload word
    #[inline]
    pub fn emit_f32(&mut self, value: f32) {
        self.ring.emit_f32(value);
    }

    /// Append a run of words
    #[inline]
    pub fn emit_block(&mut self, words: &[u32]) {
        self.ring.emit_block(words);
    }

    /// Append an incrementing method header
    #[inline]
    pub fn method(&mut self, subc: Subchannel, method: u32, count: u32) {
        self.ring.method(subc, method, count);
    }

    /// Append a non-incrementing method header
    #[inline]
    pub fn method_ni(&mut self, subc: Subchannel, method: u32, count: u32) {
        self.ring.method_ni(subc, method, count);
    }

    /// Append a relocation placeholder
    #[inline]
    pub fn emit_reloc(
        &mut self,
        bo: BufferHandle,
        delta: u64,
        flags: RelocFlags,
        part: RelocPart,
    ) -> Result<()> {
        self.ring.emit_reloc(bo, delta, flags, part)
    }

    /// Both halves of a buffer address, high first
    pub fn emit_address(&mut self, bo: BufferHandle, delta: u64, flags: RelocFlags) -> Result<()> {
        self.ring.emit_reloc(bo, delta, flags, RelocPart::High)?;
        self.ring.emit_reloc(bo, delta, flags, RelocPart::Low)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Current rollback point
    pub fn mark(&self) -> Mark {
        self.ring.mark()
    }

    /// Ring capacity in words
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Words in the current batch
    pub fn cursor(&self) -> usize {
        self.ring.cursor()
    }

    /// Current batch, placeholders unresolved
    pub fn batch(&self) -> &[u32] {
        self.ring.batch()
    }

    /// Words that fit without flushing or waiting
    pub fn free_words(&mut self) -> usize {
        self.ring.free_words()
    }

    /// Relocation slots left in the current batch
    pub fn free_relocs(&self) -> usize {
        self.ring.free_relocs()
    }

    /// Resubmission registry
    pub fn registry(&self) -> &Registry<P> {
        &self.registry
    }

    /// Resubmission registry (mutable)
    pub fn registry_mut(&mut self) -> &mut Registry<P> {
        &mut self.registry
    }

    /// Raster-op key last emitted in this batch
    pub fn cached_rop(&self) -> Option<u64> {
        self.rop
    }

    /// Record the raster-op key now current in the batch
    pub fn set_cached_rop(&mut self, key: Option<u64>) {
        self.rop = key;
    }

    /// Ring statistics
    pub fn stats(&self) -> &RingStats {
        self.ring.stats()
    }

    /// Underlying device
    pub fn device(&self) -> &D {
        self.ring.device()
    }

    /// Underlying device (mutable)
    pub fn device_mut(&mut self) -> &mut D {
        self.ring.device_mut()
    }
}
