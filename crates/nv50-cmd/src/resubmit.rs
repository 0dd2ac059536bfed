//! # Resubmission
//!
//! The device forgets all engine state at every flush. An operation that
//! spans flushes registers itself here; the channel replays its
//! configuration at the head of every new batch until it is disarmed.

use nv50_core::Result;

use crate::channel::RingChannel;
use crate::ring::PushDevice;

/// An operation whose configuration can be re-emitted after a flush
pub trait Resubmit<D: PushDevice>: Sized {
    /// Re-emit the full configuration, including its own reservation
    fn replay(&self, chan: &mut RingChannel<D, Self>) -> Result<()>;
}

/// Channels without multi-flush operations
impl<D: PushDevice> Resubmit<D> for () {
    fn replay(&self, _chan: &mut RingChannel<D, Self>) -> Result<()> {
        Ok(())
    }
}

/// Single-slot registry for the operation in progress
///
/// A disarmed operation stays in the slot until cleared, so its state can
/// still be read after it stops replaying.
#[derive(Debug)]
pub struct Registry<P> {
    slot: Option<P>,
    armed: bool,
}

impl<P> Default for Registry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Registry<P> {
    /// Empty registry
    pub const fn new() -> Self {
        Self {
            slot: None,
            armed: false,
        }
    }

    /// Store `op` and replay it after every flush
    pub fn arm(&mut self, op: P) {
        self.slot = Some(op);
        self.armed = true;
    }

    /// Stop replaying; the operation stays stored
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Remove the stored operation
    pub fn clear(&mut self) -> Option<P> {
        self.armed = false;
        self.slot.take()
    }

    /// Whether a replay will follow the next flush
    pub fn is_armed(&self) -> bool {
        self.armed && self.slot.is_some()
    }

    /// Stored operation
    pub fn get(&self) -> Option<&P> {
        self.slot.as_ref()
    }

    /// Stored operation (mutable)
    pub fn get_mut(&mut self) -> Option<&mut P> {
        self.slot.as_mut()
    }

    /// Borrow the armed operation out of the slot for a replay
    pub(crate) fn take_armed(&mut self) -> Option<P> {
        if self.is_armed() {
            self.slot.take()
        } else {
            None
        }
    }

    /// Put back an operation taken with `take_armed`
    pub(crate) fn restore(&mut self, op: P) {
        self.slot = Some(op);
    }
}
