//! # NV50 Command Ring
//!
//! Transactional command submission for a device whose command context is
//! shared and forgets everything between flushes.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                          RingChannel                              │
//! │                                                                   │
//! │  reserve ──▶ ┌──────────────┐  flush   ┌──────────────────────┐   │
//! │  emit    ──▶ │ CommandRing  │ ───────▶ │  PushDevice (FIFO)   │   │
//! │  reloc   ──▶ │ batch+relocs │          │  drains on its own   │   │
//! │  rollback ◀─ └──────┬───────┘          └──────────────────────┘   │
//! │                     │ after every flush                           │
//! │              ┌──────▼───────┐                                     │
//! │              │  Registry    │  replays the armed operation's      │
//! │              │  (one slot)  │  configuration at the batch head    │
//! │              └──────────────┘                                     │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Flow
//!
//! 1. `reserve(words, relocs)` guarantees the words and relocation slots fit
//!    without a flush in between
//! 2. Commands and relocation placeholders are appended
//! 3. On failure, `rollback(mark)` discards everything since the reservation
//! 4. `flush()` resolves relocations, hands the batch to the device and
//!    replays the armed operation so the next batch starts configured

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod channel;
pub mod method;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod reloc;
pub mod resubmit;
pub mod ring;

// Re-exports
pub use channel::RingChannel;
pub use method::{Header, Subchannel, MAX_COUNT};
pub use reloc::{RelocFlags, RelocPart, Relocation};
pub use resubmit::{Registry, Resubmit};
pub use ring::{CommandRing, Mark, PushDevice, Reservation, RingConfig, RingStats};
