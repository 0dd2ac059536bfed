//! # Pending Operation
//!
//! The operation between a successful prepare and `done`, held in the
//! channel's resubmission slot. Replay re-emits its setup at the head of
//! every batch; pixel data already sent is never replayed.

use core::fmt;

use nv50_cmd::{PushDevice, Resubmit, RingChannel};
use nv50_core::{Error, Result};

use crate::binder::Binder;
use crate::composite::CompositeState;
use crate::context::CompositeContext;
use crate::copy::CopyState;
use crate::solid::SolidState;
use crate::upload::UploadState;

/// Ring channel carrying acceleration state
pub type Channel<D> = RingChannel<D, PendingOperation>;

/// Parameters fixed for the lifetime of an accelerator
#[derive(Debug, Clone, Copy)]
pub struct Env {
    /// Surface binder for the selected generation
    pub binder: Binder,
    /// Pixel area at and above which a draw kicks the ring
    pub kick_threshold: u64,
    /// Immediate-data words per command
    pub sifc_max_words: usize,
}

/// Operation kind, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Rectangle fill
    Solid,
    /// Screen-to-screen blit
    Copy,
    /// Host-to-screen transfer
    Upload,
    /// 3D composite
    Composite,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solid => write!(f, "solid"),
            Self::Copy => write!(f, "copy"),
            Self::Upload => write!(f, "upload"),
            Self::Composite => write!(f, "composite"),
        }
    }
}

/// Prepared operation, replayable after every flush
#[derive(Debug, Clone)]
pub enum PendingOperation {
    /// Rectangle fill
    Solid(SolidState),
    /// Screen-to-screen blit
    Copy(CopyState),
    /// Host-to-screen transfer
    Upload(UploadState),
    /// 3D composite
    Composite(CompositeState),
}

impl PendingOperation {
    /// Kind tag
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Solid(_) => OperationKind::Solid,
            Self::Copy(_) => OperationKind::Copy,
            Self::Upload(_) => OperationKind::Upload,
            Self::Composite(_) => OperationKind::Composite,
        }
    }

    /// Words the setup of this operation may write
    pub fn setup_words(&self) -> usize {
        match self {
            Self::Solid(_) => SolidState::SETUP_WORDS,
            Self::Copy(_) => CopyState::SETUP_WORDS,
            Self::Upload(_) => UploadState::SETUP_WORDS,
            Self::Composite(_) => CompositeState::SETUP_WORDS,
        }
    }

    /// Relocations the setup of this operation may emit
    pub fn setup_relocs(&self) -> usize {
        match self {
            Self::Solid(_) => SolidState::SETUP_RELOCS,
            Self::Copy(_) => CopyState::SETUP_RELOCS,
            Self::Upload(_) => UploadState::SETUP_RELOCS,
            Self::Composite(_) => CompositeState::SETUP_RELOCS,
        }
    }
}

impl<D: PushDevice> Resubmit<D> for PendingOperation {
    fn replay(&self, chan: &mut Channel<D>) -> Result<()> {
        log::trace!("replaying {} setup", self.kind());
        let res = chan.reserve(self.setup_words(), self.setup_relocs())?;

        // Raster-op state is rewritten in full so that back-to-back replays
        // emit identical words.
        let result = match self {
            Self::Solid(op) => op.setup(chan, true),
            Self::Copy(op) => op.setup(chan, true),
            Self::Upload(op) => op.setup(chan),
            Self::Composite(op) => op.setup(chan, &mut CompositeContext::new()),
        };

        if result.is_err() {
            chan.rollback(res.mark());
        }
        result
    }
}

/// Run `setup` inside a reservation of `words` and `relocs`, undoing it on
/// failure
///
/// On error the ring and the raster-op cache are as they were after the
/// reservation, and the reason is logged as a fallback.
pub(crate) fn transaction<D, F>(
    chan: &mut Channel<D>,
    words: usize,
    relocs: usize,
    what: OperationKind,
    setup: F,
) -> Result<()>
where
    D: PushDevice,
    F: FnOnce(&mut Channel<D>) -> Result<()>,
{
    let res = chan.reserve(words, relocs).map_err(|e| fallback(what, e))?;
    let rop = chan.cached_rop();

    setup(chan).map_err(|e| {
        chan.rollback(res.mark());
        chan.set_cached_rop(rop);
        fallback(what, e)
    })
}

/// Log why an operation is left to software
pub(crate) fn fallback(what: OperationKind, e: Error) -> Error {
    log::debug!("fallback: {}: {}", what, e);
    e
}
