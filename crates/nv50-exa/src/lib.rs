//! # NV50 EXA Acceleration
//!
//! Solid fills, blits, host uploads and Porter-Duff compositing for Tesla
//! class hardware, driven through a transactional command ring.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              Accel                               │
//! │                                                                  │
//! │   prepare_* ──▶ check (pure) ──▶ setup ──▶ arm PendingOperation  │
//! │   execute_* ──▶ draw commands ──▶ kick when area ≥ threshold     │
//! │   done      ──▶ clear PendingOperation                           │
//! │                                                                  │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────────┐ │
//! │  │  Binder  │ │  Blend   │ │   ROP    │ │    Capabilities      │ │
//! │  │ 2D / 3D  │ │ Planner  │ │  table   │ │  (per generation)    │ │
//! │  └──────────┘ └──────────┘ └──────────┘ └──────────────────────┘ │
//! └────────────────────────────────┬─────────────────────────────────┘
//!                                  │
//!                     RingChannel<D, PendingOperation>
//!                  (replays the setup after every flush)
//! ```
//!
//! ## Operation Lifecycle
//!
//! ```text
//!   Idle ── prepare ──▶ Prepared ──┐
//!    ▲                     │  ▲    │ execute
//!    └──────── done ───────┘  └────┘
//! ```
//!
//! A prepare that fails leaves the ring exactly as it found it and returns
//! the reason; the caller renders in software instead.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod binder;
pub mod blend;
pub mod caps;
pub mod composite;
pub mod context;
pub mod copy;
pub mod hw;
pub mod pending;
pub mod rop;
#[cfg(test)]
mod scenarios;
pub mod solid;
pub mod upload;

use nv50_cmd::{PushDevice, RingConfig, RingStats, MAX_COUNT};
use nv50_core::{BufferHandle, Error, Picture, Point, Rect, Result, Surface};

// Re-exports
pub use binder::{Binder, Role2d};
pub use blend::{BlendDecision, BlendFactor, PictOp};
pub use caps::Capabilities;
pub use context::{CompositeContext, TextureUnit};
pub use pending::{Channel, Env, OperationKind, PendingOperation};
pub use rop::RasterOp;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Accelerator configuration
#[derive(Debug, Clone)]
pub struct ExaConfig {
    /// Command ring
    pub ring: RingConfig,
    /// Buffer holding shader programs and TIC/TSC tables; compositing
    /// falls back while it is null
    pub scratch: BufferHandle,
    /// Pixel area at and above which a draw kicks the ring
    pub kick_threshold: u64,
    /// Immediate-data words per upload command
    pub sifc_max_words: u32,
}

impl Default for ExaConfig {
    fn default() -> Self {
        Self {
            ring: RingConfig::default(),
            scratch: BufferHandle::null(),
            kick_threshold: 512,
            sifc_max_words: 1792,
        }
    }
}

// =============================================================================
// ACCELERATOR
// =============================================================================

/// Acceleration front end over one ring channel
#[derive(Debug)]
pub struct Accel<D: PushDevice> {
    chan: Channel<D>,
    env: Env,
}

impl<D: PushDevice> Accel<D> {
    /// Accelerator for `chipset` in front of `device`
    pub fn new(chipset: u32, config: ExaConfig, device: D) -> Result<Self> {
        let caps = Capabilities::for_chipset(chipset)?;

        let sifc_max_words = config.sifc_max_words.clamp(1, MAX_COUNT);
        if sifc_max_words != config.sifc_max_words {
            log::warn!(
                "sifc_max_words {} out of range, using {}",
                config.sifc_max_words,
                sifc_max_words
            );
        }

        let env = Env {
            binder: Binder::new(caps, config.scratch),
            kick_threshold: config.kick_threshold,
            sifc_max_words: sifc_max_words as usize,
        };

        Ok(Self {
            chan: Channel::new(config.ring, device),
            env,
        })
    }

    // =========================================================================
    // SOLID
    // =========================================================================

    /// Set up rectangle fills of `color` onto `dst`
    pub fn prepare_solid(&mut self, dst: &Surface, rop: RasterOp, planemask: u32, color: u32) -> Result<()> {
        self.begin(OperationKind::Solid);
        solid::prepare(&mut self.chan, self.env, dst, rop, planemask, color)
    }

    /// Fill `rect`
    ///
    /// # Panics
    /// Without a prepared solid fill.
    pub fn execute_solid(&mut self, rect: Rect) -> Result<()> {
        let state = match self.chan.registry().get() {
            Some(PendingOperation::Solid(state)) => *state,
            other => contract_violation("execute_solid", other),
        };
        solid::execute(&mut self.chan, &state, rect)
    }

    // =========================================================================
    // COPY
    // =========================================================================

    /// Set up blits from `src` to `dst`
    pub fn prepare_copy(&mut self, src: &Surface, dst: &Surface, rop: RasterOp, planemask: u32) -> Result<()> {
        self.begin(OperationKind::Copy);
        copy::prepare(&mut self.chan, self.env, src, dst, rop, planemask)
    }

    /// Blit `src` to `dst`
    ///
    /// # Panics
    /// Without a prepared copy.
    pub fn execute_copy(&mut self, src: Rect, dst: Point) -> Result<()> {
        let state = match self.chan.registry().get() {
            Some(PendingOperation::Copy(state)) => *state,
            other => contract_violation("execute_copy", other),
        };
        copy::execute(&mut self.chan, &state, src, dst)
    }

    // =========================================================================
    // UPLOAD
    // =========================================================================

    /// Set up a host transfer into `rect` of `dst`, `cpp` bytes per pixel
    pub fn prepare_upload(&mut self, dst: &Surface, rect: Rect, cpp: u32) -> Result<()> {
        self.begin(OperationKind::Upload);
        upload::prepare(&mut self.chan, self.env, dst, rect, cpp)
    }

    /// Send the next host rows
    ///
    /// # Panics
    /// Without a prepared upload, or on a row shorter than the upload width.
    pub fn execute_upload<'r, I>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = &'r [u8]>,
    {
        match self.chan.registry().get() {
            Some(PendingOperation::Upload(_)) => {}
            other => contract_violation("execute_upload", other),
        }
        upload::execute(&mut self.chan, rows)
    }

    /// Upload a whole host image with rows `pitch` bytes apart
    ///
    /// Fails with `SourceTooShort`, writing nothing, if `src` ends before
    /// the last row does.
    pub fn upload(&mut self, src: &[u8], pitch: usize, dst: &Surface, rect: Rect, cpp: u32) -> Result<()> {
        let row_bytes = rect.width.max(0) as usize * cpp as usize;
        let height = rect.height.max(0) as usize;
        let needed = match height.checked_sub(1) {
            None => Some(0),
            Some(last) => last.checked_mul(pitch).and_then(|n| n.checked_add(row_bytes)),
        };
        if needed.map_or(true, |n| src.len() < n) {
            return Err(pending::fallback(OperationKind::Upload, Error::SourceTooShort));
        }

        self.prepare_upload(dst, rect, cpp)?;

        let rows = (0..height).map(|i| {
            let start = i * pitch;
            &src[start..start + row_bytes]
        });
        let result = self.execute_upload(rows);
        self.done();
        result
    }

    // =========================================================================
    // COMPOSITE
    // =========================================================================

    /// Whether `src` through `mask` onto `dst` can be accelerated
    pub fn check_composite(&self, op: PictOp, src: &Picture, mask: Option<&Picture>, dst: &Picture) -> Result<()> {
        composite::check(&self.env.binder, op, src, mask, dst)
    }

    /// Set up compositing
    pub fn prepare_composite(
        &mut self,
        op: PictOp,
        src: &Picture,
        mask: Option<&Picture>,
        dst: &Picture,
    ) -> Result<()> {
        self.begin(OperationKind::Composite);
        composite::prepare(&mut self.chan, self.env, op, src, mask, dst)
    }

    /// Composite one rectangle
    ///
    /// # Panics
    /// Without a prepared composite.
    pub fn execute_composite(&mut self, src: Point, mask: Point, dst: Rect) -> Result<()> {
        let ctx = match self.chan.registry().get() {
            Some(PendingOperation::Composite(state)) => state.context().clone(),
            other => contract_violation("execute_composite", other),
        };
        composite::execute(&mut self.chan, &self.env, &ctx, src, mask, dst)
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Finish the prepared operation
    ///
    /// Calling this while idle is a contract violation: it panics in debug
    /// builds and is ignored otherwise.
    pub fn done(&mut self) {
        match self.chan.registry_mut().clear() {
            Some(op) => log::trace!("{} done", op.kind()),
            None => {
                if cfg!(debug_assertions) {
                    panic!("done without a prepared operation");
                }
                log::warn!("done without a prepared operation");
            }
        }
    }

    /// The operation currently prepared, if any
    pub fn pending(&self) -> Option<OperationKind> {
        self.chan.registry().get().map(PendingOperation::kind)
    }

    /// Submit everything written so far
    pub fn flush(&mut self) -> Result<()> {
        self.chan.flush()
    }

    /// Submit and start the device right away
    pub fn kick(&mut self) -> Result<()> {
        self.chan.kick()
    }

    /// Ring statistics
    pub fn stats(&self) -> &RingStats {
        self.chan.stats()
    }

    /// Underlying channel
    pub fn channel(&self) -> &Channel<D> {
        &self.chan
    }

    /// Underlying channel (mutable)
    pub fn channel_mut(&mut self) -> &mut Channel<D> {
        &mut self.chan
    }

    /// Capability set in use
    pub fn caps(&self) -> &'static Capabilities {
        self.env.binder.caps()
    }

    fn begin(&mut self, next: OperationKind) {
        if let Some(op) = self.chan.registry_mut().clear() {
            if cfg!(debug_assertions) {
                panic!("prepare {} while {} is prepared", next, op.kind());
            }
            log::warn!("prepare {} while {} is prepared; dropping it", next, op.kind());
        }
    }
}

#[cold]
fn contract_violation(call: &str, pending: Option<&PendingOperation>) -> ! {
    match pending {
        Some(op) => panic!("{} while {} is prepared", call, op.kind()),
        None => panic!("{} without a prepared operation", call),
    }
}

static_assertions::assert_impl_all!(ExaConfig: Send, Sync);
static_assertions::assert_impl_all!(PendingOperation: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use nv50_cmd::mock::MockDevice;
    use nv50_core::{Error, GpuAddr, PictFormat};

    fn accel() -> Accel<MockDevice> {
        let device = MockDevice::new()
            .consuming()
            .with_buffer(1, GpuAddr::new(0x10_0000))
            .with_buffer(2, GpuAddr::new(0x4000_0000));
        let config = ExaConfig {
            scratch: BufferHandle::new(1),
            ..ExaConfig::default()
        };
        Accel::new(0x50, config, device).unwrap()
    }

    fn surface(depth: u8) -> Surface {
        Surface::tiled(256, 256, depth, BufferHandle::new(2), 0)
    }

    #[test]
    fn test_unsupported_chipset() {
        let err = Accel::new(0x40, ExaConfig::default(), MockDevice::new()).err();
        assert_eq!(err, Some(Error::InvalidGeneration));
    }

    #[test]
    fn test_lifecycle() {
        let mut accel = accel();
        assert_eq!(accel.pending(), None);
        accel.prepare_solid(&surface(32), RasterOp::COPY, !0, 0).unwrap();
        assert_eq!(accel.pending(), Some(OperationKind::Solid));
        accel.execute_solid(Rect::new(0, 0, 4, 4)).unwrap();
        accel.done();
        assert_eq!(accel.pending(), None);
        assert!(!accel.channel().registry().is_armed());
    }

    #[test]
    fn test_failed_prepare_stays_idle() {
        let mut accel = accel();
        let before = accel.channel().cursor();
        assert_eq!(
            accel.prepare_solid(&surface(12), RasterOp::COPY, !0, 0),
            Err(Error::UnsupportedFormat)
        );
        assert_eq!(accel.channel().cursor(), before);
        assert_eq!(accel.pending(), None);
    }

    #[test]
    fn test_null_scratch_falls_back() {
        let device = MockDevice::new().with_buffer(2, GpuAddr::new(0x4000_0000));
        let mut accel = Accel::new(0x50, ExaConfig::default(), device).unwrap();
        let p = Picture::new(surface(32), PictFormat::A8R8G8B8);
        assert_eq!(
            accel.prepare_composite(PictOp::Over, &p, None, &p),
            Err(Error::RelocationFailed)
        );
        assert_eq!(accel.channel().cursor(), 0);
        assert_eq!(accel.pending(), None);
    }

    #[test]
    #[should_panic(expected = "execute_copy while solid is prepared")]
    fn test_execute_wrong_kind() {
        let mut accel = accel();
        accel.prepare_solid(&surface(32), RasterOp::COPY, !0, 0).unwrap();
        let _ = accel.execute_copy(Rect::new(0, 0, 1, 1), Point::ZERO);
    }

    #[test]
    #[should_panic(expected = "without a prepared operation")]
    fn test_execute_while_idle() {
        let mut accel = accel();
        let _ = accel.execute_solid(Rect::new(0, 0, 1, 1));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "done without a prepared operation")]
    fn test_done_while_idle() {
        accel().done();
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "prepare copy while solid is prepared")]
    fn test_prepare_while_prepared() {
        let mut accel = accel();
        accel.prepare_solid(&surface(32), RasterOp::COPY, !0, 0).unwrap();
        let _ = accel.prepare_copy(&surface(32), &surface(32), RasterOp::COPY, !0);
    }

    #[test]
    fn test_upload_short_source_rejected() {
        let mut accel = accel();
        // Two rows of 4 pixels at a 64-byte pitch need 64 + 16 bytes.
        let src = [0u8; 79];
        assert_eq!(
            accel.upload(&src, 64, &surface(32), Rect::new(0, 0, 4, 2), 4),
            Err(Error::SourceTooShort)
        );
        assert_eq!(accel.channel().cursor(), 0);
        assert_eq!(accel.pending(), None);

        let src = [0u8; 80];
        accel.upload(&src, 64, &surface(32), Rect::new(0, 0, 4, 2), 4).unwrap();
        assert_eq!(accel.pending(), None);
    }

    #[test]
    fn test_sifc_limit_clamped() {
        let config = ExaConfig {
            sifc_max_words: 4096,
            ..ExaConfig::default()
        };
        let accel = Accel::new(0x50, config, MockDevice::new()).unwrap();
        assert_eq!(accel.env.sifc_max_words, MAX_COUNT as usize);
    }
}
