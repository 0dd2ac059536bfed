//! Screen-to-screen blits on the 2D engine.

use nv50_cmd::PushDevice;
use nv50_core::{Point, Rect, Result, Surface};

use crate::binder::{Role2d, BIND_2D_RELOCS, BIND_2D_WORDS};
use crate::hw::{twod, SUBC_2D};
use crate::pending::{fallback, transaction, Channel, Env, OperationKind, PendingOperation};
use crate::rop::{self, RasterOp, ROP_WORDS};

/// Words one blit writes
pub const COPY_DRAW_WORDS: usize = 17;

/// Everything needed to replay a blit setup
#[derive(Debug, Clone, Copy)]
pub struct CopyState {
    env: Env,
    src: Surface,
    dst: Surface,
    rop: RasterOp,
    planemask: u32,
}

impl CopyState {
    /// Reservation for the setup
    pub const SETUP_WORDS: usize = 64;
    /// Relocations the setup emits
    pub const SETUP_RELOCS: usize = 2 * BIND_2D_RELOCS;

    /// Validate a blit from `src` to `dst`
    pub fn new(env: Env, src: Surface, dst: Surface, rop: RasterOp, planemask: u32) -> Result<Self> {
        let caps = env.binder.caps();
        caps.surface_2d_format(src.depth)?;
        caps.surface_2d_format(dst.depth)?;
        Ok(Self {
            env,
            src,
            dst,
            rop,
            planemask,
        })
    }

    /// Bind both surfaces and set the raster op
    pub(crate) fn setup<D: PushDevice>(&self, chan: &mut Channel<D>, force_rop: bool) -> Result<()> {
        let binder = &self.env.binder;
        binder.bind_2d(chan, &self.src, Role2d::Source)?;
        binder.bind_2d(chan, &self.dst, Role2d::Destination { clip: None })?;
        rop::emit_rop(chan, binder.caps(), &self.dst, self.rop, self.planemask, force_rop);
        Ok(())
    }
}

static_assertions::const_assert!(2 * BIND_2D_WORDS + ROP_WORDS <= CopyState::SETUP_WORDS);

pub(crate) fn prepare<D: PushDevice>(
    chan: &mut Channel<D>,
    env: Env,
    src: &Surface,
    dst: &Surface,
    rop: RasterOp,
    planemask: u32,
) -> Result<()> {
    let state =
        CopyState::new(env, *src, *dst, rop, planemask).map_err(|e| fallback(OperationKind::Copy, e))?;

    transaction(
        chan,
        CopyState::SETUP_WORDS,
        CopyState::SETUP_RELOCS,
        OperationKind::Copy,
        |chan| state.setup(chan, false),
    )?;

    chan.registry_mut().arm(PendingOperation::Copy(state));
    Ok(())
}

/// Blit `src` to the same-sized rectangle at `dst`
pub(crate) fn execute<D: PushDevice>(
    chan: &mut Channel<D>,
    state: &CopyState,
    src: Rect,
    dst: Point,
) -> Result<()> {
    let _ = chan.reserve(COPY_DRAW_WORDS, 0)?;
    chan.method(SUBC_2D, twod::SERIALIZE, 1);
    chan.emit(0);
    chan.method(SUBC_2D, twod::BLIT_CONTROL, 1);
    chan.emit(0);

    // Source coordinates and the 1:1 scale are 32.32 fixed point.
    chan.method(SUBC_2D, twod::BLIT_DST_X, 12);
    chan.emit(dst.x as u32);
    chan.emit(dst.y as u32);
    chan.emit(src.width as u32);
    chan.emit(src.height as u32);
    chan.emit_block(&[0, 1, 0, 1]);
    chan.emit(0);
    chan.emit(src.x as u32);
    chan.emit(0);
    chan.emit(src.y as u32);

    if src.area() >= state.env.kick_threshold {
        chan.kick()?;
    }
    Ok(())
}
