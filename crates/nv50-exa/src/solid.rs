//! Solid rectangle fills on the 2D engine.

use nv50_cmd::PushDevice;
use nv50_core::{Rect, Result, Surface};

use crate::binder::{Role2d, BIND_2D_RELOCS, BIND_2D_WORDS};
use crate::hw::{twod, SUBC_2D};
use crate::pending::{transaction, Channel, Env, OperationKind, PendingOperation};
use crate::rop::{self, RasterOp, ROP_WORDS};

/// Words one rectangle fill writes
pub const SOLID_DRAW_WORDS: usize = 5;

/// Everything needed to replay a fill setup
#[derive(Debug, Clone, Copy)]
pub struct SolidState {
    env: Env,
    dst: Surface,
    rop: RasterOp,
    planemask: u32,
    color: u32,
    format: u32,
}

impl SolidState {
    /// Reservation for the setup
    pub const SETUP_WORDS: usize = 64;
    /// Relocations the setup emits
    pub const SETUP_RELOCS: usize = BIND_2D_RELOCS;

    /// Validate a fill onto `dst`
    pub fn new(env: Env, dst: Surface, rop: RasterOp, planemask: u32, color: u32) -> Result<Self> {
        let format = env.binder.caps().surface_2d_format(dst.depth)?;
        Ok(Self {
            env,
            dst,
            rop,
            planemask,
            color,
            format,
        })
    }

    /// Destination surface
    pub fn dst(&self) -> &Surface {
        &self.dst
    }

    /// Bind the destination, set the raster op and select filled rectangles
    pub(crate) fn setup<D: PushDevice>(&self, chan: &mut Channel<D>, force_rop: bool) -> Result<()> {
        self.env
            .binder
            .bind_2d(chan, &self.dst, Role2d::Destination { clip: None })?;
        rop::emit_rop(
            chan,
            self.env.binder.caps(),
            &self.dst,
            self.rop,
            self.planemask,
            force_rop,
        );

        chan.method(SUBC_2D, twod::DRAW_SHAPE, 3);
        chan.emit(twod::DRAW_SHAPE_RECTANGLES);
        chan.emit(self.format);
        chan.emit(self.color);
        Ok(())
    }
}

static_assertions::const_assert!(BIND_2D_WORDS + ROP_WORDS + 4 <= SolidState::SETUP_WORDS);

pub(crate) fn prepare<D: PushDevice>(
    chan: &mut Channel<D>,
    env: Env,
    dst: &Surface,
    rop: RasterOp,
    planemask: u32,
    color: u32,
) -> Result<()> {
    let state = SolidState::new(env, *dst, rop, planemask, color)
        .map_err(|e| crate::pending::fallback(OperationKind::Solid, e))?;

    transaction(
        chan,
        SolidState::SETUP_WORDS,
        SolidState::SETUP_RELOCS,
        OperationKind::Solid,
        |chan| state.setup(chan, false),
    )?;

    chan.registry_mut().arm(PendingOperation::Solid(state));
    Ok(())
}

pub(crate) fn execute<D: PushDevice>(chan: &mut Channel<D>, state: &SolidState, rect: Rect) -> Result<()> {
    let _ = chan.reserve(SOLID_DRAW_WORDS, 0)?;
    chan.method(SUBC_2D, twod::DRAW_POINT32_X0, 4);
    chan.emit(rect.x as u32);
    chan.emit(rect.y as u32);
    chan.emit(rect.right() as u32);
    chan.emit(rect.bottom() as u32);

    if rect.area() >= state.env.kick_threshold {
        chan.kick()?;
    }
    Ok(())
}
