//! # Composite
//!
//! Porter-Duff compositing on the Tesla 3D engine: the destination is bound
//! as render target, source and optional mask as texture units, and each
//! rectangle is drawn as a scissored two-triangle fan.
//!
//! Validation is a pure check run before anything is written. Setup is what
//! gets replayed after a flush; the check never is.

use nv50_cmd::{PushDevice, RelocFlags};
use nv50_core::{Error, PictFormat, Picture, Point, Rect, Result};

use crate::binder::{Binder, RENDER_TARGET_RELOCS, RENDER_TARGET_WORDS, TEXTURE_RELOCS, TEXTURE_WORDS};
use crate::blend::{self, BlendEntry, BlendFactor, PictOp};
use crate::context::{CompositeContext, TextureUnit, MAX_UNITS};
use crate::hw::{self, tesla, twod, FragmentProgram, SUBC_2D, SUBC_3D};
use crate::pending::{fallback, transaction, Channel, Env, OperationKind, PendingOperation};

/// Words one composite rectangle may write
pub const COMPOSITE_DRAW_WORDS: usize = 35;

// =============================================================================
// CHECK
// =============================================================================

/// Whether the hardware path can composite `src` (through `mask`) onto `dst`
pub fn check(binder: &Binder, op: PictOp, src: &Picture, mask: Option<&Picture>, dst: &Picture) -> Result<()> {
    let entry = blend::lookup(op)?;
    binder.check_render_target(dst)?;
    check_texture(binder, entry, src, dst)?;

    if let Some(mask) = mask {
        if mask.effective_component_alpha() && entry.src_alpha && entry.src != BlendFactor::Zero {
            return Err(Error::UnsupportedComponentAlpha);
        }
        check_texture(binder, entry, mask, dst)?;
    }
    Ok(())
}

fn check_texture(binder: &Binder, entry: &BlendEntry, picture: &Picture, dst: &Picture) -> Result<()> {
    binder.check_texture(picture)?;

    // Outside an untransformed source the caller clips; a transformed one
    // samples the border, which reads as opaque on formats without alpha.
    if entry.src_alpha
        && !picture.repeats()
        && picture.transform.is_some()
        && !picture.format.has_alpha()
        && dst.format.has_alpha()
    {
        return Err(Error::UnsupportedRepeat);
    }
    Ok(())
}

/// Fragment program for a source/mask/destination combination
pub fn fragment_program(entry: &BlendEntry, mask: Option<&Picture>, dst: &Picture) -> FragmentProgram {
    let a8 = dst.format == PictFormat::A8;
    match mask {
        None if a8 => FragmentProgram::SourceA8,
        None => FragmentProgram::Source,
        Some(_) if a8 => FragmentProgram::SourceMaskA8,
        Some(m) if m.effective_component_alpha() => {
            if entry.src_alpha {
                FragmentProgram::ComponentAlphaSrcAlpha
            } else {
                FragmentProgram::ComponentAlpha
            }
        }
        Some(_) => FragmentProgram::SourceMask,
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Everything needed to replay a composite setup
#[derive(Debug, Clone)]
pub struct CompositeState {
    env: Env,
    /// Operator
    pub op: PictOp,
    src: Picture,
    mask: Option<Picture>,
    dst: Picture,
    ctx: CompositeContext,
}

impl CompositeState {
    /// Reservation for the setup
    pub const SETUP_WORDS: usize = 128;
    /// Relocations the setup may emit: render target, both programs and
    /// two texture units
    pub const SETUP_RELOCS: usize = RENDER_TARGET_RELOCS + 4 + MAX_UNITS * TEXTURE_RELOCS;

    /// Bound texture units
    pub fn context(&self) -> &CompositeContext {
        &self.ctx
    }

    /// Bind render target, blend, programs and textures
    pub(crate) fn setup<D: PushDevice>(&self, chan: &mut Channel<D>, ctx: &mut CompositeContext) -> Result<()> {
        let binder = &self.env.binder;
        let entry = blend::lookup(self.op)?;
        let shader = RelocFlags::VRAM | RelocFlags::READ;

        chan.method(SUBC_2D, twod::SERIALIZE, 1);
        chan.emit(0);

        binder.bind_render_target(chan, &self.dst)?;

        let component_alpha = self.mask.is_some_and(|m| m.effective_component_alpha());
        let decision = blend::plan(self.op, component_alpha, self.dst.format.has_alpha())?;
        blend::emit(chan, decision);

        chan.method(SUBC_3D, tesla::VP_ADDRESS_HIGH, 2);
        chan.emit_address(binder.scratch(), hw::PVP_OFFSET, shader)?;
        chan.method(SUBC_3D, tesla::FP_ADDRESS_HIGH, 2);
        chan.emit_address(binder.scratch(), hw::PFP_OFFSET, shader)?;

        ctx.record(binder.bind_texture(chan, &self.src, 0)?);
        if let Some(mask) = &self.mask {
            ctx.record(binder.bind_texture(chan, mask, 1)?);
        }

        chan.method(SUBC_3D, tesla::FP_START_ID, 1);
        chan.emit(fragment_program(entry, self.mask.as_ref(), &self.dst) as u32);
        chan.method(SUBC_3D, tesla::UNK1334, 1);
        chan.emit(0);
        chan.method(SUBC_3D, tesla::BIND_TIC2, 1);
        chan.emit(1);
        chan.method(SUBC_3D, tesla::BIND_TIC2, 1);
        chan.emit(0x203);
        Ok(())
    }
}

static_assertions::const_assert!(
    2 + RENDER_TARGET_WORDS + 10 + 6 + MAX_UNITS * TEXTURE_WORDS + 8 <= CompositeState::SETUP_WORDS
);

// =============================================================================
// PREPARE / EXECUTE
// =============================================================================

pub(crate) fn prepare<D: PushDevice>(
    chan: &mut Channel<D>,
    env: Env,
    op: PictOp,
    src: &Picture,
    mask: Option<&Picture>,
    dst: &Picture,
) -> Result<()> {
    check(&env.binder, op, src, mask, dst).map_err(|e| fallback(OperationKind::Composite, e))?;

    let mut state = CompositeState {
        env,
        op,
        src: *src,
        mask: mask.copied(),
        dst: *dst,
        ctx: CompositeContext::new(),
    };

    let mut ctx = CompositeContext::new();
    transaction(
        chan,
        CompositeState::SETUP_WORDS,
        CompositeState::SETUP_RELOCS,
        OperationKind::Composite,
        |chan| state.setup(chan, &mut ctx),
    )?;

    state.ctx = ctx;
    chan.registry_mut().arm(PendingOperation::Composite(state));
    Ok(())
}

/// Draw `dst`, sampling from `src` and `mask` origins in picture space
pub(crate) fn execute<D: PushDevice>(
    chan: &mut Channel<D>,
    env: &Env,
    ctx: &CompositeContext,
    src: Point,
    mask: Point,
    dst: Rect,
) -> Result<()> {
    let origins = [src, mask];
    let mut coords = [[(0.0f32, 0.0f32); 4]; MAX_UNITS];
    for ((unit, origin), out) in ctx.units.iter().zip(origins.iter()).zip(coords.iter_mut()) {
        *out = quad(unit, *origin, dst.width, dst.height);
    }
    let units = if ctx.has_mask() { MAX_UNITS } else { 1 };

    let (x0, y0) = (dst.x, dst.y);
    let (x1, y1) = (dst.right(), dst.bottom());
    let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)];

    let _ = chan.reserve(COMPOSITE_DRAW_WORDS, 0)?;
    chan.method(SUBC_3D, tesla::SCISSOR_HORIZ0, 2);
    chan.emit(((x1 as u32) << 16) | (x0 as u32 & 0xffff));
    chan.emit(((y1 as u32) << 16) | (y0 as u32 & 0xffff));
    chan.method(SUBC_3D, tesla::VERTEX_BEGIN, 1);
    chan.emit(tesla::PRIM_TRIANGLE_FAN);

    for (i, &(x, y)) in corners.iter().enumerate() {
        chan.method(SUBC_3D, tesla::VTX_ATTR_2F_X8, 2 * units as u32);
        for unit in coords.iter().take(units) {
            let (s, t) = unit[i];
            chan.emit_f32(s);
            chan.emit_f32(t);
        }
        chan.method(SUBC_3D, tesla::VTX_ATTR_2I0, 1);
        chan.emit(((y as u32 & 0xffff) << 16) | (x as u32 & 0xffff));
    }

    chan.method(SUBC_3D, tesla::VERTEX_END, 1);
    chan.emit(0);

    if dst.area() >= env.kick_threshold {
        chan.kick()?;
    }
    Ok(())
}

/// Texture coordinates of a `w` x `h` rectangle at `origin`, in fan order
///
/// Three corners go through the unit's transform; the fourth completes the
/// parallelogram.
fn quad(unit: &TextureUnit, origin: Point, w: i32, h: i32) -> [(f32, f32); 4] {
    let p0 = unit.map(origin.x, origin.y);
    let p1 = unit.map(origin.x + w, origin.y);
    let p3 = unit.map(origin.x, origin.y + h);
    let p2 = (p1.0 + p3.0 - p0.0, p1.1 + p3.1 - p0.1);
    [p0, p1, p2, p3]
}
