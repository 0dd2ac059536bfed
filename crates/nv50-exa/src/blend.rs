//! # Blend Planner
//!
//! Maps a Porter-Duff operator onto the 3D engine's fixed-function blend
//! unit. The destination is always combined additively:
//!
//! ```text
//! result = src * src_factor + dst * dst_factor
//! ```

use nv50_cmd::{PushDevice, Resubmit, RingChannel};
use nv50_core::{Error, Result};

use crate::hw::{tesla, SUBC_3D};

// =============================================================================
// OPERATORS AND FACTORS
// =============================================================================

/// Render compositing operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PictOp {
    /// 0
    Clear = 0,
    /// S
    Src = 1,
    /// D
    Dst = 2,
    /// S + D(1 - As)
    Over = 3,
    /// S(1 - Ad) + D
    OverReverse = 4,
    /// S * Ad
    In = 5,
    /// D * As
    InReverse = 6,
    /// S(1 - Ad)
    Out = 7,
    /// D(1 - As)
    OutReverse = 8,
    /// S * Ad + D(1 - As)
    Atop = 9,
    /// S(1 - Ad) + D * As
    AtopReverse = 10,
    /// S(1 - Ad) + D(1 - As)
    Xor = 11,
    /// S + D
    Add = 12,
    /// Saturating add; needs a blend mode this engine lacks
    Saturate = 13,
}

impl PictOp {
    /// Every operator, in tag order
    pub const ALL: [PictOp; 14] = [
        Self::Clear,
        Self::Src,
        Self::Dst,
        Self::Over,
        Self::OverReverse,
        Self::In,
        Self::InReverse,
        Self::Out,
        Self::OutReverse,
        Self::Atop,
        Self::AtopReverse,
        Self::Xor,
        Self::Add,
        Self::Saturate,
    ];
}

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BlendFactor {
    /// 0
    Zero = 0x4000,
    /// 1
    One = 0x4001,
    /// Source colour
    SrcColor = 0x4300,
    /// 1 - source colour
    OneMinusSrcColor = 0x4301,
    /// Source alpha
    SrcAlpha = 0x4302,
    /// 1 - source alpha
    OneMinusSrcAlpha = 0x4303,
    /// Destination alpha
    DstAlpha = 0x4304,
    /// 1 - destination alpha
    OneMinusDstAlpha = 0x4305,
}

impl BlendFactor {
    /// Hardware encoding
    #[inline]
    pub const fn hw(self) -> u32 {
        self as u32
    }
}

/// Blend table entry for one operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendEntry {
    /// Source factor or destination factor refers to source alpha
    pub src_alpha: bool,
    /// Source factor refers to destination alpha
    pub dst_alpha: bool,
    /// Source factor
    pub src: BlendFactor,
    /// Destination factor
    pub dst: BlendFactor,
}

const fn entry(src_alpha: bool, dst_alpha: bool, src: BlendFactor, dst: BlendFactor) -> BlendEntry {
    BlendEntry {
        src_alpha,
        dst_alpha,
        src,
        dst,
    }
}

use BlendFactor::{
    DstAlpha, One, OneMinusDstAlpha, OneMinusSrcAlpha, OneMinusSrcColor, SrcAlpha, SrcColor, Zero,
};

/// Operators `Clear` through `Add`, indexed by tag
pub const BLEND_TABLE: [BlendEntry; 13] = [
    entry(false, false, Zero, Zero),                         // Clear
    entry(false, false, One, Zero),                          // Src
    entry(false, false, Zero, One),                          // Dst
    entry(true, false, One, OneMinusSrcAlpha),               // Over
    entry(false, true, OneMinusDstAlpha, One),               // OverReverse
    entry(false, true, DstAlpha, Zero),                      // In
    entry(true, false, Zero, SrcAlpha),                      // InReverse
    entry(false, true, OneMinusDstAlpha, Zero),              // Out
    entry(true, false, Zero, OneMinusSrcAlpha),              // OutReverse
    entry(true, true, DstAlpha, OneMinusSrcAlpha),           // Atop
    entry(true, true, OneMinusDstAlpha, SrcAlpha),           // AtopReverse
    entry(true, true, OneMinusDstAlpha, OneMinusSrcAlpha),   // Xor
    entry(false, false, One, One),                           // Add
];

/// Blend table entry for `op`
pub fn lookup(op: PictOp) -> Result<&'static BlendEntry> {
    BLEND_TABLE.get(op as usize).ok_or(Error::UnsupportedBlend)
}

// =============================================================================
// PLANNING
// =============================================================================

/// Blend unit configuration for one composite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendDecision {
    /// Plain overwrite, blend unit off
    Disabled,
    /// Additive blend with the given factors for colour and alpha
    Enabled {
        /// Source factor
        src: BlendFactor,
        /// Destination factor
        dst: BlendFactor,
    },
}

/// Plan the blend for `op`
///
/// A destination without alpha reads as opaque, and a component-alpha mask
/// turns source-alpha destination factors into per-channel source colour.
pub fn plan(op: PictOp, component_alpha: bool, dst_has_alpha: bool) -> Result<BlendDecision> {
    let entry = lookup(op)?;
    let mut src = entry.src;
    let mut dst = entry.dst;

    if entry.dst_alpha && !dst_has_alpha {
        src = match src {
            DstAlpha => One,
            OneMinusDstAlpha => Zero,
            other => other,
        };
    }

    if entry.src_alpha && component_alpha {
        dst = match dst {
            SrcAlpha => SrcColor,
            OneMinusSrcAlpha => OneMinusSrcColor,
            other => other,
        };
    }

    if src == One && dst == Zero {
        Ok(BlendDecision::Disabled)
    } else {
        Ok(BlendDecision::Enabled { src, dst })
    }
}

/// Emit a blend decision; up to 10 words
pub fn emit<D, P>(chan: &mut RingChannel<D, P>, decision: BlendDecision)
where
    D: PushDevice,
    P: Resubmit<D>,
{
    match decision {
        BlendDecision::Disabled => {
            chan.method(SUBC_3D, tesla::BLEND_ENABLE0, 1);
            chan.emit(0);
        }
        BlendDecision::Enabled { src, dst } => {
            chan.method(SUBC_3D, tesla::BLEND_ENABLE0, 1);
            chan.emit(1);
            chan.method(SUBC_3D, tesla::BLEND_EQUATION_RGB, 5);
            chan.emit(tesla::BLEND_FUNC_ADD);
            chan.emit(src.hw());
            chan.emit(dst.hw());
            chan.emit(tesla::BLEND_FUNC_ADD);
            chan.emit(src.hw());
            chan.method(SUBC_3D, tesla::BLEND_FUNC_DST_ALPHA, 1);
            chan.emit(dst.hw());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nv50_cmd::mock::MockDevice;
    use nv50_cmd::RingConfig;

    #[test]
    fn test_reference_table() {
        let reference: [(PictOp, bool, bool, BlendFactor, BlendFactor); 13] = [
            (PictOp::Clear, false, false, Zero, Zero),
            (PictOp::Src, false, false, One, Zero),
            (PictOp::Dst, false, false, Zero, One),
            (PictOp::Over, true, false, One, OneMinusSrcAlpha),
            (PictOp::OverReverse, false, true, OneMinusDstAlpha, One),
            (PictOp::In, false, true, DstAlpha, Zero),
            (PictOp::InReverse, true, false, Zero, SrcAlpha),
            (PictOp::Out, false, true, OneMinusDstAlpha, Zero),
            (PictOp::OutReverse, true, false, Zero, OneMinusSrcAlpha),
            (PictOp::Atop, true, true, DstAlpha, OneMinusSrcAlpha),
            (PictOp::AtopReverse, true, true, OneMinusDstAlpha, SrcAlpha),
            (PictOp::Xor, true, true, OneMinusDstAlpha, OneMinusSrcAlpha),
            (PictOp::Add, false, false, One, One),
        ];
        for (op, sa, da, src, dst) in reference {
            assert_eq!(*lookup(op).unwrap(), entry(sa, da, src, dst), "{:?}", op);
        }
        assert_eq!(lookup(PictOp::Saturate), Err(Error::UnsupportedBlend));
    }

    #[test]
    fn test_plan_every_operator_with_alpha_destination() {
        let expected = [
            BlendDecision::Enabled { src: Zero, dst: Zero },
            BlendDecision::Disabled,
            BlendDecision::Enabled { src: Zero, dst: One },
            BlendDecision::Enabled { src: One, dst: OneMinusSrcAlpha },
            BlendDecision::Enabled { src: OneMinusDstAlpha, dst: One },
            BlendDecision::Enabled { src: DstAlpha, dst: Zero },
            BlendDecision::Enabled { src: Zero, dst: SrcAlpha },
            BlendDecision::Enabled { src: OneMinusDstAlpha, dst: Zero },
            BlendDecision::Enabled { src: Zero, dst: OneMinusSrcAlpha },
            BlendDecision::Enabled { src: DstAlpha, dst: OneMinusSrcAlpha },
            BlendDecision::Enabled { src: OneMinusDstAlpha, dst: SrcAlpha },
            BlendDecision::Enabled { src: OneMinusDstAlpha, dst: OneMinusSrcAlpha },
            BlendDecision::Enabled { src: One, dst: One },
        ];
        for (op, want) in PictOp::ALL.iter().zip(expected.iter()) {
            assert_eq!(plan(*op, false, true), Ok(*want), "{:?}", op);
        }
        assert_eq!(plan(PictOp::Saturate, false, true), Err(Error::UnsupportedBlend));
    }

    #[test]
    fn test_over_and_src() {
        assert_eq!(
            plan(PictOp::Over, false, true),
            Ok(BlendDecision::Enabled {
                src: One,
                dst: OneMinusSrcAlpha
            })
        );
        assert_eq!(plan(PictOp::Src, false, true), Ok(BlendDecision::Disabled));
    }

    #[test]
    fn test_opaque_destination_collapses_dst_alpha() {
        // In: DstAlpha reads as One, leaving a plain overwrite.
        assert_eq!(plan(PictOp::In, false, false), Ok(BlendDecision::Disabled));
        assert_eq!(
            plan(PictOp::Out, false, false),
            Ok(BlendDecision::Enabled { src: Zero, dst: Zero })
        );
        assert_eq!(
            plan(PictOp::Atop, false, false),
            Ok(BlendDecision::Enabled {
                src: One,
                dst: OneMinusSrcAlpha
            })
        );
    }

    #[test]
    fn test_component_alpha_uses_source_colour() {
        assert_eq!(
            plan(PictOp::Over, true, true),
            Ok(BlendDecision::Enabled {
                src: One,
                dst: OneMinusSrcColor
            })
        );
        assert_eq!(
            plan(PictOp::InReverse, true, true),
            Ok(BlendDecision::Enabled {
                src: Zero,
                dst: SrcColor
            })
        );
        // No source alpha in the entry, nothing to rewrite.
        assert_eq!(
            plan(PictOp::Add, true, true),
            Ok(BlendDecision::Enabled { src: One, dst: One })
        );
    }

    #[test]
    fn test_emit_words() {
        let mut chan: RingChannel<MockDevice> =
            RingChannel::new(RingConfig::default(), MockDevice::new());
        let _ = chan.reserve(10, 0).unwrap();
        emit(
            &mut chan,
            BlendDecision::Enabled {
                src: One,
                dst: OneMinusSrcAlpha,
            },
        );
        let b = chan.batch();
        assert_eq!(b.len(), 10);
        assert_eq!(b[1], 1);
        assert_eq!(&b[3..8], &[0x8006, 0x4001, 0x4303, 0x8006, 0x4001]);
        assert_eq!(b[9], 0x4303);

        let _ = chan.reserve(2, 0).unwrap();
        emit(&mut chan, BlendDecision::Disabled);
        assert_eq!(chan.batch()[11], 0);
    }
}
