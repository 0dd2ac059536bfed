//! # Error Handling
//!
//! Every accelerated request either succeeds or reports exactly why the
//! hardware path cannot take it. Validation errors are recoverable: the
//! caller falls back to software rendering. Only device-level failures
//! discovered at flush time are fatal.

use core::fmt;

// =============================================================================
// RESULT TYPE
// =============================================================================

/// Result type alias
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// Unified error type for the command ring and acceleration engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    /// Pixel depth or picture format has no hardware encoding
    UnsupportedFormat,
    /// Surface exceeds the 3D engine's addressable dimensions
    DimensionExceeded,
    /// Picture filter other than nearest or bilinear
    UnsupportedFilter,
    /// Compositing operator outside the blend table
    UnsupportedBlend,
    /// Component-alpha mask combined with an operator the hardware can't express
    UnsupportedComponentAlpha,
    /// Picture has no drawable (solid fill or gradient)
    UnsupportedSource,
    /// Transformed non-repeating source would sample the wrong border alpha
    UnsupportedRepeat,
    /// Linear surface used where the 3D engine requires a tiled one
    UnsupportedLayout,
    /// Host image ends before the last row of the transfer
    SourceTooShort,

    // =========================================================================
    // Ring Errors
    // =========================================================================
    /// Request can never fit in the ring
    RingExhausted,
    /// Buffer has no resolvable device address, or an operation needs more
    /// relocations than a batch holds
    RelocationFailed,
    /// Device stopped draining the ring
    DeviceHang,

    // =========================================================================
    // Initialization Errors
    // =========================================================================
    /// Chipset outside the supported generation
    InvalidGeneration,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Validation
            Self::UnsupportedFormat => write!(f, "unsupported surface format"),
            Self::DimensionExceeded => write!(f, "surface dimensions exceeded"),
            Self::UnsupportedFilter => write!(f, "unsupported picture filter"),
            Self::UnsupportedBlend => write!(f, "unsupported blend operator"),
            Self::UnsupportedComponentAlpha => write!(f, "component-alpha not supported"),
            Self::UnsupportedSource => write!(f, "solid and gradient pictures unsupported"),
            Self::UnsupportedRepeat => write!(f, "REPEAT_NONE unsupported for XRGB source"),
            Self::UnsupportedLayout => write!(f, "surface is not tiled"),
            Self::SourceTooShort => write!(f, "host image shorter than transfer"),

            // Ring
            Self::RingExhausted => write!(f, "ring space exhausted"),
            Self::RelocationFailed => write!(f, "relocation failed"),
            Self::DeviceHang => write!(f, "device stopped consuming the ring"),

            // Initialization
            Self::InvalidGeneration => write!(f, "unsupported chipset generation"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
