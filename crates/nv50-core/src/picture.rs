//! # Composite Pictures
//!
//! A picture wraps a drawable with the sampling state a composite request
//! needs: format, projective transform, filter, repeat mode and the
//! component-alpha flag.

use crate::format::PictFormat;
use crate::surface::Surface;

// =============================================================================
// TRANSFORM
// =============================================================================

/// Projective 3x3 transform mapping destination space into picture space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Row-major matrix
    pub matrix: [[f32; 3]; 3],
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        matrix: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Translation by `(tx, ty)`
    pub const fn translate(tx: f32, ty: f32) -> Self {
        Self {
            matrix: [[1.0, 0.0, tx], [0.0, 1.0, ty], [0.0, 0.0, 1.0]],
        }
    }

    /// Scale by `(sx, sy)`
    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self {
            matrix: [[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Build from 16.16 fixed-point entries
    pub fn from_fixed(fixed: [[i32; 3]; 3]) -> Self {
        let mut matrix = [[0.0; 3]; 3];
        for (row, src) in matrix.iter_mut().zip(fixed.iter()) {
            for (dst, &v) in row.iter_mut().zip(src.iter()) {
                *dst = v as f32 / 65536.0;
            }
        }
        Self { matrix }
    }

    /// Map an integer point, dividing by the homogeneous coordinate.
    ///
    /// A point that maps to infinity is returned unchanged.
    pub fn map(&self, x: i32, y: i32) -> (f32, f32) {
        let (fx, fy) = (x as f32, y as f32);
        let m = &self.matrix;
        let tx = m[0][0] * fx + m[0][1] * fy + m[0][2];
        let ty = m[1][0] * fx + m[1][1] * fy + m[1][2];
        let w = m[2][0] * fx + m[2][1] * fy + m[2][2];

        if w == 0.0 {
            (fx, fy)
        } else {
            (tx / w, ty / w)
        }
    }
}

// =============================================================================
// SAMPLING STATE
// =============================================================================

/// Picture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    /// Nearest texel
    #[default]
    Nearest,
    /// Bilinear interpolation
    Bilinear,
    /// Implementation-chosen fast filter
    Fast,
    /// Implementation-chosen good filter
    Good,
    /// Implementation-chosen best filter
    Best,
    /// Arbitrary convolution kernel
    Convolution,
}

/// Behaviour outside the picture bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Repeat {
    /// Transparent outside the bounds
    #[default]
    None,
    /// Tile the picture
    Normal,
    /// Extend edge pixels
    Pad,
    /// Mirror at every edge
    Reflect,
}

// =============================================================================
// PICTURE
// =============================================================================

/// Source, mask or destination of a composite request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Picture {
    /// Backing drawable; `None` for solid fills and gradients
    pub drawable: Option<Surface>,
    /// Picture format
    pub format: PictFormat,
    /// Optional transform into picture space
    pub transform: Option<Transform>,
    /// Sampling filter
    pub filter: Filter,
    /// Repeat mode
    pub repeat: Repeat,
    /// Per-channel alpha (masks only)
    pub component_alpha: bool,
}

impl Picture {
    /// Picture over a drawable with default sampling state
    pub const fn new(drawable: Surface, format: PictFormat) -> Self {
        Self {
            drawable: Some(drawable),
            format,
            transform: None,
            filter: Filter::Nearest,
            repeat: Repeat::None,
            component_alpha: false,
        }
    }

    /// Picture with no drawable, such as a solid fill or gradient
    pub const fn source_only(format: PictFormat) -> Self {
        Self {
            drawable: None,
            format,
            transform: None,
            filter: Filter::Nearest,
            repeat: Repeat::None,
            component_alpha: false,
        }
    }

    /// Set the transform
    pub const fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Set the filter
    pub const fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the repeat mode
    pub const fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// Set the component-alpha flag
    pub const fn with_component_alpha(mut self, component_alpha: bool) -> Self {
        self.component_alpha = component_alpha;
        self
    }

    /// Whether the picture repeats outside its bounds
    #[inline]
    pub const fn repeats(&self) -> bool {
        !matches!(self.repeat, Repeat::None)
    }

    /// Component alpha that actually affects sampling: the flag is
    /// meaningless on alpha-only formats
    #[inline]
    pub const fn effective_component_alpha(&self) -> bool {
        self.component_alpha && self.format.has_rgb()
    }
}
