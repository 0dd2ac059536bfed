//! # Composite Context
//!
//! What `execute_composite` needs to know about the bound texture units.
//! Built while the units are bound and owned by the pending operation until
//! `done`.

use arrayvec::ArrayVec;
use nv50_core::Transform;

/// Source (0) and optional mask (1)
pub const MAX_UNITS: usize = 2;

/// A bound texture unit as seen by the vertex path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureUnit {
    /// Picture transform, `None` for identity
    pub transform: Option<Transform>,
    /// Logical width in texels
    pub width: f32,
    /// Logical height in texels
    pub height: f32,
}

impl TextureUnit {
    /// Map a picture-space point to normalized texture coordinates
    pub fn map(&self, x: i32, y: i32) -> (f32, f32) {
        let (tx, ty) = match &self.transform {
            Some(t) => t.map(x, y),
            None => (x as f32, y as f32),
        };
        (tx / self.width, ty / self.height)
    }
}

/// Per-composite state shared by every `execute_composite`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompositeContext {
    /// Bound units, source first
    pub units: ArrayVec<TextureUnit, MAX_UNITS>,
}

impl CompositeContext {
    /// Context with no units bound yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next bound unit
    pub fn record(&mut self, unit: TextureUnit) {
        self.units.push(unit);
    }

    /// Whether a mask unit is bound
    pub fn has_mask(&self) -> bool {
        self.units.len() == MAX_UNITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_normalizes() {
        let unit = TextureUnit {
            transform: None,
            width: 200.0,
            height: 50.0,
        };
        assert_eq!(unit.map(100, 25), (0.5, 0.5));
    }

    #[test]
    fn test_transform_then_normalize() {
        let unit = TextureUnit {
            transform: Some(Transform::scale(2.0, 2.0)),
            width: 100.0,
            height: 100.0,
        };
        assert_eq!(unit.map(25, 50), (0.5, 1.0));
    }

    #[test]
    fn test_mask_presence() {
        let unit = TextureUnit {
            transform: None,
            width: 1.0,
            height: 1.0,
        };
        let mut ctx = CompositeContext::new();
        ctx.record(unit);
        assert!(!ctx.has_mask());
        ctx.record(unit);
        assert!(ctx.has_mask());
    }
}
