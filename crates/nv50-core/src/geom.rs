//! Integer geometry for draw requests.

/// A point in surface pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
}

impl Point {
    /// Origin
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a new point
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Covered pixel count, zero for empty or inverted rectangles
    #[inline]
    pub const fn area(&self) -> u64 {
        if self.width <= 0 || self.height <= 0 {
            0
        } else {
            self.width as u64 * self.height as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let r = Rect::new(10, 20, 32, 16);
        assert_eq!(r.right(), 42);
        assert_eq!(r.bottom(), 36);
        assert_eq!(r.area(), 512);
    }

    #[test]
    fn test_inverted_area() {
        assert_eq!(Rect::new(5, 5, -5, -5).area(), 0);
        assert_eq!(Rect::new(5, 5, 4, 0).area(), 0);
    }
}
