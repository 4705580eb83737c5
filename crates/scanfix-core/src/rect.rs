//! Rect - integer rectangles
//!
//! Sub-rectangle arguments of every raster operation are expressed as a
//! [`Rect`]. Operations never clip a rectangle on their own; callers
//! intersect with [`Rect::intersect`] first when they need to.

use crate::error::{Error, Result};

/// A rectangle region
///
/// Right and bottom edges are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left x coordinate
    pub x: i32,
    /// Top y coordinate
    pub y: i32,
    /// Width
    pub w: i32,
    /// Height
    pub h: i32,
}

impl Rect {
    /// Create a new rectangle
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if width or height is negative.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Result<Self> {
        if w < 0 || h < 0 {
            return Err(Error::InvalidParameter(format!(
                "rect dimensions must be non-negative: w={w}, h={h}"
            )));
        }
        Ok(Self { x, y, w, h })
    }

    /// Create a rectangle without validation
    pub const fn new_unchecked(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle at the origin covering a `width` x `height` image
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            w: width as i32,
            h: height as i32,
        }
    }

    /// Create a rectangle from its inclusive left/top and exclusive
    /// right/bottom edges. Inverted edges give an empty rectangle.
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            x: left,
            y: top,
            w: (right - left).max(0),
            h: (bottom - top).max(0),
        }
    }

    /// Get the right x coordinate (exclusive)
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Get the bottom y coordinate (exclusive)
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Get the area
    #[inline]
    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    /// Check if the rectangle is empty (zero area)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Check if a point is inside the rectangle
    #[inline]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Check if this rectangle contains another one
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Compute the intersection of two rectangles
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect {
                x,
                y,
                w: right - x,
                h: bottom - y,
            })
        } else {
            None
        }
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Move the rectangle by `(dx, dy)`
    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Move each edge outwards by the given amounts.
    ///
    /// Negative amounts move an edge inwards; the result may be empty.
    pub fn adjusted(&self, left: i32, top: i32, right: i32, bottom: i32) -> Rect {
        Rect::from_edges(
            self.x - left,
            self.y - top,
            self.right() + right,
            self.bottom() + bottom,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_new_rejects_negative() {
        assert!(Rect::new(0, 0, -1, 5).is_err());
        assert!(Rect::new(3, 4, 0, 0).is_ok());
    }

    #[test]
    fn test_rect_intersect() {
        let a = Rect::new_unchecked(0, 0, 10, 10);
        let b = Rect::new_unchecked(5, 6, 10, 10);
        assert_eq!(a.intersect(&b), Some(Rect::new_unchecked(5, 6, 5, 4)));
        assert_eq!(a.intersect(&Rect::new_unchecked(10, 0, 3, 3)), None);
    }

    #[test]
    fn test_rect_adjusted() {
        let r = Rect::new_unchecked(10, 10, 20, 5);
        assert_eq!(r.adjusted(2, 1, 3, 4), Rect::new_unchecked(8, 9, 25, 10));
        assert!(r.adjusted(0, -3, 0, -3).is_empty());
    }

    #[test]
    fn test_rect_union_ignores_empty() {
        let a = Rect::new_unchecked(1, 1, 2, 2);
        assert_eq!(a.union(&Rect::default()), a);
        assert_eq!(
            a.union(&Rect::new_unchecked(5, 0, 1, 1)),
            Rect::new_unchecked(1, 0, 5, 3)
        );
    }
}
