//! Brick - rectangular structuring elements
//!
//! A brick covers every offset `(dx, dy)` with `min_x <= dx <= max_x` and
//! `min_y <= dy <= max_y`, relative to an explicit origin. The origin does
//! not have to be the geometric center, or even inside the brick.

use crate::{MorphError, MorphResult};

/// Rectangular structuring element with an explicit origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Brick {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
}

impl Brick {
    /// Create a brick from its inclusive extents.
    ///
    /// # Errors
    ///
    /// Returns [`MorphError::EmptyBrick`] if `min_x > max_x` or
    /// `min_y > max_y`.
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> MorphResult<Self> {
        if min_x > max_x || min_y > max_y {
            return Err(MorphError::EmptyBrick {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// A `width` x `height` brick with its origin at `(width / 2, height / 2)`.
    ///
    /// # Errors
    ///
    /// Returns [`MorphError::EmptyBrick`] if either size is zero.
    pub fn from_size(width: u32, height: u32) -> MorphResult<Self> {
        Self::from_size_with_origin(width, height, (width / 2) as i32, (height / 2) as i32)
    }

    /// A `width` x `height` brick whose top-left cell sits at offset
    /// `(-origin_x, -origin_y)`.
    ///
    /// # Errors
    ///
    /// Returns [`MorphError::EmptyBrick`] if either size is zero.
    pub fn from_size_with_origin(
        width: u32,
        height: u32,
        origin_x: i32,
        origin_y: i32,
    ) -> MorphResult<Self> {
        Self::new(
            -origin_x,
            -origin_y,
            width as i32 - 1 - origin_x,
            height as i32 - 1 - origin_y,
        )
    }

    /// Smallest x offset.
    #[inline]
    pub fn min_x(&self) -> i32 {
        self.min_x
    }

    /// Smallest y offset.
    #[inline]
    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    /// Largest x offset.
    #[inline]
    pub fn max_x(&self) -> i32 {
        self.max_x
    }

    /// Largest y offset.
    #[inline]
    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x + 1) as u32
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y + 1) as u32
    }

    /// Point reflection through the origin.
    pub fn flipped(&self) -> Brick {
        Brick {
            min_x: -self.max_x,
            min_y: -self.max_y,
            max_x: -self.min_x,
            max_y: -self.min_y,
        }
    }

    /// Whether `(dx, dy)` is one of the brick's offsets.
    pub fn contains(&self, dx: i32, dy: i32) -> bool {
        (self.min_x..=self.max_x).contains(&dx) && (self.min_y..=self.max_y).contains(&dy)
    }
}
