//! Pixel access functions
//!
//! Pixels are packed MSB-to-LSB within each 32-bit word: pixel 0 of a row
//! occupies bit 31 of the row's first word.

use super::{BWColor, BinaryImage};
use crate::error::{Error, Result};

impl BinaryImage {
    /// Get the pixel at (x, y).
    ///
    /// Returns `None` if coordinates are out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<BWColor> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.get_pixel_unchecked(x, y))
    }

    /// Get a pixel without bounds checking.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`; an `x` past the width reads padding.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> BWColor {
        BWColor::from_bit(get_data_bit(self.row_data(y), x))
    }

    /// Check whether (x, y) is a black pixel. Out-of-range coordinates,
    /// including negative ones, read as white.
    #[inline]
    pub fn is_black(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && (x as u32) < self.width()
            && (y as u32) < self.height()
            && get_data_bit(self.row_data(y as u32), x as u32) != 0
    }

    /// Set the pixel at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if coordinates are out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: BWColor) -> Result<()> {
        if x >= self.width() || y >= self.height() {
            return Err(Error::IndexOutOfBounds {
                x,
                y,
                width: self.width(),
                height: self.height(),
            });
        }
        self.set_pixel_unchecked(x, y, color);
        Ok(())
    }

    /// Set a pixel without bounds checking.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`. Writing past the width corrupts padding, so
    /// `x` must be inside the image.
    #[inline]
    pub fn set_pixel_unchecked(&mut self, x: u32, y: u32, color: BWColor) {
        let line = self.row_data_mut(y);
        match color {
            BWColor::Black => set_data_bit(line, x),
            BWColor::White => clear_data_bit(line, x),
        }
    }
}

/// Get a 1-bit pixel value (0 or 1).
#[inline]
pub fn get_data_bit(line: &[u32], x: u32) -> u32 {
    (line[(x >> 5) as usize] >> (31 - (x & 31))) & 1
}

/// Set a 1-bit pixel to 1.
#[inline]
pub fn set_data_bit(line: &mut [u32], x: u32) {
    line[(x >> 5) as usize] |= 0x8000_0000 >> (x & 31);
}

/// Clear a 1-bit pixel to 0.
#[inline]
pub fn clear_data_bit(line: &mut [u32], x: u32) {
    line[(x >> 5) as usize] &= !(0x8000_0000 >> (x & 31));
}

/// Set a 1-bit pixel to the low bit of `val`.
#[inline]
pub fn set_data_bit_val(line: &mut [u32], x: u32, val: u32) {
    if val & 1 != 0 {
        set_data_bit(line, x);
    } else {
        clear_data_bit(line, x);
    }
}
