//! BinaryImage - the 1bpp raster container
//!
//! # Pixel layout
//!
//! - Image data is stored in 32-bit words
//! - Every row starts on a 32-bit boundary (`wpl = ceil(width / 32)`)
//! - Pixels are packed MSB to LSB within each word
//! - A set bit is black (foreground), a clear bit is white
//! - Padding bits past `width` in the last word of a row are always clear
//!
//! # Ownership model
//!
//! `BinaryImage` keeps its words behind an `Arc`, so `clone()` is cheap and
//! shares the buffer. Every mutating method first calls
//! [`BinaryImage::ensure_owned`], which makes a private copy when the
//! buffer is shared. Two independently held images are never aliased.

mod access;
pub mod rop;

pub use access::*;
pub use rop::{RasterTransform, RopOp};

use crate::error::{Error, Result};
use crate::rect::Rect;
use std::sync::Arc;

/// Pixel color of a binary image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BWColor {
    /// Background, bit value 0
    White,
    /// Foreground, bit value 1
    Black,
}

impl BWColor {
    /// The 32-bit word with every pixel set to this color.
    #[inline]
    pub fn fill_word(self) -> u32 {
        match self {
            BWColor::White => 0,
            BWColor::Black => u32::MAX,
        }
    }

    /// The opposite color.
    #[inline]
    pub fn inverted(self) -> BWColor {
        match self {
            BWColor::White => BWColor::Black,
            BWColor::Black => BWColor::White,
        }
    }

    /// Color of a single bit value (0 = white, anything else = black).
    #[inline]
    pub fn from_bit(bit: u32) -> BWColor {
        if bit == 0 {
            BWColor::White
        } else {
            BWColor::Black
        }
    }
}

/// Mask of the valid bits in the last word of a row.
#[inline]
pub fn last_word_mask(width: u32) -> u32 {
    match width % 32 {
        0 => u32::MAX,
        extra => u32::MAX << (32 - extra),
    }
}

/// Copy-on-write 1bpp image.
///
/// The default value is the null image: zero size and no buffer.
#[derive(Debug, Clone, Default)]
pub struct BinaryImage {
    width: u32,
    height: u32,
    wpl: u32,
    data: Option<Arc<Vec<u32>>>,
}

impl BinaryImage {
    /// Create a white image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if either dimension is zero or
    /// the buffer size would overflow.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::new_filled(width, height, BWColor::White)
    }

    /// Create an image with every pixel set to `color`.
    ///
    /// # Errors
    ///
    /// Same as [`BinaryImage::new`].
    pub fn new_filled(width: u32, height: u32, color: BWColor) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let wpl = Self::compute_wpl(width);
        let len = (wpl as u64)
            .checked_mul(height as u64)
            .filter(|&n| n <= isize::MAX as u64 / 4)
            .ok_or(Error::InvalidDimension { width, height })?;

        let mut data = vec![color.fill_word(); len as usize];
        if color == BWColor::Black {
            clear_padding(&mut data, width, wpl);
        }
        Ok(Self {
            width,
            height,
            wpl,
            data: Some(Arc::new(data)),
        })
    }

    /// Create an image from raw row data.
    ///
    /// `data` must hold `wpl * height` words in the layout described in the
    /// module docs. Padding bits are cleared on the way in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] for zero sizes and
    /// [`Error::InvalidParameter`] if `data` has the wrong length.
    pub fn from_words(width: u32, height: u32, mut data: Vec<u32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let wpl = Self::compute_wpl(width);
        let expected = wpl as usize * height as usize;
        if data.len() != expected {
            return Err(Error::InvalidParameter(format!(
                "expected {expected} words for a {width}x{height} image, got {}",
                data.len()
            )));
        }
        clear_padding(&mut data, width, wpl);
        Ok(Self {
            width,
            height,
            wpl,
            data: Some(Arc::new(data)),
        })
    }

    /// The null image: zero size, no buffer.
    pub fn null() -> Self {
        Self::default()
    }

    /// Check whether this is the null image.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.data.is_none()
    }

    /// Words per line for a given width.
    #[inline]
    pub fn compute_wpl(width: u32) -> u32 {
        width.div_ceil(32)
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Words per line.
    #[inline]
    pub fn wpl(&self) -> u32 {
        self.wpl
    }

    /// The rectangle covering the whole image.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Check whether two images have the same dimensions.
    pub fn sizes_equal(&self, other: &BinaryImage) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// All words of the image. Empty for the null image.
    #[inline]
    pub fn data(&self) -> &[u32] {
        self.data.as_deref().map_or(&[], Vec::as_slice)
    }

    /// Words of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_data(&self, y: u32) -> &[u32] {
        let wpl = self.wpl as usize;
        let start = y as usize * wpl;
        &self.data()[start..start + wpl]
    }

    /// Mutable access to all words, unsharing the buffer first.
    ///
    /// Callers must leave padding bits clear.
    pub fn data_mut(&mut self) -> &mut [u32] {
        self.ensure_owned();
        match self.data.as_mut() {
            Some(data) => Arc::make_mut(data).as_mut_slice(),
            None => &mut [],
        }
    }

    /// Mutable words of row `y`, unsharing the buffer first.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row_data_mut(&mut self, y: u32) -> &mut [u32] {
        let wpl = self.wpl as usize;
        let start = y as usize * wpl;
        &mut self.data_mut()[start..start + wpl]
    }

    /// Make sure the buffer is not shared with any other image.
    ///
    /// Called by every mutating method; a shared buffer is deep-copied.
    pub fn ensure_owned(&mut self) {
        if let Some(data) = self.data.as_mut() {
            Arc::make_mut(data);
        }
    }

    /// Check whether the buffer is currently shared with another image.
    pub fn is_shared(&self) -> bool {
        self.data.as_ref().is_some_and(|d| Arc::strong_count(d) > 1)
    }

    /// Copy with a private buffer.
    pub fn deep_clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            wpl: self.wpl,
            data: self.data.as_ref().map(|d| Arc::new(Vec::clone(d))),
        }
    }

    /// A white image of the same size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NullImage`] for the null image.
    pub fn create_template(&self) -> Result<Self> {
        self.require_non_null("create_template")?;
        Self::new(self.width, self.height)
    }

    pub(crate) fn require_non_null(&self, op: &'static str) -> Result<()> {
        if self.is_null() {
            Err(Error::NullImage(op))
        } else {
            Ok(())
        }
    }

    pub(crate) fn require_same_size(&self, other: &BinaryImage) -> Result<()> {
        if self.sizes_equal(other) {
            Ok(())
        } else {
            Err(Error::SizeMismatch {
                expected: self.size(),
                actual: other.size(),
            })
        }
    }

    /// Set every pixel to `color`.
    pub fn fill(&mut self, color: BWColor) {
        let (width, wpl) = (self.width, self.wpl);
        let data = self.data_mut();
        data.fill(color.fill_word());
        if color == BWColor::Black {
            clear_padding(data, width, wpl);
        }
    }

    /// Set every pixel of `rect` to `color`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NullImage`] or [`Error::RectOutOfBounds`].
    pub fn fill_rect(&mut self, rect: Rect, color: BWColor) -> Result<()> {
        let op = match color {
            BWColor::White => RopOp::Clear,
            BWColor::Black => RopOp::Set,
        };
        self.rop_dst_only(rect, op)
    }

    /// Set every pixel outside `rect` to `color`.
    ///
    /// `rect` may extend past the image; only its intersection with the
    /// image is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NullImage`] for the null image.
    pub fn fill_except(&mut self, rect: Rect, color: BWColor) -> Result<()> {
        self.require_non_null("fill_except")?;
        let bounds = self.rect();
        let Some(keep) = rect.intersect(&bounds) else {
            self.fill(color);
            return Ok(());
        };

        let bands = [
            Rect::from_edges(0, 0, bounds.w, keep.y),
            Rect::from_edges(0, keep.bottom(), bounds.w, bounds.h),
            Rect::from_edges(0, keep.y, keep.x, keep.bottom()),
            Rect::from_edges(keep.right(), keep.y, bounds.w, keep.bottom()),
        ];
        for band in bands.into_iter().filter(|b| !b.is_empty()) {
            self.fill_rect(band, color)?;
        }
        Ok(())
    }

    /// Number of black pixels.
    pub fn count_black(&self) -> u64 {
        self.data().iter().map(|w| w.count_ones() as u64).sum()
    }

    /// Number of black pixels inside `rect`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NullImage`] or [`Error::RectOutOfBounds`].
    pub fn count_black_in(&self, rect: Rect) -> Result<u64> {
        self.require_non_null("count_black_in")?;
        self.check_rect(&rect)?;
        if rect.is_empty() {
            return Ok(0);
        }
        let first = (rect.x / 32) as usize;
        let last = ((rect.right() - 1) / 32) as usize;
        let mut total = 0u64;
        for y in rect.y..rect.bottom() {
            let row = self.row_data(y as u32);
            for (k, &word) in row.iter().enumerate().take(last + 1).skip(first) {
                let mask = rop::span_mask(k, rect.x as u32, rect.w as u32);
                total += (word & mask).count_ones() as u64;
            }
        }
        Ok(total)
    }

    /// Check whether the image has no black pixel.
    pub fn is_all_white(&self) -> bool {
        self.data().iter().all(|&w| w == 0)
    }

    /// Bounding rectangle of all black pixels, `None` if there are none.
    pub fn content_bounds(&self) -> Option<Rect> {
        let mut top = None;
        let mut bottom = 0;
        let mut left = u32::MAX;
        let mut right = 0;

        for y in 0..self.height {
            let row = self.row_data(y);
            let Some(first) = row.iter().position(|&w| w != 0) else {
                continue;
            };
            // at least one non-zero word exists, so rposition finds one too
            let last = row.iter().rposition(|&w| w != 0).unwrap_or(first);
            left = left.min(first as u32 * 32 + row[first].leading_zeros());
            right = right.max(last as u32 * 32 + 31 - row[last].trailing_zeros());
            top.get_or_insert(y);
            bottom = y;
        }

        top.map(|top| {
            Rect::from_edges(
                left as i32,
                top as i32,
                right as i32 + 1,
                bottom as i32 + 1,
            )
        })
    }

    /// Copy out the pixels of `rect` as a new image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NullImage`], [`Error::RectOutOfBounds`], or
    /// [`Error::InvalidDimension`] for an empty `rect`.
    pub fn sub_image(&self, rect: Rect) -> Result<BinaryImage> {
        self.require_non_null("sub_image")?;
        self.check_rect(&rect)?;
        let mut out = BinaryImage::new(rect.w.max(0) as u32, rect.h.max(0) as u32)?;
        out.rop(out.rect(), self, rect.x, rect.y, RopOp::Src)?;
        Ok(out)
    }

    pub(crate) fn check_rect(&self, rect: &Rect) -> Result<()> {
        if rect.w < 0 || rect.h < 0 || !self.rect().contains_rect(rect) {
            return Err(Error::RectOutOfBounds {
                x: rect.x,
                y: rect.y,
                w: rect.w,
                h: rect.h,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl PartialEq for BinaryImage {
    fn eq(&self, other: &Self) -> bool {
        // padding is always clear, so word equality is pixel equality
        self.sizes_equal(other) && self.data() == other.data()
    }
}

impl Eq for BinaryImage {}

/// Zero every padding bit of a packed buffer.
pub(crate) fn clear_padding(data: &mut [u32], width: u32, wpl: u32) {
    let mask = last_word_mask(width);
    if mask == u32::MAX || wpl == 0 {
        return;
    }
    for row in data.chunks_exact_mut(wpl as usize) {
        if let Some(last) = row.last_mut() {
            *last &= mask;
        }
    }
}
