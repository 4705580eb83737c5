//! Raster operations (ROP)
//!
//! A raster operation combines a source rectangle with an equally sized
//! destination rectangle one 32-bit word at a time through a transform
//! `f(src_word, dst_word) -> word`. The first and last word of each
//! destination row are masked so pixels outside the rectangle (and the
//! padding bits) are never touched, and source words are re-aligned when
//! the source and destination bit offsets differ.
//!
//! Transforms are zero-sized types implementing [`RasterTransform`], so
//! the word loop is monomorphized per operation. [`RopOp`] names the
//! built-in transforms and is dispatched once per call.
//!
//! Source and destination may be the same image
//! ([`BinaryImage::rop_within`]). Rows and words are then walked in the
//! order that never reads a word already written by the same call.

use super::BinaryImage;
use crate::error::Result;
use crate::rect::Rect;

/// Word-level combination of a source and a destination word.
pub trait RasterTransform {
    /// Combine one word of source pixels with one word of destination
    /// pixels. Bits outside the operated rectangle are masked afterwards.
    fn transform(src: u32, dst: u32) -> u32;
}

macro_rules! raster_transforms {
    ($($(#[$doc:meta])* $name:ident => |$s:ident, $d:ident| $body:expr;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl RasterTransform for $name {
                #[inline(always)]
                fn transform($s: u32, $d: u32) -> u32 {
                    $body
                }
            }
        )*
    };
}

raster_transforms! {
    /// `0`
    ClearOp => |_s, _d| 0;
    /// `1`
    SetOp => |_s, _d| u32::MAX;
    /// `src`
    SrcOp => |s, _d| s;
    /// `!src`
    NotSrcOp => |s, _d| !s;
    /// `!dst`
    NotDstOp => |_s, d| !d;
    /// `src & dst`
    AndOp => |s, d| s & d;
    /// `src | dst`
    OrOp => |s, d| s | d;
    /// `src ^ dst`
    XorOp => |s, d| s ^ d;
    /// `dst & !src`
    SubtractOp => |s, d| d & !s;
    /// `src & !dst`
    SrcAndNotDstOp => |s, d| s & !d;
    /// `!(src & dst)`
    NandOp => |s, d| !(s & d);
    /// `!(src | dst)`
    NorOp => |s, d| !(s | d);
    /// `!(src ^ dst)`
    XnorOp => |s, d| !(s ^ d);
    /// `!src | dst`
    OrNotSrcOp => |s, d| !s | d;
    /// `src | !dst`
    SrcOrNotDstOp => |s, d| s | !d;
}

/// Raster operation type
///
/// Named raster operations for combining source and destination pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RopOp {
    /// Clear destination to 0 (white)
    Clear,
    /// Set destination to 1 (black)
    Set,
    /// Copy source to destination
    Src,
    /// NOT source
    NotSrc,
    /// NOT destination
    NotDst,
    /// Source AND destination
    And,
    /// Source OR destination
    Or,
    /// Source XOR destination
    Xor,
    /// Destination AND (NOT source)
    Subtract,
    /// Source AND (NOT destination)
    SrcAndNotDst,
    /// NOT (source AND destination)
    Nand,
    /// NOT (source OR destination)
    Nor,
    /// NOT (source XOR destination)
    Xnor,
    /// (NOT source) OR destination
    OrNotSrc,
    /// Source OR (NOT destination)
    SrcOrNotDst,
}

/// Expand `$then!(Type)` for the transform matching `$op`.
macro_rules! dispatch_rop {
    ($op:expr, $then:ident) => {
        match $op {
            RopOp::Clear => $then!(ClearOp),
            RopOp::Set => $then!(SetOp),
            RopOp::Src => $then!(SrcOp),
            RopOp::NotSrc => $then!(NotSrcOp),
            RopOp::NotDst => $then!(NotDstOp),
            RopOp::And => $then!(AndOp),
            RopOp::Or => $then!(OrOp),
            RopOp::Xor => $then!(XorOp),
            RopOp::Subtract => $then!(SubtractOp),
            RopOp::SrcAndNotDst => $then!(SrcAndNotDstOp),
            RopOp::Nand => $then!(NandOp),
            RopOp::Nor => $then!(NorOp),
            RopOp::Xnor => $then!(XnorOp),
            RopOp::OrNotSrc => $then!(OrNotSrcOp),
            RopOp::SrcOrNotDst => $then!(SrcOrNotDstOp),
        }
    };
}

impl RopOp {
    /// Check if this operation reads a source image.
    pub fn requires_source(self) -> bool {
        !matches!(self, Self::Clear | Self::Set | Self::NotDst)
    }

    /// Apply the operation to one pair of words.
    pub fn apply(self, src: u32, dst: u32) -> u32 {
        macro_rules! one {
            ($t:ty) => {
                <$t>::transform(src, dst)
            };
        }
        dispatch_rop!(self, one)
    }
}

/// Where the source words of one call come from.
#[derive(Clone, Copy)]
enum Source<'a> {
    /// Destination-only operation
    None,
    /// Another image's buffer, source rectangle starting at `(x, y)`
    Other {
        data: &'a [u32],
        wpl: usize,
        x: u32,
        y: u32,
    },
    /// The destination image itself, source rectangle starting at `(x, y)`
    Same { x: u32, y: u32 },
}

impl BinaryImage {
    /// Combine `dst_rect` of this image with the equally sized rectangle of
    /// `src` whose top-left corner is `(src_x, src_y)`.
    ///
    /// # Arguments
    ///
    /// * `dst_rect` - Destination rectangle; must lie inside this image
    /// * `src` - Source image (ignored when `op` does not read a source)
    /// * `src_x`, `src_y` - Top-left corner of the source rectangle
    /// * `op` - The raster operation to apply
    ///
    /// # Errors
    ///
    /// Returns [`Error::NullImage`](crate::Error::NullImage) if either image
    /// is null and [`Error::RectOutOfBounds`](crate::Error::RectOutOfBounds)
    /// if either rectangle is not fully inside its image.
    pub fn rop(
        &mut self,
        dst_rect: Rect,
        src: &BinaryImage,
        src_x: i32,
        src_y: i32,
        op: RopOp,
    ) -> Result<()> {
        if !op.requires_source() {
            return self.rop_dst_only(dst_rect, op);
        }
        macro_rules! run {
            ($t:ty) => {
                self.rop_with::<$t>(dst_rect, src, src_x, src_y)
            };
        }
        dispatch_rop!(op, run)
    }

    /// Generic form of [`rop`](Self::rop) for a custom transform.
    ///
    /// # Errors
    ///
    /// Same as [`rop`](Self::rop).
    pub fn rop_with<T: RasterTransform>(
        &mut self,
        dst_rect: Rect,
        src: &BinaryImage,
        src_x: i32,
        src_y: i32,
    ) -> Result<()> {
        self.require_non_null("rop")?;
        src.require_non_null("rop")?;
        self.check_rect(&dst_rect)?;
        src.check_rect(&Rect::new_unchecked(src_x, src_y, dst_rect.w, dst_rect.h))?;
        if dst_rect.is_empty() {
            return Ok(());
        }

        let source = Source::Other {
            data: src.data(),
            wpl: src.wpl() as usize,
            x: src_x as u32,
            y: src_y as u32,
        };
        let wpl = self.wpl() as usize;
        run_rop::<T>(self.data_mut(), wpl, dst_rect, source);
        Ok(())
    }

    /// Like [`rop`](Self::rop), with the source rectangle taken from this
    /// same image. The rectangles may overlap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NullImage`](crate::Error::NullImage) or
    /// [`Error::RectOutOfBounds`](crate::Error::RectOutOfBounds).
    pub fn rop_within(&mut self, dst_rect: Rect, src_x: i32, src_y: i32, op: RopOp) -> Result<()> {
        if !op.requires_source() {
            return self.rop_dst_only(dst_rect, op);
        }
        self.require_non_null("rop_within")?;
        self.check_rect(&dst_rect)?;
        self.check_rect(&Rect::new_unchecked(src_x, src_y, dst_rect.w, dst_rect.h))?;
        if dst_rect.is_empty() {
            return Ok(());
        }

        let source = Source::Same {
            x: src_x as u32,
            y: src_y as u32,
        };
        let wpl = self.wpl() as usize;
        let data = self.data_mut();
        macro_rules! run {
            ($t:ty) => {
                run_rop::<$t>(data, wpl, dst_rect, source)
            };
        }
        dispatch_rop!(op, run);
        Ok(())
    }

    pub(crate) fn rop_dst_only(&mut self, rect: Rect, op: RopOp) -> Result<()> {
        self.require_non_null("rop")?;
        self.check_rect(&rect)?;
        if rect.is_empty() {
            return Ok(());
        }
        let wpl = self.wpl() as usize;
        let data = self.data_mut();
        macro_rules! run {
            ($t:ty) => {
                run_rop::<$t>(data, wpl, rect, Source::None)
            };
        }
        dispatch_rop!(op, run);
        Ok(())
    }

    /// Invert all pixels in place. The null image stays null.
    pub fn invert(&mut self) {
        if self.is_null() {
            return;
        }
        let (width, wpl) = (self.width(), self.wpl());
        let data = self.data_mut();
        for word in data.iter_mut() {
            *word = !*word;
        }
        super::clear_padding(data, width, wpl);
    }

    /// Inverted copy.
    pub fn inverted(&self) -> BinaryImage {
        let mut out = self.clone();
        out.invert();
        out
    }

    /// Combine the whole image with a same-sized `other`, in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NullImage`](crate::Error::NullImage) or
    /// [`Error::SizeMismatch`](crate::Error::SizeMismatch).
    pub fn combine(&mut self, other: &BinaryImage, op: RopOp) -> Result<()> {
        self.require_non_null("combine")?;
        other.require_non_null("combine")?;
        self.require_same_size(other)?;
        self.rop(self.rect(), other, 0, 0, op)
    }

    /// Bitwise AND of two images.
    ///
    /// # Errors
    ///
    /// Same as [`combine`](Self::combine).
    pub fn and(&self, other: &BinaryImage) -> Result<BinaryImage> {
        self.combined(other, RopOp::And)
    }

    /// Bitwise OR of two images.
    ///
    /// # Errors
    ///
    /// Same as [`combine`](Self::combine).
    pub fn or(&self, other: &BinaryImage) -> Result<BinaryImage> {
        self.combined(other, RopOp::Or)
    }

    /// Bitwise XOR of two images.
    ///
    /// # Errors
    ///
    /// Same as [`combine`](Self::combine).
    pub fn xor(&self, other: &BinaryImage) -> Result<BinaryImage> {
        self.combined(other, RopOp::Xor)
    }

    /// Pixels black in `self` and white in `other`.
    ///
    /// # Errors
    ///
    /// Same as [`combine`](Self::combine).
    pub fn subtract(&self, other: &BinaryImage) -> Result<BinaryImage> {
        self.combined(other, RopOp::Subtract)
    }

    fn combined(&self, other: &BinaryImage, op: RopOp) -> Result<BinaryImage> {
        let mut out = self.clone();
        out.combine(other, op)?;
        Ok(out)
    }

    /// Check whether every black pixel of `self` is also black in `other`.
    ///
    /// Images of different sizes are never subsets of each other.
    pub fn is_subset_of(&self, other: &BinaryImage) -> bool {
        self.sizes_equal(other)
            && self
                .data()
                .iter()
                .zip(other.data())
                .all(|(&a, &b)| a & !b == 0)
    }
}

/// Mask of the bits of word `k` covered by `[x, x + width)`.
#[inline]
pub(crate) fn span_mask(k: usize, x: u32, width: u32) -> u32 {
    let word_start = k as u32 * 32;
    let lo = x.max(word_start) - word_start;
    let hi = (x + width).min(word_start + 32) - word_start;
    range_mask(lo, hi)
}

/// Mask with bits `[start, end)` set, counted from the MSB.
#[inline]
fn range_mask(start: u32, end: u32) -> u32 {
    let head = if start >= 32 { 0 } else { u32::MAX >> start };
    let tail = if end == 0 { 0 } else { u32::MAX << (32 - end) };
    head & tail
}

/// 32 bits of `line` starting at bit `start`. Bits before the row or past
/// its last word read as 0.
#[inline]
fn fetch_bits(line: &[u32], start: i64) -> u32 {
    let word = start.div_euclid(32);
    let shift = start.rem_euclid(32) as u32;
    let get = |i: i64| {
        if i >= 0 && (i as usize) < line.len() {
            line[i as usize]
        } else {
            0
        }
    };
    if shift == 0 {
        get(word)
    } else {
        (get(word) << shift) | (get(word + 1) >> (32 - shift))
    }
}

#[inline]
fn apply_word<T: RasterTransform>(dst: &mut [u32], k: usize, src_word: u32, x: u32, width: u32) {
    let mask = span_mask(k, x, width);
    let d = dst[k];
    dst[k] = (d & !mask) | (T::transform(src_word, d) & mask);
}

/// One destination row against one distinct source row.
fn rop_row<T: RasterTransform>(dst: &mut [u32], dst_x: u32, width: u32, src: &[u32], src_x: u32) {
    let first = (dst_x / 32) as usize;
    let last = ((dst_x + width - 1) / 32) as usize;
    let offset = src_x as i64 - dst_x as i64;
    for k in first..=last {
        let src_word = fetch_bits(src, k as i64 * 32 + offset);
        apply_word::<T>(dst, k, src_word, dst_x, width);
    }
}

/// One row whose source span lies in the same row.
///
/// Words are walked away from the source: left to right when the source
/// is to the right, right to left otherwise.
fn rop_row_within<T: RasterTransform>(row: &mut [u32], dst_x: u32, width: u32, src_x: u32) {
    let first = (dst_x / 32) as usize;
    let last = ((dst_x + width - 1) / 32) as usize;
    let offset = src_x as i64 - dst_x as i64;
    let mut step = |k: usize| {
        let src_word = fetch_bits(row, k as i64 * 32 + offset);
        apply_word::<T>(row, k, src_word, dst_x, width);
    };
    if offset >= 0 {
        (first..=last).for_each(&mut step);
    } else {
        (first..=last).rev().for_each(&mut step);
    }
}

fn run_rop<T: RasterTransform>(data: &mut [u32], wpl: usize, rect: Rect, source: Source<'_>) {
    let (dx, dy) = (rect.x as u32, rect.y as u32);
    let (w, h) = (rect.w as u32, rect.h as usize);
    let row_range = |y: usize| y * wpl..(y + 1) * wpl;

    match source {
        Source::None => {
            for y in dy as usize..dy as usize + h {
                rop_row::<T>(&mut data[row_range(y)], dx, w, &[], dx);
            }
        }
        Source::Other {
            data: src,
            wpl: src_wpl,
            x: sx,
            y: sy,
        } => {
            for i in 0..h {
                let s = (sy as usize + i) * src_wpl;
                let d = dy as usize + i;
                rop_row::<T>(&mut data[row_range(d)], dx, w, &src[s..s + src_wpl], sx);
            }
        }
        Source::Same { x: sx, y: sy } if sy == dy => {
            for y in dy as usize..dy as usize + h {
                rop_row_within::<T>(&mut data[row_range(y)], dx, w, sx);
            }
        }
        Source::Same { x: sx, y: sy } => {
            let mut step = |i: usize| {
                let d = dy as usize + i;
                let s = sy as usize + i;
                let (dst_row, src_row) = if d < s {
                    let (head, tail) = data.split_at_mut(s * wpl);
                    (&mut head[row_range(d)], &tail[..wpl])
                } else {
                    let (head, tail) = data.split_at_mut(d * wpl);
                    (&mut tail[..wpl], &head[row_range(s)])
                };
                rop_row::<T>(dst_row, dx, w, src_row, sx);
            };
            // moving content down: write bottom rows first
            if dy > sy {
                (0..h).rev().for_each(&mut step);
            } else {
                (0..h).for_each(&mut step);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::BWColor;

    fn from_rows(rows: &[&str]) -> BinaryImage {
        let mut img = BinaryImage::new(rows[0].len() as u32, rows.len() as u32).unwrap();
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == 'x' {
                    img.set_pixel(x as u32, y as u32, BWColor::Black).unwrap();
                }
            }
        }
        img
    }

    /// Reference: pixel-by-pixel application of `op`.
    fn naive_rop(dst: &mut BinaryImage, rect: Rect, src: &BinaryImage, sx: i32, sy: i32, op: RopOp) {
        let snapshot = src.clone();
        let before = dst.clone();
        for y in 0..rect.h {
            for x in 0..rect.w {
                let s = snapshot.is_black(sx + x, sy + y) as u32 * u32::MAX;
                let d = before.is_black(rect.x + x, rect.y + y) as u32 * u32::MAX;
                let r = BWColor::from_bit(op.apply(s, d) & 1);
                dst.set_pixel((rect.x + x) as u32, (rect.y + y) as u32, r)
                    .unwrap();
            }
        }
    }

    fn patterned(w: u32, h: u32, seed: u32) -> BinaryImage {
        let mut img = BinaryImage::new(w, h).unwrap();
        for y in 0..h {
            for x in 0..w {
                let v = (x * 7 + y * 13 + seed).wrapping_mul(2_654_435_761);
                if v >> 29 < 3 {
                    img.set_pixel(x, y, BWColor::Black).unwrap();
                }
            }
        }
        img
    }

    #[test]
    fn test_range_mask() {
        assert_eq!(range_mask(0, 32), u32::MAX);
        assert_eq!(range_mask(0, 1), 0x8000_0000);
        assert_eq!(range_mask(31, 32), 1);
        assert_eq!(range_mask(4, 8), 0x0F00_0000);
    }

    #[test]
    fn test_rop_matches_naive_for_all_ops() {
        let src = patterned(97, 9, 1);
        let base = patterned(83, 11, 5);
        let rect = Rect::new_unchecked(13, 2, 61, 7);
        for op in [
            RopOp::Clear,
            RopOp::Set,
            RopOp::Src,
            RopOp::NotSrc,
            RopOp::NotDst,
            RopOp::And,
            RopOp::Or,
            RopOp::Xor,
            RopOp::Subtract,
            RopOp::SrcAndNotDst,
            RopOp::Nand,
            RopOp::Nor,
            RopOp::Xnor,
            RopOp::OrNotSrc,
            RopOp::SrcOrNotDst,
        ] {
            let mut fast = base.clone();
            fast.rop(rect, &src, 30, 1, op).unwrap();
            let mut slow = base.clone();
            naive_rop(&mut slow, rect, &src, 30, 1, op);
            assert_eq!(fast, slow, "{op:?}");
        }
    }

    #[test]
    fn test_rop_within_overlap_all_directions() {
        let base = patterned(100, 40, 3);
        for (sx, sy) in [(0, 0), (5, 0), (20, 3), (2, 9), (45, 17), (38, 20)] {
            let rect = Rect::new_unchecked(20, 10, 50, 15);
            let mut fast = base.clone();
            fast.rop_within(rect, sx, sy, RopOp::Or).unwrap();
            let mut slow = base.clone();
            naive_rop(&mut slow, rect, &base, sx, sy, RopOp::Or);
            assert_eq!(fast, slow, "source at ({sx}, {sy})");
        }
    }

    #[test]
    fn test_rop_within_same_row_word_order() {
        // shifts under, at and over a word in both directions
        let base = patterned(130, 6, 9);
        let rect = Rect::new_unchecked(35, 1, 60, 4);
        for sx in [34, 36, 3, 67, 70, 2] {
            for op in [RopOp::Src, RopOp::Xor, RopOp::Subtract, RopOp::Nand] {
                let mut fast = base.clone();
                fast.rop_within(rect, sx, 1, op).unwrap();
                let mut slow = base.clone();
                naive_rop(&mut slow, rect, &base, sx, 1, op);
                assert_eq!(fast, slow, "{op:?} from column {sx}");
            }
        }
    }

    #[test]
    fn test_rop_rejects_rect_outside() {
        let mut dst = BinaryImage::new(10, 10).unwrap();
        let src = BinaryImage::new(10, 10).unwrap();
        assert!(dst.rop(Rect::new_unchecked(5, 5, 6, 1), &src, 0, 0, RopOp::Src).is_err());
        assert!(dst.rop(Rect::new_unchecked(0, 0, 4, 4), &src, 7, 0, RopOp::Src).is_err());
        assert!(
            dst.rop(Rect::new_unchecked(0, 0, 4, 4), &BinaryImage::null(), 0, 0, RopOp::Src)
                .is_err()
        );
    }

    #[test]
    fn test_rop_keeps_padding_clear() {
        let src = BinaryImage::new_filled(70, 3, BWColor::Black).unwrap();
        let mut dst = BinaryImage::new(45, 3).unwrap();
        dst.rop(dst.rect(), &src, 25, 0, RopOp::Src).unwrap();
        dst.rop(dst.rect(), &src, 0, 0, RopOp::NotDst).unwrap();
        dst.rop(dst.rect(), &src, 3, 0, RopOp::Nor).unwrap();
        let mask = super::super::last_word_mask(45);
        for y in 0..3 {
            assert_eq!(dst.row_data(y)[1] & !mask, 0);
        }
    }

    #[test]
    fn test_combine_and_subset() {
        let a = from_rows(&["xx..", "..xx"]);
        let b = from_rows(&["x...", "...x"]);
        assert_eq!(a.and(&b).unwrap(), b);
        assert_eq!(a.subtract(&b).unwrap(), from_rows(&[".x..", "..x."]));
        assert!(b.is_subset_of(&a));
        assert!(!a.is_subset_of(&b));
        assert!(a.or(&BinaryImage::new(3, 2).unwrap()).is_err());
    }

    #[test]
    fn test_invert_twice_is_identity() {
        let img = patterned(33, 5, 9);
        let inv = img.inverted();
        assert_eq!(inv.count_black(), 33 * 5 - img.count_black());
        assert_eq!(inv.inverted(), img);
    }
}
