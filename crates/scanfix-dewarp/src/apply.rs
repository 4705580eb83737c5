//! Inverse-mapping resampler
//!
//! Every destination pixel looks up its source row through the curvature
//! polynomials, then its source column through the margin transform on that
//! row. Pixels whose source falls outside the page stay white and are
//! counted.

use crate::error::DewarpResult;
use crate::types::MarginModel;
use scanfix_core::{BinaryImage, CancelToken, get_data_bit, set_data_bit};
use tracing::warn;

/// Resample `src` through `model`.
///
/// Returns the corrected image, the same size as `src`, and the number of
/// destination pixels left blank because their source was out of bounds.
///
/// # Errors
///
/// Returns a core error for a null input and a cancelled core error when
/// `cancel` fires; the token is polled once per row.
pub fn resample(
    src: &BinaryImage,
    model: &MarginModel,
    cancel: &CancelToken,
) -> DewarpResult<(BinaryImage, u64)> {
    let (width, height) = src.size();
    let mut dst = BinaryImage::new(width, height)?;
    let (w, h) = (width as f64, height as f64);
    let mut skipped = 0u64;

    for y in 0..height {
        cancel.check()?;
        let [a, b, c] = model.row_coefficients(y as f64);
        let out = dst.row_data_mut(y);
        for x in 0..width {
            let xf = x as f64;
            let ys = (a + xf * (b + xf * c)).round();
            if !(0.0..h).contains(&ys) {
                skipped += 1;
                continue;
            }
            let xs = model.source_column(xf, ys).round();
            if !(0.0..w).contains(&xs) {
                skipped += 1;
                continue;
            }
            if get_data_bit(src.row_data(ys as u32), xs as u32) != 0 {
                set_data_bit(out, x);
            }
        }
    }

    if skipped > 0 {
        warn!(
            skipped,
            total = width as u64 * height as u64,
            "resampled pixels outside the page"
        );
    }
    Ok((dst, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanfix_core::{BWColor, Rect};

    fn identity() -> MarginModel {
        MarginModel {
            left: [0.0, 0.0],
            right: [100.0, 0.0],
            transform: [0.0, 1.0, 0.0, 0.0],
            anchor_row: 0,
            meta: [[0.0, 1.0, 0.0], [0.0; 3], [0.0; 3]],
        }
    }

    #[test]
    fn test_identity_model() {
        let mut img = BinaryImage::new(70, 40).unwrap();
        img.fill_rect(Rect::new(5, 7, 33, 9).unwrap(), BWColor::Black).unwrap();
        let (out, skipped) = resample(&img, &identity(), &CancelToken::new()).unwrap();
        assert_eq!(out, img);
        assert_eq!(skipped, 0);
    }

    #[test]
    fn test_shift_counts_skipped() {
        let mut img = BinaryImage::new(40, 30).unwrap();
        img.fill_rect(Rect::new(10, 10, 5, 5).unwrap(), BWColor::Black).unwrap();
        // read from 3 columns to the right and 2 rows down
        let mut model = identity();
        model.meta[0][0] = 2.0;
        model.transform[0] = 3.0;
        let (out, skipped) = resample(&img, &model, &CancelToken::new()).unwrap();
        assert_eq!(out.content_bounds(), Some(Rect::new(7, 8, 5, 5).unwrap()));
        // the bottom two rows, plus the last three columns of the others
        assert_eq!(skipped, 2 * 40 + 28 * 3);
    }

    #[test]
    fn test_row_dependent_column_shift() {
        // a vertical line leaning one column right every 10 rows
        let mut img = BinaryImage::new(50, 50).unwrap();
        for y in 0..50 {
            img.set_pixel(20 + y / 10, y, BWColor::Black).unwrap();
        }
        let mut model = identity();
        model.transform[2] = 0.1;
        let (out, _) = resample(&img, &model, &CancelToken::new()).unwrap();
        // sources are rounded, so a row lands on column 19, 20 or 21
        for y in 0..50 {
            let cols: Vec<u32> = (0..50)
                .filter(|&x| out.get_pixel(x, y) == Some(BWColor::Black))
                .collect();
            assert_eq!(cols.len(), 1, "row {y}");
            assert!((19..=21).contains(&cols[0]), "row {y}: {cols:?}");
        }
    }

    #[test]
    fn test_cancelled() {
        let img = BinaryImage::new(8, 8).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(resample(&img, &identity(), &cancel).unwrap_err().is_cancelled());
    }
}
