//! Linear least squares via Givens rotations
//!
//! Solves an overdetermined system `C·x ≈ d` by reducing `C` to upper
//! triangular form with plane rotations, applying every rotation to `d` as
//! it goes, and back-substituting on the square top of the result.

use crate::error::{MathError, MathResult};
use crate::matrix::Matrix;

/// Diagonal entries of R smaller than this fraction of the largest one
/// count as zero.
const RANK_EPS: f64 = 1e-12;

/// Solve `C·x ≈ d` in the least-squares sense.
///
/// # Arguments
///
/// * `c` - h×w system matrix with `h >= w`
/// * `d` - Right-hand side of length `h`
///
/// # Errors
///
/// Returns [`MathError::InvalidArgument`] if `h < w` or `w == 0`,
/// [`MathError::DimensionMismatch`] if `d.len() != h`, and
/// [`MathError::SingularMatrix`] if the triangular factor has a zero on its
/// diagonal (rank-deficient `C`).
pub fn least_squares_fit(c: &Matrix, d: &[f64]) -> MathResult<Vec<f64>> {
    let (h, w) = (c.rows(), c.cols());
    if w == 0 || h < w {
        return Err(MathError::InvalidArgument(format!(
            "least squares needs height >= width > 0, got {}x{}",
            h, w
        )));
    }
    if d.len() != h {
        return Err(MathError::DimensionMismatch(format!(
            "right-hand side has {} values, expected {}",
            d.len(),
            h
        )));
    }

    let mut r = c.clone();
    let mut rhs = d.to_vec();

    for j in 0..w {
        for i in j + 1..h {
            let q = r[(i, j)];
            if q == 0.0 {
                continue;
            }
            let p = r[(j, j)];
            let norm = p.hypot(q);
            let (cos, sin) = (p / norm, q / norm);

            for k in j..w {
                let (a, b) = (r[(j, k)], r[(i, k)]);
                r[(j, k)] = cos * a + sin * b;
                r[(i, k)] = cos * b - sin * a;
            }
            let (a, b) = (rhs[j], rhs[i]);
            rhs[j] = cos * a + sin * b;
            rhs[i] = cos * b - sin * a;
        }
    }

    let scale = (0..w).map(|j| r[(j, j)].abs()).fold(0.0, f64::max);
    let tiny = scale * RANK_EPS;

    let mut x = vec![0.0; w];
    for j in (0..w).rev() {
        let diag = r[(j, j)];
        if diag.abs() <= tiny {
            return Err(MathError::SingularMatrix);
        }
        let tail: f64 = (j + 1..w).map(|k| r[(j, k)] * x[k]).sum();
        x[j] = (rhs[j] - tail) / diag;
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_square_system() {
        let c = Matrix::from_rows(&[[1.0, 1.0, 1.0], [2.0, 4.0, -3.0], [3.0, 6.0, -5.0]]).unwrap();
        let x = least_squares_fit(&c, &[9.0, 1.0, 0.0]).unwrap();
        for (a, e) in x.iter().zip([7.0, -1.0, 3.0]) {
            assert!((a - e).abs() < 1e-9);
        }
    }

    #[test]
    fn test_line_fit_through_noisy_points() {
        // y = 2 + 0.5 x with symmetric +-0.1 noise
        let xs: Vec<f64> = (0..10).map(f64::from).collect();
        let rows: Vec<[f64; 2]> = xs.iter().map(|&x| [1.0, x]).collect();
        let d: Vec<f64> = xs
            .iter()
            .enumerate()
            .map(|(i, &x)| 2.0 + 0.5 * x + if i % 2 == 0 { 0.1 } else { -0.1 })
            .collect();
        let c = Matrix::from_rows(&rows).unwrap();
        let fit = least_squares_fit(&c, &d).unwrap();
        assert!((fit[0] - 2.0).abs() < 0.1);
        assert!((fit[1] - 0.5).abs() < 0.02);
    }

    #[test]
    fn test_shape_errors() {
        let wide = Matrix::new(2, 3);
        assert!(matches!(
            least_squares_fit(&wide, &[0.0, 0.0]),
            Err(MathError::InvalidArgument(_))
        ));
        let tall = Matrix::new(3, 2);
        assert!(matches!(
            least_squares_fit(&tall, &[0.0; 2]),
            Err(MathError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_rank_deficient() {
        let c = Matrix::from_rows(&[[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]]).unwrap();
        assert_eq!(least_squares_fit(&c, &[1.0, 2.0, 3.0]), Err(MathError::SingularMatrix));
        assert_eq!(least_squares_fit(&Matrix::new(3, 1), &[0.0; 3]), Err(MathError::SingularMatrix));
    }
}
