//! LU decomposition and Gauss-Jordan elimination
//!
//! [`LuDecomposition`] factors an m×n matrix (m ≥ n) as `P·A = L·U` using the
//! left-looking dot-product formulation with partial pivoting on the largest
//! absolute value in the current column. [`gauss_jordan`] is a one-shot
//! square solver for small systems.

use crate::error::{MathError, MathResult};
use crate::matrix::Matrix;

/// Pivot magnitude below which [`gauss_jordan`] reports a singular system.
const GAUSS_JORDAN_EPS: f64 = 1e-12;

/// Pivoted LU factorization.
#[derive(Debug, Clone)]
pub struct LuDecomposition {
    /// L below the diagonal (unit diagonal implied), U on and above
    lu: Matrix,
    piv: Vec<usize>,
    pivot_sign: i32,
}

impl LuDecomposition {
    /// Factor `a`.
    ///
    /// # Errors
    ///
    /// Returns [`MathError::DimensionMismatch`] if `a` has fewer rows than
    /// columns.
    pub fn new(a: &Matrix) -> MathResult<Self> {
        let (m, n) = (a.rows(), a.cols());
        if m < n {
            return Err(MathError::DimensionMismatch(format!(
                "LU needs rows >= cols, got {}x{}",
                m, n
            )));
        }

        let mut lu = a.clone();
        let mut piv: Vec<usize> = (0..m).collect();
        let mut pivot_sign = 1;
        let mut col = vec![0.0; m];

        for j in 0..n {
            for (i, c) in col.iter_mut().enumerate() {
                *c = lu[(i, j)];
            }

            // apply previous transformations
            for i in 0..m {
                let kmax = i.min(j);
                let row = lu.row(i);
                let s: f64 = row[..kmax].iter().zip(&col[..kmax]).map(|(a, b)| a * b).sum();
                col[i] -= s;
                lu[(i, j)] = col[i];
            }

            let p = (j..m).fold(j, |best, i| {
                if col[i].abs() > col[best].abs() { i } else { best }
            });
            if p != j {
                lu.swap_rows(p, j);
                piv.swap(p, j);
                pivot_sign = -pivot_sign;
            }

            let diag = lu[(j, j)];
            if diag != 0.0 {
                for i in j + 1..m {
                    lu[(i, j)] /= diag;
                }
            }
        }

        Ok(Self {
            lu,
            piv,
            pivot_sign,
        })
    }

    /// True iff every diagonal pivot of U is non-zero.
    pub fn is_nonsingular(&self) -> bool {
        (0..self.lu.cols()).all(|j| self.lu[(j, j)] != 0.0)
    }

    /// Determinant of a square input.
    ///
    /// # Errors
    ///
    /// Returns [`MathError::DimensionMismatch`] for a non-square input.
    pub fn determinant(&self) -> MathResult<f64> {
        if self.lu.rows() != self.lu.cols() {
            return Err(MathError::DimensionMismatch(
                "determinant of a non-square matrix".to_string(),
            ));
        }
        Ok((0..self.lu.cols()).fold(self.pivot_sign as f64, |d, j| d * self.lu[(j, j)]))
    }

    /// Row permutation applied to the input.
    pub fn pivot(&self) -> &[usize] {
        &self.piv
    }

    /// Solve `A·X = B`.
    ///
    /// # Errors
    ///
    /// Returns [`MathError::DimensionMismatch`] for a non-square factor or if
    /// `b` has the wrong number of rows, and [`MathError::SingularMatrix`]
    /// if a pivot is zero.
    pub fn solve(&self, b: &Matrix) -> MathResult<Matrix> {
        let (m, n) = (self.lu.rows(), self.lu.cols());
        if m != n {
            return Err(MathError::DimensionMismatch(format!(
                "LU solve needs a square factor, got {}x{}",
                m, n
            )));
        }
        if b.rows() != m {
            return Err(MathError::DimensionMismatch(format!(
                "right-hand side has {} rows, expected {}",
                b.rows(),
                m
            )));
        }
        if !self.is_nonsingular() {
            return Err(MathError::SingularMatrix);
        }

        let nx = b.cols();
        let mut x = Matrix::new(n, nx);
        for (i, &p) in self.piv.iter().enumerate() {
            x.row_mut(i).copy_from_slice(b.row(p));
        }

        // L·Y = P·B
        for k in 0..n {
            for i in k + 1..n {
                let l = self.lu[(i, k)];
                for j in 0..nx {
                    x[(i, j)] -= x[(k, j)] * l;
                }
            }
        }
        // U·X = Y
        for k in (0..n).rev() {
            let diag = self.lu[(k, k)];
            for j in 0..nx {
                x[(k, j)] /= diag;
            }
            for i in 0..k {
                let u = self.lu[(i, k)];
                for j in 0..nx {
                    x[(i, j)] -= x[(k, j)] * u;
                }
            }
        }
        Ok(x)
    }

    /// Solve `A·x = b` for a single right-hand side.
    ///
    /// # Errors
    ///
    /// See [`solve`](Self::solve).
    pub fn solve_vec(&self, b: &[f64]) -> MathResult<Vec<f64>> {
        Ok(self.solve(&Matrix::from_column(b))?.column(0))
    }
}

/// Solve the square system `a·x = b` by Gauss-Jordan elimination with
/// partial pivoting.
///
/// # Errors
///
/// Returns [`MathError::DimensionMismatch`] for a non-square `a` or a
/// right-hand side of the wrong length, and [`MathError::SingularMatrix`]
/// when a pivot is numerically zero.
pub fn gauss_jordan(a: &Matrix, b: &[f64]) -> MathResult<Vec<f64>> {
    let n = b.len();
    if a.rows() != n || a.cols() != n {
        return Err(MathError::DimensionMismatch(format!(
            "{}x{} system with {} right-hand values",
            a.rows(),
            a.cols(),
            n
        )));
    }

    // augmented matrix [A | b]
    let mut m = Matrix::new(n, n + 1);
    for i in 0..n {
        m.row_mut(i)[..n].copy_from_slice(a.row(i));
        m[(i, n)] = b[i];
    }

    for col in 0..n {
        let pivot = (col..n).fold(col, |best, i| {
            if m[(i, col)].abs() > m[(best, col)].abs() { i } else { best }
        });
        m.swap_rows(col, pivot);

        let diag = m[(col, col)];
        if diag.abs() < GAUSS_JORDAN_EPS {
            return Err(MathError::SingularMatrix);
        }
        for v in m.row_mut(col) {
            *v /= diag;
        }

        let pivot_row = m.row(col).to_vec();
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = m[(row, col)];
            if factor == 0.0 {
                continue;
            }
            for (v, &p) in m.row_mut(row).iter_mut().zip(&pivot_row) {
                *v -= p * factor;
            }
        }
    }

    Ok((0..n).map(|i| m[(i, n)]).collect())
}
