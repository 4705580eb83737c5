//! Least-squares polynomial through evenly spaced samples
//!
//! Sample `i` of `N` sits at `x = 1 + i / (N - 1)`, so every line lives on
//! the abstract domain `[1, 2]` regardless of how many samples built it or
//! how many outputs are requested. Keeping the domain away from zero keeps
//! the Vandermonde columns well separated.

use crate::error::{MathError, MathResult};
use crate::lsq::least_squares_fit;
use crate::matrix::Matrix;

/// Sample types a [`PolynomialLine`] can be built from and written to.
pub trait PolyValue: Copy {
    /// Widen to `f64`.
    fn to_f64(self) -> f64;

    /// Default output post-processing: round and clip for integers, a plain
    /// cast for floats.
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_poly_value_int {
    ($($t:ty),*) => {$(
        impl PolyValue for $t {
            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                value.round().clamp(<$t>::MIN as f64, <$t>::MAX as f64) as $t
            }
        }
    )*};
}

macro_rules! impl_poly_value_float {
    ($($t:ty),*) => {$(
        impl PolyValue for $t {
            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                value as $t
            }
        }
    )*};
}

impl_poly_value_int!(u8, u16, u32, i8, i16, i32);
impl_poly_value_float!(f32, f64);

/// Fitted polynomial over the domain `[1, 2]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialLine {
    /// Coefficients, constant term first
    coeffs: Vec<f64>,
}

impl PolynomialLine {
    /// Fit a polynomial of the given degree through `samples`.
    ///
    /// The degree is reduced to `samples.len() - 1` when there are too few
    /// samples to determine it.
    ///
    /// # Errors
    ///
    /// Returns [`MathError::InvalidArgument`] for an empty sample slice and
    /// propagates [`least_squares_fit`] failures.
    pub fn new<T: PolyValue>(degree: usize, samples: &[T]) -> MathResult<Self> {
        let n = samples.len();
        if n == 0 {
            return Err(MathError::InvalidArgument(
                "polynomial line needs at least one sample".to_string(),
            ));
        }
        let terms = degree.min(n - 1) + 1;

        let mut c = Matrix::new(n, terms);
        for i in 0..n {
            let x = domain_position(i, n);
            let mut p = 1.0;
            for t in 0..terms {
                c[(i, t)] = p;
                p *= x;
            }
        }
        let d: Vec<f64> = samples.iter().map(|s| s.to_f64()).collect();
        let coeffs = least_squares_fit(&c, &d)?;
        Ok(Self { coeffs })
    }

    /// Coefficients, constant term first.
    pub fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }

    /// Effective degree after clamping.
    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    /// Evaluate at a point of the `[1, 2]` domain.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }

    /// Resample into `out` with the default post-processing.
    pub fn output<T: PolyValue>(&self, out: &mut [T]) {
        self.output_with(out, T::from_f64);
    }

    /// Resample into `out`, converting each value with `post`.
    pub fn output_with<T, F>(&self, out: &mut [T], mut post: F)
    where
        F: FnMut(f64) -> T,
    {
        let n = out.len();
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = post(self.evaluate(domain_position(i, n)));
        }
    }
}

#[inline]
fn domain_position(i: usize, n: usize) -> f64 {
    if n <= 1 {
        1.0
    } else {
        1.0 + i as f64 / (n - 1) as f64
    }
}
