//! scanfix-math - Numeric solvers for page geometry
//!
//! This crate provides:
//!
//! - [`Matrix`] - Dense row-major `f64` matrix
//! - [`LuDecomposition`] - Pivoted LU factorization and solve
//! - [`gauss_jordan`] - Small square systems
//! - [`least_squares_fit`] - Overdetermined systems via Givens rotations
//! - [`PolynomialLine`] - Polynomial fit through evenly spaced samples
//! - [`LevenbergMarquardt`] - Nonlinear least squares with analytic gradients
//!
//! # Example
//!
//! ```
//! use scanfix_math::{LuDecomposition, Matrix};
//!
//! let a = Matrix::from_rows(&[[1.0, 1.0, 1.0], [2.0, 4.0, -3.0], [3.0, 6.0, -5.0]]).unwrap();
//! let x = LuDecomposition::new(&a).unwrap().solve_vec(&[9.0, 1.0, 0.0]).unwrap();
//! assert!((x[0] - 7.0).abs() < 1e-9);
//! ```

mod error;
pub mod lm;
pub mod lsq;
pub mod lu;
pub mod matrix;
pub mod polyline;

pub use error::{MathError, MathResult};
pub use lm::{LevenbergMarquardt, LmModel, LmOptions, LmOutcome};
pub use lsq::least_squares_fit;
pub use lu::{LuDecomposition, gauss_jordan};
pub use matrix::Matrix;
pub use polyline::{PolyValue, PolynomialLine};
