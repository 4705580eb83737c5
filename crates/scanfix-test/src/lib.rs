//! scanfix-test - Regression test framework for scanfix
//!
//! Provides [`RegParams`], which records value and image comparisons and
//! reports all failures at the end of a test, and in-memory builders for
//! synthetic inputs (hand-drawn pictures, random noise, skewed pages).
//!
//! # Usage
//!
//! ```ignore
//! use scanfix_test::RegParams;
//!
//! let mut rp = RegParams::new("despeckle");
//! rp.compare_values(200.0, count as f64, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "display" to print intermediate images

mod error;
pub mod fixtures;
mod params;

pub use error::{TestError, TestResult};
pub use fixtures::{SkewedPage, picture, random_image, rects_image, to_picture};
pub use params::{RegParams, RegTestMode};
