//! scanfix - Binary raster engine for scanned pages
//!
//! # Overview
//!
//! scanfix post-processes 1-bit scans:
//!
//! - Bit-packed binary images with word-level raster operations
//! - Morphological operations (dilation, erosion, opening, closing, hit-miss)
//! - Speck removal by connected-component area
//! - Least-squares and Levenberg-Marquardt solvers
//! - Text-line based page dewarping
//!
//! # Example
//!
//! ```
//! use scanfix::{BWColor, BinaryImage, CancelToken, Rect};
//! use scanfix::region::{DespeckleOptions, despeckle};
//!
//! let mut page = BinaryImage::new(200, 100).unwrap();
//! page.fill_rect(Rect::new(20, 20, 120, 10).unwrap(), BWColor::Black).unwrap();
//! page.set_pixel(180, 80, BWColor::Black).unwrap();
//!
//! let clean = despeckle(&page, &DespeckleOptions::default(), &CancelToken::new()).unwrap();
//! assert_eq!(clean.count_black(), 1200);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use scanfix_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use scanfix_dewarp as dewarp;
pub use scanfix_math as math;
pub use scanfix_morph as morph;
pub use scanfix_region as region;
