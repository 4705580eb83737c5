//! scanfix-region - Connected components and despeckling
//!
//! This crate provides:
//!
//! - [`ConnCompEraser`] - Lazy 4- or 8-connected component enumeration
//! - [`despeckle`] - Removal of components below a resolution-scaled area
//!
//! # Example
//!
//! ```
//! use scanfix_core::{BWColor, BinaryImage, CancelToken, Rect};
//! use scanfix_region::{Connectivity, despeckle_by_area};
//!
//! let mut img = BinaryImage::new(50, 50).unwrap();
//! img.fill_rect(Rect::new(5, 5, 2, 2).unwrap(), BWColor::Black).unwrap();
//! img.fill_rect(Rect::new(20, 20, 10, 10).unwrap(), BWColor::Black).unwrap();
//!
//! let clean = despeckle_by_area(&img, 10, Connectivity::EightWay, &CancelToken::new()).unwrap();
//! assert_eq!(clean.count_black(), 100);
//! ```

pub mod conncomp;
pub mod despeckle;
mod error;

pub use conncomp::{ConnCompEraser, ConnectedComponent, Connectivity, Span};
pub use despeckle::{
    DespeckleLevel, DespeckleOptions, DespeckleThresholds, despeckle, despeckle_by_area,
    despeckle_by_area_in_place, despeckle_in_place,
};
pub use error::{RegionError, RegionResult};
