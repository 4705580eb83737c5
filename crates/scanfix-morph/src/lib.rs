//! scanfix-morph - Morphological operations on binary images
//!
//! This crate provides:
//!
//! - [`Brick`] - Rectangular structuring elements with an explicit origin
//! - Brick dilation, erosion, opening and closing with declared
//!   surroundings, computed by separable O(log n) doubling passes
//! - Hit-miss matching and pattern-driven replacement
//! - [`ImagePool`] - Scratch image reuse for the brick passes
//!
//! # Example
//!
//! ```
//! use scanfix_core::{BWColor, BinaryImage, Rect};
//! use scanfix_morph::{Brick, close_brick};
//!
//! let mut img = BinaryImage::new(40, 10).unwrap();
//! img.fill_rect(Rect::new(5, 4, 10, 2).unwrap(), BWColor::Black).unwrap();
//! img.fill_rect(Rect::new(18, 4, 10, 2).unwrap(), BWColor::Black).unwrap();
//!
//! // a 5-wide brick bridges the 3-pixel gap
//! let brick = Brick::from_size(5, 1).unwrap();
//! let closed = close_brick(&img, &brick, img.rect(), BWColor::White).unwrap();
//! assert_eq!(closed.count_black(), 23 * 2);
//! ```

pub mod binary;
pub mod brick;
mod error;
pub mod hitmiss;
pub mod pool;

pub use binary::{close_brick, dilate_brick, erode_brick, open_brick};
pub use brick::Brick;
pub use error::{MorphError, MorphResult};
pub use hitmiss::{HitMissPattern, Offset, hit_miss_match, hit_miss_replace};
pub use pool::ImagePool;
