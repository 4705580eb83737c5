//! scanfix-core - binary raster storage for scanned page processing
//!
//! This crate provides the data structures every other scanfix crate
//! builds on:
//!
//! - [`BinaryImage`] - Copy-on-write 1bpp image with word-level raster ops
//! - [`RopOp`] / [`RasterTransform`] - Boolean raster operations
//! - [`Rect`] - Integer rectangles for sub-image arguments
//! - [`CancelToken`] - Cooperative cancellation flag
//!
//! # Example
//!
//! ```
//! use scanfix_core::{BWColor, BinaryImage, Rect, RopOp};
//!
//! let mut page = BinaryImage::new(64, 32).unwrap();
//! page.fill_rect(Rect::new(8, 8, 16, 4).unwrap(), BWColor::Black).unwrap();
//!
//! // shift the bar 10 pixels to the right, inside the same image
//! page.rop_within(Rect::new(18, 8, 16, 4).unwrap(), 8, 8, RopOp::Or).unwrap();
//! assert_eq!(page.count_black(), 26 * 4);
//! ```

pub mod cancel;
pub mod error;
pub mod image;
pub mod rect;

pub use cancel::CancelToken;
pub use error::{Error, Result};
pub use image::{
    BWColor, BinaryImage, RasterTransform, RopOp, clear_data_bit, get_data_bit, last_word_mask,
    set_data_bit, set_data_bit_val,
};
pub use rect::Rect;
