//! Reusable scratch images
//!
//! A brick operation needs a handful of equally sized temporary canvases.
//! [`ImagePool`] hands them out by size and takes them back, so one
//! top-level call allocates each size at most as often as it needs two of
//! them alive at once.

use scanfix_core::{BinaryImage, Result};
use std::collections::HashMap;

/// Pool of scratch images keyed by `(width, height)`.
///
/// Retrieved images have unspecified contents.
#[derive(Debug, Default)]
pub struct ImagePool {
    free: HashMap<(u32, u32), Vec<BinaryImage>>,
    allocations: usize,
}

impl ImagePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take an image of the given size, allocating one if none is free.
    ///
    /// # Errors
    ///
    /// Returns [`scanfix_core::Error::InvalidDimension`] for zero sizes.
    pub fn retrieve_or_create(&mut self, width: u32, height: u32) -> Result<BinaryImage> {
        if let Some(img) = self.free.get_mut(&(width, height)).and_then(Vec::pop) {
            return Ok(img);
        }
        self.allocations += 1;
        BinaryImage::new(width, height)
    }

    /// Give an image back for reuse.
    pub fn retain(&mut self, image: BinaryImage) {
        if image.is_null() {
            return;
        }
        self.free.entry(image.size()).or_default().push(image);
    }

    /// Number of images allocated by this pool so far.
    pub fn allocations(&self) -> usize {
        self.allocations
    }
}
