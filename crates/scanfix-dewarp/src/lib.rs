//! scanfix-dewarp - Text-line based page dewarping
//!
//! Straightens scanned pages whose text lines curve or lean, using the text
//! lines themselves as the only reference.
//!
//! # Overview
//!
//! Dewarping works by:
//! 1. Fusing the glyphs of each text line into a solid bar
//! 2. Marking the bottom edges of the bars with a hit-miss pattern
//! 3. Tracing the edges into lines and fitting a quadratic to each
//! 4. Fitting left and right margin lines through the line endpoints
//! 5. Deriving a margin transform and per-row curvature polynomials
//! 6. Resampling the page through the inverse mapping
//!
//! # Example
//!
//! ```
//! use scanfix_core::{BinaryImage, CancelToken};
//! use scanfix_dewarp::{DewarpError, DewarpOptions, dewarp};
//!
//! let page = BinaryImage::new(400, 300).unwrap();
//! match dewarp(&page, &DewarpOptions::default(), &CancelToken::new()) {
//!     Ok(out) => assert_eq!(out.image.size(), page.size()),
//!     // a blank page has no lines to go by
//!     Err(e) => assert!(matches!(e, DewarpError::NotEnoughLines { found: 0, .. })),
//! }
//! ```
//!
//! When [`DewarpError::is_recoverable`] holds, the page itself is fine and
//! callers usually keep the input unchanged.

pub mod apply;
mod error;
pub mod model;
pub mod preprocess;
pub mod trace;
mod types;

pub use apply::resample;
pub use error::{DewarpError, DewarpResult};
pub use model::build_model;
pub use preprocess::{bottom_edge_pattern, bottom_points, line_bars};
pub use trace::trace_lines;
pub use types::{DebugImages, DewarpOptions, DewarpOutput, MarginModel, TracedLine};

use scanfix_core::{BinaryImage, CancelToken};
use tracing::{debug, instrument};

/// Dewarp one page.
///
/// The output image has the size of `src`; pixels are read from `src`
/// itself, the morphological passes only serve line detection.
///
/// # Errors
///
/// Returns [`DewarpError::InvalidParameters`] for bad options,
/// [`DewarpError::NotEnoughLines`] or [`DewarpError::DegenerateModel`]
/// when no model can be built, solver and core errors from the stages, and
/// a cancelled error when `cancel` fires.
#[instrument(skip_all, fields(width = src.width(), height = src.height()))]
pub fn dewarp(
    src: &BinaryImage,
    options: &DewarpOptions,
    cancel: &CancelToken,
) -> DewarpResult<DewarpOutput> {
    options.validate()?;
    if src.is_null() {
        return Err(scanfix_core::Error::NullImage("dewarp").into());
    }
    let (width, height) = src.size();

    let bars = line_bars(src, options)?;
    cancel.check()?;
    let points = bottom_points(&bars)?;
    let mut lines = trace_lines(&points, options, cancel)?;
    let model = build_model(&mut lines, width, height, options, cancel)?;
    let (image, skipped_pixels) = resample(src, &model, cancel)?;

    debug!(lines = lines.len(), skipped_pixels, "dewarp done");
    let debug = options
        .collect_debug_images
        .then(|| DebugImages { lines: bars, points });
    Ok(DewarpOutput {
        image,
        model,
        lines,
        skipped_pixels,
        debug,
    })
}
