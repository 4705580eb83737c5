//! Line bar extraction
//!
//! Closing with a wide flat brick fuses the glyphs of a text line into one
//! bar; opening with a wider and taller brick then removes everything that
//! cannot hold such a bar. The bottom edges of the bars are picked out with
//! a fixed hit-miss pattern: a solid 5x4 block above three empty rows.

use crate::error::DewarpResult;
use crate::types::DewarpOptions;
use scanfix_core::{BWColor, BinaryImage};
use scanfix_morph::{Brick, HitMissPattern, close_brick, hit_miss_match, open_brick};
use tracing::debug;

const BOTTOM_EDGE_WIDTH: u32 = 5;
const BOTTOM_EDGE_HEIGHT: u32 = 7;
const BOTTOM_EDGE: &str = concat!(
    "XXXXX", //
    "XXXXX", //
    "XXXXX", //
    "XXXXX", //
    "     ", //
    "     ", //
    "     ", //
);

/// The bottom-edge pattern, anchored at the middle of the last hit row.
///
/// # Errors
///
/// Never fails for the built-in pattern; the `Result` comes from parsing.
pub fn bottom_edge_pattern() -> DewarpResult<HitMissPattern> {
    Ok(HitMissPattern::parse(
        BOTTOM_EDGE,
        BOTTOM_EDGE_WIDTH,
        BOTTOM_EDGE_HEIGHT,
        Some((2, 3)),
    )?)
}

/// Fuse text lines into solid bars.
///
/// # Errors
///
/// Returns a morphology error for a null image or an empty brick.
pub fn line_bars(src: &BinaryImage, options: &DewarpOptions) -> DewarpResult<BinaryImage> {
    let (cw, ch) = options.close_brick;
    let (ow, oh) = options.open_brick;
    let closer = Brick::from_size(cw, ch)?;
    let opener = Brick::from_size(ow, oh)?;

    let closed = close_brick(src, &closer, src.rect(), BWColor::White)?;
    let opened = open_brick(&closed, &opener, closed.rect(), BWColor::White)?;
    debug!(
        input = src.count_black(),
        closed = closed.count_black(),
        opened = opened.count_black(),
        "line bars"
    );
    Ok(opened)
}

/// Mark the bottom-edge pixels of every bar.
///
/// # Errors
///
/// Returns a morphology error for a null image.
pub fn bottom_points(bars: &BinaryImage) -> DewarpResult<BinaryImage> {
    let pattern = bottom_edge_pattern()?;
    let points = hit_miss_match(bars, BWColor::White, pattern.hits(), pattern.misses())?;
    debug!(points = points.count_black(), "bottom points");
    Ok(points)
}
