//! Line tracing over the bottom-point image
//!
//! Points are consumed in column-major order: the scan looks for the
//! leftmost point, topmost among ties, and walks right from it. Each step
//! searches the next `lookahead` columns, nearest column first and nearest
//! row within a column first, up to `vertical_search` rows up or down.
//! Every visited point is erased so no later walk can pick it up again.

use crate::error::DewarpResult;
use crate::types::{DewarpOptions, TracedLine};
use scanfix_core::{BinaryImage, CancelToken, clear_data_bit, get_data_bit};
use tracing::{debug, trace};

/// Trace every line in `points` and keep those spanning at least
/// `min_line_fraction` of the page width.
///
/// The token is polled once per started line.
///
/// # Errors
///
/// Returns a cancelled core error when the token fires, or a solver error
/// from fitting a line.
pub fn trace_lines(
    points: &BinaryImage,
    options: &DewarpOptions,
    cancel: &CancelToken,
) -> DewarpResult<Vec<TracedLine>> {
    let mut work = points.deep_clone();
    let (width, height) = work.size();
    let lookahead = (width / options.lookahead_divisor).max(1);
    let min_extent = (width as f64 * options.min_line_fraction).ceil() as u32;

    let mut lines = Vec::new();
    let mut dropped = 0usize;
    let mut cursor = (0u32, 0u32);

    while let Some(start) = next_start(&work, cursor) {
        cancel.check()?;
        cursor = start;
        let walked = walk_right(&mut work, start, lookahead, options.vertical_search, height);
        let extent = walked.last().map_or(0, |p| p.0 - start.0);
        if extent >= min_extent {
            lines.push(TracedLine::fit(walked)?);
        } else {
            trace!(x = start.0, y = start.1, extent, "short line dropped");
            dropped += 1;
        }
    }

    debug!(kept = lines.len(), dropped, min_extent, "traced lines");
    Ok(lines)
}

/// Leftmost-topmost point at or after `from` in column-major order.
fn next_start(image: &BinaryImage, from: (u32, u32)) -> Option<(u32, u32)> {
    let (width, height) = image.size();
    let (x0, y0) = from;
    for x in x0..width {
        let first_row = if x == x0 { y0 } else { 0 };
        for y in first_row..height {
            if get_data_bit(image.row_data(y), x) != 0 {
                return Some((x, y));
            }
        }
    }
    None
}

fn walk_right(
    image: &mut BinaryImage,
    start: (u32, u32),
    lookahead: u32,
    vertical_search: u32,
    height: u32,
) -> Vec<(u32, u32)> {
    let width = image.width();
    let mut walked = vec![start];
    clear_data_bit(image.row_data_mut(start.1), start.0);

    let (mut x, mut y) = start;
    'walk: loop {
        let last_column = x.saturating_add(lookahead).min(width - 1);
        for nx in x + 1..=last_column {
            for ny in search_rows(y, vertical_search, height) {
                if get_data_bit(image.row_data(ny), nx) != 0 {
                    clear_data_bit(image.row_data_mut(ny), nx);
                    walked.push((nx, ny));
                    (x, y) = (nx, ny);
                    continue 'walk;
                }
            }
        }
        return walked;
    }
}

/// Rows `y, y-1, y+1, y-2, y+2, ...` within `range` and the image.
fn search_rows(y: u32, range: u32, height: u32) -> impl Iterator<Item = u32> {
    let y = y as i64;
    std::iter::once(y)
        .chain((1..=range as i64).flat_map(move |d| [y - d, y + d]))
        .filter(move |&r| r >= 0 && r < height as i64)
        .map(|r| r as u32)
}
