//! Hit-miss pattern matching and replacement
//!
//! A pixel matches when every "hit" offset relative to it is black and
//! every "miss" offset is white. Patterns can be written as a grid of
//! characters:
//!
//! | char | meaning                                   |
//! |------|-------------------------------------------|
//! | `X`  | hit                                       |
//! | ` `  | miss                                      |
//! | `?`  | don't care                                |
//! | `-`  | hit, cleared by [`hit_miss_replace`]      |
//! | `+`  | miss, set by [`hit_miss_replace`]         |

use crate::{MorphError, MorphResult};
use scanfix_core::{BWColor, BinaryImage, Rect, RopOp};

/// Offset relative to the pattern origin.
pub type Offset = (i32, i32);

/// Parsed hit-miss pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitMissPattern {
    width: u32,
    height: u32,
    origin: (u32, u32),
    hits: Vec<Offset>,
    misses: Vec<Offset>,
    set_on_match: Vec<Offset>,
    clear_on_match: Vec<Offset>,
}

impl HitMissPattern {
    /// Parse a pattern grid given in row-major order.
    ///
    /// # Arguments
    ///
    /// * `pattern` - Exactly `width * height` characters from `X ?-+`
    /// * `width`, `height` - Grid size
    /// * `origin` - Grid cell the offsets are relative to. Defaults to the
    ///   first `-` or `+` in row-major order, else the top-left cell.
    ///
    /// # Errors
    ///
    /// Returns [`MorphError::InvalidPattern`] for a wrong length, an unknown
    /// character, or an origin outside the grid.
    pub fn parse(
        pattern: &str,
        width: u32,
        height: u32,
        origin: Option<(u32, u32)>,
    ) -> MorphResult<Self> {
        let cells: Vec<char> = pattern.chars().collect();
        let expected = width as usize * height as usize;
        if width == 0 || height == 0 || cells.len() != expected {
            return Err(MorphError::InvalidPattern(format!(
                "expected {}x{} = {} characters, got {}",
                width,
                height,
                expected,
                cells.len()
            )));
        }
        if let Some(bad) = cells.iter().find(|c| !matches!(c, 'X' | ' ' | '?' | '-' | '+')) {
            return Err(MorphError::InvalidPattern(format!(
                "unexpected character {:?}",
                bad
            )));
        }

        let origin = match origin {
            Some((ox, oy)) if ox >= width || oy >= height => {
                return Err(MorphError::InvalidPattern(format!(
                    "origin ({}, {}) outside a {}x{} pattern",
                    ox, oy, width, height
                )));
            }
            Some(o) => o,
            None => cells
                .iter()
                .position(|&c| c == '-' || c == '+')
                .map_or((0, 0), |i| (i as u32 % width, i as u32 / width)),
        };

        let mut parsed = Self {
            width,
            height,
            origin,
            hits: Vec::new(),
            misses: Vec::new(),
            set_on_match: Vec::new(),
            clear_on_match: Vec::new(),
        };
        for (i, &c) in cells.iter().enumerate() {
            let offset = (
                (i as u32 % width) as i32 - origin.0 as i32,
                (i as u32 / width) as i32 - origin.1 as i32,
            );
            match c {
                'X' => parsed.hits.push(offset),
                ' ' => parsed.misses.push(offset),
                '-' => {
                    parsed.hits.push(offset);
                    parsed.clear_on_match.push(offset);
                }
                '+' => {
                    parsed.misses.push(offset);
                    parsed.set_on_match.push(offset);
                }
                _ => {}
            }
        }
        Ok(parsed)
    }

    /// Grid width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Grid cell the offsets are relative to.
    pub fn origin(&self) -> (u32, u32) {
        self.origin
    }

    /// Offsets that must be black, including `-` cells.
    pub fn hits(&self) -> &[Offset] {
        &self.hits
    }

    /// Offsets that must be white, including `+` cells.
    pub fn misses(&self) -> &[Offset] {
        &self.misses
    }

    /// Offsets painted black on a match (`+`).
    pub fn set_on_match(&self) -> &[Offset] {
        &self.set_on_match
    }

    /// Offsets painted white on a match (`-`).
    pub fn clear_on_match(&self) -> &[Offset] {
        &self.clear_on_match
    }
}

/// Mark every pixel whose hit offsets are all black and miss offsets all
/// white.
///
/// Offsets falling outside the image read as `surroundings`: with white
/// surroundings a hit outside never matches, with black surroundings a
/// miss outside never matches. Without any offsets every pixel matches.
///
/// # Errors
///
/// Returns [`MorphError::Core`] for a null source.
pub fn hit_miss_match(
    src: &BinaryImage,
    surroundings: BWColor,
    hits: &[Offset],
    misses: &[Offset],
) -> MorphResult<BinaryImage> {
    if src.is_null() {
        return Err(scanfix_core::Error::NullImage("hit_miss_match").into());
    }
    let mut dst = BinaryImage::new_filled(src.width(), src.height(), BWColor::Black)?;
    let offsets = hits
        .iter()
        .map(|&o| (o, true))
        .chain(misses.iter().map(|&o| (o, false)));

    for (i, ((dx, dy), is_hit)) in offsets.enumerate() {
        // value of the probe where it falls outside the image
        let outside_matches = is_hit == (surroundings == BWColor::Black);
        let valid = shifted_overlap(src, -dx, -dy);

        if i == 0 {
            dst.fill(BWColor::from_bit(outside_matches as u32));
            if let Some(rect) = valid {
                let op = if is_hit { RopOp::Src } else { RopOp::NotSrc };
                dst.rop(rect, src, rect.x + dx, rect.y + dy, op)?;
            }
            continue;
        }

        match valid {
            Some(rect) => {
                let op = if is_hit { RopOp::And } else { RopOp::Subtract };
                dst.rop(rect, src, rect.x + dx, rect.y + dy, op)?;
                if !outside_matches {
                    dst.fill_except(rect, BWColor::White)?;
                }
            }
            None if !outside_matches => dst.fill(BWColor::White),
            None => {}
        }
    }
    Ok(dst)
}

/// Apply a pattern in place: find matches, then paint the match image
/// black at every `+` offset and white at every `-` offset.
///
/// # Errors
///
/// Returns [`MorphError::Core`] for a null image.
pub fn hit_miss_replace(
    image: &mut BinaryImage,
    surroundings: BWColor,
    pattern: &HitMissPattern,
) -> MorphResult<()> {
    let matches = hit_miss_match(image, surroundings, pattern.hits(), pattern.misses())?;

    for &(dx, dy) in pattern.set_on_match() {
        if let Some(rect) = shifted_overlap(image, dx, dy) {
            image.rop(rect, &matches, rect.x - dx, rect.y - dy, RopOp::Or)?;
        }
    }
    for &(dx, dy) in pattern.clear_on_match() {
        if let Some(rect) = shifted_overlap(image, dx, dy) {
            image.rop(rect, &matches, rect.x - dx, rect.y - dy, RopOp::Subtract)?;
        }
    }
    Ok(())
}

/// Part of the image that stays inside after shifting it by `(dx, dy)`,
/// in the shifted position.
fn shifted_overlap(image: &BinaryImage, dx: i32, dy: i32) -> Option<Rect> {
    image.rect().translated(dx, dy).intersect(&image.rect())
}
