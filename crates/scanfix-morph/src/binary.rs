//! Brick morphology on binary images
//!
//! Dilation ORs together copies of the source shifted by every offset of
//! a [`Brick`]; erosion ANDs them:
//!
//! ```text
//! dilate(q) = OR  { src(q - b) : b in brick }
//! erode(q)  = AND { src(q - b) : b in brick }
//! ```
//!
//! Pixels outside the source read as the caller-declared surroundings
//! color. Opening and closing pair an operation with its counterpart over
//! the flipped brick.
//!
//! A rectangular brick is separable, so every operation is one horizontal
//! and one vertical pass. Each pass is a forward window of `n` steps that
//! is built by doubling: `W(2m)(x) = W(m)(x) op W(m)(x + m)`, plus one
//! raw step when `n` is odd. That is O(log n) raster operations per pass
//! instead of O(n).

use crate::pool::ImagePool;
use crate::{Brick, MorphError, MorphResult};
use scanfix_core::{BWColor, BinaryImage, Rect, RopOp};
use tracing::{debug, trace};

/// Window lengths up to this many steps are combined one shift at a time.
const DOUBLING_THRESHOLD: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BrickOp {
    Dilate,
    Erode,
}

impl BrickOp {
    fn rop(self) -> RopOp {
        match self {
            BrickOp::Dilate => RopOp::Or,
            BrickOp::Erode => RopOp::And,
        }
    }

    /// The surroundings color the operation cannot change.
    fn neutral(self) -> BWColor {
        match self {
            BrickOp::Dilate => BWColor::White,
            BrickOp::Erode => BWColor::Black,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Dilate `src` by `brick`.
///
/// # Arguments
///
/// * `src` - Source image
/// * `brick` - Structuring element
/// * `dst_area` - Area to compute, in source coordinates; may extend past
///   the source. The result has this area's size.
/// * `surroundings` - Color of the pixels outside the source
///
/// # Errors
///
/// Returns [`MorphError::Core`] for a null source and
/// [`MorphError::InvalidParameters`] for an empty `dst_area`.
pub fn dilate_brick(
    src: &BinaryImage,
    brick: &Brick,
    dst_area: Rect,
    surroundings: BWColor,
) -> MorphResult<BinaryImage> {
    brick_op(src, brick, dst_area, surroundings, BrickOp::Dilate)
}

/// Erode `src` by `brick`.
///
/// Arguments and errors are the same as for [`dilate_brick`].
pub fn erode_brick(
    src: &BinaryImage,
    brick: &Brick,
    dst_area: Rect,
    surroundings: BWColor,
) -> MorphResult<BinaryImage> {
    brick_op(src, brick, dst_area, surroundings, BrickOp::Erode)
}

/// Open `src` with `brick`: erode by `brick`, then dilate by the flipped
/// brick.
///
/// When the brick is wider or taller than the source nothing can survive
/// the erosion, and the result is `dst_area` filled with `surroundings`.
///
/// # Errors
///
/// Same as [`dilate_brick`].
pub fn open_brick(
    src: &BinaryImage,
    brick: &Brick,
    dst_area: Rect,
    surroundings: BWColor,
) -> MorphResult<BinaryImage> {
    compound_op(src, brick, dst_area, surroundings, BrickOp::Erode)
}

/// Close `src` with `brick`: dilate by `brick`, then erode by the flipped
/// brick.
///
/// When the brick is wider or taller than the source the result is
/// `dst_area` filled with `surroundings`.
///
/// # Errors
///
/// Same as [`dilate_brick`].
pub fn close_brick(
    src: &BinaryImage,
    brick: &Brick,
    dst_area: Rect,
    surroundings: BWColor,
) -> MorphResult<BinaryImage> {
    compound_op(src, brick, dst_area, surroundings, BrickOp::Dilate)
}

fn check_args(src: &BinaryImage, dst_area: &Rect) -> MorphResult<()> {
    if src.is_null() {
        return Err(scanfix_core::Error::NullImage("brick morphology").into());
    }
    if dst_area.is_empty() {
        return Err(MorphError::InvalidParameters(format!(
            "empty destination area {}x{}",
            dst_area.w, dst_area.h
        )));
    }
    Ok(())
}

fn compound_op(
    src: &BinaryImage,
    brick: &Brick,
    dst_area: Rect,
    surroundings: BWColor,
    first: BrickOp,
) -> MorphResult<BinaryImage> {
    check_args(src, &dst_area)?;
    if brick.width() > src.width() || brick.height() > src.height() {
        debug!(
            brick_width = brick.width(),
            brick_height = brick.height(),
            width = src.width(),
            height = src.height(),
            "brick larger than image, filling with surroundings"
        );
        return Ok(BinaryImage::new_filled(
            dst_area.w as u32,
            dst_area.h as u32,
            surroundings,
        )?);
    }

    // the second pass reads the intermediate image at q + b for every b in
    // the brick, so compute it over dst_area grown by the brick
    let tmp_area = dst_area.adjusted(
        -brick.min_x(),
        -brick.min_y(),
        brick.max_x(),
        brick.max_y(),
    );
    let second = match first {
        BrickOp::Dilate => BrickOp::Erode,
        BrickOp::Erode => BrickOp::Dilate,
    };
    let tmp = brick_op(src, brick, tmp_area, surroundings, first)?;
    let area_in_tmp = dst_area.translated(-tmp_area.x, -tmp_area.y);
    brick_op(&tmp, &brick.flipped(), area_in_tmp, surroundings, second)
}

fn brick_op(
    src: &BinaryImage,
    brick: &Brick,
    dst_area: Rect,
    surroundings: BWColor,
    op: BrickOp,
) -> MorphResult<BinaryImage> {
    check_args(src, &dst_area)?;
    let mut dst = BinaryImage::new_filled(dst_area.w as u32, dst_area.h as u32, surroundings)?;

    // Outside `relevant` every destination pixel equals the surroundings.
    // With neutral surroundings that is everything the brick cannot reach
    // from the source; otherwise it is everything whose window leaves it.
    let src_rect = src.rect();
    let relevant = if surroundings == op.neutral() {
        src_rect.adjusted(-brick.min_x(), -brick.min_y(), brick.max_x(), brick.max_y())
    } else {
        src_rect.adjusted(-brick.max_x(), -brick.max_y(), brick.min_x(), brick.min_y())
    };
    let Some(area) = relevant.intersect(&dst_area) else {
        trace!(?op, "destination outside the affected area");
        return Ok(dst);
    };

    // source pixels feeding `area`, padded with the surroundings
    let canvas_rect = area.adjusted(brick.max_x(), brick.max_y(), -brick.min_x(), -brick.min_y());
    let mut pool = ImagePool::new();
    let mut canvas = pool.retrieve_or_create(canvas_rect.w as u32, canvas_rect.h as u32)?;
    canvas.fill(surroundings);
    if let Some(inside) = canvas_rect.intersect(&src_rect) {
        canvas.rop(
            inside.translated(-canvas_rect.x, -canvas_rect.y),
            src,
            inside.x,
            inside.y,
            RopOp::Src,
        )?;
    }

    let rop = op.rop();
    let mut current = canvas;
    for (axis, steps) in [
        (Axis::Horizontal, brick.width()),
        (Axis::Vertical, brick.height()),
    ] {
        if steps < 2 {
            continue;
        }
        let mut tmp = pool.retrieve_or_create(current.width(), current.height())?;
        spread(&current, &mut tmp, steps, axis, rop)?;
        pool.retain(std::mem::replace(&mut current, tmp));
    }
    trace!(
        ?op,
        brick_width = brick.width(),
        brick_height = brick.height(),
        allocations = pool.allocations(),
        "brick pass done"
    );

    // current(0, 0) now holds the value for area's top-left pixel
    dst.rop(
        area.translated(-dst_area.x, -dst_area.y),
        &current,
        0,
        0,
        RopOp::Src,
    )?;
    Ok(dst)
}

/// Forward window along `axis`:
/// `tmp(p) = op { src(p + k * axis) : 0 <= k < steps }`.
///
/// Valid wherever `p + (steps - 1) * axis` lies inside the image; pixels
/// nearer the far edge hold partial results.
fn spread(
    src: &BinaryImage,
    tmp: &mut BinaryImage,
    steps: u32,
    axis: Axis,
    op: RopOp,
) -> MorphResult<()> {
    if steps <= DOUBLING_THRESHOLD {
        tmp.rop(tmp.rect(), src, 0, 0, RopOp::Src)?;
        for k in 1..steps {
            combine_shifted(tmp, Some(src), k, axis, op)?;
        }
        return Ok(());
    }

    let half = steps / 2;
    spread(src, tmp, half, axis, op)?;
    combine_shifted(tmp, None, half, axis, op)?;
    if steps % 2 == 1 {
        combine_shifted(tmp, Some(src), steps - 1, axis, op)?;
    }
    Ok(())
}

/// `dst(p) = dst(p) op from(p + shift * axis)`, where `from` is `dst`
/// itself when `None`.
fn combine_shifted(
    dst: &mut BinaryImage,
    from: Option<&BinaryImage>,
    shift: u32,
    axis: Axis,
    op: RopOp,
) -> MorphResult<()> {
    let (w, h) = (dst.width() as i32, dst.height() as i32);
    let shift = shift as i32;
    let (rect, sx, sy) = match axis {
        Axis::Horizontal => (Rect::new_unchecked(0, 0, w - shift, h), shift, 0),
        Axis::Vertical => (Rect::new_unchecked(0, 0, w, h - shift), 0, shift),
    };
    if rect.is_empty() {
        return Ok(());
    }
    match from {
        Some(src) => dst.rop(rect, src, sx, sy, op)?,
        None => dst.rop_within(rect, sx, sy, op)?,
    }
    Ok(())
}
