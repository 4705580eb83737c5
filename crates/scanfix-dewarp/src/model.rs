//! Page model fitting
//!
//! From the traced lines this module derives:
//!
//! 1. Left and right margin lines `x = m0 + m1·y` through the line
//!    endpoints, dropping the worst offending line while any endpoint is
//!    further than the tolerance from its margin.
//! 2. A homographic x-transform mapping the margins onto vertical columns,
//!    anchored on whichever of the top and bottom rows is wider.
//! 3. Meta-polynomials giving each line coefficient as a function of the
//!    line's intercept, so every destination row gets its own curve.

use crate::error::{DewarpError, DewarpResult};
use crate::types::{DewarpOptions, MarginModel, TracedLine};
use scanfix_core::CancelToken;
use scanfix_math::{LevenbergMarquardt, LmModel, Matrix, gauss_jordan, least_squares_fit};
use tracing::{debug, warn};

/// Lines needed for margin fitting.
const MIN_LINES: usize = 2;

/// Relative difference below which the top and bottom spans tie.
const SPAN_TIE: f64 = 1e-9;

/// Build the page model from traced lines.
///
/// Rejected lines are removed from `lines`; on success the survivors are
/// sorted top to bottom.
///
/// # Errors
///
/// Returns [`DewarpError::NotEnoughLines`] when fewer than two lines
/// survive, [`DewarpError::DegenerateModel`] when the margins cross or
/// coincide on the anchor row, and solver errors otherwise.
pub fn build_model(
    lines: &mut Vec<TracedLine>,
    width: u32,
    height: u32,
    options: &DewarpOptions,
    cancel: &CancelToken,
) -> DewarpResult<MarginModel> {
    // fits must not depend on the order lines were traced in
    lines.sort_by(|a, b| a.coefficients()[0].total_cmp(&b.coefficients()[0]));
    let (left, right) = fit_margins(lines, options.margin_tolerance)?;

    let (mut transform, anchor_row) = margin_transform(left, right, height)?;
    if options.refine_transform {
        transform = refine_transform(transform, lines, left, right, anchor_row, options, cancel)?;
    }
    let meta = meta_polynomials(lines)?;

    debug!(
        width,
        lines = lines.len(),
        ?left,
        ?right,
        ?transform,
        anchor_row,
        "page model"
    );
    Ok(MarginModel {
        left,
        right,
        transform,
        anchor_row,
        meta,
    })
}

/// Fit both margins, dropping outlier lines until every endpoint is within
/// `tolerance` pixels of its margin.
///
/// # Errors
///
/// Returns [`DewarpError::NotEnoughLines`] once fewer than two lines remain.
pub fn fit_margins(
    lines: &mut Vec<TracedLine>,
    tolerance: f64,
) -> DewarpResult<([f64; 2], [f64; 2])> {
    loop {
        if lines.len() < MIN_LINES {
            return Err(DewarpError::NotEnoughLines {
                found: lines.len(),
                required: MIN_LINES,
            });
        }
        let lefts: Vec<(f64, f64)> = lines.iter().map(TracedLine::left_end).collect();
        let rights: Vec<(f64, f64)> = lines.iter().map(TracedLine::right_end).collect();
        let left = fit_margin(&lefts)?;
        let right = fit_margin(&rights)?;

        let deviation = |m: [f64; 2], (x, y): (f64, f64)| (x - (m[0] + m[1] * y)).abs();
        let worst = (0..lines.len())
            .map(|i| {
                let dev = deviation(left, lefts[i]).max(deviation(right, rights[i]));
                (i, dev)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match worst {
            Some((i, dev)) if dev > tolerance => {
                warn!(
                    line = i,
                    deviation = dev,
                    tolerance,
                    "margin outlier rejected"
                );
                lines.remove(i);
            }
            _ => return Ok((left, right)),
        }
    }
}

/// Least-squares `x = m0 + m1·y` through `(x, y)` points.
fn fit_margin(points: &[(f64, f64)]) -> DewarpResult<[f64; 2]> {
    let mut c = Matrix::new(points.len(), 2);
    let mut d = Vec::with_capacity(points.len());
    for (i, &(x, y)) in points.iter().enumerate() {
        c[(i, 0)] = 1.0;
        c[(i, 1)] = y;
        d.push(x);
    }
    let m = least_squares_fit(&c, &d)?;
    Ok([m[0], m[1]])
}

/// Solve for `x_src = a0 + a1·x + a2·y + a3·x·y` so that the margins at the
/// top and bottom rows land on the margin columns of the anchor row.
///
/// The anchor is the wider of the two rows; equal spans anchor on row 0.
///
/// # Errors
///
/// Returns [`DewarpError::DegenerateModel`] when the anchor row has no
/// positive width, and a singular-matrix error when the system cannot be
/// solved.
pub fn margin_transform(
    left: [f64; 2],
    right: [f64; 2],
    height: u32,
) -> DewarpResult<([f64; 4], u32)> {
    let eval = |m: [f64; 2], y: f64| m[0] + m[1] * y;
    let bottom = height.saturating_sub(1);
    let rows = [0.0, bottom as f64];
    let top_width = eval(right, rows[0]) - eval(left, rows[0]);
    let bottom_width = eval(right, rows[1]) - eval(left, rows[1]);
    let tie =
        (top_width - bottom_width).abs() <= SPAN_TIE * top_width.abs().max(bottom_width.abs());
    let anchor_row = if tie || top_width > bottom_width { 0 } else { bottom };

    let xl = eval(left, anchor_row as f64);
    let xr = eval(right, anchor_row as f64);
    let span = xr - xl;
    if span.is_nan() || span <= 0.0 {
        return Err(DewarpError::DegenerateModel(format!(
            "margins at row {} span {:.2}..{:.2}",
            anchor_row, xl, xr
        )));
    }

    let mut a = Matrix::new(4, 4);
    let mut b = [0.0; 4];
    let mut row = 0;
    for &y in &rows {
        for (x_dst, margin) in [(xl, left), (xr, right)] {
            a.row_mut(row).copy_from_slice(&[1.0, x_dst, y, x_dst * y]);
            b[row] = eval(margin, y);
            row += 1;
        }
    }
    let t = gauss_jordan(&a, &b)?;
    Ok(([t[0], t[1], t[2], t[3]], anchor_row))
}

/// Line endpoint as seen by the transform: the destination column it must
/// map from, and its source position.
struct EndpointSample {
    x_dst: f64,
    y_src: f64,
}

struct HomographicX;

impl LmModel for HomographicX {
    type Input = EndpointSample;

    fn value(&self, s: &EndpointSample, p: &[f64]) -> f64 {
        p[0] + p[1] * s.x_dst + p[2] * s.y_src + p[3] * s.x_dst * s.y_src
    }

    fn gradient(&self, s: &EndpointSample, _p: &[f64], grad: &mut [f64]) {
        grad.copy_from_slice(&[1.0, s.x_dst, s.y_src, s.x_dst * s.y_src]);
    }
}

/// Refit the transform against every surviving endpoint instead of only
/// the margin lines at two rows.
fn refine_transform(
    initial: [f64; 4],
    lines: &[TracedLine],
    left: [f64; 2],
    right: [f64; 2],
    anchor_row: u32,
    options: &DewarpOptions,
    cancel: &CancelToken,
) -> DewarpResult<[f64; 4]> {
    let y = anchor_row as f64;
    let xl = left[0] + left[1] * y;
    let xr = right[0] + right[1] * y;

    let mut inputs = Vec::with_capacity(lines.len() * 2);
    let mut targets = Vec::with_capacity(lines.len() * 2);
    for line in lines {
        for (x_dst, (x_src, y_src)) in [(xl, line.left_end()), (xr, line.right_end())] {
            inputs.push(EndpointSample { x_dst, y_src });
            targets.push(x_src);
        }
    }

    let lm = LevenbergMarquardt::new(options.lm.clone());
    let outcome = lm.fit(&HomographicX, &inputs, &targets, None, &initial, cancel)?;
    if outcome.params.iter().any(|v| !v.is_finite()) {
        warn!(params = ?outcome.params, "refinement diverged, keeping margin transform");
        return Ok(initial);
    }
    debug!(
        iterations = outcome.iterations,
        error = outcome.error,
        lambda = outcome.lambda,
        "transform refined"
    );
    Ok([
        outcome.params[0],
        outcome.params[1],
        outcome.params[2],
        outcome.params[3],
    ])
}

/// Fit every line coefficient as a polynomial in the line intercept `c0`.
///
/// The degree is two, or lower when there are fewer than three lines.
///
/// # Errors
///
/// Returns a solver error when intercepts coincide.
pub fn meta_polynomials(lines: &[TracedLine]) -> DewarpResult<[[f64; 3]; 3]> {
    if lines.is_empty() {
        return Err(DewarpError::NotEnoughLines {
            found: 0,
            required: MIN_LINES,
        });
    }
    let terms = lines.len().min(3);
    let mut c = Matrix::new(lines.len(), terms);
    for (i, line) in lines.iter().enumerate() {
        let c0 = line.coefficients()[0];
        let mut p = 1.0;
        for t in 0..terms {
            c[(i, t)] = p;
            p *= c0;
        }
    }

    let mut meta = [[0.0; 3]; 3];
    for (k, row) in meta.iter_mut().enumerate() {
        let d: Vec<f64> = lines.iter().map(|l| l.coefficients()[k]).collect();
        let fitted = least_squares_fit(&c, &d)?;
        row[..terms].copy_from_slice(&fitted);
    }
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Straight line from `(x0, y0)` to `(x1, y0 + slope·(x1 - x0))`.
    fn straight(x0: u32, x1: u32, y0: f64, slope: f64) -> TracedLine {
        let pts = (x0..=x1)
            .map(|x| (x, (y0 + slope * (x - x0) as f64).round() as u32))
            .collect();
        TracedLine::fit(pts).unwrap()
    }

    #[test]
    fn test_margins_through_endpoints() {
        let mut lines = vec![
            straight(100, 500, 50.0, 0.0),
            straight(90, 490, 150.0, 0.0),
            straight(80, 480, 250.0, 0.0),
        ];
        let (left, right) = fit_margins(&mut lines, 8.0).unwrap();
        assert_eq!(lines.len(), 3);
        assert!((left[1] + 0.1).abs() < 1e-6);
        assert!((left[0] - 105.0).abs() < 1e-4);
        assert!((right[1] + 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_outlier_line_rejected() {
        let mut lines = vec![
            straight(100, 500, 50.0, 0.0),
            straight(100, 500, 150.0, 0.0),
            straight(160, 500, 200.0, 0.0),
            straight(100, 500, 250.0, 0.0),
        ];
        let (left, _) = fit_margins(&mut lines, 8.0).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.leftmost().0 == 100));
        assert!((left[0] - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_not_enough_lines() {
        let mut lines = vec![straight(0, 400, 10.0, 0.0)];
        assert!(matches!(
            fit_margins(&mut lines, 8.0),
            Err(DewarpError::NotEnoughLines { found: 1, required: 2 })
        ));
    }

    #[test]
    fn test_transform_for_slanted_margins() {
        let m1 = -0.1;
        let left = [100.0, m1];
        let right = [500.0, m1];
        let (t, anchor) = margin_transform(left, right, 400).unwrap();
        assert_eq!(anchor, 0);
        assert!(t[0].abs() < 1e-6);
        assert!((t[1] - 1.0).abs() < 1e-9);
        assert!((t[2] - m1).abs() < 1e-9);
        assert!(t[3].abs() < 1e-9);
    }

    #[test]
    fn test_transform_anchors_on_wider_row() {
        // margins converge towards the top
        let left = [120.0, -0.05];
        let right = [480.0, 0.05];
        let (t, anchor) = margin_transform(left, right, 401).unwrap();
        assert_eq!(anchor, 400);
        // the anchor row maps onto itself
        for x in [100.0, 300.0, 500.0] {
            let x_src = t[0] + t[1] * x + t[2] * 400.0 + t[3] * x * 400.0;
            assert!((x_src - x).abs() < 1e-6);
        }
        // the top-row margins come from the anchor's margin columns
        let top_left = t[0] + t[1] * 100.0;
        assert!((top_left - 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_transform_degenerate() {
        assert!(matches!(
            margin_transform([300.0, 0.0], [300.0, 0.0], 100),
            Err(DewarpError::DegenerateModel(_))
        ));
    }

    #[test]
    fn test_meta_polynomials_identity_intercept() {
        let lines = vec![
            straight(0, 400, 20.0, 0.05),
            straight(0, 400, 120.0, 0.06),
            straight(0, 400, 220.0, 0.07),
        ];
        let meta = meta_polynomials(&lines).unwrap();
        // c0 as a function of c0
        assert!(meta[0][0].abs() < 1e-6);
        assert!((meta[0][1] - 1.0).abs() < 1e-7);
        // slope grows by about 0.01 per 100 rows
        let slope_at = |y: f64| meta[1][0] + meta[1][1] * y + meta[1][2] * y * y;
        assert!((slope_at(170.0) - 0.065).abs() < 2e-3);
    }

    #[test]
    fn test_build_model_sorts_and_refines() {
        let mut lines = vec![
            straight(80, 480, 250.0, 0.02),
            straight(100, 500, 50.0, 0.02),
            straight(90, 490, 150.0, 0.02),
        ];
        let opts = DewarpOptions::default();
        let model = build_model(&mut lines, 600, 400, &opts, &CancelToken::new()).unwrap();
        assert!(lines[0].leftmost().1 < lines[1].leftmost().1);
        assert!(lines[1].leftmost().1 < lines[2].leftmost().1);
        assert!((model.transform[1] - 1.0).abs() < 0.01);
        assert!((model.left[1] + 0.1).abs() < 0.01);

        let unrefined = build_model(
            &mut lines.clone(),
            600,
            400,
            &opts.clone().with_refine_transform(false),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(model.anchor_row, unrefined.anchor_row);
        for (a, b) in model.transform.iter().zip(unrefined.transform) {
            assert!((a - b).abs() < 1e-3 * b.abs().max(1.0));
        }
    }

    #[test]
    fn test_parallel_margins_anchor_on_top_row() {
        let (t, anchor) = margin_transform([100.0, -0.1], [500.0 + 1e-12, -0.1], 400).unwrap();
        assert_eq!(anchor, 0);
        assert!(t[0].abs() < 1e-6);

        let mut lines = vec![
            straight(100, 500, 50.0, 0.02),
            straight(90, 490, 150.0, 0.02),
            straight(80, 480, 250.0, 0.02),
        ];
        let opts = DewarpOptions::default();
        let model = build_model(&mut lines, 600, 400, &opts, &CancelToken::new()).unwrap();
        assert_eq!(model.anchor_row, 0);
        assert!(model.transform[0].abs() < 1e-3);
    }

    #[test]
    fn test_build_model_ignores_line_order() {
        let lines = [
            straight(100, 500, 50.0, 0.02),
            straight(90, 490, 150.0, 0.02),
            straight(80, 480, 250.0, 0.02),
        ];
        let opts = DewarpOptions::default().with_refine_transform(false);
        let cancel = CancelToken::new();
        let mut models = Vec::new();
        for order in [[0, 1, 2], [2, 0, 1], [1, 2, 0], [2, 1, 0]] {
            let mut shuffled: Vec<TracedLine> = order.iter().map(|&i| lines[i].clone()).collect();
            models.push(build_model(&mut shuffled, 600, 400, &opts, &cancel).unwrap());
        }
        for model in &models[1..] {
            assert_eq!(model.anchor_row, models[0].anchor_row);
            assert_eq!(model.transform, models[0].transform);
            assert_eq!(model.left, models[0].left);
            assert_eq!(model.right, models[0].right);
        }
    }
}
