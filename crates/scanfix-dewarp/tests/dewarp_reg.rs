//! Dewarp regression test
//!
//! A 600x520 page carrying two parallel text bars skewed by 5 degrees. The
//! second bar is the first moved by an integer offset of (-37, +420), so
//! both margins must come out with a slope of exactly -37/420 and the
//! margin transform must reduce to a pure shear. A short vertical stroke
//! between the bars must come out vertical within a pixel.
//!
//! Run with:
//! ```
//! cargo test -p scanfix-dewarp --test dewarp_reg
//! ```

use scanfix_core::{BWColor, BinaryImage, CancelToken, Rect};
use scanfix_dewarp::{DewarpError, DewarpOptions, build_model, dewarp};
use scanfix_test::{RegParams, SkewedPage};

const WIDTH: u32 = 600;
const HEIGHT: u32 = 520;
const SHIFT_X: f64 = -37.0;
const SHIFT_Y: f64 = 420.0;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn skewed_page() -> BinaryImage {
    let top = SkewedPage::new(WIDTH, HEIGHT, 5.0)
        .with_center(60.0, 20.0)
        .bar(0.0, 460.0, 0.0, 14.0)
        .bar(200.0, 205.0, 100.0, 330.0)
        .build()
        .expect("top bar");
    let bottom = SkewedPage::new(WIDTH, HEIGHT, 5.0)
        .with_center(60.0 + SHIFT_X, 20.0 + SHIFT_Y)
        .bar(0.0, 460.0, 0.0, 14.0)
        .build()
        .expect("bottom bar");
    top.or(&bottom).expect("page")
}

/// Least-squares slope of `x` against `y`.
fn slope(samples: &[(f64, f64)]) -> f64 {
    let n = samples.len() as f64;
    let my = samples.iter().map(|s| s.1).sum::<f64>() / n;
    let mx = samples.iter().map(|s| s.0).sum::<f64>() / n;
    let sxy: f64 = samples.iter().map(|s| (s.1 - my) * (s.0 - mx)).sum();
    let syy: f64 = samples.iter().map(|s| (s.1 - my) * (s.1 - my)).sum();
    sxy / syy
}

#[test]
fn dewarp_reg() {
    init_tracing();
    let mut rp = RegParams::new("dewarp");
    let page = skewed_page();
    rp.show("skewed page", &page);

    let opts = DewarpOptions::default().with_debug_images(true);
    let out = dewarp(&page, &opts, &CancelToken::new()).expect("dewarp");
    rp.show("dewarped page", &out.image);

    rp.compare_values(2.0, out.lines.len() as f64, 0.0);
    rp.check(out.image.size() == page.size(), "output keeps the input size");
    rp.check(out.skipped_pixels > 0, "sheared corners fall outside the page");
    let debug = out.debug.as_ref().expect("debug images");
    rp.check(
        debug.lines.count_black() < page.count_black(),
        "vertical stroke removed before tracing",
    );

    // --- margins ---
    let model = &out.model;
    let expected_slope = SHIFT_X / SHIFT_Y;
    rp.compare_values(expected_slope, model.left[1], 1e-6);
    rp.compare_values(expected_slope, model.right[1], 1e-6);
    let tan5 = 5f64.to_radians().tan();
    rp.compare_values(-tan5, model.left[1], 0.01);
    rp.compare_values(-tan5, model.right[1], 0.01);

    // --- margin transform: x_src = a0 + x + m·y_src ---
    let [a0, a1, a2, a3] = model.transform;
    rp.compare_values(1.0, a1, 1e-6);
    rp.compare_values(expected_slope, a2, 1e-6);
    rp.compare_values(0.0, a3, 1e-8);
    rp.compare_values(0.0, a0 + a2 * model.anchor_row as f64, 1e-4);
    // parallel margins tie, and ties anchor on the top row
    rp.compare_values(0.0, model.anchor_row as f64, 0.0);
    rp.compare_values(0.0, a0, 1e-4);

    // the model does not depend on the order the lines arrive in
    let mut reversed: Vec<_> = out.lines.iter().rev().cloned().collect();
    let again = build_model(&mut reversed, WIDTH, HEIGHT, &opts, &CancelToken::new())
        .expect("model from reversed lines");
    rp.check(again.transform == model.transform, "transform independent of line order");
    rp.check(again.anchor_row == model.anchor_row, "anchor independent of line order");

    // --- the intercept meta-polynomial is the identity ---
    rp.compare_values(0.0, model.meta[0][0], 1e-6);
    rp.compare_values(1.0, model.meta[0][1], 1e-9);
    // the curves lean at the skew angle across the middle of the page
    let [_, b, c] = model.row_coefficients(200.0);
    rp.compare_values(tan5, b + 2.0 * c * 300.0, 0.01);

    // --- the vertical stroke comes out vertical ---
    let mut centroids = Vec::new();
    for y in 140..=320 {
        let xs: Vec<u32> = (100..400)
            .filter(|&x| out.image.get_pixel(x, y) == Some(BWColor::Black))
            .collect();
        if !xs.is_empty() {
            let c = xs.iter().map(|&x| x as f64).sum::<f64>() / xs.len() as f64;
            centroids.push((c, y as f64));
        }
    }
    rp.check(centroids.len() >= 150, "stroke present on most rows");
    let drift = slope(&centroids) * 180.0;
    eprintln!("stroke drift over 180 rows: {:.3} px", drift);
    rp.check(drift.abs() <= 1.0, "stroke is vertical within a pixel");
    let (lo, hi) = centroids
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), c| (lo.min(c.0), hi.max(c.0)));
    rp.check(hi - lo <= 2.0, "stroke centroids stay within two columns");

    // --- the top bar comes out horizontal ---
    let bottoms: Vec<u32> = (150..400)
        .filter_map(|x| {
            (0..100)
                .rev()
                .find(|&y| out.image.get_pixel(x, y) == Some(BWColor::Black))
        })
        .collect();
    rp.compare_values(250.0, bottoms.len() as f64, 0.0);
    let lowest = bottoms.iter().max().copied().unwrap_or(0);
    let highest = bottoms.iter().min().copied().unwrap_or(0);
    rp.check(lowest - highest <= 3, "top bar bottom edge is flat");

    assert!(rp.cleanup(), "dewarp regression test failed");
}

#[test]
fn dewarp_failure_modes_reg() {
    init_tracing();
    let mut rp = RegParams::new("dewarp_failure");
    let cancel = CancelToken::new();
    let opts = DewarpOptions::default();

    let blank = BinaryImage::new(WIDTH, HEIGHT).expect("blank");
    match dewarp(&blank, &opts, &cancel) {
        Err(e @ DewarpError::NotEnoughLines { found: 0, .. }) => {
            rp.check(e.is_recoverable(), "blank page is recoverable");
        }
        other => {
            rp.check(false, &format!("blank page: {:?}", other.map(|o| o.lines.len())));
        }
    }

    // one long bar and one too short to count
    let mut page = BinaryImage::new(WIDTH, HEIGHT).expect("page");
    page.fill_rect(Rect::new(40, 100, 500, 12).expect("rect"), BWColor::Black)
        .expect("fill");
    page.fill_rect(Rect::new(40, 300, 200, 12).expect("rect"), BWColor::Black)
        .expect("fill");
    match dewarp(&page, &opts, &cancel) {
        Err(DewarpError::NotEnoughLines { found, required }) => {
            rp.compare_values(1.0, found as f64, 0.0);
            rp.compare_values(2.0, required as f64, 0.0);
        }
        other => {
            rp.check(false, &format!("short line page: {:?}", other.map(|o| o.lines.len())));
        }
    }

    let cancelled = CancelToken::new();
    cancelled.cancel();
    let err = dewarp(&skewed_page(), &opts, &cancelled).expect_err("cancelled");
    rp.check(err.is_cancelled(), "cancellation reported");
    rp.check(!err.is_recoverable(), "cancellation is not recoverable");

    assert!(rp.cleanup(), "dewarp failure-mode regression test failed");
}
