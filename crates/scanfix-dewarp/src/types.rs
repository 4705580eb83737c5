//! Dewarp type definitions
//!
//! This module defines the options, the traced lines and the fitted page
//! model produced by one dewarp run.

use crate::error::{DewarpError, DewarpResult};
use scanfix_core::BinaryImage;
use scanfix_math::{LmOptions, Matrix, least_squares_fit};
use serde::{Deserialize, Serialize};

/// Options for dewarping operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DewarpOptions {
    /// Brick used to fuse glyphs into line bars (default: 30x3)
    pub close_brick: (u32, u32),

    /// Brick used to drop marks smaller than a line bar (default: 50x5)
    pub open_brick: (u32, u32),

    /// Look-ahead while tracing is `width / lookahead_divisor` columns
    /// (default: 20)
    pub lookahead_divisor: u32,

    /// Rows searched above and below while tracing (default: 10)
    pub vertical_search: u32,

    /// Traced lines narrower than this fraction of the page width are
    /// dropped (default: 0.5)
    pub min_line_fraction: f64,

    /// Largest endpoint distance from a margin line, in pixels, before the
    /// line is rejected (default: 8)
    pub margin_tolerance: f64,

    /// Refine the margin transform against every line endpoint with
    /// Levenberg-Marquardt (default: true)
    pub refine_transform: bool,

    /// Solver settings for the refinement
    pub lm: LmOptions,

    /// Keep the preprocessed and bottom-point images (default: false)
    pub collect_debug_images: bool,
}

impl Default for DewarpOptions {
    fn default() -> Self {
        Self {
            close_brick: (30, 3),
            open_brick: (50, 5),
            lookahead_divisor: 20,
            vertical_search: 10,
            min_line_fraction: 0.5,
            margin_tolerance: 8.0,
            refine_transform: true,
            lm: LmOptions::default(),
            collect_debug_images: false,
        }
    }
}

impl DewarpOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the closing brick size
    pub fn with_close_brick(mut self, width: u32, height: u32) -> Self {
        self.close_brick = (width, height);
        self
    }

    /// Set the opening brick size
    pub fn with_open_brick(mut self, width: u32, height: u32) -> Self {
        self.open_brick = (width, height);
        self
    }

    /// Set the tracing look-ahead divisor
    pub fn with_lookahead_divisor(mut self, divisor: u32) -> Self {
        self.lookahead_divisor = divisor;
        self
    }

    /// Set the tracing vertical search range
    pub fn with_vertical_search(mut self, rows: u32) -> Self {
        self.vertical_search = rows;
        self
    }

    /// Set the minimum line width as a fraction of the page width
    pub fn with_min_line_fraction(mut self, fraction: f64) -> Self {
        self.min_line_fraction = fraction;
        self
    }

    /// Set the margin outlier tolerance in pixels
    pub fn with_margin_tolerance(mut self, tolerance: f64) -> Self {
        self.margin_tolerance = tolerance;
        self
    }

    /// Enable or disable the Levenberg-Marquardt refinement
    pub fn with_refine_transform(mut self, refine: bool) -> Self {
        self.refine_transform = refine;
        self
    }

    /// Keep intermediate images in the output
    pub fn with_debug_images(mut self, collect: bool) -> Self {
        self.collect_debug_images = collect;
        self
    }

    pub(crate) fn validate(&self) -> DewarpResult<()> {
        let bad = |msg: String| Err(DewarpError::InvalidParameters(msg));
        if self.close_brick.0 == 0 || self.close_brick.1 == 0 {
            return bad(format!("empty closing brick {:?}", self.close_brick));
        }
        if self.open_brick.0 == 0 || self.open_brick.1 == 0 {
            return bad(format!("empty opening brick {:?}", self.open_brick));
        }
        if self.lookahead_divisor == 0 {
            return bad("look-ahead divisor must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_line_fraction) {
            return bad(format!(
                "minimum line fraction {} outside [0, 1]",
                self.min_line_fraction
            ));
        }
        if self.margin_tolerance.is_nan() || self.margin_tolerance < 0.0 {
            return bad(format!("negative margin tolerance {}", self.margin_tolerance));
        }
        Ok(())
    }
}

/// A near-horizontal line traced along the bottom edge of a line bar.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedLine {
    /// Points in tracing order, left to right
    points: Vec<(u32, u32)>,
    /// `y = c0 + c1·x + c2·x²`
    coeffs: [f64; 3],
}

impl TracedLine {
    /// Fit a quadratic `y(x)` through traced points.
    ///
    /// Fewer than three points lower the degree.
    ///
    /// # Errors
    ///
    /// Returns [`DewarpError::InvalidParameters`] for an empty point list
    /// and propagates solver failures.
    pub fn fit(points: Vec<(u32, u32)>) -> DewarpResult<Self> {
        if points.is_empty() {
            return Err(DewarpError::InvalidParameters(
                "cannot fit an empty line".to_string(),
            ));
        }
        let terms = points.len().min(3);
        let mut c = Matrix::new(points.len(), terms);
        let mut d = Vec::with_capacity(points.len());
        for (i, &(x, y)) in points.iter().enumerate() {
            let x = x as f64;
            let mut p = 1.0;
            for t in 0..terms {
                c[(i, t)] = p;
                p *= x;
            }
            d.push(y as f64);
        }
        let fitted = least_squares_fit(&c, &d)?;
        let mut coeffs = [0.0; 3];
        coeffs[..terms].copy_from_slice(&fitted);
        Ok(Self { points, coeffs })
    }

    /// Traced points, left to right.
    pub fn points(&self) -> &[(u32, u32)] {
        &self.points
    }

    /// Polynomial coefficients `[c0, c1, c2]` of `y = c0 + c1·x + c2·x²`.
    pub fn coefficients(&self) -> [f64; 3] {
        self.coeffs
    }

    /// Number of traced points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the line has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Leftmost traced point.
    pub fn leftmost(&self) -> (u32, u32) {
        self.points.first().copied().unwrap_or_default()
    }

    /// Rightmost traced point.
    pub fn rightmost(&self) -> (u32, u32) {
        self.points.last().copied().unwrap_or_default()
    }

    /// Horizontal span between the extreme points.
    pub fn horizontal_extent(&self) -> u32 {
        self.rightmost().0 - self.leftmost().0
    }

    /// Fitted `y` at `x`.
    pub fn y_at(&self, x: f64) -> f64 {
        let [c0, c1, c2] = self.coeffs;
        c0 + x * (c1 + x * c2)
    }

    /// Left endpoint on the fitted curve.
    pub fn left_end(&self) -> (f64, f64) {
        let x = self.leftmost().0 as f64;
        (x, self.y_at(x))
    }

    /// Right endpoint on the fitted curve.
    pub fn right_end(&self) -> (f64, f64) {
        let x = self.rightmost().0 as f64;
        (x, self.y_at(x))
    }
}

/// Geometric page model built from the accepted lines.
///
/// Destination pixel `(x, y)` is read from source row
/// `y_src = A(y) + B(y)·x + C(y)·x²`, where `A`, `B` and `C` are the
/// meta-polynomials in `y`, and from source column
/// `x_src = a0 + a1·x + a2·y_src + a3·x·y_src`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginModel {
    /// Left margin `x = m0 + m1·y`
    pub left: [f64; 2],
    /// Right margin `x = m0 + m1·y`
    pub right: [f64; 2],
    /// Homographic x-transform `[a0, a1, a2, a3]`
    pub transform: [f64; 4],
    /// Row whose margin positions become the straightened columns
    pub anchor_row: u32,
    /// `meta[k][j]`: coefficient of `y^j` in the polynomial giving line
    /// coefficient `c_k` as a function of the line's intercept
    pub meta: [[f64; 3]; 3],
}

impl MarginModel {
    /// Left margin column at source row `y`.
    pub fn left_margin(&self, y: f64) -> f64 {
        self.left[0] + self.left[1] * y
    }

    /// Right margin column at source row `y`.
    pub fn right_margin(&self, y: f64) -> f64 {
        self.right[0] + self.right[1] * y
    }

    /// `[A(y), B(y), C(y)]` for destination row `y`.
    pub fn row_coefficients(&self, y: f64) -> [f64; 3] {
        self.meta.map(|[m0, m1, m2]| m0 + y * (m1 + y * m2))
    }

    /// Source row for destination pixel `(x, y)`.
    pub fn source_row(&self, x: f64, y: f64) -> f64 {
        let [a, b, c] = self.row_coefficients(y);
        a + x * (b + x * c)
    }

    /// Source column for destination column `x` on source row `y_src`.
    pub fn source_column(&self, x: f64, y_src: f64) -> f64 {
        let [a0, a1, a2, a3] = self.transform;
        a0 + a1 * x + a2 * y_src + a3 * x * y_src
    }
}

/// Intermediate images of a dewarp run.
#[derive(Debug, Clone)]
pub struct DebugImages {
    /// Page after the closing and opening passes
    pub lines: BinaryImage,
    /// Bottom-edge points found by hit-miss matching
    pub points: BinaryImage,
}

/// Result of a dewarp run.
#[derive(Debug, Clone)]
pub struct DewarpOutput {
    /// Corrected page, same size as the input
    pub image: BinaryImage,
    /// Fitted page model
    pub model: MarginModel,
    /// Lines the model was built from, sorted top to bottom
    pub lines: Vec<TracedLine>,
    /// Destination pixels whose source fell outside the page
    pub skipped_pixels: u64,
    /// Intermediate images, when requested
    pub debug: Option<DebugImages>,
}
