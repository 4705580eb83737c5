//! Synthetic page builders
//!
//! Tests build their inputs in memory: small hand-drawn pictures, random
//! noise, and skewed pages made of rotated bars.

use crate::error::{TestError, TestResult};
use scanfix_core::{BWColor, BinaryImage, Rect};

/// Build an image from rows of text. `x`, `X` and `#` are black; `.`
/// and space are white.
///
/// # Errors
///
/// Returns [`TestError::Picture`] for ragged rows or unknown characters.
pub fn picture(rows: &[&str]) -> TestResult<BinaryImage> {
    let width = rows.first().map_or(0, |r| r.chars().count());
    let mut img = BinaryImage::new(width as u32, rows.len() as u32).map_err(|source| {
        TestError::Fixture {
            name: "picture",
            source,
        }
    })?;
    for (y, row) in rows.iter().enumerate() {
        if row.chars().count() != width {
            return Err(TestError::Picture {
                row: y,
                message: format!("expected {} columns", width),
            });
        }
        for (x, c) in row.chars().enumerate() {
            match c {
                'x' | 'X' | '#' => img.set_pixel_unchecked(x as u32, y as u32, BWColor::Black),
                '.' | ' ' => {}
                other => {
                    return Err(TestError::Picture {
                        row: y,
                        message: format!("unexpected character {:?}", other),
                    });
                }
            }
        }
    }
    Ok(img)
}

/// Render an image as rows of `#` and `.`.
pub fn to_picture(image: &BinaryImage) -> Vec<String> {
    (0..image.height())
        .map(|y| {
            (0..image.width())
                .map(|x| match image.get_pixel_unchecked(x, y) {
                    BWColor::Black => '#',
                    BWColor::White => '.',
                })
                .collect()
        })
        .collect()
}

/// Random noise image where each pixel is black with probability
/// `density`.
///
/// # Errors
///
/// Returns [`TestError::Fixture`] for zero dimensions.
pub fn random_image(width: u32, height: u32, density: f64) -> TestResult<BinaryImage> {
    let mut img = BinaryImage::new(width, height).map_err(|source| TestError::Fixture {
        name: "random_image",
        source,
    })?;
    let threshold = (density.clamp(0.0, 1.0) * u32::MAX as f64) as u32;
    for y in 0..height {
        for x in 0..width {
            if rand::random::<u32>() < threshold {
                img.set_pixel_unchecked(x, y, BWColor::Black);
            }
        }
    }
    Ok(img)
}

/// White image with the given rectangles painted black.
///
/// # Errors
///
/// Returns [`TestError::Fixture`] for zero dimensions or rectangles that
/// do not fit.
pub fn rects_image(width: u32, height: u32, rects: &[Rect]) -> TestResult<BinaryImage> {
    let fixture = |source| TestError::Fixture {
        name: "rects_image",
        source,
    };
    let mut img = BinaryImage::new(width, height).map_err(fixture)?;
    for rect in rects {
        img.fill_rect(*rect, BWColor::Black).map_err(fixture)?;
    }
    Ok(img)
}

/// A page rotated by a known angle.
///
/// Content is described in page coordinates `(u, v)` and mapped to image
/// coordinates by `x = cx + u·cos(a) − v·sin(a)`,
/// `y = cy + u·sin(a) + v·cos(a)`. With a positive angle, horizontal page
/// lines slope downwards to the right.
#[derive(Debug, Clone)]
pub struct SkewedPage {
    width: u32,
    height: u32,
    angle: f64,
    center: (f64, f64),
    bars: Vec<(f64, f64, f64, f64)>,
}

impl SkewedPage {
    /// A blank page of the given image size, rotated by `angle_deg`
    /// around the origin of page coordinates, which sits at image (0, 0).
    pub fn new(width: u32, height: u32, angle_deg: f64) -> Self {
        Self {
            width,
            height,
            angle: angle_deg.to_radians(),
            center: (0.0, 0.0),
            bars: Vec::new(),
        }
    }

    /// Place the page origin at image position `(cx, cy)`.
    pub fn with_center(mut self, cx: f64, cy: f64) -> Self {
        self.center = (cx, cy);
        self
    }

    /// Add a solid bar covering `u0 <= u < u1`, `v0 <= v < v1`.
    pub fn bar(mut self, u0: f64, u1: f64, v0: f64, v1: f64) -> Self {
        self.bars.push((u0, u1, v0, v1));
        self
    }

    /// Image position of page point `(u, v)`.
    pub fn to_image(&self, u: f64, v: f64) -> (f64, f64) {
        let (s, c) = self.angle.sin_cos();
        (
            self.center.0 + u * c - v * s,
            self.center.1 + u * s + v * c,
        )
    }

    /// Page position of image point `(x, y)`.
    pub fn to_page(&self, x: f64, y: f64) -> (f64, f64) {
        let (s, c) = self.angle.sin_cos();
        let (dx, dy) = (x - self.center.0, y - self.center.1);
        (dx * c + dy * s, -dx * s + dy * c)
    }

    /// Rasterize the page. A pixel is black when its center falls in a bar.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Fixture`] for zero dimensions.
    pub fn build(&self) -> TestResult<BinaryImage> {
        let mut img = BinaryImage::new(self.width, self.height).map_err(|source| {
            TestError::Fixture {
                name: "skewed_page",
                source,
            }
        })?;
        for y in 0..self.height {
            for x in 0..self.width {
                let (u, v) = self.to_page(x as f64 + 0.5, y as f64 + 0.5);
                let inside = self
                    .bars
                    .iter()
                    .any(|&(u0, u1, v0, v1)| u >= u0 && u < u1 && v >= v0 && v < v1);
                if inside {
                    img.set_pixel_unchecked(x, y, BWColor::Black);
                }
            }
        }
        Ok(img)
    }
}
