//! Small-object removal
//!
//! Removes every connected component whose pixel count is below a
//! threshold. The threshold is derived from the scan resolution and a
//! qualitative [`DespeckleLevel`]: a base area defined at a reference
//! resolution is scaled by `(dpi / reference_dpi)²` and multiplied by the
//! level's factor. Components are independent, so the output is the input
//! minus exactly the removed components regardless of enumeration order.

use crate::conncomp::{ConnCompEraser, Connectivity};
use crate::error::{RegionError, RegionResult};
use scanfix_core::{BWColor, BinaryImage, CancelToken};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// How aggressively to remove specks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum DespeckleLevel {
    /// Leave the image alone
    Off,
    /// Only the tiniest specks
    Cautious,
    /// Default
    #[default]
    Normal,
    /// Larger specks too
    Aggressive,
}

/// Empirical area constants behind each [`DespeckleLevel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DespeckleThresholds {
    /// Speck area in pixels at `reference_dpi` for a multiplier of 1
    pub base_area: f64,
    /// Resolution `base_area` is defined at
    pub reference_dpi: f64,
    /// Multiplier for [`DespeckleLevel::Cautious`]
    pub cautious: f64,
    /// Multiplier for [`DespeckleLevel::Normal`]
    pub normal: f64,
    /// Multiplier for [`DespeckleLevel::Aggressive`]
    pub aggressive: f64,
}

impl Default for DespeckleThresholds {
    fn default() -> Self {
        Self {
            base_area: 16.0,
            reference_dpi: 300.0,
            cautious: 1.0,
            normal: 2.0,
            aggressive: 4.0,
        }
    }
}

impl DespeckleThresholds {
    /// Multiplier for `level`; zero for [`DespeckleLevel::Off`].
    pub fn multiplier(&self, level: DespeckleLevel) -> f64 {
        match level {
            DespeckleLevel::Off => 0.0,
            DespeckleLevel::Cautious => self.cautious,
            DespeckleLevel::Normal => self.normal,
            DespeckleLevel::Aggressive => self.aggressive,
        }
    }

    /// Minimum pixel count a component needs to survive.
    pub fn min_area(&self, level: DespeckleLevel, dpi: u32) -> f64 {
        let scale = dpi as f64 / self.reference_dpi;
        self.multiplier(level) * self.base_area * scale * scale
    }
}

/// Despeckle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DespeckleOptions {
    /// Qualitative strength
    pub level: DespeckleLevel,
    /// Scan resolution in dots per inch
    pub dpi: u32,
    /// Pixel adjacency used to group specks
    pub connectivity: Connectivity,
    /// Area constants
    pub thresholds: DespeckleThresholds,
}

impl Default for DespeckleOptions {
    fn default() -> Self {
        Self {
            level: DespeckleLevel::Normal,
            dpi: 300,
            connectivity: Connectivity::EightWay,
            thresholds: DespeckleThresholds::default(),
        }
    }
}

impl DespeckleOptions {
    /// Set the level.
    pub fn with_level(mut self, level: DespeckleLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the connectivity.
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Replace the area constants.
    pub fn with_thresholds(mut self, thresholds: DespeckleThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Minimum pixel count a component needs to survive.
    pub fn min_area(&self) -> f64 {
        self.thresholds.min_area(self.level, self.dpi)
    }

    fn validate(&self) -> RegionResult<()> {
        if self.level != DespeckleLevel::Off && self.dpi == 0 {
            return Err(RegionError::InvalidParameters(
                "dpi must be positive".to_string(),
            ));
        }
        let reference = self.thresholds.reference_dpi;
        if reference.is_nan() || reference <= 0.0 {
            return Err(RegionError::InvalidParameters(format!(
                "reference dpi must be positive, got {}",
                reference
            )));
        }
        Ok(())
    }
}

/// Remove specks according to `options`.
///
/// [`DespeckleLevel::Off`] returns a copy sharing the input's buffer.
///
/// # Errors
///
/// Returns [`RegionError::InvalidParameters`] for a zero dpi or reference
/// dpi, and a cancelled core error when `cancel` fires.
pub fn despeckle(
    src: &BinaryImage,
    options: &DespeckleOptions,
    cancel: &CancelToken,
) -> RegionResult<BinaryImage> {
    let mut out = src.clone();
    despeckle_in_place(&mut out, options, cancel)?;
    Ok(out)
}

/// In-place variant of [`despeckle`].
///
/// # Errors
///
/// See [`despeckle`].
pub fn despeckle_in_place(
    image: &mut BinaryImage,
    options: &DespeckleOptions,
    cancel: &CancelToken,
) -> RegionResult<()> {
    options.validate()?;
    if options.level == DespeckleLevel::Off {
        return Ok(());
    }
    remove_small(image, options.min_area(), options.connectivity, cancel)
}

/// Remove every component with fewer than `min_area` pixels.
///
/// # Errors
///
/// Returns [`RegionError::Core`] for a null image and a cancelled core
/// error when `cancel` fires.
pub fn despeckle_by_area(
    src: &BinaryImage,
    min_area: u32,
    connectivity: Connectivity,
    cancel: &CancelToken,
) -> RegionResult<BinaryImage> {
    let mut out = src.clone();
    despeckle_by_area_in_place(&mut out, min_area, connectivity, cancel)?;
    Ok(out)
}

/// In-place variant of [`despeckle_by_area`].
///
/// # Errors
///
/// See [`despeckle_by_area`].
pub fn despeckle_by_area_in_place(
    image: &mut BinaryImage,
    min_area: u32,
    connectivity: Connectivity,
    cancel: &CancelToken,
) -> RegionResult<()> {
    remove_small(image, min_area as f64, connectivity, cancel)
}

#[instrument(skip_all, fields(width = image.width(), height = image.height(), min_area = min_area))]
fn remove_small(
    image: &mut BinaryImage,
    min_area: f64,
    connectivity: Connectivity,
    cancel: &CancelToken,
) -> RegionResult<()> {
    if image.is_null() {
        return Err(scanfix_core::Error::NullImage("despeckle").into());
    }

    let mut eraser = ConnCompEraser::new(image, connectivity);
    let mut kept = 0usize;
    let mut removed = 0usize;
    let mut removed_pixels = 0u64;

    while let Some(cc) = eraser.next_component() {
        cancel.check()?;
        if (cc.pixel_count() as f64) < min_area {
            cc.paint(image, BWColor::White)?;
            removed += 1;
            removed_pixels += cc.pixel_count() as u64;
        } else {
            kept += 1;
        }
    }

    debug!(kept, removed, removed_pixels, "despeckle done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanfix_core::Rect;
    use scanfix_test::picture;

    #[test]
    fn test_levels_are_ordered() {
        assert!(DespeckleLevel::Off < DespeckleLevel::Cautious);
        assert!(DespeckleLevel::Cautious < DespeckleLevel::Normal);
        assert!(DespeckleLevel::Normal < DespeckleLevel::Aggressive);
    }

    #[test]
    fn test_min_area_scales_with_dpi() {
        let t = DespeckleThresholds::default();
        assert_eq!(t.min_area(DespeckleLevel::Cautious, 300), 16.0);
        assert_eq!(t.min_area(DespeckleLevel::Normal, 300), 32.0);
        assert_eq!(t.min_area(DespeckleLevel::Aggressive, 600), 256.0);
        assert_eq!(t.min_area(DespeckleLevel::Off, 600), 0.0);
        let opts = DespeckleOptions::default().with_dpi(150);
        assert_eq!(opts.min_area(), 8.0);
    }

    #[test]
    fn test_off_is_identity() {
        let img = picture(&["x....", "..x..", "....x"]).unwrap();
        let opts = DespeckleOptions::default().with_level(DespeckleLevel::Off);
        let out = despeckle(&img, &opts, &CancelToken::new()).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut img = BinaryImage::new(20, 10).unwrap();
        img.fill_rect(Rect::new(1, 1, 4, 4).unwrap(), BWColor::Black).unwrap();
        img.fill_rect(Rect::new(10, 1, 3, 5).unwrap(), BWColor::Black).unwrap();
        let out =
            despeckle_by_area(&img, 16, Connectivity::FourWay, &CancelToken::new()).unwrap();
        // the 16-pixel square stays, the 15-pixel bar goes
        assert_eq!(out.count_black(), 16);
        assert_eq!(out.get_pixel(1, 1), Some(BWColor::Black));
    }

    #[test]
    fn test_connectivity_changes_what_is_small() {
        // two diagonal 2-pixel pieces: 4 pixels when joined
        let img = picture(&["xx..", "..xx"]).unwrap();
        let cancel = CancelToken::new();
        let four = despeckle_by_area(&img, 3, Connectivity::FourWay, &cancel).unwrap();
        assert!(four.is_all_white());
        let eight = despeckle_by_area(&img, 3, Connectivity::EightWay, &cancel).unwrap();
        assert_eq!(eight, img);
    }

    #[test]
    fn test_cancel_and_null() {
        let img = picture(&["x.x"]).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = despeckle_by_area(&img, 5, Connectivity::FourWay, &cancel).unwrap_err();
        assert!(err.is_cancelled());

        let err = despeckle_by_area(&BinaryImage::null(), 5, Connectivity::FourWay, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, RegionError::Core(scanfix_core::Error::NullImage(_))));
    }

    #[test]
    fn test_options_validation_and_serde() {
        let bad = DespeckleOptions::default().with_dpi(0);
        assert!(despeckle(&picture(&["x"]).unwrap(), &bad, &CancelToken::new()).is_err());

        let opts: DespeckleOptions =
            serde_json::from_str(r#"{"level": "Aggressive", "dpi": 600}"#).unwrap();
        assert_eq!(opts.level, DespeckleLevel::Aggressive);
        assert_eq!(opts.connectivity, Connectivity::EightWay);
        assert_eq!(opts.min_area(), 256.0);
    }
}
