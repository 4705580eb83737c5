//! Regression test parameters and operations

use scanfix_core::{BWColor, BinaryImage};

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Compare results against expectations (default)
    #[default]
    Compare,
    /// Compare and also print intermediate images to stderr
    Display,
}

impl RegTestMode {
    /// Parse mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// Tracks the test name, the index of the current check, and every
/// failure seen so far. Checks never panic; call [`RegParams::cleanup`]
/// at the end and assert on its result.
pub struct RegParams {
    /// Name of the test (e.g., "despeckle")
    pub test_name: String,
    /// Current check index (incremented before each check)
    index: usize,
    /// Test mode
    pub mode: RegTestMode,
    /// Overall success status
    success: bool,
    /// Recorded failures
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// # Arguments
    ///
    /// * `test_name` - Name of the test (e.g., "despeckle")
    pub fn new(test_name: &str) -> Self {
        let mode = RegTestMode::from_env();

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current check index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, msg: String) -> bool {
        eprintln!("{}", msg);
        self.failures.push(msg);
        self.success = false;
        false
    }

    /// Compare two floating-point values
    ///
    /// # Arguments
    ///
    /// * `expected` - Expected value
    /// * `actual` - Actual computed value
    /// * `delta` - Maximum allowed difference
    ///
    /// # Returns
    ///
    /// `true` if values match within delta, `false` otherwise.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();

        // NaN never matches
        if diff <= delta {
            return true;
        }
        let msg = format!(
            "Failure in {}_reg: value comparison for index {}\n\
             difference = {} but allowed delta = {}\n\
             expected = {}, actual = {}",
            self.test_name, self.index, diff, delta, expected, actual
        );
        self.fail(msg)
    }

    /// Check a boolean condition
    pub fn check(&mut self, condition: bool, what: &str) -> bool {
        self.index += 1;
        if condition {
            return true;
        }
        let msg = format!(
            "Failure in {}_reg: check for index {} - {}",
            self.test_name, self.index, what
        );
        self.fail(msg)
    }

    /// Compare two images for exact equality
    ///
    /// # Returns
    ///
    /// `true` if images are identical, `false` otherwise.
    pub fn compare_images(&mut self, expected: &BinaryImage, actual: &BinaryImage) -> bool {
        self.index += 1;

        if !expected.sizes_equal(actual) {
            let msg = format!(
                "Failure in {}_reg: image comparison for index {} - size {:?} vs {:?}",
                self.test_name,
                self.index,
                expected.size(),
                actual.size()
            );
            return self.fail(msg);
        }

        for y in 0..expected.height() {
            for x in 0..expected.width() {
                let e = expected.get_pixel_unchecked(x, y);
                let a = actual.get_pixel_unchecked(x, y);
                if e != a {
                    let msg = format!(
                        "Failure in {}_reg: image comparison for index {} - pixel mismatch at ({}, {}): expected {:?}, got {:?}",
                        self.test_name, self.index, x, y, e, a
                    );
                    return self.fail(msg);
                }
            }
        }
        true
    }

    /// Compare two strings for equality
    pub fn compare_strings(&mut self, expected: &str, actual: &str) -> bool {
        self.index += 1;
        if expected == actual {
            return true;
        }
        let msg = format!(
            "Failure in {}_reg: string comparison for index {}\n\
             expected = {:?}\n\
             actual   = {:?}",
            self.test_name, self.index, expected, actual
        );
        self.fail(msg)
    }

    /// Print an image as text when running in display mode
    pub fn show(&self, label: &str, image: &BinaryImage) {
        if !self.display() {
            return;
        }
        eprintln!("--- {} ({}x{}) ---", label, image.width(), image.height());
        for y in 0..image.height() {
            let row: String = (0..image.width())
                .map(|x| match image.get_pixel_unchecked(x, y) {
                    BWColor::Black => '#',
                    BWColor::White => '.',
                })
                .collect();
            eprintln!("{}", row);
        }
    }

    /// Clean up and report results
    ///
    /// # Returns
    ///
    /// `true` if all checks passed, `false` if any failed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all checks have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}
