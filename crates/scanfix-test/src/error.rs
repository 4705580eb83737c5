//! Error types for the test framework

use thiserror::Error;

/// Errors that can occur while building test fixtures
#[derive(Debug, Error)]
pub enum TestError {
    /// A fixture could not be built
    #[error("failed to build fixture '{name}': {source}")]
    Fixture {
        name: &'static str,
        #[source]
        source: scanfix_core::Error,
    },

    /// A pattern string was malformed
    #[error("malformed picture at row {row}: {message}")]
    Picture { row: usize, message: String },
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;
