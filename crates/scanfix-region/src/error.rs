//! Error types for scanfix-region

use thiserror::Error;

/// Errors that can occur during region processing operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegionError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] scanfix_core::Error),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

impl RegionError {
    /// Whether this error is a cooperative abort.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RegionError::Core(e) if e.is_cancelled())
    }
}

/// Result type for region operations
pub type RegionResult<T> = Result<T, RegionError>;
