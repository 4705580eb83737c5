//! Error types for scanfix-morph

use thiserror::Error;

/// Errors that can occur during morphological operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MorphError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] scanfix_core::Error),

    /// A brick with `min > max` on some axis
    #[error("empty brick: x {min_x}..={max_x}, y {min_y}..={max_y}")]
    EmptyBrick {
        min_x: i32,
        min_y: i32,
        max_x: i32,
        max_y: i32,
    },

    /// Malformed hit-miss pattern
    #[error("invalid hit-miss pattern: {0}")]
    InvalidPattern(String),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

impl MorphError {
    /// Whether this error is a cooperative abort.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MorphError::Core(e) if e.is_cancelled())
    }
}

/// Result type for morphological operations
pub type MorphResult<T> = Result<T, MorphError>;
