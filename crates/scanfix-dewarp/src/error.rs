//! Error types for scanfix-dewarp

use thiserror::Error;

/// Errors that can occur while dewarping a page
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DewarpError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] scanfix_core::Error),

    /// Morphology error
    #[error("morphology error: {0}")]
    Morph(#[from] scanfix_morph::MorphError),

    /// Numeric solver error
    #[error("solver error: {0}")]
    Math(#[from] scanfix_math::MathError),

    /// Too few usable text lines to build a model
    #[error("not enough lines: found {found}, need {required}")]
    NotEnoughLines { found: usize, required: usize },

    /// The fitted geometry cannot be inverted
    #[error("degenerate model: {0}")]
    DegenerateModel(String),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

impl DewarpError {
    /// Whether this error is a cooperative abort.
    pub fn is_cancelled(&self) -> bool {
        match self {
            DewarpError::Core(e) => e.is_cancelled(),
            DewarpError::Morph(e) => e.is_cancelled(),
            DewarpError::Math(e) => e.is_cancelled(),
            _ => false,
        }
    }

    /// Whether the page can be passed through unchanged instead: the model
    /// could not be built, but nothing is wrong with the input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DewarpError::NotEnoughLines { .. }
                | DewarpError::DegenerateModel(_)
                | DewarpError::Math(scanfix_math::MathError::SingularMatrix)
        )
    }
}

/// Result type for dewarp operations
pub type DewarpResult<T> = Result<T, DewarpError>;
