//! Error types for scanfix-math

use thiserror::Error;

/// Errors that can occur in the numeric solvers
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MathError {
    /// A zero pivot or a zero diagonal in the triangular factor
    #[error("singular matrix")]
    SingularMatrix,

    /// Operand shapes do not fit together
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The host requested an abort
    #[error("operation cancelled")]
    Cancelled,
}

impl MathError {
    /// Whether this error is a cooperative abort.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MathError::Cancelled)
    }
}

/// Result type for numeric operations
pub type MathResult<T> = Result<T, MathError>;
