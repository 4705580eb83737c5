//! Error types for scanfix-core
//!
//! Every fallible raster operation returns [`Result`]. The variants are
//! precondition violations (the caller passed something the operation
//! cannot work with) plus [`Error::Cancelled`] for cooperative aborts.

use thiserror::Error;

/// scanfix-core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The operation requires a non-null image
    #[error("null image passed to {0}")]
    NullImage(&'static str),

    /// Invalid image dimensions
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// A rectangle is not fully contained in its image
    #[error("rectangle ({x}, {y}, {w}x{h}) is not inside a {width}x{height} image")]
    RectOutOfBounds {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        width: u32,
        height: u32,
    },

    /// Two images were expected to have the same size
    #[error("size mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
    SizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Pixel coordinates outside the image
    #[error("pixel ({x}, {y}) is outside a {width}x{height} image")]
    IndexOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The host requested cancellation
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Whether this error is a cooperative abort rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Result type alias for scanfix-core operations
pub type Result<T> = std::result::Result<T, Error>;
