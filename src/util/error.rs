//! Error types for detpost.

use thiserror::Error;

/// Result alias for detpost operations.
pub type DetPostResult<T> = std::result::Result<T, DetPostError>;

/// Errors that can occur while post-processing detections.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetPostError {
    /// Two inputs that must agree on a dimension do not.
    #[error("shape mismatch for {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Which dimension disagreed.
        what: &'static str,
        /// Size implied by the other input.
        expected: usize,
        /// Size actually provided.
        got: usize,
    },
    /// Rows are narrower than the layout requires.
    #[error("{what} needs at least {min} columns, got {got}")]
    TooFewColumns {
        what: &'static str,
        min: usize,
        got: usize,
    },
    /// Array dimensions overflow the address space.
    #[error("invalid dimensions {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },
    /// Row stride is shorter than the row width.
    #[error("invalid stride {stride} for {cols} columns")]
    InvalidStride { cols: usize, stride: usize },
    /// Backing buffer cannot hold the described array.
    #[error("buffer too small: need {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// Recall was requested over a batch without any ground-truth boxes.
    #[error("recall is undefined without ground-truth boxes")]
    NoGroundTruth,
}
