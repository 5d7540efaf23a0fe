//! Error types for detparse.

use thiserror::Error;

use crate::tensor::DataType;

/// Result alias for detparse operations.
pub type DetParseResult<T> = std::result::Result<T, DetParseError>;

/// Errors that can occur while parsing detector output.
///
/// An empty frame is not an error: absent buffers and zero rows produce
/// `Ok` with no detections.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DetParseError {
    /// Fewer output layers than the parser requires.
    #[error("insufficient output layers: need {needed}, got {got}")]
    MissingOutputLayers { needed: usize, got: usize },
    /// An output layer carries a different element type than expected.
    #[error("output layer {index} has type {got:?}, expected {expected:?}")]
    LayerTypeMismatch {
        index: usize,
        expected: DataType,
        got: DataType,
    },
    /// A layer buffer is shorter than its declared row count requires.
    #[error("buffer for layer {layer} too small: need {needed} elements, got {got}")]
    BufferTooSmall {
        layer: usize,
        needed: usize,
        got: usize,
    },
    /// The parser configuration is inconsistent.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

impl DetParseError {
    /// Returns true for failures caused by missing or malformed output layers.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MissingOutputLayers { .. }
                | Self::LayerTypeMismatch { .. }
                | Self::BufferTooSmall { .. }
        )
    }
}
