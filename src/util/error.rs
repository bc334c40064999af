//! Error types for detpost.

use thiserror::Error;

/// Result alias for detpost operations.
pub type DetPostResult<T> = std::result::Result<T, DetPostError>;

/// Broad classification of a failure.
///
/// `Input` failures are fatal to the current invocation only; `Config`
/// failures indicate a label table or configuration that does not fit the
/// model and will fail every invocation until fixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed tensor data or call arguments.
    Input,
    /// Label table or configuration mismatch.
    Config,
}

/// Errors that can occur when post-processing detections.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DetPostError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The flat tensor length is not a multiple of the candidate stride.
    #[error("tensor length {len} is not a multiple of stride {stride}")]
    TensorShape { len: usize, stride: usize },
    /// The declared tensor shape does not describe the buffer.
    #[error("tensor shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },
    /// Every candidate in a non-empty tensor was dropped during decoding.
    #[error("all {total} candidates were dropped as malformed")]
    NoValidCandidates { total: usize },
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    /// The external model runner failed.
    #[error("model execution failed: {reason}")]
    ModelExecution { reason: String },
    /// Configuration values are out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// Label table length differs from the model's class count.
    #[error("label table has {labels} entries but the model declares {classes} classes")]
    LabelCountMismatch { labels: usize, classes: usize },
    /// A detection references a class id the label table does not cover.
    #[error("class id {class_id} out of range for label table of length {len}")]
    ClassOutOfRange { class_id: u32, len: usize },
    /// Image decoding or encoding failed.
    #[cfg(feature = "image-io")]
    #[error("image I/O error: {reason}")]
    ImageIo { reason: String },
}

impl DetPostError {
    /// Returns whether this error stems from input data or configuration.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DetPostError::InvalidConfig(_)
            | DetPostError::LabelCountMismatch { .. }
            | DetPostError::ClassOutOfRange { .. } => ErrorKind::Config,
            _ => ErrorKind::Input,
        }
    }
}
