//! Error types for the image crate.

use imgtools_core::ErrorCode;
use thiserror::Error;

/// Result type alias for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur during planning and image operations.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Image height or width is zero
    #[error("Invalid image dimensions {height}x{width} (height x width): both must be at least 1")]
    InvalidDimension {
        /// Image height
        height: u32,
        /// Image width
        width: u32,
    },

    /// Model scale unusable or missing from the catalog
    #[error("Invalid scale: {0}")]
    InvalidScale(String),

    /// Composition total above the supported maximum
    #[error("Invalid composition total {total}: must be at most {max}")]
    InvalidTotal {
        /// Requested total
        total: u32,
        /// Largest supported total
        max: u32,
    },

    /// Addend set empty or containing zero
    #[error("Invalid composition numbers: {0}")]
    InvalidNumbers(String),

    /// No scale combination satisfies the demand
    #[error("Scale combination exhausted: {0}")]
    CombinationExhausted(String),

    /// Plan trace cannot be aligned with the demand table
    #[error("Plan mismatch: {0}")]
    PlanMismatch(String),

    /// Output format rejected
    #[error("Invalid output format: {0}")]
    InvalidOutputFormat(String),

    /// Model catalog problem
    #[error("Model error: {0}")]
    ModelError(String),

    /// Encoding failed
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image processing error
    #[cfg(feature = "processing")]
    #[error("Image processing error: {0}")]
    ProcessingError(#[from] image::ImageError),
}

impl ImageError {
    /// Error code used for reporting and exit codes
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidDimension { .. } => ErrorCode::InvalidDimension,
            Self::InvalidScale(_) => ErrorCode::InvalidScale,
            Self::InvalidTotal { .. } => ErrorCode::InvalidTotal,
            Self::InvalidNumbers(_) => ErrorCode::InvalidNumbers,
            Self::CombinationExhausted(_) => ErrorCode::CombinationExhausted,
            Self::PlanMismatch(_) => ErrorCode::PlanMismatch,
            Self::InvalidOutputFormat(_) => ErrorCode::InvalidOutputFormat,
            Self::ModelError(_) => ErrorCode::InvalidModelConfig,
            Self::EncodeError(_) => ErrorCode::EncodeFailed,
            Self::IoError(_) => ErrorCode::IoError,
            #[cfg(feature = "processing")]
            Self::ProcessingError(_) => ErrorCode::ProcessingError,
        }
    }
}

impl From<ImageError> for imgtools_core::Error {
    fn from(err: ImageError) -> Self {
        let code = err.code();
        let message = err.to_string();
        let error = imgtools_core::Error::new(code, message);
        match code {
            ErrorCode::InvalidScale => error.with_suggestion(
                "Check the model directory for a model file with the requested scale",
            ),
            ErrorCode::CombinationExhausted => error.with_suggestion(
                "Add model files with smaller scales or lower the requested output sizes",
            ),
            _ => error,
        }
        .with_source(err)
    }
}
