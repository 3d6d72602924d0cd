//! Error types for the transform engine.
//!
//! Every variant is a structural precondition failure detected before any
//! output buffer is allocated. A degenerate value range is not an error:
//! the range scaler recovers by returning an all-zero buffer.

use thiserror::Error;

/// Errors returned by engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Channel count outside {1, 3}, a zero dimension, or a data length
    /// that does not match `height * width * channels`.
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Kernel size is even, zero, or larger than [`MAX_KERNEL_SIZE`].
    ///
    /// [`MAX_KERNEL_SIZE`]: crate::kernel::MAX_KERNEL_SIZE
    #[error(
        "Invalid kernel size {size}: size must be odd and between 1 and {}",
        crate::kernel::MAX_KERNEL_SIZE
    )]
    InvalidKernelSize { size: usize },

    /// More pixels were requested for contamination than the image holds.
    #[error("Cannot contaminate {requested} pixels: image only has {available}")]
    SampleExhaustion { requested: usize, available: usize },

    /// Histogram equalization was given no samples.
    #[error("Histogram equalization requires at least one sample")]
    EmptyHistogramInput,

    /// Two buffers that must share a shape do not.
    #[error("Size mismatch: {0}")]
    SizeMismatch(String),

    /// A numeric parameter is out of its domain.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::InvalidKernelSize { size: 4 };
        assert_eq!(
            err.to_string(),
            "Invalid kernel size 4: size must be odd and between 1 and 4095"
        );

        let err = EngineError::SampleExhaustion {
            requested: 20,
            available: 16,
        };
        assert_eq!(
            err.to_string(),
            "Cannot contaminate 20 pixels: image only has 16"
        );

        let err = EngineError::EmptyHistogramInput;
        assert_eq!(
            err.to_string(),
            "Histogram equalization requires at least one sample"
        );
    }
}
