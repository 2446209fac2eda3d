//! Error types for raster request construction.

use thiserror::Error;

/// Result type alias using RasterError.
pub type RasterResult<T> = Result<T, RasterError>;

/// Errors raised while building or validating a raster request.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Invalid dimensions {width}x{height}: both must be positive")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid CRS: {0}")]
    InvalidCrs(String),

    #[error("Invalid affine transform: {0}")]
    InvalidTransform(String),

    #[error("Pixel window {window} exceeds grid {width}x{height}")]
    WindowOutOfBounds {
        window: String,
        width: u32,
        height: u32,
    },

    #[error("Request has no bands")]
    NoBands,
}
