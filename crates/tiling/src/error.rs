//! Error types for tile splitting.

use raster_common::RasterError;
use thiserror::Error;

/// Errors that can occur while turning a quota violation into a tile grid.
#[derive(Error, Debug)]
pub enum TilingError {
    /// The quota signal could not be read as two positive pixel counts.
    #[error("malformed quota signal: {0}")]
    MalformedQuotaSignal(String),

    /// The request cannot be cut finely enough to satisfy the quota.
    #[error("cannot split {width}x{height} request into a {side}x{side} grid")]
    Unsplittable { width: u32, height: u32, side: u64 },

    /// A sub-request could not be derived from the parent.
    #[error("invalid sub-request: {0}")]
    Raster(#[from] RasterError),
}

impl TilingError {
    /// Create a MalformedQuotaSignal error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedQuotaSignal(msg.into())
    }
}

/// Result type for tiling operations.
pub type Result<T> = std::result::Result<T, TilingError>;
