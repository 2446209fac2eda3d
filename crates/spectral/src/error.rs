//! Error types for spectral synthesis.

use thiserror::Error;

/// Errors that can occur while building SRF weights or synthetic bands.
#[derive(Error, Debug)]
pub enum SpectralError {
    /// No hyperspectral band falls inside a target band's SRF support.
    #[error("no source band within the spectral support of {band} [{min} nm, {max} nm]")]
    EmptySupport { band: String, min: f64, max: f64 },

    /// The reference image names a sensor variant with no SRF table.
    #[error("unrecognized sensor variant: {0}")]
    UnrecognizedSensorVariant(String),

    /// The SRF table has no curve for the requested band.
    #[error("band {0} not present in SRF table")]
    UnknownBand(String),

    /// A response curve violates its invariants.
    #[error("invalid spectral curve for {band}: {message}")]
    InvalidCurve { band: String, message: String },

    /// A wavelength inside the support matched no curve segment.
    #[error("wavelength {wavelength} nm is outside every segment of the {band} curve")]
    OutsideCurve { band: String, wavelength: f64 },

    /// Image metadata lacks or garbles a band's wavelength entry.
    #[error("invalid wavelength metadata for {key}: {message}")]
    InvalidWavelength { key: String, message: String },

    /// The cube's band axis does not match the wavelength table.
    #[error("cube has {actual} bands but wavelength table has {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// SRF table could not be parsed.
    #[error("SRF table error: {0}")]
    Table(String),

    /// Expression serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Storage/IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpectralError {
    /// Create an InvalidCurve error.
    pub fn invalid_curve(band: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCurve {
            band: band.into(),
            message: message.into(),
        }
    }

    /// Create an InvalidWavelength error.
    pub fn invalid_wavelength(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidWavelength {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl From<csv::Error> for SpectralError {
    fn from(err: csv::Error) -> Self {
        Self::Table(err.to_string())
    }
}

/// Result type for spectral operations.
pub type Result<T> = std::result::Result<T, SpectralError>;
