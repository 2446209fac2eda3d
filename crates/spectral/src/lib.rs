//! Spectral Band Synthesis
//!
//! Reconstructs the bands of a multispectral sensor (Sentinel-2 MSI) from a
//! hyperspectral cube (NEON AOP, 426 bands) by weighting the hyperspectral
//! bands with the target sensor's spectral response functions (SRFs).
//!
//! # Architecture
//!
//! ```text
//! SrfProvider ──resolve(spacecraft)──► SrfTable (one per SensorVariant)
//!                                         │
//!                                         ▼ curve(band)
//! WavelengthTable ──────────────► band_weights(curve, wavelengths)
//!   (from image metadata)                 │
//!                                         ├─► support mask: xMin <= wl <= xMax
//!                                         ├─► piecewise-linear interpolation
//!                                         └─► normalize to sum 1
//!                                         │
//!                                         ▼
//!                                   BandWeights
//!                                    │       │
//!                 SyntheticExpression│       │SpectralSynthesizer::synthesize
//!              (evaluated remotely)  ▼       ▼ (local ndarray cube)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use spectral::{SrfProvider, SpectralSynthesizer, WavelengthTable};
//!
//! let table = provider.resolve("Sentinel-2A")?;
//! let wavelengths = WavelengthTable::from_properties(&props, &band_names)?;
//!
//! let synthesizer = SpectralSynthesizer::new(table, S2_BANDS.iter().map(|b| b.to_string()).collect());
//! let bands = synthesizer.synthesize(cube.view(), &wavelengths)?;
//! ```

pub mod curve;
pub mod error;
pub mod expression;
pub mod srf;
pub mod synthesis;
pub mod wavelength;

pub use curve::{linear_interpolate, Segment, SpectralCurve};
pub use error::{Result, SpectralError};
pub use expression::{ExpressionBand, SyntheticExpression, Term};
pub use srf::{SensorVariant, SrfProvider, SrfTable, S2_BANDS};
pub use synthesis::{band_weights, stack, BandWeights, SpectralSynthesizer, SyntheticBand};
pub use wavelength::WavelengthTable;
