//! Centre wavelengths of hyperspectral bands.

use serde_json::{Map, Value};

use crate::{Result, SpectralError};

/// Prefix of the per-band wavelength/FWHM image properties.
const WL_FWHM_PREFIX: &str = "WL_FWHM_";

/// Centre wavelength (nm) of every band of a hyperspectral image, in cube
/// band order.
#[derive(Debug, Clone, PartialEq)]
pub struct WavelengthTable {
    names: Vec<String>,
    wavelengths: Vec<f64>,
}

impl WavelengthTable {
    /// Build a table from parallel name and wavelength lists.
    pub fn new(names: Vec<String>, wavelengths: Vec<f64>) -> Result<Self> {
        if names.len() != wavelengths.len() {
            return Err(SpectralError::ShapeMismatch {
                expected: names.len(),
                actual: wavelengths.len(),
            });
        }
        if let Some((name, wl)) = names.iter().zip(&wavelengths).find(|(_, wl)| !wl.is_finite()) {
            return Err(SpectralError::invalid_wavelength(name, format!("non-finite value {}", wl)));
        }
        Ok(Self { names, wavelengths })
    }

    /// Read wavelengths from image properties.
    ///
    /// Each band `Bnnn` has a `WL_FWHM_Bnnn` property holding
    /// `"<wavelength>,<fwhm>"`; the first field is the centre wavelength.
    pub fn from_properties(properties: &Map<String, Value>, band_names: &[String]) -> Result<Self> {
        let wavelengths = band_names
            .iter()
            .map(|band| {
                let key = format!("{}{}", WL_FWHM_PREFIX, band);
                let value = properties
                    .get(&key)
                    .ok_or_else(|| SpectralError::invalid_wavelength(&key, "property missing"))?;
                parse_wl_fwhm(&key, value)
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(band_names.to_vec(), wavelengths)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// `(index, name, wavelength)` for every band.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, f64)> {
        self.names
            .iter()
            .zip(&self.wavelengths)
            .enumerate()
            .map(|(i, (name, wl))| (i, name.as_str(), *wl))
    }
}

fn parse_wl_fwhm(key: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| SpectralError::invalid_wavelength(key, "not representable as f64")),
        Value::String(s) => {
            let first = s.split(',').next().unwrap_or("").trim();
            first.parse::<f64>().map_err(|e| {
                SpectralError::invalid_wavelength(key, format!("cannot parse {:?}: {}", s, e))
            })
        }
        other => Err(SpectralError::invalid_wavelength(
            key,
            format!("unexpected value {}", other),
        )),
    }
}
