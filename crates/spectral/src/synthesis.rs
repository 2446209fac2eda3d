//! SRF-weighted synthesis of multispectral bands.

use ndarray::{Array2, Array3, ArrayView3, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::curve::SpectralCurve;
use crate::srf::SrfTable;
use crate::wavelength::WavelengthTable;
use crate::{Result, SpectralError};

/// Normalized contribution of hyperspectral bands to one target band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandWeights {
    /// Target band name (e.g. `B4`).
    pub target: String,
    /// Positions of the selected bands in the hyperspectral cube.
    pub indices: Vec<usize>,
    /// Names of the selected hyperspectral bands (e.g. `B052`).
    pub sources: Vec<String>,
    /// Weights summing to 1, parallel to `indices`.
    pub weights: Vec<f64>,
}

impl BandWeights {
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// `(source band name, weight)` pairs.
    pub fn terms(&self) -> impl Iterator<Item = (&str, f64)> {
        self.sources.iter().map(String::as_str).zip(self.weights.iter().copied())
    }
}

/// Weights of the hyperspectral bands inside `curve`'s support.
///
/// Bands whose centre wavelength lies in `[x_min, x_max]` (inclusive) are
/// selected, their response is interpolated on the curve and the responses
/// are normalized to sum to 1. All other bands get no weight.
pub fn band_weights(curve: &SpectralCurve, wavelengths: &WavelengthTable) -> Result<BandWeights> {
    let (min, max) = curve.support();
    let empty = || SpectralError::EmptySupport {
        band: curve.band().to_string(),
        min,
        max,
    };

    let mut indices = Vec::new();
    let mut sources = Vec::new();
    let mut raw = Vec::new();
    for (i, name, wl) in wavelengths.iter() {
        if wl < min || wl > max {
            continue;
        }
        indices.push(i);
        sources.push(name.to_string());
        raw.push(curve.response_at(wl)?);
    }

    let total: f64 = raw.iter().sum();
    if raw.is_empty() || total <= 0.0 {
        return Err(empty());
    }

    Ok(BandWeights {
        target: curve.band().to_string(),
        indices,
        sources,
        weights: raw.into_iter().map(|w| w / total).collect(),
    })
}

/// One synthesized band on the hyperspectral grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticBand {
    pub name: String,
    pub data: Array2<f32>,
}

/// Synthesizes the target bands of one sensor variant.
#[derive(Debug, Clone)]
pub struct SpectralSynthesizer {
    table: Arc<SrfTable>,
    targets: Vec<String>,
}

impl SpectralSynthesizer {
    /// Synthesizer producing `targets`, in that order.
    pub fn new(table: Arc<SrfTable>, targets: Vec<String>) -> Self {
        Self { table, targets }
    }

    /// Synthesizer producing every band of the table, in table order.
    pub fn all_bands(table: Arc<SrfTable>) -> Self {
        let targets = table.bands().map(str::to_string).collect();
        Self::new(table, targets)
    }

    pub fn table(&self) -> &SrfTable {
        &self.table
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Band weights of every target band, in target order.
    pub fn weights(&self, wavelengths: &WavelengthTable) -> Result<Vec<BandWeights>> {
        self.targets
            .iter()
            .map(|band| {
                let weights = band_weights(self.table.curve(band)?, wavelengths)?;
                debug!(
                    band = %band,
                    selected = weights.len(),
                    variant = %self.table.variant(),
                    "Computed band weights"
                );
                Ok(weights)
            })
            .collect()
    }

    /// Synthesize the target bands from a `[band, row, col]` cube.
    ///
    /// Bands are computed in parallel; output order follows the targets.
    #[instrument(skip_all, fields(variant = %self.table.variant(), targets = self.targets.len()))]
    pub fn synthesize(
        &self,
        cube: ArrayView3<'_, f32>,
        wavelengths: &WavelengthTable,
    ) -> Result<Vec<SyntheticBand>> {
        let bands = cube.len_of(Axis(0));
        if bands != wavelengths.len() {
            return Err(SpectralError::ShapeMismatch {
                expected: wavelengths.len(),
                actual: bands,
            });
        }

        let weights = self.weights(wavelengths)?;
        Ok(weights
            .par_iter()
            .map(|w| SyntheticBand {
                name: w.target.clone(),
                data: weighted_sum(cube, w),
            })
            .collect())
    }
}

fn weighted_sum(cube: ArrayView3<'_, f32>, weights: &BandWeights) -> Array2<f32> {
    let (_, height, width) = cube.dim();
    let mut out = Array2::<f32>::zeros((height, width));
    for (&index, &weight) in weights.indices.iter().zip(&weights.weights) {
        out.scaled_add(weight as f32, &cube.index_axis(Axis(0), index));
    }
    out
}

/// Stack synthesized bands into a `[band, row, col]` cube.
pub fn stack(bands: &[SyntheticBand]) -> Array3<f32> {
    let (height, width) = bands.first().map(|b| b.data.dim()).unwrap_or((0, 0));
    let mut cube = Array3::<f32>::zeros((bands.len(), height, width));
    for (mut slot, band) in cube.outer_iter_mut().zip(bands) {
        slot.assign(&band.data);
    }
    cube
}
