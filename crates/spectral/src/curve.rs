//! Piecewise-linear spectral response curves.

use crate::{Result, SpectralError};

/// One linear piece of a [`SpectralCurve`] between two adjacent samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    pub slope: f64,
}

impl Segment {
    fn new(a: (f64, f64), b: (f64, f64)) -> Self {
        let (x0, y0) = a;
        let (x1, y1) = b;
        Self {
            x0,
            x1,
            y0,
            y1,
            slope: (y1 - y0) / (x1 - x0),
        }
    }

    /// Linear value at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.y0 + self.slope * (x - self.x0)
    }
}

/// Piecewise-linear interpolation over `(x, y)` samples sorted by `x`.
///
/// Sample positions return their stored value exactly. Between samples the
/// value is `y0 + slope * (x - x0)` along the enclosing [`Segment`]. Outside
/// `[x_first, x_last]` (or for NaN) there is no value.
pub fn linear_interpolate(samples: &[(f64, f64)], x: f64) -> Option<f64> {
    // First sample at or past x
    let i1 = samples.partition_point(|(sx, _)| *sx < x);
    if i1 >= samples.len() {
        return None;
    }

    let (x1, y1) = samples[i1];
    if x1 == x {
        return Some(y1);
    }
    if i1 == 0 {
        return None;
    }

    Some(Segment::new(samples[i1 - 1], samples[i1]).evaluate(x))
}

/// Response of one multispectral band as a function of wavelength.
///
/// Samples are `(wavelength_nm, weight)` pairs with strictly increasing
/// wavelengths and weights in `(0, 1]`. Zero-weight samples are dropped on
/// construction, so the first and last sample bound the band's support.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralCurve {
    band: String,
    samples: Vec<(f64, f64)>,
}

impl SpectralCurve {
    /// Build a curve from raw table samples.
    ///
    /// Zero weights are removed. Fails when nothing remains, when wavelengths
    /// are not strictly increasing, or when a weight is outside `[0, 1]` or
    /// not finite.
    pub fn new(band: impl Into<String>, samples: impl IntoIterator<Item = (f64, f64)>) -> Result<Self> {
        let band = band.into();
        let mut kept: Vec<(f64, f64)> = Vec::new();

        for (x, y) in samples {
            if !x.is_finite() || !y.is_finite() {
                return Err(SpectralError::invalid_curve(
                    &band,
                    format!("non-finite sample ({}, {})", x, y),
                ));
            }
            if !(0.0..=1.0).contains(&y) {
                return Err(SpectralError::invalid_curve(
                    &band,
                    format!("weight {} at {} nm outside [0, 1]", y, x),
                ));
            }
            if y == 0.0 {
                continue;
            }
            if let Some(&(prev, _)) = kept.last() {
                if x <= prev {
                    return Err(SpectralError::invalid_curve(
                        &band,
                        format!("wavelength {} nm does not increase past {} nm", x, prev),
                    ));
                }
            }
            kept.push((x, y));
        }

        if kept.is_empty() {
            return Err(SpectralError::invalid_curve(&band, "no non-zero samples"));
        }

        Ok(Self { band, samples: kept })
    }

    pub fn band(&self) -> &str {
        &self.band
    }

    pub fn samples(&self) -> &[(f64, f64)] {
        &self.samples
    }

    /// Inclusive wavelength range `[x_min, x_max]` with non-zero response.
    pub fn support(&self) -> (f64, f64) {
        // Non-empty by construction.
        let min = self.samples[0].0;
        let max = self.samples[self.samples.len() - 1].0;
        (min, max)
    }

    /// Linear pieces between adjacent samples. Empty for single-sample curves.
    pub fn segments(&self) -> Vec<Segment> {
        self.samples
            .windows(2)
            .map(|pair| Segment::new(pair[0], pair[1]))
            .collect()
    }

    /// Response at wavelength `x`; see [`linear_interpolate`].
    pub fn interpolate(&self, x: f64) -> Option<f64> {
        linear_interpolate(&self.samples, x)
    }

    /// Like [`interpolate`](Self::interpolate) but reports wavelengths with no
    /// enclosing segment as an error.
    pub fn response_at(&self, x: f64) -> Result<f64> {
        self.interpolate(x).ok_or_else(|| SpectralError::OutsideCurve {
            band: self.band.clone(),
            wavelength: x,
        })
    }
}
