//! Test data generators for spectral and raster tests.
//!
//! These generators create predictable, verifiable patterns so tests can
//! check weights and pixel values by hand.

/// Evenly spaced wavelengths in nanometres.
///
/// ```
/// use test_utils::wavelength_grid;
///
/// let grid = wavelength_grid(400.0, 10.0, 3);
/// assert_eq!(grid, vec![400.0, 410.0, 420.0]);
/// ```
pub fn wavelength_grid(start: f64, step: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Approximation of the 426-band NEON AOP imaging spectrometer grid
/// (~381 nm to ~2510 nm, 5 nm spacing).
pub fn neon_like_wavelengths() -> Vec<f64> {
    wavelength_grid(381.0, 5.008, 426)
}

/// Band names `B001..Bnnn` matching a hyperspectral cube of `count` bands.
pub fn hyperspectral_band_names(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("B{:03}", i)).collect()
}

/// Triangular response curve peaking at `center` with weight 1.0 and
/// reaching zero at `center ± half_width`, sampled every `step` nm.
///
/// The zero-weight end points are included, as in real SRF tables.
pub fn triangular_curve(center: f64, half_width: f64, step: f64) -> Vec<(f64, f64)> {
    let mut samples = Vec::new();
    let mut x = center - half_width;
    while x <= center + half_width + 1e-9 {
        let weight = (1.0 - (x - center).abs() / half_width).max(0.0);
        samples.push((x, weight));
        x += step;
    }
    samples
}

/// Creates a band-sequential cube where every pixel of band `b` equals
/// `band_values[b]`.
///
/// Returned in `[band][row][col]` order, length `bands * height * width`.
pub fn constant_band_cube(band_values: &[f32], height: usize, width: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(band_values.len() * height * width);
    for &value in band_values {
        data.extend(std::iter::repeat(value).take(height * width));
    }
    data
}

/// Creates a band-sequential cube with value `band * 1000 + row * width + col`.
///
/// Makes it easy to check that a pixel was read from the right band and
/// position.
pub fn indexed_cube(bands: usize, height: usize, width: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(bands * height * width);
    for band in 0..bands {
        for row in 0..height {
            for col in 0..width {
                data.push((band * 1000 + row * width + col) as f32);
            }
        }
    }
    data
}

/// Minimal payload standing in for an encoded raster tile.
pub fn fake_tile_payload(index: usize) -> Vec<u8> {
    let mut payload = b"II*\0".to_vec();
    payload.extend_from_slice(format!("tile-{:03}", index).as_bytes());
    payload
}
