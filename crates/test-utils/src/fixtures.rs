//! Common test fixtures for sen2neon tests.
//!
//! Pre-defined values for the scenarios the pipeline deals with: a NEON
//! flight-line sample in UTM zone 13N, the service's quota rejection text,
//! SRF tables and image metadata documents.

use serde_json::{json, Map, Value};

/// Request geometry used by the synthetic hyperspectral download.
pub mod request {
    /// Upper-left corner of the sample (UTM 13N, metres).
    pub const ORIGIN_X: f64 = 481_200.0;
    pub const ORIGIN_Y: f64 = 4_428_700.0;

    /// EPSG code of the sample.
    pub const EPSG: &str = "EPSG:32613";

    /// Synthetic request side length in pixels at 2.5 m.
    pub const NEON_SIDE: u32 = 2064;
    pub const NEON_PIXEL_SIZE: f64 = 2.5;

    /// Sentinel-2 reference pixel size.
    pub const S2_PIXEL_SIZE: f64 = 10.0;

    /// Per-request pixel quota used across tests (1024 x 1024).
    pub const PIXEL_QUOTA: u64 = 1_048_576;
}

/// Quota rejection messages as returned by the service.
pub mod quota {
    /// Well-formed: requested 2064*2064, allowed 1024*1024.
    pub const MESSAGE: &str =
        "Total request size (4260096 pixels) must be less than or equal to 1048576 pixels.";

    /// Carries no numbers at all.
    pub const NO_NUMBERS: &str = "User memory limit exceeded.";

    /// Carries a single number.
    pub const ONE_NUMBER: &str = "Request payload size exceeds the limit: 10485760 bytes.";
}

/// Sentinel-2 MSI bands with SRF columns, in canonical order.
pub const S2_SRF_BANDS: [&str; 13] = [
    "B1", "B2", "B3", "B4", "B5", "B6", "B7", "B8", "B8A", "B9", "B10", "B11", "B12",
];

/// Build an SRF table CSV in the published layout: an `SR_WL` column
/// followed by one `<prefix><band>` column per band.
///
/// Every band curve is given as `(wavelength, weight)` samples; wavelengths
/// missing from a band's curve are written as zero weight.
pub fn srf_csv(prefix: &str, bands: &[(&str, Vec<(f64, f64)>)]) -> String {
    let mut wavelengths: Vec<f64> = bands
        .iter()
        .flat_map(|(_, curve)| curve.iter().map(|(x, _)| *x))
        .collect();
    wavelengths.sort_by(|a, b| a.total_cmp(b));
    wavelengths.dedup();

    let mut csv = String::from("SR_WL");
    for (name, _) in bands {
        csv.push(',');
        csv.push_str(prefix);
        csv.push_str(name);
    }
    csv.push('\n');

    for wl in wavelengths {
        csv.push_str(&format!("{}", wl));
        for (_, curve) in bands {
            let weight = curve
                .iter()
                .find(|(x, _)| *x == wl)
                .map(|(_, y)| *y)
                .unwrap_or(0.0);
            csv.push_str(&format!(",{}", weight));
        }
        csv.push('\n');
    }
    csv
}

/// Image properties document of a hyperspectral asset: one
/// `WL_FWHM_Bnnn = "<wavelength>,<fwhm>"` entry per band.
pub fn hyperspectral_properties(wavelengths: &[f64]) -> Map<String, Value> {
    let mut props = Map::new();
    for (i, wl) in wavelengths.iter().enumerate() {
        props.insert(
            format!("WL_FWHM_B{:03}", i + 1),
            Value::String(format!("{},5.0", wl)),
        );
    }
    props.insert("SENSOR".to_string(), json!("NEON AOP NIS"));
    props
}

/// Image properties document of a Sentinel-2 reference asset.
pub fn reference_properties(spacecraft: &str) -> Map<String, Value> {
    let mut props = Map::new();
    props.insert("SPACECRAFT_NAME".to_string(), json!(spacecraft));
    props.insert("CLOUDY_PIXEL_PERCENTAGE".to_string(), json!(1.5));
    props
}

/// Sample table CSV with a single row covering 5160 m x 5160 m.
pub fn sample_table_csv() -> String {
    format!(
        "x,y,epsg,width,height,folder,neon_id,neon_ids,neon_id_gee,s2_id_gee\n\
         {},{},{},5160,5160,CPER,CPER_2019,CPER_2019_000,projects/neon/DP3_CPER_2019,COPERNICUS/S2_HARMONIZED/20190801T172909_20190801T173923_T13TEF\n",
        request::ORIGIN_X,
        request::ORIGIN_Y,
        request::EPSG
    )
}
