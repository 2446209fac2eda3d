//! Spectral response function tables and sensor variants.
//!
//! SRF tables are CSV files with an `SR_WL` wavelength column followed by one
//! weight column per band, e.g. `S2A_SR_AV_B1 .. S2A_SR_AV_B12`. The column
//! prefix is read from the second header so the same parser handles every
//! spacecraft's table.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::curve::SpectralCurve;
use crate::{Result, SpectralError};

/// Sentinel-2 MSI bands in canonical order.
pub const S2_BANDS: [&str; 13] = [
    "B1", "B2", "B3", "B4", "B5", "B6", "B7", "B8", "B8A", "B9", "B10", "B11", "B12",
];

/// Name of the wavelength column in SRF tables.
const WAVELENGTH_COLUMN: &str = "SR_WL";

/// Image property naming the spacecraft of a reference image.
pub const SPACECRAFT_PROPERTY: &str = "SPACECRAFT_NAME";

/// Spacecraft of the Sentinel-2 constellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorVariant {
    #[serde(rename = "Sentinel-2A")]
    Sentinel2A,
    #[serde(rename = "Sentinel-2B")]
    Sentinel2B,
}

impl SensorVariant {
    pub const ALL: [SensorVariant; 2] = [SensorVariant::Sentinel2A, SensorVariant::Sentinel2B];

    /// Resolve a variant from the `SPACECRAFT_NAME` value of an image.
    pub fn from_spacecraft_name(name: &str) -> Result<Self> {
        match name.trim() {
            "Sentinel-2A" => Ok(Self::Sentinel2A),
            "Sentinel-2B" => Ok(Self::Sentinel2B),
            other => Err(SpectralError::UnrecognizedSensorVariant(other.to_string())),
        }
    }

    /// Resolve a variant from an image properties document.
    pub fn from_properties(properties: &Map<String, Value>) -> Result<Self> {
        match properties.get(SPACECRAFT_PROPERTY) {
            Some(Value::String(name)) => Self::from_spacecraft_name(name),
            Some(other) => Err(SpectralError::UnrecognizedSensorVariant(other.to_string())),
            None => Err(SpectralError::UnrecognizedSensorVariant(format!(
                "<missing {}>",
                SPACECRAFT_PROPERTY
            ))),
        }
    }

    pub fn spacecraft_name(&self) -> &'static str {
        match self {
            Self::Sentinel2A => "Sentinel-2A",
            Self::Sentinel2B => "Sentinel-2B",
        }
    }

    /// Column prefix used by this variant's published SRF table.
    pub fn column_prefix(&self) -> &'static str {
        match self {
            Self::Sentinel2A => "S2A_SR_AV_",
            Self::Sentinel2B => "S2B_SR_AV_",
        }
    }
}

impl fmt::Display for SensorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spacecraft_name())
    }
}

/// Response curves of every band of one sensor variant.
#[derive(Debug, Clone)]
pub struct SrfTable {
    variant: SensorVariant,
    prefix: String,
    curves: Vec<SpectralCurve>,
}

impl SrfTable {
    /// Build a table from already-validated curves.
    pub fn new(variant: SensorVariant, curves: Vec<SpectralCurve>) -> Self {
        Self {
            variant,
            prefix: variant.column_prefix().to_string(),
            curves,
        }
    }

    /// Parse an SRF table from CSV.
    pub fn from_csv_reader<R: Read>(variant: SensorVariant, reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = reader.headers()?.clone();

        if headers.get(0) != Some(WAVELENGTH_COLUMN) {
            return Err(SpectralError::Table(format!(
                "first column must be {}, found {:?}",
                WAVELENGTH_COLUMN,
                headers.get(0)
            )));
        }
        let first_band = headers
            .get(1)
            .ok_or_else(|| SpectralError::Table("no band columns".to_string()))?;
        let prefix = column_prefix(first_band);

        let band_names: Vec<String> = headers
            .iter()
            .skip(1)
            .map(|h| h.strip_prefix(&prefix).unwrap_or(h).to_string())
            .collect();
        let mut samples: Vec<Vec<(f64, f64)>> = vec![Vec::new(); band_names.len()];

        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let wavelength = parse_cell(&record, 0, line)?;
            for (i, column) in samples.iter_mut().enumerate() {
                column.push((wavelength, parse_cell(&record, i + 1, line)?));
            }
        }

        let curves = band_names
            .into_iter()
            .zip(samples)
            .map(|(band, samples)| SpectralCurve::new(band, samples))
            .collect::<Result<Vec<_>>>()?;

        debug!(variant = %variant, prefix = %prefix, bands = curves.len(), "Parsed SRF table");

        Ok(Self {
            variant,
            prefix,
            curves,
        })
    }

    /// Load an SRF table from a CSV file.
    pub fn from_path(variant: SensorVariant, path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(variant, file)
    }

    pub fn variant(&self) -> SensorVariant {
        self.variant
    }

    /// Column prefix found in the table's header.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Band names in table order.
    pub fn bands(&self) -> impl Iterator<Item = &str> {
        self.curves.iter().map(|c| c.band())
    }

    /// Response curve of `band`.
    pub fn curve(&self, band: &str) -> Result<&SpectralCurve> {
        self.curves
            .iter()
            .find(|c| c.band() == band)
            .ok_or_else(|| SpectralError::UnknownBand(band.to_string()))
    }
}

/// Text before and including the last `_` of a band column header.
fn column_prefix(header: &str) -> String {
    match header.rfind('_') {
        Some(pos) => header[..=pos].to_string(),
        None => String::new(),
    }
}

fn parse_cell(record: &csv::StringRecord, column: usize, line: usize) -> Result<f64> {
    let cell = record.get(column).unwrap_or("");
    if cell.is_empty() {
        return Ok(0.0);
    }
    cell.parse::<f64>().map_err(|e| {
        SpectralError::Table(format!(
            "row {} column {}: invalid number {:?}: {}",
            line + 2,
            column,
            cell,
            e
        ))
    })
}

/// Supplies the SRF table of each sensor variant.
#[derive(Debug, Clone, Default)]
pub struct SrfProvider {
    tables: HashMap<SensorVariant, Arc<SrfTable>>,
}

impl SrfProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: SrfTable) {
        self.tables.insert(table.variant(), Arc::new(table));
    }

    pub fn with_table(mut self, table: SrfTable) -> Self {
        self.insert(table);
        self
    }

    /// Table of `variant`; a variant without a table is unrecognized.
    pub fn table(&self, variant: SensorVariant) -> Result<Arc<SrfTable>> {
        self.tables
            .get(&variant)
            .cloned()
            .ok_or_else(|| SpectralError::UnrecognizedSensorVariant(variant.to_string()))
    }

    /// Table for the spacecraft named by `SPACECRAFT_NAME`.
    pub fn resolve(&self, spacecraft_name: &str) -> Result<Arc<SrfTable>> {
        self.table(SensorVariant::from_spacecraft_name(spacecraft_name)?)
    }

    /// Table for the spacecraft described by an image properties document.
    pub fn resolve_properties(&self, properties: &Map<String, Value>) -> Result<Arc<SrfTable>> {
        self.table(SensorVariant::from_properties(properties)?)
    }

    pub fn variants(&self) -> impl Iterator<Item = SensorVariant> + '_ {
        self.tables.keys().copied()
    }
}
