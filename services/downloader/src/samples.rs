//! Sample table reading.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use raster_common::CrsCode;
use serde::Deserialize;

/// One row of the sample table: a NEON flight-line sample and the Sentinel-2
/// scene paired with it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SampleRecord {
    /// Upper-left corner in the sample's CRS.
    pub x: f64,
    pub y: f64,
    /// CRS code, `32613` or `EPSG:32613`.
    pub epsg: String,
    /// Extent in CRS units.
    pub width: f64,
    pub height: f64,
    /// NEON site folder, e.g. `CPER`.
    pub folder: String,
    pub neon_id: String,
    /// Identifier of this sample within the flight line.
    pub neon_ids: String,
    /// Hyperspectral asset id.
    pub neon_id_gee: String,
    /// Sentinel-2 asset id.
    pub s2_id_gee: String,
}

impl SampleRecord {
    pub fn crs(&self) -> Result<CrsCode> {
        CrsCode::parse(&self.epsg).with_context(|| format!("Invalid epsg for sample {}", self.neon_ids))
    }

    /// Directory of this sample's tiles under a job's output root.
    pub fn tile_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.folder).join(&self.neon_id).join(&self.neon_ids)
    }

    /// Path of this sample's single-request output under a job's output root.
    pub fn full_path(&self, root: &Path, extension: &str) -> PathBuf {
        root.join(&self.folder)
            .join(&self.neon_id)
            .join(format!("{}.{}", self.neon_ids, extension))
    }
}

/// Read sample records from CSV.
pub fn read_samples<R: Read>(reader: R) -> Result<Vec<SampleRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Invalid sample row {}", i + 2)))
        .collect()
}

/// Read sample records from a CSV file.
pub fn load_samples(path: &Path) -> Result<Vec<SampleRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open sample table: {}", path.display()))?;
    read_samples(file)
}
