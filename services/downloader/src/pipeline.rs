//! Per-sample download pipeline.
//!
//! For every sample of a job:
//! 1. Build the request (weighted band-sum expression or reference asset)
//! 2. Try the full extent in one request
//! 3. On a quota rejection, split into a tile grid and fetch the tiles

use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::counter;
use raster_common::{AffineTransform, Dimensions, PixelGrid, RasterError, RasterRequest, RasterSource};
use spectral::{SpectralError, SpectralSynthesizer, SrfProvider, SyntheticExpression, WavelengthTable};
use thiserror::Error;
use tiling::{TileNaming, TileSplitter, TilingError};
use tracing::{error, info, instrument, warn};

use crate::client::{ImageService, ServiceError};
use crate::config::{JobConfig, JobKind};
use crate::fetch::{write_atomic, BoundedFetcher, FetchReport, TileFetchError};
use crate::samples::SampleRecord;

/// Failure of a whole sample.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Spectral(#[from] SpectralError),

    #[error(transparent)]
    Tiling(#[from] TilingError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Write(#[from] TileFetchError),

    #[error("sample {sample}: {message}")]
    Sample { sample: String, message: String },
}

/// What happened to one sample.
#[derive(Debug)]
pub enum SampleOutcome {
    /// Output was already on disk.
    Skipped { path: PathBuf },
    /// The full extent was fetched in one request.
    Full { path: PathBuf },
    /// The request was split; `report` lists per-tile results.
    Tiled {
        dir: PathBuf,
        power: u32,
        report: FetchReport,
    },
}

impl SampleOutcome {
    /// Whether every output of the sample is on disk.
    pub fn is_complete(&self) -> bool {
        match self {
            Self::Skipped { .. } | Self::Full { .. } => true,
            Self::Tiled { report, .. } => report.is_complete(),
        }
    }
}

/// Counts for one job run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub samples: usize,
    pub full: usize,
    pub tiled: usize,
    pub skipped: usize,
    pub failed_tiles: usize,
    /// Sample ids that failed outright.
    pub failed_samples: Vec<String>,
}

/// Runs download jobs against an [`ImageService`].
pub struct SamplePipeline {
    service: Arc<dyn ImageService>,
    fetcher: BoundedFetcher,
    srf: SrfProvider,
    output_root: PathBuf,
}

impl SamplePipeline {
    pub fn new(
        service: Arc<dyn ImageService>,
        srf: SrfProvider,
        output_root: impl Into<PathBuf>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            fetcher: BoundedFetcher::new(service.clone(), max_concurrent),
            service,
            srf,
            output_root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Build the full-extent request of `sample` for `job`.
    pub async fn build_request(
        &self,
        job: &JobConfig,
        sample: &SampleRecord,
    ) -> Result<RasterRequest, PipelineError> {
        let dimensions = request_dimensions(job, sample)?;
        let grid = PixelGrid::new(
            dimensions.width,
            dimensions.height,
            AffineTransform::north_up(sample.x, sample.y, job.pixel_size),
            sample.crs().map_err(|e| PipelineError::Sample {
                sample: sample.neon_ids.clone(),
                message: format!("{:#}", e),
            })?,
        );

        let source = match job.kind {
            JobKind::Reference => RasterSource::Asset(sample.s2_id_gee.clone()),
            JobKind::Synthetic => RasterSource::Expression(self.synthetic_expression(job, sample).await?),
        };

        Ok(RasterRequest::new(source, job.bands.clone(), grid)?.with_file_format(job.file_format))
    }

    /// Band-sum expression synthesizing `job.bands` from the sample's
    /// hyperspectral asset with the SRFs of its paired Sentinel-2 scene.
    async fn synthetic_expression(
        &self,
        job: &JobConfig,
        sample: &SampleRecord,
    ) -> Result<serde_json::Value, PipelineError> {
        let reference = self.service.properties(&sample.s2_id_gee).await?;
        let table = self.srf.resolve_properties(&reference)?;

        let hyperspectral = self.service.properties(&sample.neon_id_gee).await?;
        let wavelengths =
            WavelengthTable::from_properties(&hyperspectral, &job.hyperspectral_band_names())?;

        let weights = SpectralSynthesizer::new(table, job.bands.clone()).weights(&wavelengths)?;
        Ok(SyntheticExpression::from_weights(&sample.neon_id_gee, &weights).to_value()?)
    }

    /// Download one sample, splitting on quota rejection.
    #[instrument(skip(self, job, sample), fields(job = %job.name, sample = %sample.neon_ids))]
    pub async fn run_sample(
        &self,
        job: &JobConfig,
        sample: &SampleRecord,
    ) -> Result<SampleOutcome, PipelineError> {
        let root = job.output_root(&self.output_root);
        let extension = job.extension();

        let full_path = sample.full_path(&root, extension);
        if tokio::fs::try_exists(&full_path).await.unwrap_or(false) {
            info!(path = %full_path.display(), "Output exists, skipping sample");
            return Ok(SampleOutcome::Skipped { path: full_path });
        }

        let request = self.build_request(job, sample).await?;

        match self.service.fetch(&request).await {
            Ok(bytes) => {
                write_atomic(&full_path, &bytes).await?;
                counter!("tiles_fetched_total").increment(1);
                info!(path = %full_path.display(), bytes = bytes.len(), "Fetched full extent");
                Ok(SampleOutcome::Full { path: full_path })
            }
            Err(ServiceError::QuotaExceeded(violation)) => {
                counter!("quota_splits_total").increment(1);
                info!(%violation, "Request exceeds pixel quota, splitting");

                let splitter = TileSplitter::new(TileNaming::new(extension));
                let grid = splitter.split_for(&request, &violation)?;
                let power = grid.power();

                let dir = sample.tile_dir(&root);
                let report = self.fetcher.fetch_grid(grid, &dir).await;
                Ok(SampleOutcome::Tiled { dir, power, report })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run `job` over every sample. Failures are logged and counted; the
    /// remaining samples still run.
    #[instrument(skip(self, job, samples), fields(job = %job.name, samples = samples.len()))]
    pub async fn run_job(&self, job: &JobConfig, samples: &[SampleRecord]) -> JobSummary {
        let mut summary = JobSummary {
            samples: samples.len(),
            ..JobSummary::default()
        };

        for sample in samples {
            match self.run_sample(job, sample).await {
                Ok(SampleOutcome::Skipped { .. }) => summary.skipped += 1,
                Ok(SampleOutcome::Full { .. }) => summary.full += 1,
                Ok(SampleOutcome::Tiled { report, .. }) => {
                    summary.tiled += 1;
                    if !report.is_complete() {
                        warn!(
                            sample = %sample.neon_ids,
                            failed = ?report.failed_ids().iter().map(|id| id.index).collect::<Vec<_>>(),
                            "Sample has missing tiles"
                        );
                        summary.failed_tiles += report.failed.len();
                    }
                }
                Err(e) => {
                    error!(sample = %sample.neon_ids, error = %e, "Sample failed");
                    summary.failed_samples.push(sample.neon_ids.clone());
                }
            }
        }

        info!(
            full = summary.full,
            tiled = summary.tiled,
            skipped = summary.skipped,
            failed_samples = summary.failed_samples.len(),
            failed_tiles = summary.failed_tiles,
            "Job complete"
        );
        summary
    }
}

/// Request size: fixed by the job, or the sample extent over the pixel size
/// (truncated).
fn request_dimensions(job: &JobConfig, sample: &SampleRecord) -> Result<Dimensions, PipelineError> {
    if let Some(dims) = job.dimensions {
        return Ok(dims);
    }

    let derive = |extent: f64| -> Result<u32, PipelineError> {
        let pixels = (extent / job.pixel_size).trunc();
        if !(pixels >= 1.0 && pixels <= u32::MAX as f64) {
            return Err(PipelineError::Sample {
                sample: sample.neon_ids.clone(),
                message: format!(
                    "extent {} at pixel size {} gives no pixels",
                    extent, job.pixel_size
                ),
            });
        }
        Ok(pixels as u32)
    };

    Ok(Dimensions {
        width: derive(sample.width)?,
        height: derive(sample.height)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_request_bands;
    use raster_common::FileFormat;

    fn job(kind: JobKind, dimensions: Option<Dimensions>) -> JobConfig {
        JobConfig {
            name: "s2".to_string(),
            kind,
            pixel_size: 10.0,
            bands: default_request_bands(),
            dimensions,
            file_format: FileFormat::GeoTiff,
            extension: None,
            output_dir: None,
            hyperspectral_bands: 426,
            enabled: true,
        }
    }

    fn sample(width: f64, height: f64) -> SampleRecord {
        SampleRecord {
            x: 481_200.0,
            y: 4_428_700.0,
            epsg: "32613".to_string(),
            width,
            height,
            folder: "CPER".to_string(),
            neon_id: "CPER_2019".to_string(),
            neon_ids: "CPER_2019_000".to_string(),
            neon_id_gee: "projects/neon/DP3_CPER_2019".to_string(),
            s2_id_gee: "COPERNICUS/S2/T13TEF".to_string(),
        }
    }

    #[test]
    fn test_derived_dimensions_truncate() {
        let dims = request_dimensions(&job(JobKind::Reference, None), &sample(5165.0, 5160.0)).unwrap();
        assert_eq!(dims, Dimensions { width: 516, height: 516 });
    }

    #[test]
    fn test_fixed_dimensions_win() {
        let fixed = Dimensions { width: 2064, height: 2064 };
        let dims = request_dimensions(&job(JobKind::Synthetic, Some(fixed)), &sample(1.0, 1.0)).unwrap();
        assert_eq!(dims, fixed);
    }

    #[test]
    fn test_extent_below_one_pixel_fails() {
        let result = request_dimensions(&job(JobKind::Reference, None), &sample(5.0, 100.0));
        assert!(matches!(result, Err(PipelineError::Sample { .. })));
    }
}
