//! Paired-imagery downloader.
//!
//! Pulls, for every sample of a sample table, a synthetic Sentinel-2 image
//! computed from NEON hyperspectral data and the real Sentinel-2 reference
//! image. Requests over the service's pixel quota are split into tile grids
//! and fetched concurrently.
//!
//! This module exposes the internal modules for testing purposes.

pub mod client;
pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod samples;
pub mod tables;

pub use client::{HttpImageService, ImageService, ServiceError};
pub use config::{DownloaderConfig, JobConfig, JobKind};
pub use fetch::{BoundedFetcher, FetchReport, TileFailure, TileFetchError};
pub use pipeline::{JobSummary, PipelineError, SampleOutcome, SamplePipeline};
pub use samples::{load_samples, read_samples, SampleRecord};
pub use tables::{load_for_jobs, load_srf_tables, TableSource};
