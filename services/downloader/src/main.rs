//! Paired-imagery downloader service.
//!
//! Downloads, per sample of the sample table:
//! - Synthetic Sentinel-2 bands computed from NEON hyperspectral imagery
//! - The matching Sentinel-2 reference scene
//!
//! Requests above the service's pixel quota are split into tile grids and
//! fetched with bounded concurrency.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use downloader::{load_for_jobs, load_samples, DownloaderConfig, HttpImageService, SamplePipeline};

#[derive(Parser, Debug)]
#[command(name = "downloader")]
#[command(about = "Paired NEON/Sentinel-2 imagery downloader")]
struct Args {
    /// Job configuration file (YAML)
    #[arg(short, long, env = "DOWNLOADER_CONFIG", default_value = "config/downloader.yaml")]
    config: PathBuf,

    /// Sample table (CSV)
    #[arg(short, long, env = "SAMPLES_CSV")]
    samples: PathBuf,

    /// Specific job to run (default: all enabled)
    #[arg(short, long)]
    job: Option<String>,

    /// Maximum concurrent tile fetches (overrides config)
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Output root directory (overrides config)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Port for the Prometheus metrics endpoint
    #[arg(long, env = "METRICS_PORT")]
    metrics_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .init();

    info!("Starting paired-imagery downloader");

    if let Some(port) = args.metrics_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!(%addr, "Prometheus metrics exporter listening");
    }

    let mut config = if args.config.exists() {
        DownloaderConfig::load(&args.config)?
    } else {
        warn!(path = %args.config.display(), "Config file not found, using environment");
        DownloaderConfig::from_env()?
    };
    config.apply_env()?;
    if let Some(max) = args.max_concurrent {
        config.max_concurrent = max;
    }
    if let Some(dir) = &args.output_dir {
        config.output_root = dir.clone();
    }
    config.validate()?;

    let jobs = config.selected_jobs(args.job.as_deref());
    if jobs.is_empty() {
        bail!("No enabled job matches {:?}", args.job);
    }

    let service = Arc::new(HttpImageService::new(&config.service)?);
    let srf = load_for_jobs(service.client(), &config, &jobs)
        .await
        .context("Failed to load SRF tables")?;
    let pipeline = SamplePipeline::new(service, srf, &config.output_root, config.max_concurrent);

    let samples = load_samples(&args.samples)?;
    info!(
        samples = samples.len(),
        max_concurrent = config.max_concurrent,
        output_root = %config.output_root.display(),
        "Loaded sample table"
    );

    let mut failed_samples = 0;
    let mut failed_tiles = 0;
    for job in jobs {
        info!(job = %job.name, kind = ?job.kind, "Running job");
        let summary = pipeline.run_job(job, &samples).await;
        failed_samples += summary.failed_samples.len();
        failed_tiles += summary.failed_tiles;
    }

    info!(failed_samples, failed_tiles, "Download session complete");

    if failed_samples > 0 || failed_tiles > 0 {
        bail!(
            "{} samples and {} tiles failed; rerun to resume",
            failed_samples,
            failed_tiles
        );
    }
    Ok(())
}
