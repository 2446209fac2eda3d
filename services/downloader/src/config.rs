//! Configuration loading for download jobs.
//!
//! Loads the downloader configuration from a YAML file, e.g.
//!
//! ```yaml
//! service:
//!   base_url: https://imagery.example.com
//!   timeout_secs: 600
//! max_concurrent: 10
//! output_root: /data/sen2neon
//! srf_tables:
//!   Sentinel-2A: https://example.com/tables/srf_s2a.csv
//!   Sentinel-2B: tables/srf_s2b.csv
//! jobs:
//!   - name: neon
//!     kind: synthetic
//!     pixel_size: 2.5
//!     dimensions: { width: 2064, height: 2064 }
//!   - name: s2
//!     kind: reference
//!     pixel_size: 10.0
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use raster_common::{Dimensions, FileFormat};
use serde::Deserialize;
use spectral::{SensorVariant, S2_BANDS};
use tracing::{debug, info};

use crate::tables::TableSource;

/// Sentinel-2 bands requested by default. B10 (cirrus) carries no surface
/// signal and is left out of downloads.
pub fn default_request_bands() -> Vec<String> {
    S2_BANDS
        .iter()
        .filter(|b| **b != "B10")
        .map(|b| b.to_string())
        .collect()
}

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloaderConfig {
    pub service: ServiceConfig,
    /// Maximum concurrent tile fetches.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Root of all job output directories.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    /// SRF table per spacecraft name (`Sentinel-2A`, `Sentinel-2B`): a
    /// local CSV path or an http(s) URL.
    #[serde(default)]
    pub srf_tables: BTreeMap<String, String>,
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

/// Remote image service connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: usize,
}

/// What a job downloads for each sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Sentinel-2 bands synthesized from the hyperspectral asset by the
    /// service, via a weighted band-sum expression.
    Synthetic,
    /// The Sentinel-2 reference asset itself.
    Reference,
}

/// One download job, run for every sample.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub kind: JobKind,
    /// Ground sample distance in CRS units (metres).
    pub pixel_size: f64,
    /// Output bands. Defaults to the Sentinel-2 bands without B10.
    #[serde(default = "default_request_bands")]
    pub bands: Vec<String>,
    /// Fixed request size. When absent the size is the sample extent divided
    /// by the pixel size.
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub file_format: FileFormat,
    /// Output file extension. Defaults to the file format's extension.
    #[serde(default)]
    pub extension: Option<String>,
    /// Output directory under `output_root`. Defaults to the job name.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Number of bands of the hyperspectral source (`B001..Bnnn`).
    #[serde(default = "default_hyperspectral_bands")]
    pub hyperspectral_bands: usize,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_max_concurrent() -> usize {
    10
}

fn default_output_root() -> PathBuf {
    PathBuf::from("/data/sen2neon")
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_max_idle_connections() -> usize {
    10
}

fn default_hyperspectral_bands() -> usize {
    426
}

fn default_enabled() -> bool {
    true
}

impl JobConfig {
    pub fn extension(&self) -> &str {
        self.extension
            .as_deref()
            .map(|e| e.trim_start_matches('.'))
            .unwrap_or_else(|| self.file_format.extension())
    }

    /// Root directory of this job's outputs.
    pub fn output_root(&self, root: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) => root.join(dir),
            None => root.join(&self.name),
        }
    }

    /// Hyperspectral band names `B001..Bnnn`.
    pub fn hyperspectral_band_names(&self) -> Vec<String> {
        (1..=self.hyperspectral_bands)
            .map(|i| format!("B{:03}", i))
            .collect()
    }
}

impl DownloaderConfig {
    /// Load the configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!(
            path = %path.display(),
            jobs = config.jobs.len(),
            "Loaded downloader configuration"
        );
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment overrides.
    ///
    /// - `IMAGE_SERVICE_URL`: service base URL
    /// - `MAX_CONCURRENT`: concurrent tile fetches
    /// - `OUTPUT_ROOT`: output root directory
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("IMAGE_SERVICE_URL") {
            debug!(url = %url, "Overriding service URL from environment");
            self.service.base_url = url;
        }
        if let Ok(value) = std::env::var("MAX_CONCURRENT") {
            self.max_concurrent = value
                .parse()
                .with_context(|| format!("Invalid MAX_CONCURRENT: {}", value))?;
        }
        if let Ok(root) = std::env::var("OUTPUT_ROOT") {
            self.output_root = PathBuf::from(root);
        }
        Ok(())
    }

    /// Configuration from the environment alone, with no jobs.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("IMAGE_SERVICE_URL")
            .context("IMAGE_SERVICE_URL must be set when no config file is given")?;

        let mut config = Self {
            service: ServiceConfig {
                base_url,
                timeout_secs: default_timeout_secs(),
                connect_timeout_secs: default_connect_timeout_secs(),
                max_idle_connections: default_max_idle_connections(),
            },
            max_concurrent: default_max_concurrent(),
            output_root: default_output_root(),
            srf_tables: BTreeMap::new(),
            jobs: Vec::new(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// SRF table sources keyed by sensor variant.
    pub fn srf_sources(&self) -> Result<Vec<(SensorVariant, TableSource)>> {
        self.srf_tables
            .iter()
            .map(|(name, location)| {
                let variant = SensorVariant::from_spacecraft_name(name)
                    .with_context(|| format!("Invalid srf_tables entry: {}", name))?;
                Ok((variant, TableSource::parse(location)))
            })
            .collect()
    }

    pub fn enabled_jobs(&self) -> impl Iterator<Item = &JobConfig> {
        self.jobs.iter().filter(|j| j.enabled)
    }

    /// Enabled jobs, limited to `name` when given.
    pub fn selected_jobs(&self, name: Option<&str>) -> Vec<&JobConfig> {
        self.enabled_jobs()
            .filter(|j| name.map_or(true, |n| j.name == n))
            .collect()
    }

    /// Check the configuration for values that cannot work.
    pub fn validate(&self) -> Result<()> {
        if !self.service.base_url.starts_with("http://") && !self.service.base_url.starts_with("https://") {
            bail!("service.base_url must be an http(s) URL: {}", self.service.base_url);
        }
        if self.max_concurrent == 0 {
            bail!("max_concurrent must be at least 1");
        }
        self.srf_sources()?;

        let mut names = std::collections::HashSet::new();
        for job in &self.jobs {
            if !names.insert(job.name.as_str()) {
                bail!("duplicate job name: {}", job.name);
            }
            if !(job.pixel_size.is_finite() && job.pixel_size > 0.0) {
                bail!("job {}: pixel_size must be positive", job.name);
            }
            if job.bands.is_empty() {
                bail!("job {}: bands must not be empty", job.name);
            }
            if let Some(dims) = job.dimensions {
                if dims.width == 0 || dims.height == 0 {
                    bail!("job {}: dimensions must be positive", job.name);
                }
            }
            if job.kind == JobKind::Synthetic {
                if job.hyperspectral_bands == 0 {
                    bail!("job {}: hyperspectral_bands must be positive", job.name);
                }
                if job.enabled && self.srf_tables.is_empty() {
                    bail!("job {}: synthetic jobs need at least one SRF table", job.name);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
service:
  base_url: https://imagery.example.com/
max_concurrent: 4
output_root: /tmp/sen2neon
srf_tables:
  Sentinel-2A: https://example.com/tables/srf_s2a.csv
  Sentinel-2B: tables/srf_s2b.csv
jobs:
  - name: neon
    kind: synthetic
    pixel_size: 2.5
    dimensions: { width: 2064, height: 2064 }
  - name: s2
    kind: reference
    pixel_size: 10.0
    output_dir: sentinel
    extension: .tiff
"#;

    #[test]
    fn test_parse_config() {
        let config = DownloaderConfig::from_yaml(YAML).unwrap();
        config.validate().unwrap();

        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.service.timeout_secs, 600);
        assert_eq!(config.jobs.len(), 2);

        let neon = &config.jobs[0];
        assert_eq!(neon.kind, JobKind::Synthetic);
        assert_eq!(neon.dimensions, Some(Dimensions { width: 2064, height: 2064 }));
        assert_eq!(neon.extension(), "tif");
        assert_eq!(neon.bands.len(), 12);
        assert!(!neon.bands.contains(&"B10".to_string()));
        assert_eq!(neon.hyperspectral_band_names()[425], "B426");
        assert_eq!(neon.output_root(&config.output_root), PathBuf::from("/tmp/sen2neon/neon"));

        let s2 = &config.jobs[1];
        assert_eq!(s2.kind, JobKind::Reference);
        assert_eq!(s2.dimensions, None);
        assert_eq!(s2.extension(), "tiff");
        assert_eq!(s2.output_root(&config.output_root), PathBuf::from("/tmp/sen2neon/sentinel"));
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let config =
            DownloaderConfig::from_yaml(include_str!("../../../config/downloader.yaml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.enabled_jobs().count(), 2);
        assert_eq!(config.jobs[1].bands, default_request_bands());
        assert_eq!(config.jobs[1].extension(), "tiff");
        assert_eq!(config.jobs[0].extension(), "tif");

        // Published tables are fetched, not expected on disk.
        for (_, source) in config.srf_sources().unwrap() {
            assert!(matches!(source, TableSource::Url(_)), "{}", source);
        }
    }

    #[test]
    fn test_selected_jobs() {
        let config = DownloaderConfig::from_yaml(YAML).unwrap();
        assert_eq!(config.selected_jobs(None).len(), 2);

        let s2 = config.selected_jobs(Some("s2"));
        assert_eq!(s2.len(), 1);
        assert_eq!(s2[0].kind, JobKind::Reference);

        assert!(config.selected_jobs(Some("landsat")).is_empty());
    }

    #[test]
    fn test_srf_sources_resolve_variants() {
        let config = DownloaderConfig::from_yaml(YAML).unwrap();
        let sources = config.srf_sources().unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].0, SensorVariant::Sentinel2A);
        assert!(matches!(sources[0].1, TableSource::Url(_)));
        assert_eq!(sources[1].0, SensorVariant::Sentinel2B);
        assert_eq!(sources[1].1, TableSource::Path(PathBuf::from("tables/srf_s2b.csv")));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = DownloaderConfig::from_yaml(YAML).unwrap();
        config.max_concurrent = 0;
        assert!(config.validate().is_err());

        let mut config = DownloaderConfig::from_yaml(YAML).unwrap();
        config.jobs[1].name = "neon".to_string();
        assert!(config.validate().is_err());

        let mut config = DownloaderConfig::from_yaml(YAML).unwrap();
        config.srf_tables.insert("Landsat-9".to_string(), "x.csv".to_string());
        assert!(config.validate().is_err());

        let mut config = DownloaderConfig::from_yaml(YAML).unwrap();
        config.srf_tables.clear();
        assert!(config.validate().is_err());
    }
}
