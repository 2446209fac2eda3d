//! SRF table loading.
//!
//! Each `srf_tables` entry of the configuration is either a local CSV path or
//! the http(s) URL of a published table. Tables are only needed to build
//! synthetic requests, so runs limited to reference jobs never touch them.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::Client;
use spectral::{SensorVariant, SrfProvider, SrfTable};
use tracing::{debug, info, instrument};

use crate::config::{DownloaderConfig, JobConfig, JobKind};

/// Where an SRF table is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    Path(PathBuf),
    Url(String),
}

impl TableSource {
    /// `http://` and `https://` locations are URLs; anything else is a path.
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::Path(PathBuf::from(location))
        }
    }
}

impl fmt::Display for TableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Read and parse the table of `variant` from `source`.
#[instrument(skip(client, source), fields(source = %source))]
pub async fn load_table(client: &Client, variant: SensorVariant, source: &TableSource) -> Result<SrfTable> {
    let content = match source {
        TableSource::Path(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read SRF table {}", path.display()))?,
        TableSource::Url(url) => client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to download SRF table {}", url))?
            .bytes()
            .await
            .with_context(|| format!("Failed to download SRF table {}", url))?
            .to_vec(),
    };

    SrfTable::from_csv_reader(variant, content.as_slice())
        .with_context(|| format!("Invalid SRF table for {}: {}", variant, source))
}

/// Load one table per configured variant.
pub async fn load_srf_tables(
    client: &Client,
    sources: &[(SensorVariant, TableSource)],
) -> Result<SrfProvider> {
    let mut provider = SrfProvider::new();
    for (variant, source) in sources {
        let table = load_table(client, *variant, source).await?;
        info!(
            variant = %variant,
            source = %source,
            bands = table.bands().count(),
            "Loaded SRF table"
        );
        provider.insert(table);
    }
    Ok(provider)
}

/// Tables for a run of `jobs`. Empty when none of them is synthetic.
pub async fn load_for_jobs(
    client: &Client,
    config: &DownloaderConfig,
    jobs: &[&JobConfig],
) -> Result<SrfProvider> {
    if !jobs.iter().any(|j| j.kind == JobKind::Synthetic) {
        debug!("No synthetic job selected, SRF tables not loaded");
        return Ok(SrfProvider::new());
    }
    load_srf_tables(client, &config.srf_sources()?).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        assert_eq!(
            TableSource::parse("https://example.com/srf_s2a.csv"),
            TableSource::Url("https://example.com/srf_s2a.csv".to_string())
        );
        assert_eq!(
            TableSource::parse(" tables/srf_s2b.csv "),
            TableSource::Path(PathBuf::from("tables/srf_s2b.csv"))
        );
        assert!(matches!(TableSource::parse("file:///x.csv"), TableSource::Path(_)));
    }
}
