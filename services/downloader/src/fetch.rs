//! Bounded concurrent tile fetching.
//!
//! Key features:
//! - At most `max_concurrent` requests in flight
//! - Per-tile failure isolation: a failed tile never stops its siblings
//! - Atomic writes via a `.partial` file renamed into place
//! - Tiles already on disk are not fetched again

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};
use thiserror::Error;
use tiling::{Tile, TileGrid, TileId};
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{ImageService, ServiceError};

/// Failure of a single tile.
#[derive(Error, Debug)]
pub enum TileFetchError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A tile that could not be fetched.
#[derive(Debug)]
pub struct TileFailure {
    pub id: TileId,
    pub error: TileFetchError,
}

/// Outcome of fetching a tile grid.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Tiles present on disk after the run, by index.
    pub succeeded: Vec<TileId>,
    /// Tiles that failed, by index.
    pub failed: Vec<TileFailure>,
    /// Tiles skipped because their output already existed.
    pub skipped: usize,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<TileId> {
        self.failed.iter().map(|f| f.id).collect()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

enum TileOutcome {
    Written,
    Existing,
}

/// Fetches tiles with bounded parallelism.
#[derive(Clone)]
pub struct BoundedFetcher {
    service: Arc<dyn ImageService>,
    max_concurrent: usize,
}

impl BoundedFetcher {
    pub fn new(service: Arc<dyn ImageService>, max_concurrent: usize) -> Self {
        Self {
            service,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Fetch every tile of `grid` into `dir`.
    ///
    /// Completion order is arbitrary; the report is sorted by tile index.
    #[instrument(skip(self, grid), fields(dir = %dir.display(), tiles = grid.len()))]
    pub async fn fetch_grid(&self, grid: TileGrid, dir: &Path) -> FetchReport {
        self.fetch_all(grid.into_tiles(), dir).await
    }

    /// Fetch `tiles` into `dir`, each to its own file name.
    pub async fn fetch_all(&self, tiles: Vec<Tile>, dir: &Path) -> FetchReport {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create tile directory");
            let failed = tiles
                .into_iter()
                .map(|tile| TileFailure {
                    id: tile.id,
                    error: TileFetchError::Write {
                        path: dir.to_path_buf(),
                        source: std::io::Error::new(e.kind(), e.to_string()),
                    },
                })
                .collect();
            return FetchReport {
                failed,
                ..FetchReport::default()
            };
        }

        let results = stream::iter(tiles)
            .map(|tile| {
                let service = self.service.clone();
                let path = dir.join(&tile.file_name);
                async move {
                    let result = fetch_tile(service.as_ref(), &tile, &path).await;
                    (tile.id, result)
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect::<Vec<_>>()
            .await;

        let mut report = FetchReport::default();
        for (id, result) in results {
            match result {
                Ok(TileOutcome::Written) => report.succeeded.push(id),
                Ok(TileOutcome::Existing) => {
                    report.skipped += 1;
                    report.succeeded.push(id);
                }
                Err(error) => {
                    error!(tile = %id, error = %error, "Tile fetch failed");
                    report.failed.push(TileFailure { id, error });
                }
            }
        }
        report.succeeded.sort();
        report.failed.sort_by_key(|f| f.id);

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            skipped = report.skipped,
            "Tile fetch complete"
        );
        report
    }
}

#[instrument(skip(service, tile), fields(tile = %tile.id))]
async fn fetch_tile(
    service: &dyn ImageService,
    tile: &Tile,
    path: &Path,
) -> Result<TileOutcome, TileFetchError> {
    if fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Tile already exists, skipping");
        return Ok(TileOutcome::Existing);
    }

    let start = Instant::now();
    let bytes = match service.fetch(&tile.request).await {
        Ok(bytes) => bytes,
        Err(e) => {
            counter!("tile_failures_total").increment(1);
            return Err(e.into());
        }
    };

    if let Err(e) = write_atomic(path, &bytes).await {
        counter!("tile_failures_total").increment(1);
        return Err(e);
    }

    histogram!("tile_fetch_duration_ms").record(start.elapsed().as_secs_f64() * 1000.0);
    counter!("tiles_fetched_total").increment(1);
    debug!(path = %path.display(), bytes = bytes.len(), "Tile written");
    Ok(TileOutcome::Written)
}

/// Write `data` to `path` through a `.partial` sibling renamed into place.
pub async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), TileFetchError> {
    let write_err = |source| TileFetchError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    if let Err(e) = fs::write(&partial, data).await {
        remove_partial(&partial).await;
        return Err(write_err(e));
    }

    // rename fails across filesystems; fall back to copy+delete
    if fs::rename(&partial, path).await.is_err() {
        let copied = fs::copy(&partial, path).await;
        remove_partial(&partial).await;
        copied.map_err(write_err)?;
    }
    Ok(())
}

async fn remove_partial(partial: &Path) {
    if let Err(e) = fs::remove_file(partial).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %partial.display(), error = %e, "Failed to remove partial file");
        }
    }
}
