//! Output file naming for tiles.
//!
//! Tiles are written as `000.tif`, `001.tif`, ... in row-major grid order.
//! The merge step downstream discovers a sample's tiles by listing the
//! directory, so names must sort in grid order and be reproducible.

use std::io;
use std::path::{Path, PathBuf};

/// Minimum number of digits in a tile file name.
const MIN_INDEX_DIGITS: usize = 3;

/// Naming scheme for tile output files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileNaming {
    extension: String,
}

impl Default for TileNaming {
    fn default() -> Self {
        Self::new("tif")
    }
}

impl TileNaming {
    /// Naming with the given file extension (without the dot).
    pub fn new(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File name of tile `index` in a grid of `count` tiles.
    ///
    /// Indices are zero-padded to at least three digits, and wide enough for
    /// the largest index so lexical order equals grid order.
    pub fn file_name(&self, index: usize, count: usize) -> String {
        let digits = index_digits(count);
        format!("{:0width$}.{}", index, self.extension, width = digits)
    }
}

fn index_digits(count: usize) -> usize {
    let largest = count.saturating_sub(1);
    largest.to_string().len().max(MIN_INDEX_DIGITS)
}

/// List the tile files of a sample directory in grid order.
///
/// Only files named `<digits>.<extension>` are considered; anything else
/// (partial downloads, merged outputs) is ignored.
pub fn discover_tiles(dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.');
    let mut tiles: Vec<(u64, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let index = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse::<u64>().ok());

        if let Some(index) = index {
            tiles.push((index, path));
        }
    }

    tiles.sort_by_key(|(index, _)| *index);
    Ok(tiles.into_iter().map(|(_, path)| path).collect())
}
