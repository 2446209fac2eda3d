//! Tile grids produced by the splitter.

use raster_common::{PixelWindow, RasterRequest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one tile of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId {
    /// Row-major linear index.
    pub index: usize,
    pub row: u32,
    pub col: u32,
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} (row {}, col {})", self.index, self.row, self.col)
    }
}

/// One cell of a [`TileGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: TileId,
    /// Pixel window of this tile inside the parent request.
    pub window: PixelWindow,
    /// The narrowed request to send for this tile.
    pub request: RasterRequest,
    /// Output file name (e.g. `003.tif`).
    pub file_name: String,
}

/// A square `side x side` grid of tiles, `side = 2^power`, covering the
/// parent request exactly. Tiles are stored in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    power: u32,
    cell_width: u32,
    cell_height: u32,
    parent: PixelWindow,
    tiles: Vec<Tile>,
}

impl TileGrid {
    pub(crate) fn new(
        power: u32,
        cell_width: u32,
        cell_height: u32,
        parent: PixelWindow,
        tiles: Vec<Tile>,
    ) -> Self {
        Self {
            power,
            cell_width,
            cell_height,
            parent,
            tiles,
        }
    }

    /// Split power; the grid has `4^power` tiles.
    pub fn power(&self) -> u32 {
        self.power
    }

    /// Number of tiles per row and per column (`2^power`).
    pub fn side(&self) -> u32 {
        1 << self.power
    }

    /// Nominal (truncated) cell width. The last column may be wider.
    pub fn cell_width(&self) -> u32 {
        self.cell_width
    }

    /// Nominal (truncated) cell height. The last row may be taller.
    pub fn cell_height(&self) -> u32 {
        self.cell_height
    }

    /// Window of the parent request the grid covers.
    pub fn parent(&self) -> PixelWindow {
        self.parent
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile at `(row, col)`.
    pub fn tile(&self, row: u32, col: u32) -> Option<&Tile> {
        let side = self.side();
        if row >= side || col >= side {
            return None;
        }
        self.tiles.get((row * side + col) as usize)
    }

    /// Largest pixel count of any tile.
    pub fn max_tile_pixels(&self) -> u64 {
        self.tiles
            .iter()
            .map(|t| t.window.pixel_count())
            .max()
            .unwrap_or(0)
    }

    /// Hand the tiles over to a consumer.
    pub fn into_tiles(self) -> Vec<Tile> {
        self.tiles
    }
}

impl IntoIterator for TileGrid {
    type Item = Tile;
    type IntoIter = std::vec::IntoIter<Tile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.into_iter()
    }
}
