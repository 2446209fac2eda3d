//! Quota-driven request splitting.

use raster_common::{PixelWindow, RasterRequest};
use tracing::{debug, info, instrument};

use crate::grid::{Tile, TileGrid, TileId};
use crate::naming::TileNaming;
use crate::quota::{quota_power, QuotaViolation};
use crate::{Result, TilingError};

/// Upper bound on the up-front tile allocation; larger grids grow as built.
const MAX_PREALLOCATED_TILES: usize = 4096;

/// Splits oversized requests into quota-sized tile grids.
#[derive(Debug, Clone, Default)]
pub struct TileSplitter {
    naming: TileNaming,
}

impl TileSplitter {
    pub fn new(naming: TileNaming) -> Self {
        Self { naming }
    }

    pub fn naming(&self) -> &TileNaming {
        &self.naming
    }

    /// Split `request` according to a quota violation reported by the service.
    pub fn split_for(&self, request: &RasterRequest, violation: &QuotaViolation) -> Result<TileGrid> {
        self.split(request, violation.requested, violation.allowed)
    }

    /// Split `request` into a `2^power x 2^power` grid where `power` is the
    /// smallest value with `requested <= allowed * 4^power`.
    ///
    /// Cell sizes are the parent dimensions divided by `2^power`, truncated.
    /// The last column and the last row absorb the division remainder so the
    /// grid covers every parent pixel. When the remainder pushes the largest
    /// cell over `allowed`, the power is raised until it fits.
    #[instrument(skip(self, request), fields(source = %request.source.label(), width = request.width(), height = request.height()))]
    pub fn split(&self, request: &RasterRequest, requested: u64, allowed: u64) -> Result<TileGrid> {
        let violation = QuotaViolation::new(requested, allowed)?;
        let (width, height) = (request.width(), request.height());

        let mut power = quota_power(violation.requested, violation.allowed);
        loop {
            let side = 1u64 << power;
            if side > width as u64 || side > height as u64 {
                return Err(TilingError::Unsplittable { width, height, side });
            }

            let largest = largest_cell(width, side) * largest_cell(height, side);
            if largest <= violation.allowed {
                break;
            }

            debug!(
                power,
                largest_cell_pixels = largest,
                allowed = violation.allowed,
                "Remainder cell exceeds quota, increasing split power"
            );
            power += 1;
        }

        let grid = self.build_grid(request, power)?;

        info!(
            power,
            tiles = grid.len(),
            cell_width = grid.cell_width(),
            cell_height = grid.cell_height(),
            "Split request into tile grid"
        );
        Ok(grid)
    }

    fn build_grid(&self, request: &RasterRequest, power: u32) -> Result<TileGrid> {
        let side = 1u32 << power;
        let (width, height) = (request.width(), request.height());
        let cell_width = width / side;
        let cell_height = height / side;
        let count = (side as usize) * (side as usize);

        let mut tiles = Vec::with_capacity(count.min(MAX_PREALLOCATED_TILES));
        for row in 0..side {
            for col in 0..side {
                let window = PixelWindow::new(
                    col * cell_width,
                    row * cell_height,
                    span(width, cell_width, side, col),
                    span(height, cell_height, side, row),
                );
                let index = tile_index(row, col, side);

                tiles.push(Tile {
                    id: TileId { index, row, col },
                    window,
                    request: request.window(&window)?,
                    file_name: self.naming.file_name(index, count),
                });
            }
        }

        Ok(TileGrid::new(
            power,
            cell_width,
            cell_height,
            PixelWindow::full(width, height),
            tiles,
        ))
    }
}

/// Row-major index of cell `(row, col)`, in `usize` since grids wider
/// than 65536 cells have more cells than `u32` can count.
fn tile_index(row: u32, col: u32, side: u32) -> usize {
    row as usize * side as usize + col as usize
}

/// Extent of cell `i` along one axis; the last cell takes the remainder.
fn span(total: u32, cell: u32, side: u32, i: u32) -> u32 {
    if i + 1 == side {
        total - cell * (side - 1)
    } else {
        cell
    }
}

/// Extent of the largest cell along one axis for a given side count.
fn largest_cell(total: u32, side: u64) -> u64 {
    let total = total as u64;
    let cell = total / side;
    total - cell * (side - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{AffineTransform, CrsCode, PixelGrid, RasterSource};

    fn request(width: u32, height: u32) -> RasterRequest {
        RasterRequest::new(
            RasterSource::Asset("S2".to_string()),
            vec!["B2".to_string()],
            PixelGrid::new(
                width,
                height,
                AffineTransform::north_up(0.0, 0.0, 10.0),
                CrsCode::epsg(32613),
            ),
        )
        .unwrap()
    }

    #[test]
    fn test_power_zero_is_single_tile() {
        let grid = TileSplitter::default()
            .split(&request(100, 100), 10_000, 10_000)
            .unwrap();
        assert_eq!(grid.power(), 0);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.tiles()[0].window, PixelWindow::full(100, 100));
        assert_eq!(grid.tiles()[0].file_name, "000.tif");
    }

    #[test]
    fn test_remainder_goes_to_last_row_and_column() {
        let grid = TileSplitter::default()
            .split(&request(101, 99), 101 * 99, 2_600)
            .unwrap();
        assert_eq!(grid.power(), 1);
        assert_eq!(grid.cell_width(), 50);
        assert_eq!(grid.cell_height(), 49);

        assert_eq!(grid.tile(0, 0).unwrap().window, PixelWindow::new(0, 0, 50, 49));
        assert_eq!(grid.tile(0, 1).unwrap().window, PixelWindow::new(50, 0, 51, 49));
        assert_eq!(grid.tile(1, 0).unwrap().window, PixelWindow::new(0, 49, 50, 50));
        assert_eq!(grid.tile(1, 1).unwrap().window, PixelWindow::new(50, 49, 51, 50));
    }

    #[test]
    fn test_power_is_raised_when_remainder_overflows_quota() {
        // Power 1 satisfies 2065*2064 <= 4 * 1_066_000, but the 1033x1032
        // corner cell does not fit.
        assert_eq!(quota_power(2065 * 2064, 1_066_000), 1);
        let grid = TileSplitter::default()
            .split(&request(2065, 2064), 2065 * 2064, 1_066_000)
            .unwrap();
        assert_eq!(grid.power(), 2);
        assert!(grid.max_tile_pixels() <= 1_066_000);
    }

    #[test]
    fn test_unsplittable_thin_request() {
        let result = TileSplitter::default().split(&request(1, 5_000), 5_000, 100);
        assert!(matches!(result, Err(TilingError::Unsplittable { .. })));
    }

    #[test]
    fn test_zero_quota_is_malformed() {
        let result = TileSplitter::default().split(&request(10, 10), 100, 0);
        assert!(matches!(result, Err(TilingError::MalformedQuotaSignal(_))));
    }

    #[test]
    fn test_tile_index_beyond_u32() {
        assert_eq!(tile_index(1, 1, 4), 5);
        assert_eq!(tile_index(65_535, 65_535, 65_536), u32::MAX as usize);

        let side = 1u32 << 17;
        let last = tile_index(side - 1, side - 1, side);
        assert_eq!(last as u64, (1u64 << 34) - 1);
    }
}
