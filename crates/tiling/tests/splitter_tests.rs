//! Tests for the adaptive tile splitter: coverage, quota and naming.

use proptest::prelude::*;
use raster_common::{AffineTransform, CrsCode, PixelGrid, PixelWindow, RasterRequest, RasterSource};
use test_utils::fixtures::{quota, request as fx};
use test_utils::assert_approx_eq;
use tiling::{quota_power, QuotaViolation, TileGrid, TileSplitter};

fn neon_request(width: u32, height: u32) -> RasterRequest {
    RasterRequest::new(
        RasterSource::Expression(serde_json::json!({"bands": []})),
        vec!["B2".to_string(), "B3".to_string(), "B4".to_string()],
        PixelGrid::new(
            width,
            height,
            AffineTransform::north_up(fx::ORIGIN_X, fx::ORIGIN_Y, fx::NEON_PIXEL_SIZE),
            CrsCode::parse(fx::EPSG).unwrap(),
        ),
    )
    .unwrap()
}

fn assert_exact_cover(grid: &TileGrid, width: u32, height: u32) {
    let parent = PixelWindow::full(width, height);
    let tiles = grid.tiles();

    let total: u64 = tiles.iter().map(|t| t.window.pixel_count()).sum();
    assert_eq!(total, parent.pixel_count(), "tile pixels must sum to parent");

    for (i, a) in tiles.iter().enumerate() {
        assert!(parent.contains(&a.window), "{} escapes parent", a.window);
        for b in &tiles[i + 1..] {
            assert!(!a.window.intersects(&b.window), "{} overlaps {}", a.window, b.window);
        }
    }
}

// ============================================================================
// Scenario tests
// ============================================================================

#[test]
fn test_neon_request_splits_into_four() {
    let request = neon_request(fx::NEON_SIDE, fx::NEON_SIDE);
    let quota = 1032 * 1032;

    let grid = TileSplitter::default()
        .split(&request, request.pixel_count(), quota)
        .unwrap();

    assert_eq!(grid.power(), 1);
    assert_eq!(grid.side(), 2);
    assert_eq!(grid.len(), 4);
    for tile in grid.tiles() {
        assert_eq!(tile.request.width(), 1032);
        assert_eq!(tile.request.height(), 1032);
        assert!(tile.request.pixel_count() <= quota);
    }

    let origin = grid.tile(0, 0).unwrap().request.grid.affine_transform;
    assert_eq!(origin.translate_x, fx::ORIGIN_X);
    assert_eq!(origin.translate_y, fx::ORIGIN_Y);

    let corner = grid.tile(1, 1).unwrap().request.grid.affine_transform;
    assert_approx_eq!(corner.translate_x, fx::ORIGIN_X + 1032.0 * 2.5, 1e-9);
    assert_approx_eq!(corner.translate_y, fx::ORIGIN_Y - 1032.0 * 2.5, 1e-9);
}

#[test]
fn test_neon_request_against_service_quota() {
    let request = neon_request(fx::NEON_SIDE, fx::NEON_SIDE);
    let violation = QuotaViolation::parse_message(quota::MESSAGE).unwrap();
    assert_eq!(violation.requested, request.pixel_count());

    let grid = TileSplitter::default().split_for(&request, &violation).unwrap();

    // 2064^2 exceeds 4 * 1024^2, so a 2x2 grid is not enough.
    assert_eq!(grid.power(), 2);
    assert_eq!(grid.len(), 16);
    assert_eq!(grid.cell_width(), 516);
    assert!(grid.max_tile_pixels() <= fx::PIXEL_QUOTA);

    let last = grid.tile(3, 3).unwrap().request.grid.affine_transform;
    assert_approx_eq!(last.translate_x, fx::ORIGIN_X + 3.0 * 516.0 * 2.5, 1e-9);
    assert_approx_eq!(last.translate_y, fx::ORIGIN_Y - 3.0 * 516.0 * 2.5, 1e-9);
}

#[test]
fn test_tiles_are_row_major_and_named_in_order() {
    let request = neon_request(fx::NEON_SIDE, fx::NEON_SIDE);
    let grid = TileSplitter::default()
        .split(&request, request.pixel_count(), 300_000)
        .unwrap();

    assert_eq!(grid.power(), 2);
    let names: Vec<_> = grid.tiles().iter().map(|t| t.file_name.clone()).collect();
    assert_eq!(names.first().map(String::as_str), Some("000.tif"));
    assert_eq!(names.last().map(String::as_str), Some("015.tif"));

    for (i, tile) in grid.tiles().iter().enumerate() {
        assert_eq!(tile.id.index, i);
        assert_eq!(tile.id.row, (i / 4) as u32);
        assert_eq!(tile.id.col, (i % 4) as u32);
    }
}

#[test]
fn test_tiles_inherit_source_bands_and_crs() {
    let request = neon_request(800, 600);
    let grid = TileSplitter::default().split(&request, 480_000, 130_000).unwrap();

    for tile in grid.tiles() {
        assert_eq!(tile.request.source, request.source);
        assert_eq!(tile.request.band_ids, request.band_ids);
        assert_eq!(tile.request.grid.crs_code, request.grid.crs_code);
        assert_eq!(tile.request.file_format, request.file_format);
    }
}

#[test]
fn test_tile_world_extents_cover_parent() {
    let request = neon_request(1000, 700);
    let grid = TileSplitter::default().split(&request, 700_000, 50_000).unwrap();

    let parent = request.grid.affine_transform.bounds(1000, 700);
    let mut area = 0.0;
    let mut union = None;
    for tile in grid.tiles() {
        let t = &tile.request;
        let bbox = t.grid.affine_transform.bounds(t.width(), t.height());
        area += bbox.area();
        union = Some(match union {
            None => bbox,
            Some(u) => bbox.union(&u),
        });
    }

    let union = union.unwrap();
    assert_approx_eq!(union.min_x, parent.min_x, 1e-6);
    assert_approx_eq!(union.max_x, parent.max_x, 1e-6);
    assert_approx_eq!(union.min_y, parent.min_y, 1e-6);
    assert_approx_eq!(union.max_y, parent.max_y, 1e-6);
    assert_approx_eq!(area, parent.area(), 1e-3);
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Property: the computed power is the smallest one satisfying the quota.
    #[test]
    fn prop_power_is_minimal(requested in 1u64..=u64::MAX / 2, allowed in 1u64..=10_000_000_000) {
        let power = quota_power(requested, allowed);
        let capacity = |p: u32| (allowed as u128) * 4u128.pow(p);

        prop_assert!(requested as u128 <= capacity(power));
        if power > 0 {
            prop_assert!(requested as u128 > capacity(power - 1));
        }
    }

    /// Property: tiles cover the parent exactly and each fits the quota.
    #[test]
    fn prop_grid_covers_parent_exactly(
        width in 256u32..3000,
        height in 256u32..3000,
        divisor in 1u64..=16,
    ) {
        let request = neon_request(width, height);
        let requested = request.pixel_count();
        let allowed = requested / divisor;

        let grid = TileSplitter::default().split(&request, requested, allowed).unwrap();

        prop_assert_eq!(grid.len(), 4usize.pow(grid.power()));
        prop_assert!(grid.power() >= quota_power(requested, allowed));
        prop_assert!(grid.max_tile_pixels() <= allowed);
        assert_exact_cover(&grid, width, height);
    }
}
