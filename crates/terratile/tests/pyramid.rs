//! Integration tests for building terrain tile pyramids from a synthetic
//! elevation raster.

use terratile::{
    CrsBounds, Grid, RasterSource, RasterTiler, TerrainTiler, TileCoordinate, TileCursor, Tiler,
    ZoomRange,
};

/// Elevation of the synthetic plane at a CRS position.
fn plane(x: f64, y: f64) -> f32 {
    (100.0 + 0.5 * x + 0.25 * y) as f32
}

/// A global geodetic raster sampling the plane at pixel centers.
fn global_plane_source(width: u32, height: u32) -> RasterSource {
    let bounds = CrsBounds::new(-180.0, -90.0, 180.0, 90.0);
    let sx = bounds.width() / width as f64;
    let sy = bounds.height() / height as f64;

    let mut data = Vec::with_capacity((width * height) as usize);
    for j in 0..height {
        let y = bounds.max_y - (j as f64 + 0.5) * sy;
        for i in 0..width {
            let x = bounds.min_x + (i as f64 + 0.5) * sx;
            data.push(plane(x, y));
        }
    }
    RasterSource::from_parts(data, width, height, bounds)
}

fn global_tiler() -> TerrainTiler {
    TerrainTiler::new(global_plane_source(256, 128), Grid::geodetic(65).unwrap()).unwrap()
}

#[test]
fn test_pyramid_tile_counts_and_tags() {
    let cursor = TileCursor::new(global_tiler(), ZoomRange::new(0, 2).unwrap());
    assert_eq!(cursor.total_tiles(), 2 + 8 + 32);

    let mut seen = Vec::new();
    for tile in cursor {
        let tile = tile.expect("tile build failed");
        assert_eq!(tile.size(), 65);
        assert_eq!(tile.heights().len(), 65 * 65);
        seen.push(*tile.coordinate());
    }

    assert_eq!(seen.len(), 42);
    let mut unique = seen.clone();
    unique.sort_by_key(|c| (c.zoom, c.y, c.x));
    unique.dedup();
    assert_eq!(unique.len(), 42, "every coordinate visited exactly once");

    // Zooms ascend over the traversal.
    for pair in seen.windows(2) {
        assert!(pair[0].zoom <= pair[1].zoom);
    }
}

#[test]
fn test_adjacent_tiles_share_east_west_border() {
    let tiler = global_tiler();

    let west = tiler.create_tile(&TileCoordinate::new(1, 1, 0)).unwrap();
    let east = tiler.create_tile(&TileCoordinate::new(1, 2, 0)).unwrap();

    // The east tile's first column overlaps the west tile's last column:
    // both are sampled at identical source positions.
    for row in 0..65 {
        assert_eq!(
            west.heights()[row * 65 + 64],
            east.heights()[row * 65],
            "border mismatch at row {row}"
        );
    }
}

#[test]
fn test_adjacent_tiles_share_north_south_border() {
    let tiler = global_tiler();

    let south = tiler.create_tile(&TileCoordinate::new(1, 1, 0)).unwrap();
    let north = tiler.create_tile(&TileCoordinate::new(1, 1, 1)).unwrap();

    // Rows run north to south: the north tile's bottom row overlaps the
    // south tile's top row.
    for col in 0..65 {
        assert_eq!(
            north.heights()[64 * 65 + col],
            south.heights()[col],
            "border mismatch at column {col}"
        );
    }
}

#[test]
fn test_native_zoom_range_follows_resolution() {
    let tiler = global_tiler();

    // A 256x128 global raster resolves 1.40625 deg/px; the geodetic grid
    // reaches that between zoom 0 (2.77) and zoom 1 (1.38).
    assert_eq!(tiler.max_zoom(), 1);

    let cursor = TileCursor::over_native_range(global_tiler());
    assert_eq!(cursor.zoom_range(), &ZoomRange::new(0, 1).unwrap());
    assert_eq!(cursor.total_tiles(), 2 + 8);
    assert_eq!(cursor.filter_map(|t| t.ok()).count(), 10);
}

#[test]
fn test_partial_extent_clips_tile_ranges() {
    // Raster covering only the north-east quadrant.
    let source = RasterSource::from_parts(
        vec![42.0; 128 * 64],
        128,
        64,
        CrsBounds::new(0.0, 0.0, 180.0, 90.0),
    );
    let tiler = TerrainTiler::new(source, Grid::geodetic(65).unwrap()).unwrap();

    let zoom1 = tiler.tile_range(1).unwrap();
    assert_eq!((zoom1.min_x, zoom1.max_x), (2, 3));
    assert_eq!((zoom1.min_y, zoom1.max_y), (1, 1));

    let cursor = TileCursor::new(tiler, ZoomRange::new(0, 1).unwrap());
    assert_eq!(cursor.total_tiles(), 1 + 2);

    let coords: Vec<TileCoordinate> = cursor.map(|t| *t.unwrap().coordinate()).collect();
    assert_eq!(
        coords,
        vec![
            TileCoordinate::new(0, 1, 0),
            TileCoordinate::new(1, 2, 1),
            TileCoordinate::new(1, 3, 1),
        ]
    );
}

#[test]
fn test_constant_elevation_quantizes_uniformly() {
    let source = RasterSource::from_parts(
        vec![250.0; 128 * 64],
        128,
        64,
        CrsBounds::new(-180.0, -90.0, 180.0, 90.0),
    );
    let tiler = TerrainTiler::new(source, Grid::geodetic(65).unwrap()).unwrap();
    let tile = tiler.create_tile(&TileCoordinate::new(0, 0, 0)).unwrap();

    // (250 + 1000) * 5 = 6250 everywhere the raster covers; the padded
    // west/north overhang clamps onto the raster edge, so it matches too.
    assert!(tile.heights().iter().all(|&h| h == 6250));
}

#[test]
fn test_raster_tiler_yields_windows() {
    let source = global_plane_source(256, 128);
    let grid = Grid::geodetic(65).unwrap();
    let tiler = RasterTiler::new(source, grid.clone()).unwrap();

    let coord = TileCoordinate::new(1, 0, 0);
    let raster_tile = tiler.create_tile(&coord).unwrap();

    assert_eq!(raster_tile.coord, coord);
    assert_eq!(raster_tile.window.width, 65);
    assert_eq!(raster_tile.window.height, 65);

    let (padded, resolution) = terratile::padded_tile_extent(&grid, &coord);
    assert_eq!(raster_tile.window.bounds, padded);
    assert!((raster_tile.resolution - resolution).abs() < 1e-12);
}

#[test]
fn test_two_cursors_share_one_source() {
    let tiler = global_tiler();
    let a = TileCursor::new(tiler.clone(), ZoomRange::single(1));
    let b = TileCursor::new(tiler, ZoomRange::single(1));

    let heights_a: Vec<Vec<u16>> = a.map(|t| t.unwrap().heights().to_vec()).collect();
    let heights_b: Vec<Vec<u16>> = b.map(|t| t.unwrap().heights().to_vec()).collect();
    assert_eq!(heights_a, heights_b);
}
