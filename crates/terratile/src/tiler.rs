//! Tile builders bridging the tiling grid and the raster source.
//!
//! The heightmap format requires every tile to carry one row/column of
//! samples shared with its western and northern neighbors, so a tile is
//! sampled over a *padded* extent: the true tile bounds extended west and
//! north by exactly one sample spacing.

use crate::heightmap::{TerrainTile, CHILD_NE, CHILD_NW, CHILD_SE, CHILD_SW};
use crate::raster::{RasterSource, RasterWindow};
use crate::{CrsBounds, Grid, Result, TileCoordinate, TileRange, TilerError, ZoomRange};
use tracing::trace;

/// Extend tile bounds by one sample spacing to the west and north.
///
/// The spacing is derived from the *unpadded* tile width divided by the
/// tile's truly-owned pixel columns (`tile_size - 1`; the remaining pixel
/// is the shared border). Returns the shifted bounds and the spacing.
fn pad_bounds(mut bounds: CrsBounds, tile_size: u32) -> (CrsBounds, f64) {
    let inner = (tile_size - 1) as f64;
    let resolution = bounds.width() / inner;
    bounds.min_x -= resolution;
    bounds.max_y += resolution;
    (bounds, resolution)
}

/// Compute the padded sampling extent and per-pixel resolution for a tile.
///
/// The south and east edges match the tile's true bounds exactly; the west
/// and north edges sit one resolution unit further out. `coord` is assumed
/// valid under `grid` at its zoom level; validity is the iterating caller's
/// responsibility via [`Grid::tile_range`]. Pure function of its inputs.
pub fn padded_tile_extent(grid: &Grid, coord: &TileCoordinate) -> (CrsBounds, f64) {
    // Grid construction guarantees tile_size >= 2.
    pad_bounds(grid.tile_bounds(coord), grid.tile_size())
}

/// The capability of turning a tile coordinate into a materialized tile.
///
/// Implementations bind a raster source to a tiling grid and own the
/// whole sampling/encoding path for one tile kind. The trait also exposes
/// the tiling geometry a [`TileCursor`](crate::TileCursor) needs to
/// enumerate valid coordinates.
pub trait Tiler {
    /// The tile type this builder materializes.
    type Tile;

    /// The tiling grid tiles are laid out on.
    fn grid(&self) -> &Grid;

    /// The raster extent clipped to the grid, in grid CRS units.
    fn extent(&self) -> &CrsBounds;

    /// The finest zoom level the raster's resolution supports.
    fn max_zoom(&self) -> u8;

    /// Materialize the tile at `coord`.
    ///
    /// Either fully succeeds or fails; failures carry the coordinate via
    /// [`TilerError::TileFailed`]. No partial tile is ever returned.
    fn create_tile(&self, coord: &TileCoordinate) -> Result<Self::Tile>;

    /// The range of valid tiles at `zoom`, or `None` when the zoom holds
    /// no tiles.
    fn tile_range(&self, zoom: u8) -> Option<TileRange> {
        Some(self.grid().tile_range(self.extent(), zoom))
    }

    /// The raster's native zoom range: the whole pyramid from the root
    /// down to [`max_zoom`](Tiler::max_zoom).
    fn native_zoom_range(&self) -> ZoomRange {
        ZoomRange::up_to(self.max_zoom())
    }
}

/// Shared source/grid binding behind both tiler variants.
#[derive(Debug, Clone)]
struct TilerBinding {
    source: RasterSource,
    grid: Grid,
    extent: CrsBounds,
    max_zoom: u8,
}

impl TilerBinding {
    fn new(source: RasterSource, grid: Grid) -> Result<Self> {
        let extent = source
            .bounds()
            .intersection(grid.extent())
            .ok_or(TilerError::EmptyExtent)?;
        let max_zoom = grid.zoom_for_resolution(source.resolution());
        Ok(Self {
            source,
            grid,
            extent,
            max_zoom,
        })
    }

    /// Sample one tile's padded extent into a square window.
    fn sample_padded(&self, coord: &TileCoordinate) -> RasterWindow {
        let (bounds, resolution) = padded_tile_extent(&self.grid, coord);
        trace!(tile = %coord, ?bounds, resolution, "sampling padded tile extent");
        let size = self.grid.tile_size();
        self.source.read_window(&bounds, size, size)
    }
}

/// Builds [`TerrainTile`] heightmaps from a raster source.
///
/// Cloning is cheap: clones share the underlying raster, so independent
/// cursors over the same source are safe.
#[derive(Debug, Clone)]
pub struct TerrainTiler {
    binding: TilerBinding,
}

impl TerrainTiler {
    /// Bind a raster source to a tiling grid.
    ///
    /// Fails with [`TilerError::EmptyExtent`] if the raster does not
    /// overlap the grid at all.
    pub fn new(source: RasterSource, grid: Grid) -> Result<Self> {
        Ok(Self {
            binding: TilerBinding::new(source, grid)?,
        })
    }

    /// The bound raster source.
    pub fn source(&self) -> &RasterSource {
        &self.binding.source
    }

    /// Which of the four child tiles of `coord` exist at the next zoom.
    fn child_flags(&self, coord: &TileCoordinate) -> u8 {
        if coord.zoom >= self.max_zoom() {
            return 0;
        }
        let Some(range) = self.tile_range(coord.zoom + 1) else {
            return 0;
        };

        let (cx, cy) = (coord.x * 2, coord.y * 2);
        let child = |x, y| TileCoordinate::new(coord.zoom + 1, x, y);
        let mut flags = 0;
        if range.contains(&child(cx, cy)) {
            flags |= CHILD_SW;
        }
        if range.contains(&child(cx + 1, cy)) {
            flags |= CHILD_SE;
        }
        if range.contains(&child(cx, cy + 1)) {
            flags |= CHILD_NW;
        }
        if range.contains(&child(cx + 1, cy + 1)) {
            flags |= CHILD_NE;
        }
        flags
    }
}

impl Tiler for TerrainTiler {
    type Tile = TerrainTile;

    fn grid(&self) -> &Grid {
        &self.binding.grid
    }

    fn extent(&self) -> &CrsBounds {
        &self.binding.extent
    }

    fn max_zoom(&self) -> u8 {
        self.binding.max_zoom
    }

    fn create_tile(&self, coord: &TileCoordinate) -> Result<TerrainTile> {
        let window = self.binding.sample_padded(coord);
        let mut tile = TerrainTile::from_window(coord, &window);
        tile.set_child_flags(self.child_flags(coord));
        Ok(tile)
    }
}

/// A raw resampled raster window tagged with its tile coordinate.
///
/// Produced by [`RasterTiler`] for callers that want the padded-extent
/// sample data without terrain encoding.
#[derive(Debug, Clone)]
pub struct RasterTile {
    /// The coordinate this window was sampled for.
    pub coord: TileCoordinate,
    /// The resampled window over the padded extent.
    pub window: RasterWindow,
    /// Sample spacing in CRS units per pixel.
    pub resolution: f64,
}

/// Builds raw [`RasterTile`] windows instead of encoded terrain tiles.
#[derive(Debug, Clone)]
pub struct RasterTiler {
    binding: TilerBinding,
}

impl RasterTiler {
    /// Bind a raster source to a tiling grid.
    pub fn new(source: RasterSource, grid: Grid) -> Result<Self> {
        Ok(Self {
            binding: TilerBinding::new(source, grid)?,
        })
    }
}

impl Tiler for RasterTiler {
    type Tile = RasterTile;

    fn grid(&self) -> &Grid {
        &self.binding.grid
    }

    fn extent(&self) -> &CrsBounds {
        &self.binding.extent
    }

    fn max_zoom(&self) -> u8 {
        self.binding.max_zoom
    }

    fn create_tile(&self, coord: &TileCoordinate) -> Result<RasterTile> {
        let (_, resolution) = padded_tile_extent(self.grid(), coord);
        let window = self.binding.sample_padded(coord);
        Ok(RasterTile {
            coord: *coord,
            window,
            resolution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pad_bounds_reference_values() {
        // 65-pixel tiles: 64 owned columns plus the shared border pixel.
        let (bounds, resolution) =
            pad_bounds(CrsBounds::new(100.0, 50.0, 200.0, 150.0), 65);

        assert_relative_eq!(resolution, 100.0 / 64.0);
        assert_relative_eq!(resolution, 1.5625);
        assert_relative_eq!(bounds.min_x, 98.4375);
        assert_relative_eq!(bounds.max_x, 200.0);
        assert_relative_eq!(bounds.min_y, 50.0);
        assert_relative_eq!(bounds.max_y, 151.5625);
    }

    #[test]
    fn test_padded_extent_from_grid() {
        let grid = Grid::geodetic(65).unwrap();
        let coord = TileCoordinate::new(0, 0, 0);
        let true_bounds = grid.tile_bounds(&coord);
        let (padded, resolution) = padded_tile_extent(&grid, &coord);

        assert!(resolution > 0.0);
        assert_relative_eq!(resolution, true_bounds.width() / 64.0);
        assert_relative_eq!(padded.min_x, true_bounds.min_x - resolution);
        assert_relative_eq!(padded.max_y, true_bounds.max_y + resolution);
        // South and east edges are untouched.
        assert_relative_eq!(padded.min_y, true_bounds.min_y);
        assert_relative_eq!(padded.max_x, true_bounds.max_x);
    }

    #[test]
    fn test_empty_extent_rejected() {
        // Raster entirely off the mercator grid's square extent.
        let source = RasterSource::from_parts(
            vec![0.0; 4],
            2,
            2,
            CrsBounds::new(3.0e7, 3.0e7, 3.1e7, 3.1e7),
        );
        let grid = Grid::mercator(65).unwrap();
        assert!(matches!(
            TerrainTiler::new(source, grid),
            Err(TilerError::EmptyExtent)
        ));
    }

    #[test]
    fn test_child_flags_at_max_zoom() {
        let source = RasterSource::from_parts(
            vec![0.0; 4],
            2,
            2,
            CrsBounds::new(-180.0, -90.0, 180.0, 90.0),
        );
        let grid = Grid::geodetic(65).unwrap();
        let tiler = TerrainTiler::new(source, grid).unwrap();

        // A 2x2 global raster is far coarser than zoom 0 resolution.
        assert_eq!(tiler.max_zoom(), 0);
        let tile = tiler.create_tile(&TileCoordinate::new(0, 0, 0)).unwrap();
        assert_eq!(tile.child_flags(), 0);
    }
}
