//! # terratile
//!
//! Terrain heightmap tile pyramid generator for GeoTIFF elevation rasters.
//!
//! This crate turns a georeferenced elevation raster into quantized
//! heightmap tiles keyed by zoom/x/y coordinates, for tiled web-mapping and
//! 3D-globe clients that consume heightmap terrain.
//!
//! ## Overview
//!
//! A [`Grid`] defines the tiling scheme: a quadtree of fixed-pixel-size
//! tiles over a global extent (geodetic or mercator profile). A
//! [`RasterSource`] holds the decoded elevation raster. A [`TerrainTiler`]
//! binds the two and materializes one [`TerrainTile`] per coordinate,
//! sampling each tile over a *padded* extent - the tile bounds extended one
//! sample spacing west and north - so that adjacent tiles share a border
//! row/column of samples as the heightmap format requires.
//!
//! A [`TileCursor`] enumerates every tile across a [`ZoomRange`] lazily:
//! moving the cursor is cheap, and a tile is only built when dereferenced.
//!
//! ## Example
//!
//! ```no_run
//! use terratile::{Grid, RasterSource, TerrainTiler, TileCursor, ZoomRange};
//!
//! let source = RasterSource::open("dem/srtm_region.tif")?;
//! let grid = Grid::geodetic(65)?;
//! let tiler = TerrainTiler::new(source, grid)?;
//!
//! for tile in TileCursor::new(tiler, ZoomRange::new(0, 8)?) {
//!     let tile = tile?;
//!     println!("built tile {}", tile.coordinate());
//! }
//! # Ok::<(), terratile::TilerError>(())
//! ```

mod coord;
mod cursor;
mod error;
mod grid;
mod heightmap;
mod raster;
mod tiler;

pub use coord::{TileCoordinate, TileRange, ZoomRange};
pub use cursor::TileCursor;
pub use error::TilerError;
pub use grid::{CrsBounds, Grid};
pub use heightmap::{TerrainTile, CHILD_NE, CHILD_NW, CHILD_SE, CHILD_SW};
pub use raster::{RasterSource, RasterWindow};
pub use tiler::{padded_tile_extent, RasterTile, RasterTiler, TerrainTiler, Tiler};

/// Result type for tiling operations.
pub type Result<T> = std::result::Result<T, TilerError>;
