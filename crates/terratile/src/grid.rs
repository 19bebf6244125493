//! Tiling grid: the mapping between geographic space and tile indices.

use crate::{Result, TileCoordinate, TileRange, TilerError};

/// Axis-aligned bounding box in the grid's CRS units.
///
/// Degrees for the geodetic profile, meters for the mercator profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrsBounds {
    /// West edge.
    pub min_x: f64,
    /// South edge.
    pub min_y: f64,
    /// East edge.
    pub max_x: f64,
    /// North edge.
    pub max_y: f64,
}

impl CrsBounds {
    /// Create a new bounding box.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width of the box in CRS units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box in CRS units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Whether a point lies within the box (edges included).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// The overlap of two boxes, or `None` if they do not overlap.
    pub fn intersection(&self, other: &CrsBounds) -> Option<CrsBounds> {
        let overlap = CrsBounds {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        };
        if overlap.min_x < overlap.max_x && overlap.min_y < overlap.max_y {
            Some(overlap)
        } else {
            None
        }
    }
}

/// A quadtree tiling scheme over a fixed geographic extent.
///
/// The grid divides its extent into square tiles of a fixed pixel size.
/// Zoom level 0 holds the configured number of root tiles; every further
/// zoom level subdivides each tile into four. Tile addressing is TMS-style:
/// the origin tile sits at the grid's south-west corner, `x` grows eastward
/// and `y` grows northward.
///
/// Two standard profiles are provided: [`Grid::geodetic`] (EPSG:4326, two
/// root tiles spanning -180..180 x -90..90) and [`Grid::mercator`]
/// (EPSG:3857, one root tile spanning the square Web Mercator extent).
#[derive(Debug, Clone)]
pub struct Grid {
    tile_size: u32,
    extent: CrsBounds,
    zoom0_x: u32,
    zoom0_y: u32,
}

impl Grid {
    /// Default tile pixel size: a 65x65 heightmap per tile.
    pub const DEFAULT_TILE_SIZE: u32 = 65;

    /// Finest zoom level the grid will report.
    pub const MAX_ZOOM: u8 = 30;

    /// Half the Web Mercator extent in meters.
    const MERCATOR_EXTENT: f64 = 20_037_508.342_789_244;

    /// Create a global-geodetic (EPSG:4326) grid.
    ///
    /// Zoom 0 has two tiles side by side, each covering a 180x180 degree
    /// square, following the TMS global-geodetic profile.
    pub fn geodetic(tile_size: u32) -> Result<Self> {
        Self::with_extent(tile_size, CrsBounds::new(-180.0, -90.0, 180.0, 90.0), 2, 1)
    }

    /// Create a global-mercator (EPSG:3857) grid with one root tile.
    pub fn mercator(tile_size: u32) -> Result<Self> {
        let m = Self::MERCATOR_EXTENT;
        Self::with_extent(tile_size, CrsBounds::new(-m, -m, m, m), 1, 1)
    }

    /// Create a grid over an arbitrary extent.
    ///
    /// `zoom0_x` and `zoom0_y` give the number of root tiles along each
    /// axis. Tile sizes below 2 pixels are rejected: the heightmap border
    /// reserves one pixel, and the sampling resolution is undefined without
    /// at least one remaining interior pixel.
    pub fn with_extent(
        tile_size: u32,
        extent: CrsBounds,
        zoom0_x: u32,
        zoom0_y: u32,
    ) -> Result<Self> {
        if tile_size < 2 {
            return Err(TilerError::InvalidTileSize(tile_size));
        }
        Ok(Self {
            tile_size,
            extent,
            zoom0_x,
            zoom0_y,
        })
    }

    /// Tile pixel size (width = height).
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// The full geographic extent covered by the grid.
    pub fn extent(&self) -> &CrsBounds {
        &self.extent
    }

    /// Number of tiles along each axis at `zoom`.
    pub fn tiles_across(&self, zoom: u8) -> (u32, u32) {
        let zoom = zoom.min(Self::MAX_ZOOM) as u32;
        (self.zoom0_x << zoom, self.zoom0_y << zoom)
    }

    /// Geographic units per pixel at `zoom`.
    pub fn resolution(&self, zoom: u8) -> f64 {
        let (tiles_x, _) = self.tiles_across(zoom);
        self.extent.width() / tiles_x as f64 / self.tile_size as f64
    }

    /// The smallest zoom level whose resolution is at least as fine as
    /// `resolution`.
    ///
    /// Used to derive a raster's native maximum zoom from its pixel scale.
    pub fn zoom_for_resolution(&self, resolution: f64) -> u8 {
        let mut zoom = 0;
        while zoom < Self::MAX_ZOOM && self.resolution(zoom) > resolution {
            zoom += 1;
        }
        zoom
    }

    /// The true (unpadded) geographic bounds of a tile.
    pub fn tile_bounds(&self, coord: &TileCoordinate) -> CrsBounds {
        let (tiles_x, tiles_y) = self.tiles_across(coord.zoom);
        let tile_w = self.extent.width() / tiles_x as f64;
        let tile_h = self.extent.height() / tiles_y as f64;

        let min_x = self.extent.min_x + coord.x as f64 * tile_w;
        let min_y = self.extent.min_y + coord.y as f64 * tile_h;
        CrsBounds::new(min_x, min_y, min_x + tile_w, min_y + tile_h)
    }

    /// The tile containing a CRS point at `zoom`.
    ///
    /// Points outside the grid extent are clamped to the nearest edge tile.
    pub fn crs_to_tile(&self, x: f64, y: f64, zoom: u8) -> TileCoordinate {
        let (tiles_x, tiles_y) = self.tiles_across(zoom);
        let tile_w = self.extent.width() / tiles_x as f64;
        let tile_h = self.extent.height() / tiles_y as f64;

        let tx = ((x - self.extent.min_x) / tile_w).floor();
        let ty = ((y - self.extent.min_y) / tile_h).floor();
        TileCoordinate::new(
            zoom,
            clamp_index(tx, tiles_x),
            clamp_index(ty, tiles_y),
        )
    }

    /// The range of tiles at `zoom` touched by `extent`.
    ///
    /// `extent` is clipped to the grid before conversion, so an extent that
    /// overhangs the grid simply yields edge tiles. An extent whose edge
    /// falls exactly on a tile boundary does not pull in the neighboring
    /// empty strip of tiles.
    pub fn tile_range(&self, extent: &CrsBounds, zoom: u8) -> TileRange {
        let (tiles_x, tiles_y) = self.tiles_across(zoom);
        let tile_w = self.extent.width() / tiles_x as f64;
        let tile_h = self.extent.height() / tiles_y as f64;

        let min_x = clamp_index(((extent.min_x - self.extent.min_x) / tile_w).floor(), tiles_x);
        let min_y = clamp_index(((extent.min_y - self.extent.min_y) / tile_h).floor(), tiles_y);
        // ceil - 1 keeps boundary-aligned maxima out of the next tile over.
        let max_x = clamp_index(((extent.max_x - self.extent.min_x) / tile_w).ceil() - 1.0, tiles_x)
            .max(min_x);
        let max_y = clamp_index(((extent.max_y - self.extent.min_y) / tile_h).ceil() - 1.0, tiles_y)
            .max(min_y);

        TileRange {
            zoom,
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }
}

/// Clamp a fractional tile index into `[0, tiles - 1]`.
fn clamp_index(t: f64, tiles: u32) -> u32 {
    t.max(0.0).min((tiles - 1) as f64) as u32
}
