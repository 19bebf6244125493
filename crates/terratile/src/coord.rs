//! Tile coordinates, zoom ranges, and per-zoom tile ranges.

use crate::{Result, TilerError};
use std::fmt;

/// Identifies a single tile: zoom level, column, and row.
///
/// Tiles are addressed TMS-style: `x` is the column counted from the grid's
/// west edge, `y` is the row counted from the grid's south edge. Whether a
/// given coordinate is valid depends on the grid and zoom level; see
/// [`Grid::tile_range`](crate::Grid::tile_range).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoordinate {
    /// Zoom level.
    pub zoom: u8,
    /// Column (0 at the grid's west edge, increases eastward).
    pub x: u32,
    /// Row (0 at the grid's south edge, increases northward).
    pub y: u32,
}

impl TileCoordinate {
    /// Create a new tile coordinate.
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// An inclusive `[start, end]` span of zoom levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomRange {
    start: u8,
    end: u8,
}

impl ZoomRange {
    /// Create a zoom range, validating `start <= end`.
    pub fn new(start: u8, end: u8) -> Result<Self> {
        if start > end {
            return Err(TilerError::InvalidZoomRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering a single zoom level.
    pub fn single(zoom: u8) -> Self {
        Self { start: zoom, end: zoom }
    }

    /// The full pyramid from zoom 0 down to `end`.
    pub fn up_to(end: u8) -> Self {
        Self { start: 0, end }
    }

    /// The coarsest zoom in the range.
    pub fn start(&self) -> u8 {
        self.start
    }

    /// The finest zoom in the range.
    pub fn end(&self) -> u8 {
        self.end
    }

    /// Whether `zoom` lies within the range.
    pub fn contains(&self, zoom: u8) -> bool {
        zoom >= self.start && zoom <= self.end
    }
}

/// The inclusive column/row spans of valid tiles at one zoom level.
///
/// Also defines the canonical enumeration order within the zoom: row-major
/// with rows (`y`) ascending and columns (`x`) ascending within each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    /// Zoom level this range belongs to.
    pub zoom: u8,
    /// Westernmost valid column.
    pub min_x: u32,
    /// Easternmost valid column.
    pub max_x: u32,
    /// Southernmost valid row.
    pub min_y: u32,
    /// Northernmost valid row.
    pub max_y: u32,
}

impl TileRange {
    /// Number of tiles in the range.
    pub fn count(&self) -> u64 {
        let cols = (self.max_x - self.min_x) as u64 + 1;
        let rows = (self.max_y - self.min_y) as u64 + 1;
        cols * rows
    }

    /// Whether `coord` lies within the range (zoom included).
    pub fn contains(&self, coord: &TileCoordinate) -> bool {
        coord.zoom == self.zoom
            && coord.x >= self.min_x
            && coord.x <= self.max_x
            && coord.y >= self.min_y
            && coord.y <= self.max_y
    }

    /// The first tile in canonical order (south-west corner).
    pub fn first(&self) -> TileCoordinate {
        TileCoordinate::new(self.zoom, self.min_x, self.min_y)
    }

    /// The last tile in canonical order (north-east corner).
    pub fn last(&self) -> TileCoordinate {
        TileCoordinate::new(self.zoom, self.max_x, self.max_y)
    }

    /// The tile following `coord` in canonical order, if any.
    pub fn next(&self, coord: &TileCoordinate) -> Option<TileCoordinate> {
        debug_assert!(self.contains(coord));
        if coord.x < self.max_x {
            Some(TileCoordinate::new(self.zoom, coord.x + 1, coord.y))
        } else if coord.y < self.max_y {
            Some(TileCoordinate::new(self.zoom, self.min_x, coord.y + 1))
        } else {
            None
        }
    }

    /// The tile preceding `coord` in canonical order, if any.
    pub fn prev(&self, coord: &TileCoordinate) -> Option<TileCoordinate> {
        debug_assert!(self.contains(coord));
        if coord.x > self.min_x {
            Some(TileCoordinate::new(self.zoom, coord.x - 1, coord.y))
        } else if coord.y > self.min_y {
            Some(TileCoordinate::new(self.zoom, self.max_x, coord.y - 1))
        } else {
            None
        }
    }
}
