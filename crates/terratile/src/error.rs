//! Error types for terrain tiling.

use thiserror::Error;

/// Errors that can occur while building terrain tiles.
#[derive(Debug, Error)]
pub enum TilerError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding error.
    #[error("TIFF decode error: {0}")]
    TiffDecode(#[from] tiff::TiffError),

    /// Invalid GeoTIFF - missing or malformed georeferencing tags.
    #[error("Invalid GeoTIFF: {0}")]
    InvalidGeoTiff(String),

    /// Unsupported sample format in the TIFF file.
    #[error("Unsupported TIFF data type: {0}")]
    UnsupportedDataType(String),

    /// Tile size too small to define a sampling resolution.
    ///
    /// The heightmap overlap border reserves one pixel, so a grid needs at
    /// least a 2x2 tile to have any interior left.
    #[error("Invalid tile size {0} (must be at least 2 pixels)")]
    InvalidTileSize(u32),

    /// Zoom range where the start zoom is above the end zoom.
    #[error("Invalid zoom range: start zoom {start} is above end zoom {end}")]
    InvalidZoomRange {
        /// Requested start (coarsest) zoom.
        start: u8,
        /// Requested end (finest) zoom.
        end: u8,
    },

    /// The raster does not overlap the tiling grid's extent at all.
    #[error("Raster extent does not intersect the tiling grid")]
    EmptyExtent,

    /// A tile could not be materialized.
    ///
    /// Wraps the underlying failure together with the coordinate that was
    /// being built, so callers can decide to skip, retry, or abort.
    #[error("Failed to build tile {zoom}/{x}/{y}: {source}")]
    TileFailed {
        /// Zoom level of the failed tile.
        zoom: u8,
        /// Column of the failed tile.
        x: u32,
        /// Row of the failed tile.
        y: u32,
        /// The underlying failure.
        #[source]
        source: Box<TilerError>,
    },
}

impl TilerError {
    /// Wrap an error as a tile materialization failure for `coord`.
    pub fn for_tile(coord: &crate::TileCoordinate, source: TilerError) -> Self {
        TilerError::TileFailed {
            zoom: coord.zoom,
            x: coord.x,
            y: coord.y,
            source: Box::new(source),
        }
    }
}
