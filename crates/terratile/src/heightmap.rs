//! Terrain heightmap tile representation and serialization.
//!
//! Follows the Cesium heightmap-1.0 terrain format: a square grid of
//! little-endian u16 height samples in 0.2 meter increments offset by
//! -1000 m, followed by a child-tile flags byte and a water mask byte.
//! On disk the payload is gzip-compressed.

use crate::raster::RasterWindow;
use crate::TileCoordinate;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

/// Lowest representable elevation in meters.
const HEIGHT_OFFSET: f64 = 1000.0;

/// Quantization steps per meter (0.2 m resolution).
const HEIGHT_SCALE: f64 = 5.0;

/// Child flag: south-west child tile exists.
pub const CHILD_SW: u8 = 1;
/// Child flag: south-east child tile exists.
pub const CHILD_SE: u8 = 2;
/// Child flag: north-west child tile exists.
pub const CHILD_NW: u8 = 4;
/// Child flag: north-east child tile exists.
pub const CHILD_NE: u8 = 8;

/// Water mask byte for an all-land tile.
const WATER_MASK_LAND: u8 = 0;

/// A materialized heightmap tile for one tile coordinate.
///
/// Immutable after construction; holds no reference back to whatever
/// produced it.
#[derive(Debug, Clone)]
pub struct TerrainTile {
    coord: TileCoordinate,
    size: u32,
    heights: Vec<u16>,
    child_flags: u8,
}

impl TerrainTile {
    /// Build a tile from a sampled raster window.
    ///
    /// The window must be square and its dimensions become the tile's
    /// sample grid size. Rows run north to south, as sampled.
    ///
    /// # Panics
    /// Panics if the window is not square or its pixel count is wrong.
    pub fn from_window(coord: &TileCoordinate, window: &RasterWindow) -> Self {
        assert_eq!(window.width, window.height, "heightmap windows are square");
        assert_eq!(
            window.data.len(),
            (window.width * window.height) as usize,
            "window pixel count does not match dimensions"
        );

        let heights = window.data.iter().map(|&e| quantize(e)).collect();
        Self {
            coord: *coord,
            size: window.width,
            heights,
            child_flags: 0,
        }
    }

    /// The tile coordinate this tile was built for.
    pub fn coordinate(&self) -> &TileCoordinate {
        &self.coord
    }

    /// Sample grid size (width = height).
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The raw quantized height samples, row-major from the north-west.
    pub fn heights(&self) -> &[u16] {
        &self.heights
    }

    /// Decoded elevation in meters at sample position (x, y).
    ///
    /// `x` counts from the west edge, `y` from the north edge.
    pub fn height_at(&self, x: u32, y: u32) -> f32 {
        dequantize(self.heights[(y * self.size + x) as usize])
    }

    /// Replace the child-tile flags (combination of the `CHILD_*` bits).
    pub fn set_child_flags(&mut self, flags: u8) {
        self.child_flags = flags;
    }

    /// The child-tile flags.
    pub fn child_flags(&self) -> u8 {
        self.child_flags
    }

    /// Serialize the uncompressed payload.
    ///
    /// `size * size` little-endian u16 heights, the child flags byte, and
    /// the water mask byte.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.heights.len() * 2 + 2);
        for &h in &self.heights {
            buf.extend_from_slice(&h.to_le_bytes());
        }
        buf.push(self.child_flags);
        buf.push(WATER_MASK_LAND);
        buf
    }

    /// Write the gzip-compressed payload, as served to terrain clients.
    pub fn write_gzipped<W: Write>(&self, writer: W) -> std::io::Result<()> {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        encoder.write_all(&self.encode())?;
        encoder.finish()?;
        Ok(())
    }
}

/// Quantize an elevation in meters to a heightmap sample.
fn quantize(elevation: f32) -> u16 {
    ((elevation as f64 + HEIGHT_OFFSET) * HEIGHT_SCALE)
        .round()
        .clamp(0.0, u16::MAX as f64) as u16
}

/// Decode a heightmap sample back to meters.
fn dequantize(sample: u16) -> f32 {
    (sample as f64 / HEIGHT_SCALE - HEIGHT_OFFSET) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CrsBounds;
    use approx::assert_relative_eq;

    fn window(size: u32, data: Vec<f32>) -> RasterWindow {
        RasterWindow {
            data,
            width: size,
            height: size,
            bounds: CrsBounds::new(0.0, 0.0, 1.0, 1.0),
        }
    }

    #[test]
    fn test_quantization() {
        // Sea level sits at the 1000 m offset.
        assert_eq!(quantize(0.0), 5000);
        // The format floor and clamping below it.
        assert_eq!(quantize(-1000.0), 0);
        assert_eq!(quantize(-2000.0), 0);
        // 0.2 m steps.
        assert_eq!(quantize(0.2), 5001);
        // Everest comfortably in range.
        assert_eq!(quantize(8848.0), (9848.0 * 5.0) as u16);
        // Clamp at the top end.
        assert_eq!(quantize(1.0e9), u16::MAX);
    }

    #[test]
    fn test_dequantize_inverse() {
        for elevation in [-1000.0_f32, -431.0, 0.0, 8.2, 8848.0] {
            assert_relative_eq!(
                dequantize(quantize(elevation)),
                elevation,
                epsilon = 0.11
            );
        }
    }

    #[test]
    fn test_encode_layout() {
        let coord = TileCoordinate::new(3, 1, 2);
        let mut tile = TerrainTile::from_window(&coord, &window(2, vec![0.0, 0.2, -1000.0, 10.0]));
        tile.set_child_flags(CHILD_SW | CHILD_NE);

        let bytes = tile.encode();
        assert_eq!(bytes.len(), 2 * 2 * 2 + 2);
        assert_eq!(&bytes[0..2], &5000_u16.to_le_bytes());
        assert_eq!(&bytes[2..4], &5001_u16.to_le_bytes());
        assert_eq!(&bytes[4..6], &0_u16.to_le_bytes());
        assert_eq!(bytes[8], CHILD_SW | CHILD_NE);
        assert_eq!(bytes[9], 0);
    }

    #[test]
    fn test_gzip_wrapper() {
        let coord = TileCoordinate::new(0, 0, 0);
        let tile = TerrainTile::from_window(&coord, &window(2, vec![1.0; 4]));

        let mut out = Vec::new();
        tile.write_gzipped(&mut out).unwrap();
        // Gzip magic bytes.
        assert_eq!(&out[0..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_height_at() {
        let coord = TileCoordinate::new(1, 0, 0);
        let tile = TerrainTile::from_window(&coord, &window(2, vec![5.0, 6.0, 7.0, 8.0]));
        assert_relative_eq!(tile.height_at(0, 0), 5.0, epsilon = 0.11);
        assert_relative_eq!(tile.height_at(1, 0), 6.0, epsilon = 0.11);
        assert_relative_eq!(tile.height_at(0, 1), 7.0, epsilon = 0.11);
    }
}
