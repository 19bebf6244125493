//! Georeferenced elevation raster source.

use crate::{CrsBounds, Result, TilerError};
use std::path::Path;
use std::sync::Arc;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

/// Fill value for window samples outside the raster.
///
/// The heightmap format has no nodata notion, so uncovered samples are
/// written as sea level.
const FILL_ELEVATION: f32 = 0.0;

/// A georeferenced elevation raster loaded into memory.
///
/// The pixel data is held behind a reference-counted handle, so cloning a
/// `RasterSource` is cheap and clones share the underlying raster.
/// Independent tile cursors over the same source are therefore safe: the
/// raster is never mutated after loading.
#[derive(Debug, Clone)]
pub struct RasterSource {
    inner: Arc<RasterData>,
}

#[derive(Debug)]
struct RasterData {
    /// Elevation data in row-major order (north to south, west to east).
    data: Vec<f32>,
    /// Width in pixels.
    width: u32,
    /// Height in pixels.
    height: u32,
    /// Geographic bounds in the tiling grid's CRS.
    bounds: CrsBounds,
    /// No-data value (elevations equal to this are treated as missing).
    no_data_value: Option<f32>,
}

/// A resampled rectangular window of elevation data.
///
/// Rows run north to south, columns west to east, matching the raster's
/// own pixel layout.
#[derive(Debug, Clone)]
pub struct RasterWindow {
    /// Elevations in row-major order.
    pub data: Vec<f32>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// The geographic extent the window was sampled over.
    pub bounds: CrsBounds,
}

impl RasterSource {
    /// Load a raster from a GeoTIFF file.
    ///
    /// The file must carry ModelTiepoint and ModelPixelScale tags; its CRS
    /// is assumed to match the tiling grid the source will be used with.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let mut decoder = Decoder::new(file)?;

        // Raise the decoder limits: source DEMs can run to hundreds of
        // megapixels.
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024;
        limits.intermediate_buffer_size = 1024 * 1024 * 1024;
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        let bounds = read_geotransform(&mut decoder, width, height)?;
        let data = decode_elevation_data(&mut decoder)?;
        let no_data_value = read_nodata_value(&mut decoder);

        debug!(
            path = %path.display(),
            width,
            height,
            ?bounds,
            "opened raster source"
        );

        Ok(Self {
            inner: Arc::new(RasterData {
                data,
                width,
                height,
                bounds,
                no_data_value,
            }),
        })
    }

    /// Build a raster source from in-memory pixel data.
    ///
    /// # Panics
    /// Panics if `data.len() != width * height` or either dimension is zero.
    pub fn from_parts(data: Vec<f32>, width: u32, height: u32, bounds: CrsBounds) -> Self {
        assert!(width > 0 && height > 0, "raster dimensions must be nonzero");
        assert_eq!(
            data.len(),
            (width * height) as usize,
            "pixel count does not match dimensions"
        );
        Self {
            inner: Arc::new(RasterData {
                data,
                width,
                height,
                bounds,
                no_data_value: None,
            }),
        }
    }

    /// Geographic bounds of the raster.
    pub fn bounds(&self) -> CrsBounds {
        self.inner.bounds
    }

    /// Raster dimensions in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.inner.width, self.inner.height)
    }

    /// Finest axis resolution in CRS units per pixel.
    pub fn resolution(&self) -> f64 {
        let sx = self.inner.bounds.width() / self.inner.width as f64;
        let sy = self.inner.bounds.height() / self.inner.height as f64;
        sx.min(sy)
    }

    /// Sample the elevation at a CRS position using bilinear interpolation.
    ///
    /// Returns `None` outside the raster bounds or where only no-data
    /// pixels surround the position.
    pub fn sample(&self, x: f64, y: f64) -> Option<f32> {
        let r = &*self.inner;
        if !r.bounds.contains(x, y) {
            return None;
        }

        // Continuous pixel coordinates, pixel-center registered.
        let sx = r.bounds.width() / r.width as f64;
        let sy = r.bounds.height() / r.height as f64;
        let fx = (x - r.bounds.min_x) / sx - 0.5;
        let fy = (r.bounds.max_y - y) / sy - 0.5;

        // Neighbor indices may fall past the edge for positions within the
        // outermost half-pixel; clamping each one separately extends the
        // edge pixel instead of blending it with its neighbor.
        let ix0 = fx.floor() as i64;
        let iy0 = fy.floor() as i64;
        let x0 = ix0.clamp(0, r.width as i64 - 1) as u32;
        let x1 = (ix0 + 1).clamp(0, r.width as i64 - 1) as u32;
        let y0 = iy0.clamp(0, r.height as i64 - 1) as u32;
        let y1 = (iy0 + 1).clamp(0, r.height as i64 - 1) as u32;

        let tx = (fx - ix0 as f64).clamp(0.0, 1.0);
        let ty = (fy - iy0 as f64).clamp(0.0, 1.0);

        let corners = [
            (r.pixel(x0, y0), (1.0 - tx) * (1.0 - ty)),
            (r.pixel(x1, y0), tx * (1.0 - ty)),
            (r.pixel(x0, y1), (1.0 - tx) * ty),
            (r.pixel(x1, y1), tx * ty),
        ];

        // Weighted average of the valid corners; no-data corners drop out.
        let mut sum = 0.0;
        let mut weight = 0.0;
        for (value, w) in corners {
            if let Some(v) = value {
                sum += v as f64 * w;
                weight += w;
            }
        }
        if weight > 0.0 {
            Some((sum / weight) as f32)
        } else {
            None
        }
    }

    /// Resample a `width` x `height` window of elevations over `bounds`.
    ///
    /// Samples are taken at pixel centers, rows north to south. Positions
    /// hanging over the raster edge by up to one source pixel are clamped
    /// onto the edge; anything further out is filled with sea level.
    pub fn read_window(&self, bounds: &CrsBounds, width: u32, height: u32) -> RasterWindow {
        let src = self.bounds();
        let (src_sx, src_sy) = {
            let r = &*self.inner;
            (
                r.bounds.width() / r.width as f64,
                r.bounds.height() / r.height as f64,
            )
        };

        let out_sx = bounds.width() / width as f64;
        let out_sy = bounds.height() / height as f64;

        let mut data = Vec::with_capacity((width * height) as usize);
        for j in 0..height {
            let y = bounds.max_y - (j as f64 + 0.5) * out_sy;
            let y = edge_clamp(y, src.min_y, src.max_y, src_sy);
            for i in 0..width {
                let x = bounds.min_x + (i as f64 + 0.5) * out_sx;
                let x = edge_clamp(x, src.min_x, src.max_x, src_sx);
                data.push(self.sample(x, y).unwrap_or(FILL_ELEVATION));
            }
        }

        RasterWindow {
            data,
            width,
            height,
            bounds: *bounds,
        }
    }
}

impl RasterData {
    /// Raw pixel value, or `None` for no-data pixels.
    fn pixel(&self, x: u32, y: u32) -> Option<f32> {
        let value = self.data[(y * self.width + x) as usize];
        match self.no_data_value {
            Some(nodata) if (value - nodata).abs() < 0.001 => None,
            _ => Some(value),
        }
    }
}

/// Pull a position just outside `[min, max]` back onto the edge, within a
/// one-pixel tolerance.
fn edge_clamp(v: f64, min: f64, max: f64, tolerance: f64) -> f64 {
    if v < min && v >= min - tolerance {
        min
    } else if v > max && v <= max + tolerance {
        max
    } else {
        v
    }
}

/// Read the geographic bounds from ModelTiepoint / ModelPixelScale tags.
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    width: u32,
    height: u32,
) -> Result<CrsBounds> {
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::Unknown(33922))
        .map_err(|_| TilerError::InvalidGeoTiff("missing ModelTiepoint tag".to_string()))?;
    let scale = decoder
        .get_tag_f64_vec(Tag::Unknown(33550))
        .map_err(|_| TilerError::InvalidGeoTiff("missing ModelPixelScale tag".to_string()))?;

    if tiepoint.len() < 6 || scale.len() < 2 {
        return Err(TilerError::InvalidGeoTiff(
            "truncated georeferencing tags".to_string(),
        ));
    }

    // Tiepoint format: [i, j, k, x, y, z]; the raster origin is its
    // north-west corner.
    let tie_x = tiepoint[3];
    let tie_y = tiepoint[4];
    let scale_x = scale[0];
    let scale_y = scale[1];

    if scale_x <= 0.0 || scale_y <= 0.0 {
        return Err(TilerError::InvalidGeoTiff(format!(
            "non-positive pixel scale ({scale_x}, {scale_y})"
        )));
    }

    Ok(CrsBounds::new(
        tie_x,
        tie_y - height as f64 * scale_y,
        tie_x + width as f64 * scale_x,
        tie_y,
    ))
}

/// Decode the raster pixels into f32 elevations.
fn decode_elevation_data<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<Vec<f32>> {
    let result = decoder.read_image()?;

    match result {
        DecodingResult::F32(data) => Ok(data),
        DecodingResult::F64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::I16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::I32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::U16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::U32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::U8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::I8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::U64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::I64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
    }
}

/// Try to read the no-data value from the GDAL_NODATA tag.
fn read_nodata_value<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f32> {
    decoder
        .get_tag_ascii_string(Tag::Unknown(42113))
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 4x4 raster over [0,4]x[0,4], value = 10 * row + col (row 0 north).
    fn gradient_source() -> RasterSource {
        let data = (0..16).map(|i| (i / 4 * 10 + i % 4) as f32).collect();
        RasterSource::from_parts(data, 4, 4, CrsBounds::new(0.0, 0.0, 4.0, 4.0))
    }

    #[test]
    fn test_sample_at_pixel_centers() {
        let source = gradient_source();

        // North-west pixel center is (0.5, 3.5).
        assert_relative_eq!(source.sample(0.5, 3.5).unwrap(), 0.0);
        // One pixel east.
        assert_relative_eq!(source.sample(1.5, 3.5).unwrap(), 1.0);
        // One pixel south.
        assert_relative_eq!(source.sample(0.5, 2.5).unwrap(), 10.0);
    }

    #[test]
    fn test_sample_bilinear_midpoint() {
        let source = gradient_source();
        // Halfway between the four north-west pixels: mean of 0, 1, 10, 11.
        assert_relative_eq!(source.sample(1.0, 3.0).unwrap(), 5.5);
    }

    #[test]
    fn test_sample_outside_bounds() {
        let source = gradient_source();
        assert!(source.sample(-0.1, 2.0).is_none());
        assert!(source.sample(2.0, 4.1).is_none());
    }

    #[test]
    fn test_read_window_fills_outside() {
        let source = gradient_source();

        // A window entirely west of the raster is filled with sea level.
        let window = source.read_window(&CrsBounds::new(-12.0, 0.0, -4.0, 4.0), 4, 4);
        assert_eq!(window.data.len(), 16);
        assert!(window.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_read_window_clamps_near_edge() {
        let source = gradient_source();

        // Sample centers land half a pixel outside the raster on every
        // side; they clamp onto the edge instead of dropping to fill.
        let window = source.read_window(&CrsBounds::new(-1.0, -1.0, 5.0, 5.0), 6, 6);
        assert_relative_eq!(window.data[0], 0.0);
        // The clamped north-east corner reads the corner pixel.
        assert_relative_eq!(window.data[5], 3.0);
        assert_relative_eq!(window.data[35], 33.0);
    }

    #[test]
    fn test_read_window_matches_source() {
        let source = gradient_source();

        // Sampling the full extent back at native size reproduces the data.
        let window = source.read_window(&CrsBounds::new(0.0, 0.0, 4.0, 4.0), 4, 4);
        assert_eq!(window.width, 4);
        assert_eq!(window.height, 4);
        for (i, &v) in window.data.iter().enumerate() {
            assert_relative_eq!(v, (i / 4 * 10 + i % 4) as f32);
        }
    }

    #[test]
    fn test_clone_shares_data() {
        let source = gradient_source();
        let copy = source.clone();
        assert_eq!(source.dimensions(), copy.dimensions());
        assert_relative_eq!(
            source.sample(1.0, 3.0).unwrap(),
            copy.sample(1.0, 3.0).unwrap()
        );
    }

    #[test]
    fn test_resolution() {
        let source = gradient_source();
        assert_relative_eq!(source.resolution(), 1.0);
    }
}
