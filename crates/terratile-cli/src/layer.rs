//! Cesium `layer.json` metadata for a generated terrain pyramid.

use crate::error::CliError;
use serde::Serialize;
use std::fs;
use std::path::Path;
use terratile::{Tiler, ZoomRange};

#[derive(Debug, Serialize)]
struct LayerMetadata {
    tilejson: &'static str,
    name: String,
    description: String,
    version: &'static str,
    format: &'static str,
    scheme: &'static str,
    tiles: Vec<&'static str>,
    /// Per-zoom tile availability, indexed by zoom level.
    available: Vec<Vec<AvailableRange>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AvailableRange {
    start_x: u32,
    start_y: u32,
    end_x: u32,
    end_y: u32,
}

fn build_metadata<T: Tiler>(name: &str, tiler: &T, range: &ZoomRange) -> LayerMetadata {
    let available = (0..=range.end())
        .map(|zoom| {
            if !range.contains(zoom) {
                return Vec::new();
            }
            tiler
                .tile_range(zoom)
                .map(|r| {
                    vec![AvailableRange {
                        start_x: r.min_x,
                        start_y: r.min_y,
                        end_x: r.max_x,
                        end_y: r.max_y,
                    }]
                })
                .unwrap_or_default()
        })
        .collect();

    LayerMetadata {
        tilejson: "2.1.0",
        name: name.to_string(),
        description: String::new(),
        version: "1.0.0",
        format: "heightmap-1.0",
        scheme: "tms",
        tiles: vec!["{z}/{x}/{y}.terrain"],
        available,
    }
}

/// Write `layer.json` into the output directory.
pub fn write_layer_json<T: Tiler>(
    output: &Path,
    name: &str,
    tiler: &T,
    range: &ZoomRange,
) -> Result<(), CliError> {
    fs::create_dir_all(output)?;
    let file = fs::File::create(output.join("layer.json"))?;
    serde_json::to_writer_pretty(file, &build_metadata(name, tiler, range))?;
    Ok(())
}
