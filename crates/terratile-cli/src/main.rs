//! Command-line terrain tile pyramid builder.
//!
//! Reads a GeoTIFF elevation raster and writes a gzip-compressed
//! `{z}/{x}/{y}.terrain` heightmap pyramid plus a `layer.json` metadata
//! document for terrain clients.

mod error;
mod layer;

use clap::{Parser, ValueEnum};
use error::CliError;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use terratile::{Grid, RasterSource, TerrainTile, TerrainTiler, TileCursor, Tiler, TilerError, ZoomRange};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Tiling grid profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Profile {
    /// Global-geodetic grid (EPSG:4326), two root tiles.
    Geodetic,
    /// Global-mercator grid (EPSG:3857), one root tile.
    Mercator,
}

#[derive(Debug, Parser)]
#[command(
    name = "terratile",
    version,
    about = "Generate heightmap terrain tiles from a GeoTIFF elevation raster"
)]
struct Args {
    /// Input GeoTIFF elevation raster, georeferenced in the grid's CRS.
    input: PathBuf,

    /// Output directory for the tile pyramid.
    #[arg(short, long, default_value = "tiles")]
    output: PathBuf,

    /// Coarsest zoom level to generate.
    #[arg(long, default_value_t = 0)]
    start_zoom: u8,

    /// Finest zoom level to generate [default: derived from the raster resolution].
    #[arg(long)]
    end_zoom: Option<u8>,

    /// Tile pixel size (width = height).
    #[arg(long, default_value_t = Grid::DEFAULT_TILE_SIZE)]
    tile_size: u32,

    /// Tiling grid profile.
    #[arg(long, value_enum, default_value_t = Profile::Geodetic)]
    profile: Profile,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let source = RasterSource::open(&args.input)?;
    let grid = match args.profile {
        Profile::Geodetic => Grid::geodetic(args.tile_size),
        Profile::Mercator => Grid::mercator(args.tile_size),
    }?;
    let tiler = TerrainTiler::new(source, grid)?;

    let end_zoom = args.end_zoom.unwrap_or_else(|| tiler.max_zoom());
    let range = ZoomRange::new(args.start_zoom, end_zoom)?;

    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        start_zoom = range.start(),
        end_zoom = range.end(),
        tile_size = args.tile_size,
        "building terrain pyramid"
    );

    let name = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("terrain");
    layer::write_layer_json(&args.output, name, &tiler, &range)?;

    let mut cursor = TileCursor::new(tiler, range);
    let total = cursor.total_tiles();
    let mut written = 0u64;
    let mut failed = 0u64;
    let mut current_zoom = None;

    while let Some(&coord) = cursor.current() {
        if current_zoom != Some(coord.zoom) {
            current_zoom = Some(coord.zoom);
            let count = cursor
                .tiler()
                .tile_range(coord.zoom)
                .map(|r| r.count())
                .unwrap_or(0);
            info!(zoom = coord.zoom, tiles = count, "starting zoom level");
        }

        match cursor.build_current().and_then(|t| write_tile(&args.output, &t)) {
            Ok(()) => written += 1,
            Err(e) => {
                warn!(tile = %coord, "{e}");
                failed += 1;
            }
        }
        cursor.advance();
    }

    info!(written, failed, total, "terrain pyramid complete");
    if failed > 0 {
        return Err(CliError::TilesFailed { failed, total });
    }
    Ok(())
}

/// Write one tile as `{output}/{z}/{x}/{y}.terrain`.
fn write_tile(output: &Path, tile: &TerrainTile) -> terratile::Result<()> {
    let coord = tile.coordinate();
    let result = (|| {
        let dir = output
            .join(coord.zoom.to_string())
            .join(coord.x.to_string());
        fs::create_dir_all(&dir)?;
        let file = fs::File::create(dir.join(format!("{}.terrain", coord.y)))?;
        tile.write_gzipped(BufWriter::new(file))
    })();
    result.map_err(|e| TilerError::for_tile(coord, TilerError::Io(e)))
}
