//! Example: Print the padded sampling extent for a tile coordinate.
//!
//! Usage: cargo run --example tile_extent -- <zoom> <x> <y> [tile_size]

use std::env;
use terratile::{padded_tile_extent, Grid, TileCoordinate};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 4 {
        eprintln!("Usage: {} <zoom> <x> <y> [tile_size]", args[0]);
        eprintln!("Example: {} 5 10 12 65", args[0]);
        std::process::exit(1);
    }

    let zoom: u8 = args[1].parse().expect("Invalid zoom");
    let x: u32 = args[2].parse().expect("Invalid x");
    let y: u32 = args[3].parse().expect("Invalid y");
    let tile_size: u32 = args
        .get(4)
        .map(|s| s.parse().expect("Invalid tile size"))
        .unwrap_or(Grid::DEFAULT_TILE_SIZE);

    let grid = Grid::geodetic(tile_size).expect("Invalid grid configuration");
    let coord = TileCoordinate::new(zoom, x, y);

    let true_bounds = grid.tile_bounds(&coord);
    let (padded, resolution) = padded_tile_extent(&grid, &coord);

    println!("Tile {} on a global-geodetic grid ({} px tiles)", coord, tile_size);
    println!(
        "  true bounds:   [{:.6}, {:.6}] x [{:.6}, {:.6}]",
        true_bounds.min_x, true_bounds.max_x, true_bounds.min_y, true_bounds.max_y
    );
    println!(
        "  padded bounds: [{:.6}, {:.6}] x [{:.6}, {:.6}]",
        padded.min_x, padded.max_x, padded.min_y, padded.max_y
    );
    println!("  resolution:    {:.6} degrees/pixel", resolution);
}
