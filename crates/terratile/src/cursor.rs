//! Bidirectional cursor over every tile in a zoom range.

use crate::tiler::Tiler;
use crate::{Result, TileCoordinate, ZoomRange};

/// Cursor position: two non-dereferenceable sentinels around the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Before the first tile; reached by retreating off the front.
    BeforeStart,
    /// On a valid tile coordinate.
    Positioned(TileCoordinate),
    /// Past the last tile; reached by advancing off the back.
    AtEnd,
}

/// A finite, bidirectional, lazily-materializing cursor over all tiles of
/// a zoom range.
///
/// The cursor enumerates every valid coordinate the tiler reports, zoom
/// levels ascending, rows ascending within a zoom, and columns ascending
/// within a row. Nothing is materialized by moving the cursor; a tile is
/// built only when dereferenced through [`build_current`](Self::build_current)
/// or the [`Iterator`] implementation.
///
/// A fresh cursor over the same tiler and zoom range reproduces an
/// identical sequence: the traversal is a pure function of its inputs.
#[derive(Debug, Clone)]
pub struct TileCursor<T: Tiler> {
    tiler: T,
    range: ZoomRange,
    position: Position,
}

impl<T: Tiler> TileCursor<T> {
    /// Create a cursor over an explicit zoom range.
    ///
    /// The cursor starts positioned on the first tile of the first zoom in
    /// the range that has any tiles, or exhausted if none do.
    pub fn new(tiler: T, range: ZoomRange) -> Self {
        let position = first_from(&tiler, &range, range.start());
        Self {
            tiler,
            range,
            position,
        }
    }

    /// Create a cursor over the tiler's native zoom range (the whole
    /// pyramid from zoom 0 to the raster's maximum useful zoom).
    pub fn over_native_range(tiler: T) -> Self {
        let range = tiler.native_zoom_range();
        Self::new(tiler, range)
    }

    /// The zoom range being traversed.
    pub fn zoom_range(&self) -> &ZoomRange {
        &self.range
    }

    /// The coordinate under the cursor, or `None` on a sentinel position.
    pub fn current(&self) -> Option<&TileCoordinate> {
        match &self.position {
            Position::Positioned(coord) => Some(coord),
            _ => None,
        }
    }

    /// Whether the cursor has moved past the last tile.
    pub fn at_end(&self) -> bool {
        self.position == Position::AtEnd
    }

    /// Whether the cursor has moved before the first tile.
    pub fn before_start(&self) -> bool {
        self.position == Position::BeforeStart
    }

    /// Move to the next coordinate in canonical order.
    ///
    /// From the end sentinel this is a no-op; exhaustion is a terminal
    /// state, not an error. Returns `true` while the cursor remains on a
    /// valid coordinate.
    pub fn advance(&mut self) -> bool {
        self.position = match self.position {
            Position::BeforeStart => first_from(&self.tiler, &self.range, self.range.start()),
            Position::Positioned(coord) => {
                let next_in_zoom = self
                    .tiler
                    .tile_range(coord.zoom)
                    .and_then(|r| r.next(&coord));
                match next_in_zoom {
                    Some(next) => Position::Positioned(next),
                    None if coord.zoom >= self.range.end() => Position::AtEnd,
                    None => first_from(&self.tiler, &self.range, coord.zoom + 1),
                }
            }
            Position::AtEnd => Position::AtEnd,
        };
        matches!(self.position, Position::Positioned(_))
    }

    /// Move to the previous coordinate in canonical order.
    ///
    /// Mirror of [`advance`](Self::advance), terminating at the
    /// before-start sentinel.
    pub fn retreat(&mut self) -> bool {
        self.position = match self.position {
            Position::AtEnd => last_from(&self.tiler, &self.range, self.range.end()),
            Position::Positioned(coord) => {
                let prev_in_zoom = self
                    .tiler
                    .tile_range(coord.zoom)
                    .and_then(|r| r.prev(&coord));
                match prev_in_zoom {
                    Some(prev) => Position::Positioned(prev),
                    None if coord.zoom <= self.range.start() => Position::BeforeStart,
                    None => last_from(&self.tiler, &self.range, coord.zoom - 1),
                }
            }
            Position::BeforeStart => Position::BeforeStart,
        };
        matches!(self.position, Position::Positioned(_))
    }

    /// Materialize the tile under the cursor.
    ///
    /// # Panics
    /// Panics if the cursor sits on a sentinel position; check
    /// [`current`](Self::current) first when that is not statically known.
    pub fn build_current(&self) -> Result<T::Tile> {
        match &self.position {
            Position::Positioned(coord) => self.tiler.create_tile(coord),
            Position::BeforeStart => panic!("dereferenced a tile cursor before its first tile"),
            Position::AtEnd => panic!("dereferenced an exhausted tile cursor"),
        }
    }

    /// Total number of tiles across the zoom range.
    pub fn total_tiles(&self) -> u64 {
        (self.range.start()..=self.range.end())
            .filter_map(|zoom| self.tiler.tile_range(zoom))
            .map(|r| r.count())
            .sum()
    }

    /// The tiler backing this cursor.
    pub fn tiler(&self) -> &T {
        &self.tiler
    }
}

/// First position at or above `zoom`, skipping zoom levels with no tiles.
fn first_from<T: Tiler>(tiler: &T, range: &ZoomRange, zoom: u8) -> Position {
    let mut zoom = zoom;
    loop {
        if !range.contains(zoom) {
            return Position::AtEnd;
        }
        if let Some(tile_range) = tiler.tile_range(zoom) {
            return Position::Positioned(tile_range.first());
        }
        if zoom >= range.end() {
            return Position::AtEnd;
        }
        zoom += 1;
    }
}

/// Last position at or below `zoom`, skipping zoom levels with no tiles.
fn last_from<T: Tiler>(tiler: &T, range: &ZoomRange, zoom: u8) -> Position {
    let mut zoom = zoom;
    loop {
        if !range.contains(zoom) {
            return Position::BeforeStart;
        }
        if let Some(tile_range) = tiler.tile_range(zoom) {
            return Position::Positioned(tile_range.last());
        }
        if zoom <= range.start() {
            return Position::BeforeStart;
        }
        zoom -= 1;
    }
}

impl<T: Tiler> Iterator for TileCursor<T> {
    type Item = Result<T::Tile>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.before_start() {
            self.advance();
        }
        let coord = *self.current()?;
        let tile = self.tiler.create_tile(&coord);
        self.advance();
        Some(tile)
    }
}
