//! Geographic (EPSG:4326) TMS tiling used by quantized-mesh sources.
//!
//! Level `L` has `2^(L+1)` columns and `2^L` rows of square tiles, each
//! `180 / 2^L` degrees wide. Column 0 starts at -180° and row 0 at the
//! south pole.

use crate::coord::{TileBounds, TileCoord};
use std::fmt;

/// Mesh source level cap for tiles centered north of [`HIGH_LATITUDE`].
pub const HIGH_LATITUDE_MAX_LEVEL: u8 = 14;

/// Mesh source level cap elsewhere.
pub const MAX_LEVEL: u8 = 15;

/// Latitude (degrees north) above which the lower cap applies.
pub const HIGH_LATITUDE: f64 = 49.0;

/// A tile in the geographic TMS scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeographicTile {
    pub level: u8,
    pub x: u32,
    pub y: u32,
}

impl GeographicTile {
    /// Width and height of a tile at `level`, in degrees.
    pub fn span_degrees(level: u8) -> f64 {
        180.0 / 2.0_f64.powi(level as i32)
    }

    pub fn columns(level: u8) -> u32 {
        2u32 << level
    }

    pub fn rows(level: u8) -> u32 {
        1u32 << level
    }

    /// Tile containing a position. Positions on the far edges fall into the
    /// last column or row.
    pub fn containing(level: u8, lon: f64, lat: f64) -> Self {
        let span = Self::span_degrees(level);
        let lon = lon.clamp(-180.0, 180.0);
        let lat = lat.clamp(-90.0, 90.0);
        let x = (((lon + 180.0) / span).floor() as u32).min(Self::columns(level) - 1);
        let y = (((lat + 90.0) / span).floor() as u32).min(Self::rows(level) - 1);
        Self { level, x, y }
    }

    pub fn bounds(&self) -> TileBounds {
        let span = Self::span_degrees(self.level);
        let west = -180.0 + self.x as f64 * span;
        let south = -90.0 + self.y as f64 * span;
        TileBounds {
            west,
            south,
            east: west + span,
            north: south + span,
        }
    }
}

impl fmt::Display for GeographicTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.x, self.y)
    }
}

/// Mesh level used to shade a slippy-map tile.
///
/// One level shallower than the target, capped lower near the poles where
/// geographic tiles are much denser on the ground than mercator ones.
pub fn source_level(tile: TileCoord) -> u8 {
    let (_, center_lat) = tile.bounds().center();
    let cap = if center_lat > HIGH_LATITUDE {
        HIGH_LATITUDE_MAX_LEVEL
    } else {
        MAX_LEVEL
    };
    tile.zoom.saturating_sub(1).min(cap)
}

/// Mesh tiles overlapping a slippy-map tile, south row first.
///
/// Tiles that only touch the target along an edge are left out.
pub fn covering_tiles(tile: TileCoord) -> Vec<GeographicTile> {
    let level = source_level(tile);
    let span = GeographicTile::span_degrees(level);
    let bounds = tile.bounds();

    let columns = GeographicTile::columns(level);
    let rows = GeographicTile::rows(level);
    let (x0, x1) = index_range(bounds.west + 180.0, bounds.east + 180.0, span, columns);
    let (y0, y1) = index_range(bounds.south + 90.0, bounds.north + 90.0, span, rows);

    (y0..=y1)
        .flat_map(|y| (x0..=x1).map(move |x| GeographicTile { level, x, y }))
        .collect()
}

/// Overlap smaller than this fraction of a cell counts as touching.
const EDGE_TOLERANCE: f64 = 1e-9;

/// Indices of the `span`-wide cells overlapping `[start, end)`.
fn index_range(start: f64, end: f64, span: f64, count: u32) -> (u32, u32) {
    let last = count - 1;
    let first = ((start / span + EDGE_TOLERANCE).floor().max(0.0) as u32).min(last);
    let end_index = ((end / span - EDGE_TOLERANCE).ceil() - 1.0).max(0.0) as u32;
    (first, end_index.clamp(first, last))
}
