//! Coordinate type definitions

use std::fmt;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels served by the compositor
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 22;

/// Edge length of every output tile, in pixels.
pub const TILE_SIZE: u32 = 256;

/// Spherical earth radius used for ground distances (WGS84 semi-major axis).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Tile coordinates in the Web Mercator / Slippy Map system.
///
/// Identifies one 256×256 output raster. `x` grows eastwards and `y`
/// southwards, both in `[0, 2^zoom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Zoom level (0-22)
    pub zoom: u8,
    /// X coordinate (east-west), 0 at the antimeridian
    pub x: u32,
    /// Y coordinate (north-south), 0 at north
    pub y: u32,
}

impl TileCoord {
    /// Creates a validated tile coordinate.
    pub fn new(zoom: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let n = Self::tiles_per_side(zoom);
        if x >= n || y >= n {
            return Err(CoordError::OutOfRange { zoom, x, y });
        }
        Ok(Self { zoom, x, y })
    }

    /// Number of tiles along one axis at the given zoom level.
    #[inline]
    pub fn tiles_per_side(zoom: u8) -> u32 {
        1u32 << zoom
    }

    /// Geographic bounding box of this tile in degrees.
    pub fn bounds(&self) -> TileBounds {
        let (north, west) = super::tile_to_lat_lon(self);
        let (south, east) = super::tile_to_lat_lon(&TileCoord {
            zoom: self.zoom,
            x: self.x + 1,
            y: self.y + 1,
        });
        TileBounds {
            west,
            south,
            east,
            north,
        }
    }

    /// Returns the ancestor of this tile at a lower (or equal) zoom level.
    ///
    /// Returns `None` when `zoom` is deeper than this tile.
    pub fn parent_at(&self, zoom: u8) -> Option<TileCoord> {
        if zoom > self.zoom {
            return None;
        }
        let shift = self.zoom - zoom;
        Some(TileCoord {
            zoom,
            x: self.x >> shift,
            y: self.y >> shift,
        })
    }

    /// Projects a geographic position into this tile's pixel space.
    ///
    /// The origin is the tile's north-west corner; one tile spans
    /// [`TILE_SIZE`] pixels. Positions outside the tile produce coordinates
    /// outside `[0, 256)`.
    pub fn pixel_of(&self, lon: f64, lat: f64) -> (f64, f64) {
        let px = super::lon_to_pixel_x(lon, self.zoom) - (self.x as f64 * TILE_SIZE as f64);
        let py = super::lat_to_pixel_y(lat, self.zoom) - (self.y as f64 * TILE_SIZE as f64);
        (px, py)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl TileBounds {
    /// Center of the box as `(lon, lat)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }

    /// The four corners as `(lon, lat)`, clockwise from north-west.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.west, self.north),
            (self.east, self.north),
            (self.east, self.south),
            (self.west, self.south),
        ]
    }

    /// Ground extent of the box in meters as `(width, height)`.
    ///
    /// Width is measured along the parallel through the box center, so it
    /// shrinks with `cos(latitude)` the way real ground distance does.
    pub fn ground_size_meters(&self) -> (f64, f64) {
        let (_, center_lat) = self.center();
        let width =
            (self.east - self.west).to_radians() * EARTH_RADIUS_M * center_lat.to_radians().cos();
        let height = (self.north - self.south).to_radians() * EARTH_RADIUS_M;
        (width.abs(), height.abs())
    }

    /// Ground distance covered by one pixel when the box is rendered as a
    /// `width_px` × `height_px` raster.
    pub fn pixel_size_meters(&self, width_px: u32, height_px: u32) -> (f64, f64) {
        let (width, height) = self.ground_size_meters();
        (width / width_px as f64, height / height_px as f64)
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside valid range (-85.05112878 to 85.05112878)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside valid range (0 to 22)
    InvalidZoom(u8),
    /// Tile column or row does not exist at this zoom level
    OutOfRange { zoom: u8, x: u32, y: u32 },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::OutOfRange { zoom, x, y } => {
                write!(f, "Tile {}/{}/{} does not exist at zoom {}", zoom, x, y, zoom)
            }
        }
    }
}

impl std::error::Error for CoordError {}
