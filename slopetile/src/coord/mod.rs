//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile/pixel coordinates used by slippy-map tile servers.

mod types;


pub use types::{
    CoordError, TileBounds, TileCoord, EARTH_RADIUS_M, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT,
    MIN_LON, MIN_ZOOM, TILE_SIZE,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 22)
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = TileCoord::tiles_per_side(zoom);
    let max_index = n - 1;

    let x = (((lon + 180.0) / 360.0 * n as f64) as u32).min(max_index);

    let lat_rad = lat * PI / 180.0;
    let y = (((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n as f64) as u32).min(max_index);

    Ok(TileCoord { zoom, x, y })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Global Web Mercator pixel column of a longitude at the given zoom.
#[inline]
pub fn lon_to_pixel_x(lon: f64, zoom: u8) -> f64 {
    let world = TILE_SIZE as f64 * 2.0_f64.powi(zoom as i32);
    (lon + 180.0) / 360.0 * world
}

/// Global Web Mercator pixel row of a latitude at the given zoom.
#[inline]
pub fn lat_to_pixel_y(lat: f64, zoom: u8) -> f64 {
    let world = TILE_SIZE as f64 * 2.0_f64.powi(zoom as i32);
    let lat_rad = lat.to_radians();
    (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * world
}
