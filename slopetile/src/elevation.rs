//! Terrain-RGB elevation decoding.
//!
//! Each pixel encodes elevation in meters as
//! `-10000 + R * 6553.6 + G * 25.6 + B * 0.1`, giving 0.1 m vertical
//! resolution over roughly ±10 000 m.

use image::RgbaImage;

/// Elevation offset of the terrain-RGB encoding, in meters.
pub const ELEVATION_OFFSET_M: f64 = -10_000.0;

/// Vertical resolution of the terrain-RGB encoding, in meters.
pub const ELEVATION_STEP_M: f64 = 0.1;

/// A row-major grid of elevations in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    width: u32,
    height: u32,
    meters: Vec<f64>,
}

impl ElevationGrid {
    /// Builds a grid by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f64) -> Self {
        let mut meters = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                meters.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            meters,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.meters.is_empty()
    }

    /// Elevation at `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn at(&self, x: u32, y: u32) -> f64 {
        self.meters[(y * self.width + x) as usize]
    }

    /// Elevation at `(x, y)` with coordinates clamped to the grid, which
    /// behaves like a one-cell edge-replicated border.
    #[inline]
    pub fn at_clamped(&self, x: i64, y: i64) -> f64 {
        let cx = x.clamp(0, self.width as i64 - 1) as u32;
        let cy = y.clamp(0, self.height as i64 - 1) as u32;
        self.at(cx, cy)
    }

    /// Averages `factor × factor` blocks into a smaller grid.
    ///
    /// Blocks on the right and bottom edges may be partial; they average the
    /// cells they contain. A factor below 2 returns a copy.
    pub fn block_average(&self, factor: u32) -> ElevationGrid {
        if factor < 2 {
            return self.clone();
        }
        let width = self.width.div_ceil(factor);
        let height = self.height.div_ceil(factor);

        ElevationGrid::from_fn(width, height, |bx, by| {
            let x0 = bx * factor;
            let y0 = by * factor;
            let x1 = (x0 + factor).min(self.width);
            let y1 = (y0 + factor).min(self.height);

            let mut sum = 0.0;
            for y in y0..y1 {
                for x in x0..x1 {
                    sum += self.at(x, y);
                }
            }
            sum / ((x1 - x0) * (y1 - y0)) as f64
        })
    }
}

/// Decodes one terrain-RGB pixel to meters.
#[inline]
pub fn decode_pixel(r: u8, g: u8, b: u8) -> f64 {
    ELEVATION_OFFSET_M + r as f64 * 6553.6 + g as f64 * 25.6 + b as f64 * 0.1
}

/// Encodes meters as a terrain-RGB pixel, rounding to the nearest 0.1 m.
///
/// Elevations outside the representable range saturate.
pub fn encode_pixel(meters: f64) -> [u8; 3] {
    let steps = ((meters - ELEVATION_OFFSET_M) / ELEVATION_STEP_M)
        .round()
        .clamp(0.0, 16_777_215.0) as u32;
    [(steps >> 16) as u8, (steps >> 8) as u8, steps as u8]
}

/// Decodes a terrain-RGB image into an elevation grid of the same shape.
///
/// The alpha channel is ignored.
pub fn decode_terrain_rgb(image: &RgbaImage) -> ElevationGrid {
    ElevationGrid::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        decode_pixel(r, g, b)
    })
}
