//! Per-pixel maximum slope angle from an elevation grid.

use crate::elevation::ElevationGrid;

/// Offsets of the eight neighbors of a cell.
const NEIGHBORS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Slope angles in degrees, one per elevation cell, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SlopeField {
    width: u32,
    height: u32,
    degrees: Vec<f64>,
}

impl SlopeField {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Slope at `(x, y)` in degrees. Panics when out of bounds.
    #[inline]
    pub fn at(&self, x: u32, y: u32) -> f64 {
        self.degrees[(y * self.width + x) as usize]
    }

    pub fn degrees(&self) -> &[f64] {
        &self.degrees
    }

    /// Samples the field with nearest-neighbor lookup.
    ///
    /// `(u, v)` are fractional positions in `[0, 1)` across the field.
    pub fn sample(&self, u: f64, v: f64) -> f64 {
        let x = ((u * self.width as f64) as i64).clamp(0, self.width as i64 - 1) as u32;
        let y = ((v * self.height as f64) as i64).clamp(0, self.height as i64 - 1) as u32;
        self.at(x, y)
    }

    /// Repeats every cell into a `factor × factor` block, cropped to
    /// `width × height`.
    fn upsample(&self, factor: u32, width: u32, height: u32) -> SlopeField {
        let mut degrees = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                degrees.push(self.at(x / factor, y / factor));
            }
        }
        SlopeField {
            width,
            height,
            degrees,
        }
    }
}

/// Computes the maximum slope angle at every cell of `grid`.
///
/// `dx` and `dy` are the ground distances in meters covered by one cell
/// horizontally and vertically. Each cell compares itself with its eight
/// neighbors (border cells against a replicated edge), takes the steepest
/// `|rise| / run` and converts it to degrees in `[0, 90]`.
pub fn slope_field(grid: &ElevationGrid, dx: f64, dy: f64) -> SlopeField {
    let diagonal = dx.hypot(dy);
    let runs: Vec<f64> = NEIGHBORS
        .iter()
        .map(|&(ox, oy)| match (ox != 0, oy != 0) {
            (true, true) => diagonal,
            (true, false) => dx,
            _ => dy,
        })
        .collect();

    let mut degrees = Vec::with_capacity(grid.width() as usize * grid.height() as usize);
    for y in 0..grid.height() as i64 {
        for x in 0..grid.width() as i64 {
            let center = grid.at_clamped(x, y);
            let steepest = NEIGHBORS
                .iter()
                .zip(&runs)
                .map(|(&(ox, oy), run)| (grid.at_clamped(x + ox, y + oy) - center).abs() / run)
                .fold(0.0_f64, f64::max);
            degrees.push(steepest.atan().to_degrees().clamp(0.0, 90.0));
        }
    }

    SlopeField {
        width: grid.width(),
        height: grid.height(),
        degrees,
    }
}

/// Computes the slope field on a coarser grid and scales it back up.
///
/// The grid is block-averaged by `factor`, the slope is computed with the
/// cell distances scaled by `factor`, and each coarse cell is repeated over
/// the block it came from. A factor below 2 is the plain [`slope_field`].
pub fn slope_field_resampled(grid: &ElevationGrid, dx: f64, dy: f64, factor: u32) -> SlopeField {
    if factor < 2 {
        return slope_field(grid, dx, dy);
    }
    let coarse = grid.block_average(factor);
    let scale = factor as f64;
    slope_field(&coarse, dx * scale, dy * scale).upsample(factor, grid.width(), grid.height())
}
