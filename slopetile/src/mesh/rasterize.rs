//! Triangle slope rasterization.
//!
//! Triangles are drawn into a 512×512 buffer with the target tile in the
//! middle, so triangles straddling the tile edge are filled exactly as their
//! neighbors would fill them, then the central 256×256 is cropped out.

use super::types::{triangle_slope, TerrainMesh};
use crate::coord::{TileCoord, TILE_SIZE};
use crate::layer::RenderError;
use crate::slope::{classify, SlopeClass};
use image::{Rgba, RgbaImage};
use tiny_skia::{Color, FillRule, Paint, Path, PathBuilder, Pixmap, Shader, Stroke, Transform};

/// Side of the oversized drawing buffer in pixels.
pub const BUFFER_SIZE: u32 = 2 * TILE_SIZE;

/// Offset of the target tile inside the buffer.
const MARGIN: u32 = (BUFFER_SIZE - TILE_SIZE) / 2;

/// Triangle outline color.
pub const OUTLINE_COLOR: Rgba<u8> = Rgba([48, 48, 48, 255]);

fn solid_paint(color: Rgba<u8>) -> Paint<'static> {
    let [r, g, b, a] = color.0;
    Paint {
        shader: Shader::SolidColor(Color::from_rgba8(r, g, b, a)),
        anti_alias: false,
        ..Default::default()
    }
}

/// Renders every triangle of `mesh` in its slope color for `tile`.
///
/// Vertices map linearly from the tile's bounding box onto 256 pixels.
/// Triangles below the first slope threshold stay transparent. With
/// `outline`, every triangle edge is stroked in [`OUTLINE_COLOR`].
pub fn rasterize_slopes(
    mesh: &TerrainMesh,
    tile: TileCoord,
    outline: bool,
) -> Result<RgbaImage, RenderError> {
    let mut pixmap = Pixmap::new(BUFFER_SIZE, BUFFER_SIZE)
        .ok_or_else(|| RenderError::Raster("failed to allocate mesh buffer".to_string()))?;

    let bounds = tile.bounds();
    let scale_x = TILE_SIZE as f64 / (bounds.east - bounds.west);
    let scale_y = TILE_SIZE as f64 / (bounds.north - bounds.south);
    let to_pixel = |lon: f64, lat: f64| {
        (
            ((lon - bounds.west) * scale_x + MARGIN as f64) as f32,
            ((bounds.north - lat) * scale_y + MARGIN as f64) as f32,
        )
    };

    let mut paths: Vec<Path> = Vec::new();
    let mut filled = 0usize;

    for i in 0..mesh.triangles().len() {
        let corners = mesh.triangle(i);
        let Some(slope) = triangle_slope(corners) else {
            continue;
        };

        let mut builder = PathBuilder::new();
        let (x, y) = to_pixel(corners[0][0], corners[0][1]);
        builder.move_to(x, y);
        for corner in &corners[1..] {
            let (x, y) = to_pixel(corner[0], corner[1]);
            builder.line_to(x, y);
        }
        builder.close();
        let Some(path) = builder.finish() else {
            continue;
        };

        let class = classify(slope);
        if class != SlopeClass::None {
            pixmap.fill_path(
                &path,
                &solid_paint(class.color()),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
            filled += 1;
        }
        if outline {
            paths.push(path);
        }
    }

    // Outlines go on top of every fill.
    let outline_paint = solid_paint(OUTLINE_COLOR);
    let stroke = Stroke {
        width: 1.0,
        ..Default::default()
    };
    for path in &paths {
        pixmap.stroke_path(path, &outline_paint, &stroke, Transform::identity(), None);
    }

    tracing::trace!(
        tile = %tile,
        triangles = mesh.triangles().len(),
        filled,
        "Rasterized mesh slopes"
    );

    Ok(crop_center(&pixmap))
}

fn crop_center(pixmap: &Pixmap) -> RgbaImage {
    RgbaImage::from_fn(TILE_SIZE, TILE_SIZE, |x, y| {
        match pixmap.pixel(x + MARGIN, y + MARGIN) {
            Some(pixel) => {
                let c = pixel.demultiply();
                Rgba([c.red(), c.green(), c.blue(), c.alpha()])
            }
            None => Rgba([0, 0, 0, 0]),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::EARTH_RADIUS_M;

    fn tile() -> TileCoord {
        TileCoord::new(12, 654, 1583).unwrap()
    }

    /// Two triangles spanning the tile's bounding box, padded by `pad` of
    /// the tile size on every side, with the north edge raised by `rise` m.
    fn covering_mesh(tile: TileCoord, pad: f64, rise: f64) -> TerrainMesh {
        let b = tile.bounds();
        let dx = (b.east - b.west) * pad;
        let dy = (b.north - b.south) * pad;
        let (w, e, s, n) = (b.west - dx, b.east + dx, b.south - dy, b.north + dy);
        TerrainMesh::new(
            vec![[w, s, 0.0], [e, s, 0.0], [e, n, rise], [w, n, rise]],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    /// Rise that tilts the padded mesh north-south at `degrees`.
    fn rise_for(tile: TileCoord, pad: f64, degrees: f64) -> f64 {
        let b = tile.bounds();
        let span = (b.north - b.south) * (1.0 + 2.0 * pad);
        span.to_radians() * EARTH_RADIUS_M * degrees.to_radians().tan()
    }

    #[test]
    fn test_flat_mesh_is_transparent() {
        let image = rasterize_slopes(&covering_mesh(tile(), 0.5, 0.0), tile(), false).unwrap();
        assert_eq!(image.dimensions(), (256, 256));
        assert!(image.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_steep_mesh_fills_tile() {
        let rise = rise_for(tile(), 0.5, 40.0);
        let image = rasterize_slopes(&covering_mesh(tile(), 0.5, rise), tile(), false).unwrap();

        let red = SlopeClass::Red.color();
        assert!(image.pixels().all(|p| *p == red));
    }

    #[test]
    fn test_straddling_triangles_reach_tile_edges() {
        // Mesh extends beyond the tile on every side, so edge pixels are filled.
        let rise = rise_for(tile(), 0.25, 55.0);
        let image = rasterize_slopes(&covering_mesh(tile(), 0.25, rise), tile(), false).unwrap();

        let blue = SlopeClass::Blue.color();
        for (x, y) in [(0, 0), (255, 0), (0, 255), (255, 255)] {
            assert_eq!(*image.get_pixel(x, y), blue, "pixel {},{}", x, y);
        }
    }

    #[test]
    fn test_outline_draws_diagonal() {
        // Mesh exactly on the tile: the shared diagonal runs from the
        // south-west to the north-east corner through pixel centers x + y = 255.
        let image = rasterize_slopes(&covering_mesh(tile(), 0.0, 0.0), tile(), true).unwrap();

        assert_eq!(*image.get_pixel(127, 128), OUTLINE_COLOR);
        assert_eq!(image.get_pixel(200, 40)[3], 0);
    }

    #[test]
    fn test_empty_mesh() {
        let image = rasterize_slopes(&TerrainMesh::default(), tile(), true).unwrap();
        assert!(image.pixels().all(|p| p[3] == 0));
    }
}
