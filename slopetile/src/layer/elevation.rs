//! Slope shading computed from terrain-RGB elevation tiles.

use super::params::LayerParams;
use super::{decode_image, resource, Layer, LayerKind, RenderError};
use crate::composite::clip_image_alpha;
use crate::coord::{TileCoord, TILE_SIZE};
use crate::elevation::decode_terrain_rgb;
use crate::provider::UrlTemplate;
use crate::slope::{classify, slope_field_resampled, SlopeField};
use crate::tilespec::{LayerDescriptor, TilespecError};
use bytes::Bytes;
use image::RgbaImage;
use std::collections::HashMap;
use tracing::trace;

/// Slope classes drawn from the elevation raster covering each tile.
///
/// Tiles deeper than the source's native zoom are cut out of the ancestor
/// tile at `max_zoom` and scaled up with nearest-neighbor sampling.
#[derive(Debug, Clone)]
pub struct ElevationSlopeLayer {
    name: String,
    template: UrlTemplate,
    max_zoom: u8,
    max_alpha: Option<u8>,
    resample: Option<u32>,
}

impl ElevationSlopeLayer {
    pub fn new(name: impl Into<String>, template: UrlTemplate, max_zoom: u8) -> Self {
        Self {
            name: name.into(),
            template,
            max_zoom,
            max_alpha: None,
            resample: None,
        }
    }

    /// Builds the layer from a descriptor accepting `o` and `r`.
    pub fn from_descriptor(
        descriptor: &LayerDescriptor,
        template: UrlTemplate,
        max_zoom: u8,
    ) -> Result<Self, TilespecError> {
        let mut params = LayerParams::new(descriptor)?;
        let max_alpha = params.opacity("o")?;
        let resample = params.resample("r")?;
        params.finish()?;

        Ok(Self {
            max_alpha,
            resample,
            ..Self::new(&descriptor.name, template, max_zoom)
        })
    }

    pub fn resample(&self) -> Option<u32> {
        self.resample
    }

    /// Elevation tile holding `tile`'s terrain.
    pub fn source_tile(&self, tile: TileCoord) -> TileCoord {
        if tile.zoom > self.max_zoom {
            tile.parent_at(self.max_zoom).unwrap_or(tile)
        } else {
            tile
        }
    }

    /// Slope field over the source tile.
    fn slope_field(
        &self,
        source: TileCoord,
        data: &[u8],
        url: &str,
    ) -> Result<SlopeField, RenderError> {
        let grid = decode_terrain_rgb(&decode_image(url, data)?);
        let (dx, dy) = source.bounds().pixel_size_meters(grid.width(), grid.height());
        Ok(slope_field_resampled(
            &grid,
            dx,
            dy,
            self.resample.unwrap_or(1),
        ))
    }
}

impl Layer for ElevationSlopeLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LayerKind {
        LayerKind::ElevationRaster
    }

    fn resources_for(&self, tile: TileCoord) -> Vec<String> {
        vec![self.template.for_tile(self.source_tile(tile))]
    }

    fn render(
        &self,
        tile: TileCoord,
        resources: &HashMap<String, Bytes>,
    ) -> Result<RgbaImage, RenderError> {
        let source = self.source_tile(tile);
        let url = self.template.for_tile(source);
        let field = self.slope_field(source, resource(resources, &url)?, &url)?;

        // Position of `tile` inside `source`, in source tiles.
        let scale = (1u64 << (tile.zoom - source.zoom)) as f64;
        let offset_x = tile.x as f64 - source.x as f64 * scale;
        let offset_y = tile.y as f64 - source.y as f64 * scale;
        let size = TILE_SIZE as f64;

        trace!(
            tile = %tile,
            source = %source,
            field_width = field.width(),
            resample = ?self.resample,
            "Rendering elevation slope"
        );

        let mut image = RgbaImage::from_fn(TILE_SIZE, TILE_SIZE, |px, py| {
            let u = (offset_x + (px as f64 + 0.5) / size) / scale;
            let v = (offset_y + (py as f64 + 0.5) / size) / scale;
            classify(field.sample(u, v)).color()
        });
        if let Some(max_alpha) = self.max_alpha {
            clip_image_alpha(&mut image, max_alpha);
        }
        Ok(image)
    }
}
