//! Layers that draw upstream raster tiles unchanged.

use super::params::LayerParams;
use super::{decode_image, fit_to_tile, resource, Layer, LayerKind, RenderError};
use crate::composite::clip_image_alpha;
use crate::coord::TileCoord;
use crate::provider::UrlTemplate;
use crate::tilespec::{LayerDescriptor, TilespecError};
use bytes::Bytes;
use image::RgbaImage;
use std::collections::HashMap;

/// One upstream tile per output tile, optionally alpha-capped.
///
/// Serves both plain base maps and pre-rendered slope shading; the two only
/// differ in [`LayerKind`].
#[derive(Debug, Clone)]
pub struct DirectImageLayer {
    name: String,
    kind: LayerKind,
    template: UrlTemplate,
    max_alpha: Option<u8>,
}

impl DirectImageLayer {
    pub fn new(
        name: impl Into<String>,
        kind: LayerKind,
        template: UrlTemplate,
        max_alpha: Option<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            template,
            max_alpha,
        }
    }

    /// Builds the layer from a descriptor accepting the `a` parameter.
    pub fn from_descriptor(
        descriptor: &LayerDescriptor,
        kind: LayerKind,
        template: UrlTemplate,
    ) -> Result<Self, TilespecError> {
        let mut params = LayerParams::new(descriptor)?;
        let max_alpha = params.alpha("a")?;
        params.finish()?;
        Ok(Self::new(&descriptor.name, kind, template, max_alpha))
    }

    pub fn max_alpha(&self) -> Option<u8> {
        self.max_alpha
    }
}

impl Layer for DirectImageLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LayerKind {
        self.kind
    }

    fn resources_for(&self, tile: TileCoord) -> Vec<String> {
        vec![self.template.for_tile(tile)]
    }

    fn render(
        &self,
        tile: TileCoord,
        resources: &HashMap<String, Bytes>,
    ) -> Result<RgbaImage, RenderError> {
        let url = self.template.for_tile(tile);
        let mut image = fit_to_tile(decode_image(&url, resource(resources, &url)?)?);
        if let Some(max_alpha) = self.max_alpha {
            clip_image_alpha(&mut image, max_alpha);
        }
        Ok(image)
    }
}
