//! Slope shading computed from quantized-mesh terrain tiles.

use super::params::LayerParams;
use super::{resource, Layer, LayerKind, RenderError};
use crate::composite::clip_image_alpha;
use crate::coord::TileCoord;
use crate::mesh::{covering_tiles, decode, rasterize_slopes, GeographicTile, TerrainMesh};
use crate::provider::UrlTemplate;
use crate::tilespec::{LayerDescriptor, TilespecError};
use bytes::Bytes;
use image::RgbaImage;
use std::collections::HashMap;
use tracing::trace;

/// Per-triangle slope classes from the mesh tiles covering each tile.
#[derive(Debug, Clone)]
pub struct MeshSlopeLayer {
    name: String,
    template: UrlTemplate,
    max_alpha: Option<u8>,
    outline: bool,
}

impl MeshSlopeLayer {
    pub fn new(name: impl Into<String>, template: UrlTemplate) -> Self {
        Self {
            name: name.into(),
            template,
            max_alpha: None,
            outline: false,
        }
    }

    /// Builds the layer from a descriptor accepting `o` and `outline`.
    pub fn from_descriptor(
        descriptor: &LayerDescriptor,
        template: UrlTemplate,
    ) -> Result<Self, TilespecError> {
        let mut params = LayerParams::new(descriptor)?;
        let max_alpha = params.opacity("o")?;
        let outline = params.flag("outline")?;
        params.finish()?;

        Ok(Self {
            max_alpha,
            outline,
            ..Self::new(&descriptor.name, template)
        })
    }

    pub fn outline(&self) -> bool {
        self.outline
    }

    fn url_for(&self, mesh_tile: &GeographicTile) -> String {
        self.template.expand(mesh_tile.level, mesh_tile.x, mesh_tile.y)
    }
}

impl Layer for MeshSlopeLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LayerKind {
        LayerKind::QuantizedMeshSlope
    }

    fn resources_for(&self, tile: TileCoord) -> Vec<String> {
        covering_tiles(tile).iter().map(|t| self.url_for(t)).collect()
    }

    fn render(
        &self,
        tile: TileCoord,
        resources: &HashMap<String, Bytes>,
    ) -> Result<RgbaImage, RenderError> {
        let mut terrain = TerrainMesh::default();
        for mesh_tile in covering_tiles(tile) {
            let url = self.url_for(&mesh_tile);
            let mesh = decode(resource(resources, &url)?).map_err(|source| RenderError::Mesh {
                url: url.clone(),
                source,
            })?;
            trace!(
                url = %url,
                vertices = mesh.vertex_count(),
                triangles = mesh.triangles.len(),
                "Decoded terrain mesh"
            );
            terrain.append(mesh.to_terrain(&mesh_tile.bounds()));
        }

        let mut image = rasterize_slopes(&terrain, tile, self.outline)?;
        if let Some(max_alpha) = self.max_alpha {
            clip_image_alpha(&mut image, max_alpha);
        }
        Ok(image)
    }
}
