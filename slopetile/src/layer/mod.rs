//! Map layers and the registry that builds them from tilespecs.
//!
//! Every layer answers two questions for a tile: which upstream URLs it
//! needs, and what it looks like once those URLs have been fetched. The
//! [`LayerRegistry`] is the only place that knows the concrete layer types.
//!
//! | name        | kind               | parameters                      |
//! |-------------|--------------------|---------------------------------|
//! | `topo`      | DirectImage        | `a` alpha cap 0..=256           |
//! | `contour`   | DirectImage        | `a`                             |
//! | `imagery`   | DirectImage        | `a`                             |
//! | `slope`     | SlopeShading       | `a`                             |
//! | `elevslope` | ElevationRaster    | `o` opacity 0..=1, `r` resample |
//! | `meshslope` | QuantizedMeshSlope | `o` opacity, `outline` 0/1      |

mod direct;
mod elevation;
mod mesh;
mod params;
mod registry;

pub use direct::DirectImageLayer;
pub use elevation::ElevationSlopeLayer;
pub use mesh::MeshSlopeLayer;
pub use params::LayerParams;
pub use registry::{LayerFactory, LayerRegistry};

use crate::coord::{TileCoord, TILE_SIZE};
use crate::mesh::MeshDecodeError;
use bytes::Bytes;
use image::{ImageError, ImageReader, RgbaImage};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use thiserror::Error;

/// Errors rendering a layer from fetched payloads.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The fetched map lacks a URL the layer asked for
    #[error("Resource {url} was not fetched")]
    MissingResource { url: String },

    #[error("Failed to decode image from {url}: {source}")]
    Image {
        url: String,
        #[source]
        source: ImageError,
    },

    #[error("Image from {url} has no pixels")]
    EmptyImage { url: String },

    #[error("Failed to decode terrain mesh from {url}: {source}")]
    Mesh {
        url: String,
        #[source]
        source: MeshDecodeError,
    },

    #[error("Rasterization failed: {0}")]
    Raster(String),
}

/// Which family a layer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Upstream raster tiles drawn as they are
    DirectImage,
    /// Pre-rendered slope-shading tiles
    SlopeShading,
    /// Slope computed from terrain-RGB elevation tiles
    ElevationRaster,
    /// Slope computed from quantized-mesh terrain tiles
    QuantizedMeshSlope,
}

impl LayerKind {
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::DirectImage => "DirectImage",
            LayerKind::SlopeShading => "SlopeShading",
            LayerKind::ElevationRaster => "ElevationRaster",
            LayerKind::QuantizedMeshSlope => "QuantizedMeshSlope",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A configured map layer.
pub trait Layer: Send + Sync {
    /// Registry name this layer was built from.
    fn name(&self) -> &str;

    fn kind(&self) -> LayerKind;

    /// Upstream URLs needed to render `tile`.
    fn resources_for(&self, tile: TileCoord) -> Vec<String>;

    /// Renders `tile` as a 256×256 RGBA image.
    ///
    /// `resources` holds at least every URL returned by
    /// [`resources_for`](Layer::resources_for).
    fn render(
        &self,
        tile: TileCoord,
        resources: &HashMap<String, Bytes>,
    ) -> Result<RgbaImage, RenderError>;
}

/// Looks up a fetched payload.
pub(crate) fn resource<'a>(
    resources: &'a HashMap<String, Bytes>,
    url: &str,
) -> Result<&'a Bytes, RenderError> {
    resources
        .get(url)
        .ok_or_else(|| RenderError::MissingResource {
            url: url.to_string(),
        })
}

/// Decodes a PNG or JPEG payload to RGBA.
pub(crate) fn decode_image(url: &str, data: &[u8]) -> Result<RgbaImage, RenderError> {
    let to_error = |source: ImageError| RenderError::Image {
        url: url.to_string(),
        source,
    };
    let image = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| to_error(ImageError::IoError(e)))?
        .decode()
        .map_err(to_error)?
        .to_rgba8();

    if image.width() == 0 || image.height() == 0 {
        return Err(RenderError::EmptyImage {
            url: url.to_string(),
        });
    }
    Ok(image)
}

/// Resizes to the output tile size when an upstream serves another size.
pub(crate) fn fit_to_tile(image: RgbaImage) -> RgbaImage {
    if image.dimensions() == (TILE_SIZE, TILE_SIZE) {
        image
    } else {
        image::imageops::resize(
            &image,
            TILE_SIZE,
            TILE_SIZE,
            image::imageops::FilterType::Triangle,
        )
    }
}
