//! Composite tile rendering.
//!
//! Ties the pieces together for one request: parse the tilespec into layers,
//! fetch the union of their resources in one batch, render every layer and
//! stack them base layer first.

use crate::composite::overlay_image;
use crate::coord::{TileCoord, TILE_SIZE};
use crate::fetch::{BatchFetcher, FetchError};
use crate::layer::{Layer, LayerRegistry, RenderError};
use crate::provider::AsyncHttpClient;
use crate::tilespec::TilespecError;
use bytes::Bytes;
use image::{ImageFormat, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Request-level failure of a composite render.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The tilespec is malformed; never worth retrying
    #[error("Invalid tilespec: {0}")]
    Parse(#[from] TilespecError),

    /// An upstream resource could not be fetched
    #[error("{source}")]
    Fetch {
        #[source]
        source: FetchError,
        /// Backoff to suggest when the failure was a timeout
        retry_after_secs: u64,
    },

    /// A layer could not render from its payloads
    #[error("Layer '{layer}' failed: {source}")]
    Render {
        layer: String,
        #[source]
        source: RenderError,
    },

    #[error("Failed to encode PNG: {0}")]
    Encode(String),

    #[error("Render task failed: {0}")]
    Task(String),
}

impl ComposeError {
    /// HTTP-equivalent status for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            ComposeError::Parse(_) => 400,
            ComposeError::Fetch { source, .. } if source.is_timeout() => 503,
            ComposeError::Fetch { .. } => 502,
            ComposeError::Render { .. } | ComposeError::Encode(_) | ComposeError::Task(_) => 500,
        }
    }

    /// Whether the client may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ComposeError::Fetch { source, .. } if source.is_timeout())
    }

    /// Suggested backoff before retrying, for retryable failures only.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ComposeError::Fetch {
                source,
                retry_after_secs,
            } if source.is_timeout() => Some(Duration::from_secs(*retry_after_secs)),
            _ => None,
        }
    }
}

/// Renders composite tiles from tilespecs.
pub struct TileCompositor<C: AsyncHttpClient> {
    registry: Arc<LayerRegistry>,
    fetcher: Arc<BatchFetcher<C>>,
}

impl<C: AsyncHttpClient> Clone for TileCompositor<C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl<C: AsyncHttpClient> TileCompositor<C> {
    pub fn new(registry: Arc<LayerRegistry>, fetcher: Arc<BatchFetcher<C>>) -> Self {
        Self { registry, fetcher }
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn fetcher(&self) -> &BatchFetcher<C> {
        &self.fetcher
    }

    /// Checks that a tilespec parses and every layer accepts its parameters.
    pub fn validate(&self, tilespec: &str) -> Result<(), TilespecError> {
        self.registry.parse(tilespec).map(|_| ())
    }

    /// Renders `tile` for `tilespec` as a 256×256 RGBA image.
    ///
    /// # Errors
    ///
    /// Any parse, fetch or layer failure fails the whole tile.
    pub async fn render_tile(
        &self,
        tilespec: &str,
        tile: TileCoord,
    ) -> Result<RgbaImage, ComposeError> {
        let started = Instant::now();
        let layers = self.registry.parse(tilespec)?;

        let urls: Vec<String> = layers
            .iter()
            .flat_map(|layer| layer.resources_for(tile))
            .collect();
        debug!(
            tile = %tile,
            tilespec,
            layers = layers.len(),
            resources = urls.len(),
            "Composing tile"
        );

        let resources = self.fetcher.retrieve_map(&urls).await.map_err(|source| {
            warn!(tile = %tile, tilespec, error = %source, "Composite fetch failed");
            ComposeError::Fetch {
                source,
                retry_after_secs: self.fetcher.config().retry_after_secs(),
            }
        })?;

        let image = tokio::task::spawn_blocking(move || render_layers(&layers, tile, &resources))
            .await
            .map_err(|e| ComposeError::Task(e.to_string()))??;

        info!(
            tile = %tile,
            tilespec,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Composite tile rendered"
        );
        Ok(image)
    }

    /// Renders `tile` and encodes it as PNG.
    pub async fn render_png(&self, tilespec: &str, tile: TileCoord) -> Result<Bytes, ComposeError> {
        let image = self.render_tile(tilespec, tile).await?;
        encode_png(&image)
    }
}

/// Renders every layer and stacks them, first layer at the bottom.
fn render_layers(
    layers: &[Box<dyn Layer>],
    tile: TileCoord,
    resources: &HashMap<String, Bytes>,
) -> Result<RgbaImage, ComposeError> {
    let mut rendered = Vec::with_capacity(layers.len());
    for layer in layers {
        let image = layer
            .render(tile, resources)
            .map_err(|source| ComposeError::Render {
                layer: layer.name().to_string(),
                source,
            })?;
        rendered.push(image);
    }

    match rendered.split_first() {
        Some((base, overlays)) => Ok(overlay_image(base, overlays)),
        None => Ok(RgbaImage::new(TILE_SIZE, TILE_SIZE)),
    }
}

/// Encodes an image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Bytes, ComposeError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| ComposeError::Encode(e.to_string()))?;
    Ok(Bytes::from(buffer.into_inner()))
}
