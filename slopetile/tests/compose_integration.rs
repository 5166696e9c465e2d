//! End-to-end composite rendering through the public API.
//!
//! A stub upstream serves in-memory PNGs so the whole path runs: tilespec
//! parsing, batched fetch with the memory cache, layer rendering and blending.
//!
//! Run with: `cargo test --test compose_integration`

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};
use parking_lot::Mutex;

use slopetile::cache::{MemoryCache, NoOpCache, TileCache};
use slopetile::compose::TileCompositor;
use slopetile::config::{ConfigFile, FetchConfig};
use slopetile::coord::TileCoord;
use slopetile::elevation::encode_pixel;
use slopetile::fetch::BatchFetcher;
use slopetile::layer::LayerRegistry;
use slopetile::provider::{AsyncHttpClient, ProviderError};

// ============================================================================
// Test Helpers
// ============================================================================

/// Upstream that serves fixed payloads and records every request.
#[derive(Clone, Default)]
struct StubUpstream {
    responses: Arc<HashMap<String, Bytes>>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl StubUpstream {
    fn new(responses: impl IntoIterator<Item = (String, Bytes)>) -> Self {
        Self {
            responses: Arc::new(responses.into_iter().collect()),
            requested: Arc::default(),
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

impl AsyncHttpClient for StubUpstream {
    async fn get(&self, url: &str) -> Result<Bytes, ProviderError> {
        self.requested.lock().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| ProviderError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}

fn png(image: &RgbaImage) -> Bytes {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    Bytes::from(buffer.into_inner())
}

fn solid(color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(256, 256, Rgba(color))
}

fn topo_url(tile: TileCoord) -> String {
    format!("https://topo.test/{}/{}/{}.png", tile.zoom, tile.x, tile.y)
}

fn slope_url(tile: TileCoord) -> String {
    format!("https://slope.test/{}/{}/{}.png", tile.zoom, tile.x, tile.y)
}

fn elevation_url(tile: TileCoord) -> String {
    format!("https://elevation.test/{}/{}/{}.pngraw", tile.zoom, tile.x, tile.y)
}

fn registry() -> Arc<LayerRegistry> {
    let mut sources = ConfigFile::default().sources;
    sources.topo = "https://topo.test/{z}/{x}/{y}.png".to_string();
    sources.slope = "https://slope.test/{z}/{x}/{y}.png".to_string();
    sources.elevation = "https://elevation.test/{z}/{x}/{y}.pngraw".to_string();
    sources.elevation_max_zoom = 15;
    Arc::new(LayerRegistry::from_sources(&sources))
}

fn compositor(
    upstream: StubUpstream,
    cache: Arc<dyn TileCache>,
) -> TileCompositor<StubUpstream> {
    let fetcher = BatchFetcher::new(upstream, cache, FetchConfig::default());
    TileCompositor::new(registry(), Arc::new(fetcher))
}

/// Terrain-RGB tile rising `degrees` eastwards at the tile's pixel spacing.
fn ramp(tile: TileCoord, degrees: f64) -> Bytes {
    let (dx, _) = tile.bounds().pixel_size_meters(256, 256);
    let rise = dx * degrees.to_radians().tan();
    let image = RgbaImage::from_fn(256, 256, |x, _| {
        let [r, g, b] = encode_pixel(500.0 + x as f64 * rise);
        Rgba([r, g, b, 255])
    });
    png(&image)
}

fn flat(meters: f64) -> Bytes {
    let [r, g, b] = encode_pixel(meters);
    png(&solid([r, g, b, 255]))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_single_topo_layer_is_returned_unchanged() {
    let tile = TileCoord::new(2, 1, 1).unwrap();
    let gray = solid([128, 128, 128, 255]);
    let upstream = StubUpstream::new([(topo_url(tile), png(&gray))]);

    let image = compositor(upstream, Arc::new(NoOpCache::new()))
        .render_tile("topo", tile)
        .await
        .unwrap();

    assert_eq!(image.dimensions(), (256, 256));
    assert_eq!(image, gray);
}

#[tokio::test]
async fn test_slope_overlay_is_capped_at_requested_alpha() {
    let tile = TileCoord::new(2, 1, 1).unwrap();
    let transparent_base = solid([0, 0, 0, 0]);
    let purple = solid([192, 0, 192, 255]);
    let upstream = StubUpstream::new([
        (topo_url(tile), png(&transparent_base)),
        (slope_url(tile), png(&purple)),
    ]);

    let image = compositor(upstream, Arc::new(NoOpCache::new()))
        .render_tile("topo~slope_a_64", tile)
        .await
        .unwrap();

    assert!(image.pixels().all(|p| p[3] <= 64));
    assert_eq!(image.get_pixel(0, 0)[3], 64);
}

#[tokio::test]
async fn test_flat_terrain_leaves_base_untouched() {
    let tile = TileCoord::new(12, 2140, 1428).unwrap();
    let base = solid([200, 210, 220, 255]);
    let upstream = StubUpstream::new([
        (topo_url(tile), png(&base)),
        (elevation_url(tile), flat(1200.0)),
    ]);

    let image = compositor(upstream, Arc::new(NoOpCache::new()))
        .render_tile("topo~elevslope", tile)
        .await
        .unwrap();

    assert_eq!(image, base);
}

#[tokio::test]
async fn test_steep_terrain_is_shaded_by_class() {
    let tile = TileCoord::new(12, 2140, 1428).unwrap();
    let white = solid([255, 255, 255, 255]);
    let upstream = StubUpstream::new([
        (topo_url(tile), png(&white)),
        (elevation_url(tile), ramp(tile, 40.0)),
    ]);

    let compositor = compositor(upstream, Arc::new(NoOpCache::new()));

    // 40 degrees falls in the red band
    let opaque = compositor.render_tile("topo~elevslope", tile).await.unwrap();
    assert_eq!(*opaque.get_pixel(128, 128), Rgba([255, 0, 0, 255]));

    let half = compositor
        .render_tile("topo~elevslope_o_0.5", tile)
        .await
        .unwrap();
    let p = half.get_pixel(128, 128);
    assert_eq!(p[0], 255);
    assert!(p[1] > 100 && p[1] < 150, "green was {}", p[1]);
    assert_eq!(p[3], 255);
}

#[tokio::test]
async fn test_over_zoomed_tile_reuses_parent_elevation() {
    let source = TileCoord::new(15, 17120, 11424).unwrap();
    let tile = TileCoord::new(17, 17120 * 4 + 1, 11424 * 4 + 2).unwrap();
    let upstream = StubUpstream::new([
        (topo_url(tile), png(&solid([255, 255, 255, 255]))),
        (elevation_url(source), flat(300.0)),
    ]);

    let image = compositor(upstream.clone(), Arc::new(NoOpCache::new()))
        .render_tile("topo~elevslope", tile)
        .await
        .unwrap();

    assert_eq!(image.dimensions(), (256, 256));
    assert!(upstream.requests().contains(&elevation_url(source)));
}

#[tokio::test]
async fn test_repeated_layers_fetch_each_url_once() {
    let tile = TileCoord::new(5, 10, 12).unwrap();
    let upstream = StubUpstream::new([(topo_url(tile), png(&solid([10, 20, 30, 255])))]);

    compositor(upstream.clone(), Arc::new(NoOpCache::new()))
        .render_tile("topo~topo_a_128~topo", tile)
        .await
        .unwrap();

    assert_eq!(upstream.requests(), vec![topo_url(tile)]);
}

#[tokio::test]
async fn test_memory_cache_serves_second_render() {
    let tile = TileCoord::new(5, 10, 12).unwrap();
    let upstream = StubUpstream::new([
        (topo_url(tile), png(&solid([10, 20, 30, 255]))),
        (slope_url(tile), png(&solid([255, 0, 0, 255]))),
    ]);
    let cache = Arc::new(MemoryCache::new(16 * 1024 * 1024));
    let compositor = compositor(upstream.clone(), cache.clone());

    let first = compositor.render_tile("topo~slope_a_64", tile).await.unwrap();
    let second = compositor.render_tile("topo~slope_a_64", tile).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(upstream.requests().len(), 2);
    assert_eq!(cache.entry_count(), 2);

    let stats = compositor.fetcher().stats();
    assert_eq!(stats.cache_hits, 2);
    assert_eq!(stats.network_fetches, 2);
}

#[tokio::test]
async fn test_missing_upstream_fails_whole_tile() {
    let tile = TileCoord::new(5, 10, 12).unwrap();
    let upstream = StubUpstream::new([(topo_url(tile), png(&solid([10, 20, 30, 255])))]);

    let err = compositor(upstream, Arc::new(NoOpCache::new()))
        .render_tile("topo~slope", tile)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 502);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_rendered_png_decodes_to_tile() {
    let tile = TileCoord::new(2, 1, 1).unwrap();
    let upstream = StubUpstream::new([(topo_url(tile), png(&solid([1, 2, 3, 255])))]);

    let bytes = compositor(upstream, Arc::new(NoOpCache::new()))
        .render_png("topo", tile)
        .await
        .unwrap();

    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded, solid([1, 2, 3, 255]));
}
