//! Slope-angle shading and layer compositing for slippy-map raster tiles.
//!
//! A request names a tile and a *tilespec*, a `~`-separated stack of layers
//! such as `topo~slope_a_64`. Each layer says which upstream resources it
//! needs; those are fetched in one deduplicated batch and every layer is
//! rendered and blended over the first.
//!
//! ```ignore
//! use slopetile::compose::TileCompositor;
//! use slopetile::coord::TileCoord;
//!
//! let tile = TileCoord::new(12, 2140, 1428)?;
//! let png = compositor.render_png("topo~elevslope_o_0.5", tile).await?;
//! ```
//!
//! Slope layers come in three flavours: pre-rendered shading tiles, slopes
//! computed from terrain-RGB elevation rasters ([`elevation`], [`slope`]) and
//! slopes computed per triangle of quantized-mesh terrain ([`mesh`]).

pub mod cache;
pub mod compose;
pub mod composite;
pub mod config;
pub mod coord;
pub mod elevation;
pub mod fetch;
pub mod layer;
pub mod logging;
pub mod mesh;
pub mod provider;
pub mod slope;
pub mod tilespec;

/// Version of the slopetile library and CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
