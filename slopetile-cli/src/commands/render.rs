//! Render command - compose one tile and write it as PNG.

use slopetile::coord::{to_tile_coords, TileCoord};
use std::path::PathBuf;
use std::time::Instant;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the render command.
pub struct RenderArgs {
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub tilespec: String,
    pub zoom: u8,
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub output: PathBuf,
}

impl RenderArgs {
    /// Tile addressed either by column/row or by a point inside it.
    fn tile(&self) -> Result<TileCoord, CliError> {
        match (self.x, self.y, self.lat, self.lon) {
            (Some(x), Some(y), _, _) => TileCoord::new(self.zoom, x, y).map_err(CliError::Tile),
            (_, _, Some(lat), Some(lon)) => {
                to_tile_coords(lat, lon, self.zoom).map_err(CliError::Tile)
            }
            _ => Err(CliError::MissingTile),
        }
    }
}

/// Run the render command.
pub async fn run(args: RenderArgs) -> Result<(), CliError> {
    let tile = args.tile()?;

    let runner = CliRunner::new(args.config.clone(), args.verbose)?;
    runner.log_startup("render");

    let compositor = runner.create_compositor()?;
    compositor
        .validate(&args.tilespec)
        .map_err(CliError::Tilespec)?;

    println!("Rendering {} for tile {}", args.tilespec, tile);
    let start = Instant::now();

    let png = compositor.render_png(&args.tilespec, tile).await?;

    let stats = compositor.fetcher().stats();
    println!(
        "Rendered in {:.2}s ({} fetched, {} cached)",
        start.elapsed().as_secs_f64(),
        stats.network_fetches,
        stats.cache_hits
    );

    std::fs::write(&args.output, &png).map_err(|error| CliError::FileWrite {
        path: args.output.clone(),
        error,
    })?;
    println!("Saved {}", args.output.display());

    Ok(())
}
