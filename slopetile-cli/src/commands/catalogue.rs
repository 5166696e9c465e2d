//! Tilespec validation and layer listing.

use slopetile::layer::LayerRegistry;
use std::path::PathBuf;

use crate::error::CliError;
use crate::runner::load_config;

fn registry(config: Option<PathBuf>) -> Result<LayerRegistry, CliError> {
    let config = load_config(config.as_deref())?;
    Ok(LayerRegistry::from_sources(&config.sources))
}

/// Parse a tilespec and print its layers.
pub fn run_validate(config: Option<PathBuf>, tilespec: &str) -> Result<(), CliError> {
    let registry = registry(config)?;
    let layers = registry.parse(tilespec).map_err(CliError::Tilespec)?;

    println!("{} is valid:", tilespec);
    for layer in &layers {
        println!("  {:<12} {}", layer.name(), layer.kind());
    }
    Ok(())
}

/// Print every registered layer.
pub fn run_layers(config: Option<PathBuf>) -> Result<(), CliError> {
    let registry = registry(config)?;

    for (name, kind) in registry.layers() {
        println!("{:<12} {}", name, kind);
    }
    Ok(())
}
