//! Init command - write a default config file.

use slopetile::config::{config_file_path, ConfigFile};
use std::path::PathBuf;

use crate::error::CliError;

pub fn run(config: Option<PathBuf>) -> Result<(), CliError> {
    let path = config.unwrap_or_else(config_file_path);

    if ConfigFile::ensure_exists_at(&path)? {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists; leaving it unchanged", path.display());
    }
    Ok(())
}
