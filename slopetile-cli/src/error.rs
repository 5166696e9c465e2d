//! CLI error handling with user-friendly messages.
//!
//! Centralizes error formatting and exit codes for every subcommand.

use slopetile::compose::ComposeError;
use slopetile::config::ConfigFileError;
use slopetile::coord::CoordError;
use slopetile::provider::ProviderError;
use slopetile::tilespec::TilespecError;
use std::fmt;
use std::path::PathBuf;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Config file could not be read or written
    Config(ConfigFileError),
    /// Tile address is invalid
    Tile(CoordError),
    /// Tile address arguments are incomplete
    MissingTile,
    /// Tilespec does not parse
    Tilespec(TilespecError),
    /// HTTP client could not be built
    Client(ProviderError),
    /// Rendering the composite failed
    Render(ComposeError),
    /// Failed to write output file
    FileWrite { path: PathBuf, error: std::io::Error },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Render(e) => {
                if let Some(retry_after) = e.retry_after() {
                    eprintln!();
                    eprintln!(
                        "An upstream tile server timed out. Retry in {} seconds.",
                        retry_after.as_secs()
                    );
                }
            }
            CliError::MissingTile => {
                eprintln!();
                eprintln!("Pass either --x and --y, or --lat and --lon, together with --zoom.");
            }
            CliError::Tilespec(_) => {
                eprintln!();
                eprintln!("Run 'slopetile layers' to list the available layers.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Tile(e) => write!(f, "Invalid tile: {}", e),
            CliError::MissingTile => write!(f, "No tile given"),
            CliError::Tilespec(e) => write!(f, "Invalid tilespec: {}", e),
            CliError::Client(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Render(e) => write!(f, "Failed to render tile ({}): {}", e.status_code(), e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Tile(e) => Some(e),
            CliError::Tilespec(e) => Some(e),
            CliError::Client(e) => Some(e),
            CliError::Render(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<ComposeError> for CliError {
    fn from(e: ComposeError) -> Self {
        CliError::Render(e)
    }
}
