//! CLI runner for common setup.
//!
//! Loads the config, starts logging and assembles the compositor so command
//! handlers only deal with their own arguments.

use slopetile::cache::{MemoryCache, NoOpCache, TileCache};
use slopetile::compose::TileCompositor;
use slopetile::config::{config_file_path, format_size, ConfigFile};
use slopetile::fetch::BatchFetcher;
use slopetile::layer::LayerRegistry;
use slopetile::logging::{init_logging, LoggingGuard};
use slopetile::provider::AsyncReqwestClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::error::CliError;

/// Loads the config file at `path`, or the default location.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    Ok(ConfigFile::load_from(&path)?)
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps logging active while the runner exists
    _logging_guard: LoggingGuard,
    config: ConfigFile,
    config_path: PathBuf,
}

impl CliRunner {
    /// Load config and initialize logging.
    pub fn new(config_path: Option<PathBuf>, verbose: bool) -> Result<Self, CliError> {
        let config = load_config(config_path.as_deref())?;
        let config_path = config_path.unwrap_or_else(config_file_path);

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file, verbose)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("slopetile v{}", slopetile::VERSION);
        info!(config = %self.config_path.display(), "slopetile CLI: {} command", command);
    }

    /// Build a compositor wired to the configured upstreams and cache.
    pub fn create_compositor(&self) -> Result<TileCompositor<AsyncReqwestClient>, CliError> {
        let client = AsyncReqwestClient::with_timeout(self.config.fetch.timeout)
            .map_err(CliError::Client)?;

        let cache_settings = &self.config.cache;
        let cache: Arc<dyn TileCache> = if cache_settings.memory_size == 0 {
            info!("Tile cache disabled");
            Arc::new(NoOpCache::new())
        } else {
            info!(
                size = %format_size(cache_settings.memory_size),
                ttl_secs = ?cache_settings.ttl,
                "Using memory tile cache"
            );
            Arc::new(
                MemoryCache::new(cache_settings.memory_size)
                    .with_ttl(cache_settings.ttl_duration()),
            )
        };

        let registry = LayerRegistry::from_sources(&self.config.sources);
        let fetcher = BatchFetcher::new(client, cache, self.config.fetch.to_fetch_config());

        Ok(TileCompositor::new(Arc::new(registry), Arc::new(fetcher)))
    }
}
