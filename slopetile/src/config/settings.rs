//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use super::fetch::FetchConfig;
use crate::provider::UrlTemplate;
use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Upstream URL templates
    pub sources: SourceSettings,
    /// Batch fetch deadlines
    pub fetch: FetchSettings,
    /// In-memory tile cache
    pub cache: CacheSettings,
    /// Log output location
    pub logging: LoggingSettings,
}

/// Upstream tile sources, as `{z}/{x}/{y}` URL templates.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub topo: String,
    pub slope: String,
    pub contour: String,
    pub imagery: String,
    /// Terrain-RGB elevation tiles
    pub elevation: String,
    /// Highest zoom the elevation source serves; deeper tiles are over-zoomed
    pub elevation_max_zoom: u8,
    /// Quantized-mesh terrain tiles
    pub mesh: String,
    /// Substituted for `{token}` in the elevation template
    pub mapbox_access_token: Option<String>,
}

impl SourceSettings {
    /// Elevation template with the access token filled in.
    pub fn elevation_template(&self) -> UrlTemplate {
        let token = self.mapbox_access_token.as_deref().unwrap_or("");
        UrlTemplate::new(&self.elevation).with_placeholder("token", token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Per-request deadline in seconds
    pub timeout: u64,
    /// Retry-after hint for timed-out requests, in seconds
    pub retry_after: u64,
}

impl FetchSettings {
    pub fn to_fetch_config(&self) -> FetchConfig {
        FetchConfig::new()
            .with_timeout_secs(self.timeout)
            .with_retry_after_secs(self.retry_after)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Memory cache size in bytes (0 disables caching)
    pub memory_size: usize,
    /// Entry lifetime in seconds; `None` never expires
    pub ttl: Option<u64>,
}

impl CacheSettings {
    pub fn ttl_duration(&self) -> Option<Duration> {
        self.ttl.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Directory holding the log file
    pub directory: PathBuf,
    /// Log file name
    pub file: String,
}
