//! Default values and constants for all configuration settings.

use super::settings::*;

// =============================================================================
// Upstream sources
// =============================================================================

/// Shaded-relief topographic base map.
pub const DEFAULT_TOPO_URL: &str =
    "http://caltopo.com/resource/imagery/mapbuilder/cs-60-40-c21BB6100-h22-a21-r22-t22d-m21-p21/{z}/{x}/{y}.png";

/// Pre-rendered slope-shading overlay.
pub const DEFAULT_SLOPE_URL: &str = "http://caltopo.com/resource/imagery/tiles/sf/{z}/{x}/{y}.png";

/// Contour line overlay (feet).
pub const DEFAULT_CONTOUR_URL: &str = "http://ctcontour.s3.amazonaws.com/feet/{z}/{x}/{y}.png";

/// Satellite imagery base map.
pub const DEFAULT_IMAGERY_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";

/// Terrain-RGB elevation tiles. `{token}` is replaced by the access token.
pub const DEFAULT_ELEVATION_URL: &str =
    "https://api.mapbox.com/v4/mapbox.terrain-rgb/{z}/{x}/{y}.pngraw?access_token={token}";

/// Highest zoom the elevation source serves natively.
pub const DEFAULT_ELEVATION_MAX_ZOOM: u8 = 15;

/// Quantized-mesh terrain tiles (geographic TMS scheme).
pub const DEFAULT_MESH_URL: &str =
    "https://assets.agi.com/stk-terrain/world/{z}/{x}/{y}.terrain?v=1.16389.0";

// =============================================================================
// Fetch defaults
// =============================================================================

/// Default per-request upstream deadline in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

/// Default backoff suggested to clients after an upstream timeout.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 6;

// =============================================================================
// Cache defaults
// =============================================================================

/// Default memory cache size (256MB).
pub const DEFAULT_MEMORY_CACHE_SIZE: usize = 256 * 1024 * 1024;

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log file name inside the log directory.
pub const DEFAULT_LOG_FILE: &str = "slopetile.log";

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = super::file::config_directory();

        Self {
            sources: SourceSettings {
                topo: DEFAULT_TOPO_URL.to_string(),
                slope: DEFAULT_SLOPE_URL.to_string(),
                contour: DEFAULT_CONTOUR_URL.to_string(),
                imagery: DEFAULT_IMAGERY_URL.to_string(),
                elevation: DEFAULT_ELEVATION_URL.to_string(),
                elevation_max_zoom: DEFAULT_ELEVATION_MAX_ZOOM,
                mesh: DEFAULT_MESH_URL.to_string(),
                mapbox_access_token: None,
            },
            fetch: FetchSettings {
                timeout: DEFAULT_FETCH_TIMEOUT_SECS,
                retry_after: DEFAULT_RETRY_AFTER_SECS,
            },
            cache: CacheSettings {
                memory_size: DEFAULT_MEMORY_CACHE_SIZE,
                ttl: None,
            },
            logging: LoggingSettings {
                directory: config_dir.join("logs"),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
