//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;
use super::size::format_size;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let mapbox_access_token = config.sources.mapbox_access_token.as_deref().unwrap_or("");
    let ttl = config.cache.ttl.unwrap_or(0);

    format!(
        r#"[sources]
; URL templates for upstream tiles. {{z}}, {{x}} and {{y}} are substituted per tile.
; Shaded-relief topographic base map (layer: topo)
topo = {}
; Pre-rendered slope shading (layer: slope)
slope = {}
; Contour lines (layer: contour)
contour = {}
; Satellite imagery (layer: imagery)
imagery = {}
; Terrain-RGB elevation tiles (layer: elevslope). {{token}} is replaced by mapbox_access_token
elevation = {}
; Highest zoom served by the elevation source (default: 15)
elevation_max_zoom = {}
; Quantized-mesh terrain tiles, geographic TMS scheme (layer: meshslope)
mesh = {}
mapbox_access_token = {}

[fetch]
; Deadline in seconds for each upstream request (default: 15)
timeout = {}
; Retry-after hint in seconds reported when an upstream request times out (default: 6)
retry_after = {}

[cache]
; Memory cache size (default: 256MB). Supports KB, MB, GB suffixes; 0 disables the cache
memory_size = {}
; Entry lifetime in seconds (default: 0 = never expire)
ttl = {}

[logging]
; Directory for the log file (default: ~/.slopetile/logs)
directory = {}
file = {}
"#,
        config.sources.topo,
        config.sources.slope,
        config.sources.contour,
        config.sources.imagery,
        config.sources.elevation,
        config.sources.elevation_max_zoom,
        config.sources.mesh,
        mapbox_access_token,
        config.fetch.timeout,
        config.fetch.retry_after,
        format_size(config.cache.memory_size),
        ttl,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.sources.mapbox_access_token = Some("pk.test".to_string());
        config.fetch.timeout = 20;
        config.cache.memory_size = 64 * 1024 * 1024;
        config.cache.ttl = Some(600);
        config.logging.directory = temp_dir.path().join("logs");

        config.save_to(&config_path).unwrap();
        let reloaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_default_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let config = ConfigFile::default();
        config.save_to(&config_path).unwrap();

        assert_eq!(ConfigFile::load_from(&config_path).unwrap(), config);
    }

    #[test]
    fn test_output_is_commented() {
        let content = to_config_string(&ConfigFile::default());
        assert!(content.contains("[sources]"));
        assert!(content.contains("; Deadline in seconds"));
        assert!(content.contains("memory_size = 256MB"));
        assert!(content.contains("ttl = 0"));
    }
}
