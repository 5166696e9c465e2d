//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use super::size::parse_size;
use crate::coord::MAX_ZOOM;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [sources] section
    if let Some(section) = ini.section(Some("sources")) {
        let templates = [
            ("topo", &mut config.sources.topo),
            ("slope", &mut config.sources.slope),
            ("contour", &mut config.sources.contour),
            ("imagery", &mut config.sources.imagery),
            ("elevation", &mut config.sources.elevation),
            ("mesh", &mut config.sources.mesh),
        ];
        for (key, field) in templates {
            if let Some(v) = non_empty(section, key) {
                *field = parse_template("sources", key, v)?;
            }
        }
        if let Some(v) = section.get("elevation_max_zoom") {
            let zoom: u8 = v.trim().parse().map_err(|_| zoom_error(v))?;
            if zoom > MAX_ZOOM {
                return Err(zoom_error(v));
            }
            config.sources.elevation_max_zoom = zoom;
        }
        if let Some(v) = non_empty(section, "mapbox_access_token") {
            config.sources.mapbox_access_token = Some(v.to_string());
        }
    }

    // [fetch] section
    if let Some(section) = ini.section(Some("fetch")) {
        if let Some(v) = section.get("timeout") {
            config.fetch.timeout = parse_positive_secs("fetch", "timeout", v)?;
        }
        if let Some(v) = section.get("retry_after") {
            config.fetch.retry_after = parse_positive_secs("fetch", "retry_after", v)?;
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("memory_size") {
            config.cache.memory_size =
                parse_size(v).map_err(|_| ConfigFileError::InvalidValue {
                    section: "cache".to_string(),
                    key: "memory_size".to_string(),
                    value: v.to_string(),
                    reason: "expected format like '1GB', '256MB', or '1024KB'".to_string(),
                })?;
        }
        if let Some(v) = section.get("ttl") {
            let v = v.trim();
            if !v.is_empty() {
                let secs: u64 = v.parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "cache".to_string(),
                    key: "ttl".to_string(),
                    value: v.to_string(),
                    reason: "must be a non-negative integer (seconds, 0 = never expire)"
                        .to_string(),
                })?;
                config.cache.ttl = (secs > 0).then_some(secs);
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_template(section: &str, key: &str, value: &str) -> Result<String, ConfigFileError> {
    let missing: Vec<&str> = ["{z}", "{x}", "{y}"]
        .into_iter()
        .filter(|p| !value.contains(p))
        .collect();
    if missing.is_empty() {
        Ok(value.to_string())
    } else {
        Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: format!("URL template is missing {}", missing.join(", ")),
        })
    }
}

fn parse_positive_secs(section: &str, key: &str, value: &str) -> Result<u64, ConfigFileError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be a positive integer (seconds)".to_string(),
        }),
    }
}

fn zoom_error(value: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: "sources".to_string(),
        key: "elevation_max_zoom".to_string(),
        value: value.to_string(),
        reason: format!("must be an integer between 0 and {}", MAX_ZOOM),
    }
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, content).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_overlay_sources() {
        let config = load(
            r#"
[sources]
topo = https://tiles.example.com/topo/{z}/{x}/{y}.png
elevation_max_zoom = 12
mapbox_access_token = pk.abc
"#,
        )
        .unwrap();

        assert_eq!(
            config.sources.topo,
            "https://tiles.example.com/topo/{z}/{x}/{y}.png"
        );
        assert_eq!(config.sources.slope, DEFAULT_SLOPE_URL);
        assert_eq!(config.sources.elevation_max_zoom, 12);
        assert_eq!(config.sources.mapbox_access_token.as_deref(), Some("pk.abc"));
    }

    #[test]
    fn test_template_without_placeholders_rejected() {
        let err = load("[sources]\nslope = https://tiles.example.com/static.png\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("sources.slope"));
        assert!(msg.contains("{z}"));
    }

    #[test]
    fn test_elevation_max_zoom_range() {
        assert!(load("[sources]\nelevation_max_zoom = 23\n").is_err());
        assert!(load("[sources]\nelevation_max_zoom = high\n").is_err());
    }

    #[test]
    fn test_fetch_section() {
        let config = load("[fetch]\ntimeout = 30\nretry_after = 10\n").unwrap();
        assert_eq!(config.fetch.timeout, 30);
        assert_eq!(config.fetch.retry_after, 10);

        assert!(load("[fetch]\ntimeout = 0\n").is_err());
        assert!(load("[fetch]\ntimeout = soon\n").is_err());
    }

    #[test]
    fn test_cache_section() {
        let config = load("[cache]\nmemory_size = 64MB\nttl = 3600\n").unwrap();
        assert_eq!(config.cache.memory_size, 64 * 1024 * 1024);
        assert_eq!(config.cache.ttl, Some(3600));

        let config = load("[cache]\nttl = 0\n").unwrap();
        assert_eq!(config.cache.ttl, None);
        assert_eq!(config.cache.memory_size, DEFAULT_MEMORY_CACHE_SIZE);
    }

    #[test]
    fn test_invalid_cache_size() {
        let err = load("[cache]\nmemory_size = 2TB\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref key, .. } if key == "memory_size"
        ));
    }

    #[test]
    fn test_logging_section() {
        let config = load("[logging]\ndirectory = /var/log/slopetile\nfile = tiles.log\n").unwrap();
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/slopetile"));
        assert_eq!(config.logging.file, "tiles.log");
    }

    #[test]
    fn test_expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/tmp/logs"), PathBuf::from("/tmp/logs"));
    }
}
