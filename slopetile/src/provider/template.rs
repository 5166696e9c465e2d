//! Upstream URL templates.
//!
//! Templates carry `{z}`, `{x}` and `{y}` placeholders, in any order:
//!
//! ```
//! use slopetile::provider::UrlTemplate;
//!
//! let template = UrlTemplate::new("https://tiles.example.com/{z}/{x}/{y}.png");
//! assert_eq!(template.expand(12, 654, 1583), "https://tiles.example.com/12/654/1583.png");
//! ```

use crate::coord::TileCoord;
use std::fmt;

/// A tile URL pattern for one upstream source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
}

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Substitutes the tile coordinates into the template.
    pub fn expand(&self, zoom: u8, x: u32, y: u32) -> String {
        self.template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }

    /// Expands the template for a slippy-map tile.
    pub fn for_tile(&self, tile: TileCoord) -> String {
        self.expand(tile.zoom, tile.x, tile.y)
    }

    /// Replaces a named placeholder such as `{token}` ahead of expansion.
    pub fn with_placeholder(&self, name: &str, value: &str) -> Self {
        Self {
            template: self.template.replace(&format!("{{{}}}", name), value),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
