//! Tilespec parsing.
//!
//! A tilespec names an ordered stack of layers, base layer first:
//!
//! ```text
//! topo~slope_a_64~contour
//! └┬─┘ └────┬───┘ └──┬──┘
//!  │   name + key/value pairs
//!  └── layers separated by `~`, tokens by `_`
//! ```

use std::fmt;
use thiserror::Error;

/// Separates layers.
pub const LAYER_DELIMITER: char = '~';

/// Separates a layer's name and parameter tokens.
pub const TOKEN_DELIMITER: char = '_';

/// Stack served when a client does not name one.
pub const DEFAULT_TILESPEC: &str = "topo~slope_a_64";

/// Errors raised while turning a tilespec into layers.
///
/// All of them are client errors: the request is malformed and retrying it
/// cannot help.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TilespecError {
    #[error("Empty tilespec")]
    Empty,

    #[error("Empty layer segment at position {position}")]
    EmptySegment { position: usize },

    #[error("Unknown layer '{name}' in segment '{segment}'")]
    UnknownLayer { name: String, segment: String },

    #[error("Segment '{segment}' has an odd number of parameter tokens")]
    MalformedParameters { segment: String },

    #[error("Invalid parameter {key}={value} in segment '{segment}': {reason}")]
    InvalidParameter {
        segment: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// One parsed layer segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDescriptor {
    /// Registry name
    pub name: String,
    /// Parameters in the order given
    pub params: Vec<(String, String)>,
    /// The raw segment, for error messages
    pub segment: String,
}

impl LayerDescriptor {
    /// Parses one `name_key_value...` segment.
    pub fn parse(segment: &str) -> Result<Self, TilespecError> {
        let mut tokens = segment.split(TOKEN_DELIMITER);
        let name = tokens.next().unwrap_or_default();
        let rest: Vec<&str> = tokens.collect();

        if rest.len() % 2 != 0 {
            return Err(TilespecError::MalformedParameters {
                segment: segment.to_string(),
            });
        }

        let params = rest
            .chunks_exact(2)
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect();

        Ok(Self {
            name: name.to_string(),
            params,
            segment: segment.to_string(),
        })
    }

    /// Builds the error for a rejected parameter.
    pub fn invalid(&self, key: &str, value: &str, reason: impl Into<String>) -> TilespecError {
        TilespecError::InvalidParameter {
            segment: self.segment.clone(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for LayerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segment)
    }
}

/// Splits a tilespec into layer descriptors, base layer first.
///
/// Only the syntax is checked here; layer names and parameter values are
/// validated by the [`LayerRegistry`](crate::layer::LayerRegistry).
///
/// # Example
///
/// ```
/// use slopetile::tilespec::parse;
///
/// let layers = parse("topo~slope_a_64").unwrap();
/// assert_eq!(layers.len(), 2);
/// assert_eq!(layers[1].name, "slope");
/// assert_eq!(layers[1].params, vec![("a".to_string(), "64".to_string())]);
/// ```
pub fn parse(tilespec: &str) -> Result<Vec<LayerDescriptor>, TilespecError> {
    if tilespec.is_empty() {
        return Err(TilespecError::Empty);
    }

    tilespec
        .split(LAYER_DELIMITER)
        .enumerate()
        .map(|(position, segment)| {
            if segment.is_empty() {
                Err(TilespecError::EmptySegment { position })
            } else {
                LayerDescriptor::parse(segment)
            }
        })
        .collect()
}
