//! Human-readable size parsing (e.g., "256MB", "1GB").

use std::fmt;
use thiserror::Error;

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '1GB', '256MB', or '1024KB'")]
pub struct SizeParseError {
    input: String,
}

impl SizeParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

/// Parse a human-readable size string into bytes.
///
/// Bare numbers are bytes. `K`/`KB`, `M`/`MB` and `G`/`GB` suffixes are binary
/// multiples, matched case-insensitively with optional whitespace.
///
/// # Examples
///
/// ```
/// use slopetile::config::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1 KB").unwrap(), 1024);
/// assert_eq!(parse_size("256mb").unwrap(), 256 * 1024 * 1024);
/// ```
pub fn parse_size(s: &str) -> Result<usize, SizeParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(SizeParseError::new(s));
    }

    let upper = s.to_uppercase();
    let digits_end = upper
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(upper.len());
    let (num_str, suffix) = upper.split_at(digits_end);

    let multiplier = match suffix.trim() {
        "" => 1,
        "K" | "KB" => KB,
        "M" | "MB" => MB,
        "G" | "GB" => GB,
        _ => return Err(SizeParseError::new(s)),
    };

    let num: usize = num_str.parse().map_err(|_| SizeParseError::new(s))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| SizeParseError::new(s))
}

/// Format a byte count using the largest exact binary suffix.
///
/// ```
/// use slopetile::config::format_size;
///
/// assert_eq!(format_size(256 * 1024 * 1024), "256MB");
/// assert_eq!(format_size(1500), "1500");
/// ```
pub fn format_size(bytes: usize) -> String {
    if bytes >= GB && bytes % GB == 0 {
        format!("{}GB", bytes / GB)
    } else if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        bytes.to_string()
    }
}

/// A byte count that parses from and displays as a human-readable size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size(pub usize);

impl Size {
    pub fn bytes(self) -> usize {
        self.0
    }

    pub fn from_mb(mb: usize) -> Self {
        Self(mb * MB)
    }
}

impl std::str::FromStr for Size {
    type Err = SizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_size(s).map(Size)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_size(self.0))
    }
}
