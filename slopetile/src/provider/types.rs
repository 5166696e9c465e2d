//! Provider types

use std::fmt;

/// Errors that can occur while talking to an upstream tile server.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The server answered with anything other than HTTP 200
    HttpStatus { url: String, status: u16 },
    /// Connection, TLS or body transfer failed
    Transport { url: String, message: String },
    /// The client-side request timeout elapsed
    Timeout { url: String },
    /// The HTTP client could not be constructed
    ClientSetup(String),
}

impl ProviderError {
    /// The URL this error refers to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            ProviderError::HttpStatus { url, .. }
            | ProviderError::Transport { url, .. }
            | ProviderError::Timeout { url } => Some(url),
            ProviderError::ClientSetup(_) => None,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpStatus { url, status } => {
                write!(f, "HTTP {} from {}", status, url)
            }
            ProviderError::Transport { url, message } => {
                write!(f, "Request to {} failed: {}", url, message)
            }
            ProviderError::Timeout { url } => write!(f, "Request to {} timed out", url),
            ProviderError::ClientSetup(msg) => write!(f, "Failed to create HTTP client: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}
