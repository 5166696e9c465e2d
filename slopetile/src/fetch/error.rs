//! Fetch error types.

use crate::provider::ProviderError;
use thiserror::Error;

/// A required upstream resource could not be obtained.
///
/// Batches are all-or-nothing, so one failing URL fails the whole batch.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Non-200 answer or transport failure
    #[error("Upstream fetch failed: {0}")]
    Upstream(#[from] ProviderError),

    /// The per-request deadline elapsed before the payload arrived
    #[error("Fetching {url} exceeded the {timeout_secs}s deadline")]
    Timeout { url: String, timeout_secs: u64 },

    /// A requested key was not resolved by the batch
    #[error("Batch did not resolve {url}")]
    Incomplete { url: String },
}

impl FetchError {
    /// Whether the failure was a deadline, on either side of the client.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout { .. } | FetchError::Upstream(ProviderError::Timeout { .. })
        )
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Upstream(e) => e.url(),
            FetchError::Timeout { url, .. } | FetchError::Incomplete { url } => Some(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_timeout() {
        let deadline = FetchError::Timeout {
            url: "u".to_string(),
            timeout_secs: 15,
        };
        let client = FetchError::Upstream(ProviderError::Timeout {
            url: "u".to_string(),
        });
        let status = FetchError::Upstream(ProviderError::HttpStatus {
            url: "u".to_string(),
            status: 500,
        });

        assert!(deadline.is_timeout());
        assert!(client.is_timeout());
        assert!(!status.is_timeout());
    }

    #[test]
    fn test_display_names_the_url() {
        let err = FetchError::Timeout {
            url: "https://example.com/1/0/0.png".to_string(),
            timeout_secs: 15,
        };
        assert_eq!(
            err.to_string(),
            "Fetching https://example.com/1/0/0.png exceeded the 15s deadline"
        );
        assert_eq!(err.url(), Some("https://example.com/1/0/0.png"));
    }
}
