//! Batch fetch configuration.

use super::defaults::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_RETRY_AFTER_SECS};
use std::time::Duration;

/// Configuration for the batch fetch coordinator.
///
/// # Example
///
/// ```
/// use slopetile::config::FetchConfig;
///
/// let config = FetchConfig::default();
/// assert_eq!(config.timeout_secs(), 15);
/// assert_eq!(config.retry_after_secs(), 6);
///
/// let config = FetchConfig::new().with_timeout_secs(30);
/// assert_eq!(config.timeout_secs(), 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    /// Deadline for every upstream request (in seconds)
    timeout_secs: u64,
    /// Backoff suggested to clients after an upstream timeout (in seconds)
    retry_after_secs: u64,
}

impl FetchConfig {
    /// Create a new fetch configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-request deadline in seconds. Default: 15 seconds.
    pub fn with_timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = timeout;
        self
    }

    /// Set the retry-after hint in seconds. Default: 6 seconds.
    pub fn with_retry_after_secs(mut self, retry_after: u64) -> Self {
        self.retry_after_secs = retry_after;
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.retry_after_secs
    }

    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.retry_after_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
        }
    }
}
