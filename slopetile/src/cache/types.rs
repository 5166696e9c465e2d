//! Cache error and statistics types.

use thiserror::Error;

/// Errors raised by cache backends.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The entry alone is larger than the cache can ever hold
    #[error("Entry of {size} bytes exceeds cache capacity of {capacity} bytes")]
    EntryTooLarge { size: usize, capacity: usize },

    /// Backend-specific failure
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub evictions: u64,
    pub size_bytes: usize,
    pub entry_count: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of lookups served from the cache (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
