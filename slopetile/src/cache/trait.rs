//! Cache trait definition for dependency injection.

use super::types::{CacheError, CacheStats};
use bytes::Bytes;
use std::collections::HashMap;

/// Key-value store for upstream tile payloads, keyed by URL.
///
/// Payloads for a URL are immutable, so concurrent writers of the same key
/// are idempotent and last-writer-wins is acceptable.
///
/// # Example
///
/// ```
/// use slopetile::cache::{MemoryCache, TileCache};
/// use bytes::Bytes;
///
/// let cache = MemoryCache::new(1024 * 1024);
/// cache.set("https://tiles.example.com/1/0/0.png", Bytes::from_static(b"png")).unwrap();
/// assert!(cache.get("https://tiles.example.com/1/0/0.png").is_some());
/// ```
pub trait TileCache: Send + Sync {
    /// Get cached data for the given key.
    fn get(&self, key: &str) -> Option<Bytes>;

    /// Look up several keys at once, returning only the hits.
    fn get_many(&self, keys: &[String]) -> HashMap<String, Bytes> {
        keys.iter()
            .filter_map(|key| self.get(key).map(|data| (key.clone(), data)))
            .collect()
    }

    /// Store data in the cache.
    fn set(&self, key: &str, data: Bytes) -> Result<(), CacheError>;

    /// Store several entries.
    ///
    /// A failing entry does not stop the rest; the first failure is returned
    /// once every entry has been tried.
    fn set_many(&self, entries: &HashMap<String, Bytes>) -> Result<(), CacheError> {
        let mut first_error = None;
        for (key, data) in entries {
            if let Err(e) = self.set(key, data.clone()) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Snapshot of the cache statistics.
    fn stats(&self) -> CacheStats;
}

/// No-op cache implementation that never caches.
///
/// Every lookup misses and every write is discarded. Useful when the
/// compositor runs behind an external tile cache.
#[derive(Debug, Clone, Default)]
pub struct NoOpCache;

impl NoOpCache {
    pub fn new() -> Self {
        Self
    }
}

impl TileCache for NoOpCache {
    fn get(&self, _key: &str) -> Option<Bytes> {
        None
    }

    fn set(&self, _key: &str, _data: Bytes) -> Result<(), CacheError> {
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_cache_always_misses() {
        let cache = NoOpCache::new();
        cache.set("a", Bytes::from_static(b"data")).unwrap();
        assert_eq!(cache.get("a"), None);
        assert!(cache.get_many(&["a".to_string()]).is_empty());
    }

    #[test]
    fn test_noop_cache_as_trait_object() {
        let cache: Box<dyn TileCache> = Box::new(NoOpCache::new());
        let mut entries = HashMap::new();
        entries.insert("k".to_string(), Bytes::from_static(b"v"));
        assert!(cache.set_many(&entries).is_ok());
        assert_eq!(cache.stats(), CacheStats::new());
    }

    #[test]
    fn test_noop_cache_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoOpCache>();
    }
}
