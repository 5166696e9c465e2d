//! In-memory cache with LRU eviction and optional expiry.

use super::r#trait::TileCache;
use super::types::{CacheError, CacheStats};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Entry in the memory cache.
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Bytes,
    last_accessed: Instant,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(data: Bytes, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            data,
            last_accessed: now,
            expires_at: ttl.map(|ttl| now + ttl),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    size_bytes: usize,
    stats: CacheStats,
}

impl Inner {
    fn remove(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.size_bytes = self.size_bytes.saturating_sub(entry.data.len());
        }
    }

    /// Evict least recently used entries until `incoming` more bytes fit.
    fn evict_for(&mut self, incoming: usize, max_size_bytes: usize) -> u64 {
        if self.size_bytes + incoming <= max_size_bytes {
            return 0;
        }
        let target = max_size_bytes.saturating_sub(incoming);

        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.last_accessed))
            .collect();
        by_age.sort_by_key(|(_, accessed)| *accessed);

        let mut evicted = 0;
        for (key, _) in by_age {
            if self.size_bytes <= target {
                break;
            }
            self.remove(&key);
            evicted += 1;
        }
        evicted
    }
}

/// In-memory payload cache.
///
/// Bounded by total payload bytes; the least recently used entries are
/// evicted first. Entries never expire unless a TTL is configured.
pub struct MemoryCache {
    inner: Mutex<Inner>,
    max_size_bytes: usize,
    ttl: Option<Duration>,
}

impl MemoryCache {
    /// Create a new memory cache with the given size limit.
    pub fn new(max_size_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_size_bytes,
            ttl: None,
        }
    }

    /// Expire entries `ttl` after they were stored. `None` keeps them forever.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn max_size_bytes(&self) -> usize {
        self.max_size_bytes
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn entry_count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn size_bytes(&self) -> usize {
        self.inner.lock().size_bytes
    }

    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Clear all entries from the cache.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.size_bytes = 0;
    }
}

impl TileCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get_mut(key) {
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => {
                entry.last_accessed = now;
                let data = entry.data.clone();
                inner.stats.hits += 1;
                return Some(data);
            }
            None => false,
        };

        if expired {
            inner.remove(key);
            inner.stats.expired += 1;
        }
        inner.stats.misses += 1;
        None
    }

    fn set(&self, key: &str, data: Bytes) -> Result<(), CacheError> {
        let size = data.len();
        if size > self.max_size_bytes {
            return Err(CacheError::EntryTooLarge {
                size,
                capacity: self.max_size_bytes,
            });
        }

        let mut inner = self.inner.lock();
        inner.remove(key);

        let evicted = inner.evict_for(size, self.max_size_bytes);
        if evicted > 0 {
            inner.stats.evictions += evicted;
            debug!(evicted, size_bytes = inner.size_bytes, "Memory cache eviction");
        }

        inner
            .entries
            .insert(key.to_string(), CacheEntry::new(data, self.ttl));
        inner.size_bytes += size;
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            size_bytes: inner.size_bytes,
            entry_count: inner.entries.len(),
            ..inner.stats.clone()
        }
    }
}
