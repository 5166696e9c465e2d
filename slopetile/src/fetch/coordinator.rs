//! Batched fetch/cache coordinator.
//!
//! Resolves a batch of URLs to payloads: duplicates collapse to one request,
//! the cache is consulted first, misses are fetched concurrently under a
//! per-request deadline, and fresh payloads are written back to the cache.
//! A batch either resolves every URL or fails as a whole.

use super::coalesce::{Registration, UrlCoalescer};
use super::error::FetchError;
use crate::cache::TileCache;
use crate::config::FetchConfig;
use crate::provider::AsyncHttpClient;
use bytes::Bytes;
use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Snapshot of fetcher activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Distinct URLs served from the cache
    pub cache_hits: u64,
    /// Distinct URLs not found in the cache
    pub cache_misses: u64,
    /// Requests actually sent upstream
    pub network_fetches: u64,
    /// Misses that waited on another batch's in-flight request
    pub coalesced: u64,
}

/// Fetches batches of upstream tiles through a shared cache.
pub struct BatchFetcher<C: AsyncHttpClient> {
    client: C,
    cache: Arc<dyn TileCache>,
    coalescer: UrlCoalescer,
    config: FetchConfig,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    network_fetches: AtomicU64,
    coalesced: AtomicU64,
}

impl<C: AsyncHttpClient> BatchFetcher<C> {
    pub fn new(client: C, cache: Arc<dyn TileCache>, config: FetchConfig) -> Self {
        Self {
            client,
            cache,
            coalescer: UrlCoalescer::new(),
            config,
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            network_fetches: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Retrieves one payload per URL, in the caller's order.
    ///
    /// Repeated URLs resolve to the same payload and are requested once.
    ///
    /// # Errors
    ///
    /// Fails with the first upstream failure; no partial result is returned.
    pub async fn retrieve(&self, urls: &[String]) -> Result<Vec<Bytes>, FetchError> {
        let resolved = self.retrieve_map(urls).await?;
        urls.iter()
            .map(|url| {
                resolved
                    .get(url)
                    .cloned()
                    .ok_or_else(|| FetchError::Incomplete { url: url.clone() })
            })
            .collect()
    }

    /// Retrieves the batch as a URL → payload map with one entry per distinct URL.
    pub async fn retrieve_map(
        &self,
        urls: &[String],
    ) -> Result<HashMap<String, Bytes>, FetchError> {
        let distinct = dedupe(urls);
        if distinct.is_empty() {
            return Ok(HashMap::new());
        }

        let mut resolved = self.cache.get_many(&distinct);
        let misses: Vec<&String> = distinct
            .iter()
            .filter(|url| !resolved.contains_key(*url))
            .collect();

        self.cache_hits
            .fetch_add(resolved.len() as u64, Ordering::Relaxed);
        self.cache_misses
            .fetch_add(misses.len() as u64, Ordering::Relaxed);
        debug!(
            requested = urls.len(),
            distinct = distinct.len(),
            cached = resolved.len(),
            missing = misses.len(),
            "Resolving fetch batch"
        );

        if misses.is_empty() {
            return Ok(resolved);
        }

        let payloads = try_join_all(misses.iter().map(|url| self.fetch_one(url))).await?;
        let fresh: HashMap<String, Bytes> = misses.into_iter().cloned().zip(payloads).collect();

        if let Err(e) = self.cache.set_many(&fresh) {
            warn!(error = %e, entries = fresh.len(), "Failed to store fetched tiles in cache");
        }

        resolved.extend(fresh);
        Ok(resolved)
    }

    pub fn stats(&self) -> FetchStats {
        FetchStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            network_fetches: self.network_fetches.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
        }
    }

    /// Fetches one URL, sharing the request with any concurrent batch.
    async fn fetch_one(&self, url: &str) -> Result<Bytes, FetchError> {
        loop {
            match self.coalescer.register(url) {
                Registration::Leader(guard) => {
                    let outcome = self.fetch_network(url).await;
                    guard.complete(&outcome);
                    return outcome;
                }
                Registration::Follower(mut rx) => {
                    self.coalesced.fetch_add(1, Ordering::Relaxed);
                    match rx.recv().await {
                        Ok(outcome) => return outcome,
                        // Leader abandoned the fetch; take it over.
                        Err(_) => debug!(url, "Coalesced fetch abandoned, retrying"),
                    }
                }
            }
        }
    }

    async fn fetch_network(&self, url: &str) -> Result<Bytes, FetchError> {
        self.network_fetches.fetch_add(1, Ordering::Relaxed);

        match tokio::time::timeout(self.config.timeout(), self.client.get(url)).await {
            Ok(Ok(bytes)) => {
                debug!(url, bytes = bytes.len(), "Fetched upstream tile");
                Ok(bytes)
            }
            Ok(Err(e)) => {
                warn!(url, error = %e, "Upstream fetch failed");
                Err(FetchError::Upstream(e))
            }
            Err(_) => {
                warn!(
                    url,
                    timeout_secs = self.config.timeout_secs(),
                    "Upstream fetch timed out"
                );
                Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.config.timeout_secs(),
                })
            }
        }
    }
}

/// Distinct URLs in first-seen order.
fn dedupe(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(urls.len());
    urls.iter()
        .filter(|url| seen.insert(url.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, NoOpCache};
    use crate::provider::{MockAsyncHttpClient, ProviderError};
    use std::time::Duration;

    const A: &str = "https://tiles.example.com/5/10/12.png";
    const B: &str = "https://tiles.example.com/5/11/12.png";
    const C: &str = "https://tiles.example.com/5/12/12.png";

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|u| u.to_string()).collect()
    }

    fn mock() -> MockAsyncHttpClient {
        MockAsyncHttpClient::default()
            .with_response(A, Ok(Bytes::from_static(b"a")))
            .with_response(B, Ok(Bytes::from_static(b"b")))
            .with_response(C, Ok(Bytes::from_static(b"c")))
    }

    fn fetcher(
        client: MockAsyncHttpClient,
        cache: Arc<dyn TileCache>,
    ) -> BatchFetcher<MockAsyncHttpClient> {
        BatchFetcher::new(client, cache, FetchConfig::default())
    }

    #[test]
    fn test_dedupe_keeps_first_seen_order() {
        assert_eq!(dedupe(&urls(&[B, A, B, C, A])), urls(&[B, A, C]));
    }

    #[tokio::test]
    async fn test_results_follow_request_order() {
        let fetcher = fetcher(mock(), Arc::new(NoOpCache::new()));

        let result = fetcher.retrieve(&urls(&[C, A, B])).await.unwrap();
        assert_eq!(
            result,
            vec![
                Bytes::from_static(b"c"),
                Bytes::from_static(b"a"),
                Bytes::from_static(b"b"),
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_url_fetched_once() {
        let client = mock();
        let fetcher = fetcher(client.clone(), Arc::new(NoOpCache::new()));

        let result = fetcher.retrieve(&urls(&[A, B, A])).await.unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result[0], result[2]);
        assert_eq!(client.calls_for(A), 1);
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_one_failure_fails_batch() {
        let client = mock().with_response(
            B,
            Err(ProviderError::HttpStatus {
                url: B.to_string(),
                status: 500,
            }),
        );
        let fetcher = fetcher(client, Arc::new(NoOpCache::new()));

        let err = fetcher.retrieve(&urls(&[A, B, C])).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Upstream(ProviderError::HttpStatus {
                url: B.to_string(),
                status: 500
            })
        );
        assert!(!err.is_timeout());
    }

    #[tokio::test]
    async fn test_failed_batch_caches_nothing() {
        let cache = Arc::new(MemoryCache::new(1024 * 1024));
        let client = mock().with_response(
            B,
            Err(ProviderError::Transport {
                url: B.to_string(),
                message: "connection reset".to_string(),
            }),
        );
        let fetcher = fetcher(client, cache.clone());

        assert!(fetcher.retrieve(&urls(&[A, B])).await.is_err());
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_hits_skip_network() {
        let cache = Arc::new(MemoryCache::new(1024 * 1024));
        cache.set(A, Bytes::from_static(b"cached-a")).unwrap();

        let client = mock();
        let fetcher = fetcher(client.clone(), cache.clone());

        let result = fetcher.retrieve(&urls(&[A, B])).await.unwrap();

        assert_eq!(result[0], Bytes::from_static(b"cached-a"));
        assert_eq!(result[1], Bytes::from_static(b"b"));
        assert_eq!(client.calls_for(A), 0);
        assert!(cache.contains(B));

        // Second batch is served entirely from cache.
        fetcher.retrieve(&urls(&[A, B])).await.unwrap();
        assert_eq!(client.call_count(), 1);

        let stats = fetcher.stats();
        assert_eq!(stats.cache_hits, 3);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.network_fetches, 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let client = mock();
        let fetcher = fetcher(client.clone(), Arc::new(NoOpCache::new()));

        assert!(fetcher.retrieve(&[]).await.unwrap().is_empty());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_upstream_times_out() {
        let client = mock().with_delay_for(B, Duration::from_secs(60));
        let fetcher = BatchFetcher::new(
            client,
            Arc::new(NoOpCache::new()),
            FetchConfig::new().with_timeout_secs(5),
        );

        let err = fetcher.retrieve(&urls(&[A, B])).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Timeout {
                url: B.to_string(),
                timeout_secs: 5
            }
        );
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_batches_share_requests() {
        let client = mock().with_delay(Duration::from_millis(100));
        let fetcher = fetcher(client.clone(), Arc::new(NoOpCache::new()));

        let first = urls(&[A, B]);
        let second = urls(&[B, C]);
        let (r1, r2) = tokio::join!(fetcher.retrieve(&first), fetcher.retrieve(&second));

        assert_eq!(r1.unwrap()[1], Bytes::from_static(b"b"));
        assert_eq!(r2.unwrap()[0], Bytes::from_static(b"b"));
        assert_eq!(client.calls_for(B), 1);
        assert_eq!(fetcher.stats().coalesced, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_fetch_is_taken_over() {
        // The first batch leads on B, then fails fast on A and drops B.
        let client = mock()
            .with_response(
                A,
                Err(ProviderError::HttpStatus {
                    url: A.to_string(),
                    status: 404,
                }),
            )
            .with_delay_for(A, Duration::from_millis(10))
            .with_delay_for(B, Duration::from_millis(100));
        let fetcher = fetcher(client.clone(), Arc::new(NoOpCache::new()));

        let failing = urls(&[B, A]);
        let surviving = urls(&[B]);
        let (r1, r2) = tokio::join!(fetcher.retrieve(&failing), fetcher.retrieve(&surviving));

        assert!(r1.is_err());
        assert_eq!(r2.unwrap(), vec![Bytes::from_static(b"b")]);
        assert_eq!(client.calls_for(B), 2);
    }
}
