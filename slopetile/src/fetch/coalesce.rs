//! Request coalescing for upstream fetches.
//!
//! When several batches need the same URL at the same time, only one network
//! request runs - every other waiter receives the same result.
//!
//! # Architecture
//!
//! ```text
//! Batch A ─┐
//!          │                          Network
//! Batch B ─┼──► UrlCoalescer ───────► fetch
//!          │        │                   │
//! Batch C ─┘        │                   │
//!                   ▼                   ▼
//!             [A, B, C all          [One request]
//!              receive same             │
//!              result]◄─────────────────┘
//! ```
//!
//! # Implementation
//!
//! Uses a `HashMap<String, broadcast::Sender>` to track in-flight URLs.
//! The first registrant becomes the leader and holds a [`LeaderGuard`]; later
//! registrants subscribe to the leader's channel. If the leader is dropped
//! before completing (its batch failed elsewhere), the guard removes the entry
//! and the closed channel tells waiters to register again.

use super::error::FetchError;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::debug;

/// Outcome shared with every waiter of a coalesced fetch.
pub(crate) type FetchOutcome = Result<Bytes, FetchError>;

/// Tracks in-flight fetches for request coalescing.
pub struct UrlCoalescer {
    in_flight: Mutex<HashMap<String, broadcast::Sender<FetchOutcome>>>,
    stats: Mutex<CoalescerStats>,
}

/// Statistics for monitoring coalescing effectiveness.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CoalescerStats {
    /// Total registrations received
    pub total_requests: u64,
    /// Registrations that waited for existing work
    pub coalesced_requests: u64,
    /// Registrations that triggered new work
    pub new_requests: u64,
}

impl CoalescerStats {
    /// Returns the coalescing ratio (0.0 to 1.0)
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }
}

/// Result of registering interest in a URL.
pub(crate) enum Registration<'a> {
    /// No fetch in flight - the caller performs it and completes the guard
    Leader(LeaderGuard<'a>),
    /// Another fetch is in flight - wait on this receiver
    Follower(broadcast::Receiver<FetchOutcome>),
}

impl Registration<'_> {
    #[cfg(test)]
    pub(crate) fn is_leader(&self) -> bool {
        matches!(self, Self::Leader(_))
    }
}

/// Ownership of one in-flight fetch.
pub(crate) struct LeaderGuard<'a> {
    coalescer: &'a UrlCoalescer,
    url: String,
    sender: Option<broadcast::Sender<FetchOutcome>>,
}

impl LeaderGuard<'_> {
    /// Publishes the outcome to all waiters and retires the in-flight entry.
    pub(crate) fn complete(mut self, outcome: &FetchOutcome) {
        self.coalescer.in_flight.lock().remove(&self.url);

        if let Some(tx) = self.sender.take() {
            let waiters = tx.receiver_count();
            // Receivers may have been dropped; nothing to do then.
            let _ = tx.send(outcome.clone());
            if waiters > 0 {
                debug!(url = %self.url, waiters, "Broadcast fetch result to coalesced waiters");
            }
        }
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if self.sender.is_some() {
            debug!(url = %self.url, "In-flight fetch abandoned");
            self.coalescer.in_flight.lock().remove(&self.url);
        }
    }
}

impl UrlCoalescer {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
            stats: Mutex::new(CoalescerStats::default()),
        }
    }

    /// Registers interest in a URL.
    pub(crate) fn register(&self, url: &str) -> Registration<'_> {
        let mut in_flight = self.in_flight.lock();
        let mut stats = self.stats.lock();
        stats.total_requests += 1;

        if let Some(tx) = in_flight.get(url) {
            stats.coalesced_requests += 1;
            debug!(url, "Coalescing fetch - waiting for in-flight request");
            return Registration::Follower(tx.subscribe());
        }

        // One message is ever sent per channel.
        let (tx, _rx) = broadcast::channel(1);
        in_flight.insert(url.to_string(), tx.clone());
        stats.new_requests += 1;

        Registration::Leader(LeaderGuard {
            coalescer: self,
            url: url.to_string(),
            sender: Some(tx),
        })
    }

    pub fn stats(&self) -> CoalescerStats {
        self.stats.lock().clone()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }
}

impl Default for UrlCoalescer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://tiles.example.com/12/654/1583.png";

    #[test]
    fn test_first_request_is_leader() {
        let coalescer = UrlCoalescer::new();
        assert!(coalescer.register(URL).is_leader());
    }

    #[test]
    fn test_second_request_is_coalesced() {
        let coalescer = UrlCoalescer::new();
        let _first = coalescer.register(URL);
        let second = coalescer.register(URL);
        assert!(!second.is_leader());
    }

    #[test]
    fn test_different_urls_not_coalesced() {
        let coalescer = UrlCoalescer::new();
        let _first = coalescer.register(URL);
        assert!(coalescer.register("https://tiles.example.com/other").is_leader());
    }

    #[tokio::test]
    async fn test_follower_receives_leader_result() {
        let coalescer = UrlCoalescer::new();
        let leader = coalescer.register(URL);
        let follower = coalescer.register(URL);

        let Registration::Leader(guard) = leader else {
            panic!("expected leader");
        };
        guard.complete(&Ok(Bytes::from_static(b"tile")));

        let Registration::Follower(mut rx) = follower else {
            panic!("expected follower");
        };
        assert_eq!(rx.recv().await.unwrap(), Ok(Bytes::from_static(b"tile")));
        assert_eq!(coalescer.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_leader_closes_channel() {
        let coalescer = UrlCoalescer::new();
        let leader = coalescer.register(URL);
        let follower = coalescer.register(URL);

        drop(leader);
        assert_eq!(coalescer.in_flight_count(), 0);

        let Registration::Follower(mut rx) = follower else {
            panic!("expected follower");
        };
        assert!(rx.recv().await.is_err());

        // The next registration takes over the fetch.
        assert!(coalescer.register(URL).is_leader());
    }

    #[test]
    fn test_completion_removes_from_in_flight() {
        let coalescer = UrlCoalescer::new();
        if let Registration::Leader(guard) = coalescer.register(URL) {
            assert_eq!(coalescer.in_flight_count(), 1);
            guard.complete(&Ok(Bytes::new()));
        }
        assert_eq!(coalescer.in_flight_count(), 0);
        assert!(coalescer.register(URL).is_leader());
    }

    #[test]
    fn test_stats_tracking() {
        let coalescer = UrlCoalescer::new();
        let _first = coalescer.register(URL);
        let _c1 = coalescer.register(URL);
        let _c2 = coalescer.register(URL);
        let _c3 = coalescer.register(URL);

        let stats = coalescer.stats();
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.new_requests, 1);
        assert_eq!(stats.coalesced_requests, 3);
        assert!((stats.coalescing_ratio() - 0.75).abs() < 0.001);
    }
}
