//! Batched upstream fetching.
//!
//! [`BatchFetcher`] turns the union of every layer's resource URLs into a
//! URL → bytes mapping, all-or-nothing, with cache lookups, per-request
//! deadlines and coalescing of identical in-flight requests.

mod coalesce;
mod coordinator;
mod error;

pub use coalesce::{CoalescerStats, UrlCoalescer};
pub use coordinator::{BatchFetcher, FetchStats};
pub use error::FetchError;
