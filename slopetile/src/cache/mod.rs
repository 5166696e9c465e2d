//! Payload cache for upstream tiles.
//!
//! The batch fetcher consults a [`TileCache`] before going to the network
//! and stores every freshly fetched payload in it.

mod memory;
mod r#trait;
mod types;

pub use memory::MemoryCache;
pub use r#trait::{NoOpCache, TileCache};
pub use types::{CacheError, CacheStats};
