//! Upstream tile source abstraction
//!
//! Provides the HTTP client seam used by the batch fetcher and the URL
//! templates that map a tile coordinate to an upstream resource.

mod http;
mod template;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use template::UrlTemplate;
pub use types::ProviderError;

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
