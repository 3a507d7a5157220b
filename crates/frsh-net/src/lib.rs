//! frsh Networking
//!
//! Request/response types and the `Fetch` seam used by partial
//! navigation. `HttpFetcher` performs real requests; tests plug in their
//! own `Fetch` implementations.

mod loader;
mod fetch;

pub use loader::Request;
pub use fetch::{Fetch, FetchResponse, HttpFetcher};
pub use url::Url;

/// HTTP Response
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Network error
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response body: {0}")]
    Body(String),
}
