//! Runtime errors

use frsh_dom::DomError;
use frsh_html::ParseError;
use frsh_net::NetError;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Runtime error
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("network error: {0}")]
    Net(#[from] NetError),

    #[error("HTML error: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("render failed: {0}")]
    Render(String),
}
