//! Runtime Configuration

use crate::RuntimeResult;
use serde::Deserialize;

/// Runtime configuration options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Keep marker comments in the DOM instead of hiding them (debugging)
    pub keep_comments: bool,

    /// Anchor attribute naming the partial-fetch URL
    pub partial_attribute: String,

    /// Query parameter flagging a request as a partial request
    pub partial_query_param: String,

    /// The only content type accepted for partial responses
    pub fragment_content_type: String,

    /// User agent for partial fetches
    pub user_agent: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            keep_comments: false,
            partial_attribute: "fh-partial".to_string(),
            partial_query_param: "fresh-partial".to_string(),
            fragment_content_type: "text/html; charset=utf-8".to_string(),
            user_agent: format!("frsh-runtime/{}", crate::VERSION),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> RuntimeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
