//! Requests
//!
//! Request description handed to a `Fetch` implementation. Partial
//! navigation only ever issues GETs.

use std::collections::HashMap;

/// Request configuration
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub url: String,
    pub headers: HashMap<String, String>,
}

impl Request {
    pub fn get(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }
}
