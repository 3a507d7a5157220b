//! Fetch API
//!
//! `fetch()`-style access to responses, behind a trait so navigation can be
//! driven by a real HTTP client or by a stub.

use crate::{NetError, Request, Response};
use std::future::Future;

/// Something that can resolve a request into a response.
///
/// Futures returned here are driven on the page's single thread; they do
/// not need to be `Send`.
pub trait Fetch {
    fn fetch(&self, request: Request) -> impl Future<Output = Result<FetchResponse, NetError>>;
}

/// Fetch response with convenience methods
#[derive(Debug, Clone)]
pub struct FetchResponse {
    inner: Response,
}

impl FetchResponse {
    /// Build a response from parts
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: Response { status, headers, body: body.into() },
        }
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.inner.status
    }

    /// Check if response is OK (2xx)
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.inner.status)
    }

    /// Get header value (case-insensitive name)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get all headers
    pub fn headers(&self) -> &[(String, String)] {
        &self.inner.headers
    }

    /// Get body as text
    pub fn text(&self) -> Result<&str, NetError> {
        std::str::from_utf8(&self.inner.body)
            .map_err(|e| NetError::Body(e.to_string()))
    }

    /// Get raw body bytes
    pub fn bytes(&self) -> &[u8] {
        &self.inner.body
    }
}

impl From<Response> for FetchResponse {
    fn from(inner: Response) -> Self {
        Self { inner }
    }
}

/// HTTP fetcher backed by reqwest's blocking client.
///
/// Requests are moved onto smol's blocking pool, so awaiting a fetch never
/// stalls the page thread.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self, NetError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| NetError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, request: Request) -> Result<FetchResponse, NetError> {
        tracing::info!("HTTP GET {}", request.url);
        let client = self.client.clone();
        smol::unblock(move || send_blocking(&client, request)).await
    }
}

fn send_blocking(client: &reqwest::blocking::Client, request: Request) -> Result<FetchResponse, NetError> {
    let url = reqwest::Url::parse(&request.url)
        .map_err(|e| NetError::InvalidUrl(format!("{}: {}", request.url, e)))?;

    let mut builder = client.get(url);
    for (key, value) in &request.headers {
        builder = builder.header(key, value);
    }

    let response = builder.send().map_err(|e| NetError::Network(e.to_string()))?;
    let status = response.status().as_u16();
    let headers = response.headers()
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();
    let body = response.bytes().map_err(|e| NetError::Body(e.to_string()))?.to_vec();

    tracing::debug!("HTTP {} -> {} ({} bytes)", request.url, status, body.len());
    Ok(FetchResponse::new(status, headers, body))
}
