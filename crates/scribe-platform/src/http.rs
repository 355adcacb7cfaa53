//! HTTP transport over the browser's `fetch()`.
//!
//! Sends the request exactly as the core built it and hands back the raw
//! status and body. Status handling and JSON decoding stay in the core.
//! Uses gloo-net for WASM compatibility.

use async_trait::async_trait;
use futures::future::{self, Either};
use gloo_net::http::Request;
use gloo_timers::future::TimeoutFuture;

use scribe_core::ports::{HttpRequest, HttpResponse, HttpTransport};
use scribe_types::{Result, ScribeError};

/// Upper bound on a single exchange when none is configured
pub const DEFAULT_TIMEOUT_MS: u32 = 120_000;

pub struct FetchTransport {
    timeout_ms: Option<u32>,
}

impl FetchTransport {
    pub fn new() -> Self {
        Self {
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
        }
    }

    /// `None` waits for the server indefinitely.
    pub fn with_timeout(timeout_ms: Option<u32>) -> Self {
        Self { timeout_ms }
    }

    pub fn timeout_ms(&self) -> Option<u32> {
        self.timeout_ms
    }
}

impl Default for FetchTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl HttpTransport for FetchTransport {
    async fn post(&self, req: &HttpRequest) -> Result<HttpResponse> {
        let Some(ms) = self.timeout_ms else {
            return send(req).await;
        };

        let request = Box::pin(send(req));
        let deadline = Box::pin(TimeoutFuture::new(ms));
        match future::select(request, deadline).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => {
                log::warn!("Request to {} timed out after {}ms", host_of(&req.url), ms);
                Err(ScribeError::Timeout(u64::from(ms)))
            }
        }
    }
}

async fn send(req: &HttpRequest) -> Result<HttpResponse> {
    let mut builder = Request::post(&req.url);
    for (name, value) in &req.headers {
        builder = builder.header(name, value);
    }

    let response = builder
        .body(req.body.clone())
        .map_err(|e| ScribeError::Network(e.to_string()))?
        .send()
        .await
        .map_err(|e| ScribeError::Network(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ScribeError::Network(e.to_string()))?;

    log::debug!("{} answered {} ({} bytes)", host_of(&req.url), status, body.len());
    Ok(HttpResponse { status, body })
}

/// Scheme and host only, so API keys in query strings stay out of the log
fn host_of(url: &str) -> &str {
    let after_scheme = url.find("://").map(|i| i + 3).unwrap_or(0);
    let end = url[after_scheme..]
        .find(|c| c == '/' || c == '?')
        .map(|i| after_scheme + i)
        .unwrap_or(url.len());
    &url[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_of_strips_path_and_key() {
        assert_eq!(
            host_of("https://generativelanguage.googleapis.com/v1beta/models/x:generateContent?key=secret"),
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(host_of("https://api.example.com?key=k"), "https://api.example.com");
        assert_eq!(host_of("localhost:8080"), "localhost:8080");
    }

    #[test]
    fn default_timeout() {
        assert_eq!(FetchTransport::new().timeout_ms(), Some(DEFAULT_TIMEOUT_MS));
        assert_eq!(FetchTransport::with_timeout(None).timeout_ms(), None);
    }
}
