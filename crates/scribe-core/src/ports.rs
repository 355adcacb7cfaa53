//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `scribe-core` (pure Rust).
//! Implementations live in `scribe-platform` (browser adapters) or are
//! supplied by the host application through `scribe-app`.
//! The core never imports platform code; it only depends on these traits.

use std::collections::BTreeMap;
use async_trait::async_trait;
use serde_json::Value;
use scribe_types::{Result, ScribeError};

// ─── HTTP Port ───────────────────────────────────────────────

/// A fully built POST request, ready for any transport
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    /// Serialized JSON
    pub body: String,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The body decoded back into JSON
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Raw response from the transport
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail on a non-2xx status, otherwise decode the body as JSON.
    pub fn into_json(self) -> Result<Value> {
        if !self.is_success() {
            return Err(ScribeError::Http {
                status: self.status,
                body: self.body,
            });
        }
        serde_json::from_str(&self.body).map_err(|e| ScribeError::Decode(e.to_string()))
    }
}

#[async_trait(?Send)]
pub trait HttpTransport {
    /// POST the request. Only transport failures are errors; a non-2xx
    /// status comes back as a normal response.
    async fn post(&self, req: &HttpRequest) -> Result<HttpResponse>;
}

// ─── Document Port ───────────────────────────────────────────

#[async_trait(?Send)]
pub trait DocumentReader {
    /// Text of the document at `path`. Missing documents and folders are
    /// `ScribeError::Document`.
    async fn read_document(&self, path: &str) -> Result<String>;
}

// ─── Settings Port ───────────────────────────────────────────

#[async_trait(?Send)]
pub trait SettingsPort {
    /// The stored blob, or `None` on first run
    async fn load(&self) -> Result<Option<Value>>;

    /// Replace the stored blob as a whole
    async fn save(&self, blob: &Value) -> Result<()>;
}

// ─── Notification Port ───────────────────────────────────────

/// Fire-and-forget user-visible notices
pub trait Notifier {
    fn notify(&self, message: &str);
}

// ─── Storage Port ────────────────────────────────────────────

/// Byte-oriented key-value storage used by the platform adapters
#[async_trait(?Send)]
pub trait StoragePort {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a value
    async fn delete(&self, key: &str) -> Result<()>;

    /// List keys with a given prefix
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}
