//! Wire-agnostic value types exchanged between caller, dispatcher, and adapter.

use std::collections::HashMap;

/// A provider-relative HTTP request, immutable once submitted.
///
/// `method` is an uppercase HTTP verb. `endpoint` is provider-relative and
/// begins with `/`; the adapter is responsible for prepending the provider's
/// base URL. `headers` is an unordered, case-insensitive-by-convention
/// mapping from name to a single value — the adapter decides casing on the
/// wire.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalizedRequest {
    pub method: String,
    pub endpoint: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl NormalizedRequest {
    /// Creates a request with no headers and an empty body.
    pub fn new(method: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            endpoint: endpoint.into(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// A provider HTTP response, immutable once produced by an adapter.
///
/// Header names must already be lowercased by the adapter; the core and
/// downstream callers only ever look headers up by their lowercase name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalizedResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl NormalizedResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Looks up a response header by its lowercase name.
    pub fn header(&self, lowercase_name: &str) -> Option<&str> {
        self.headers.get(lowercase_name).map(String::as_str)
    }

    /// Builds the synthetic 429 response adapters emit when a local,
    /// adapter-owned counter says the provider's limit is already exhausted.
    pub fn synthetic_rate_limited(provider: &str) -> Self {
        Self::new(429).with_body(
            format!(r#"{{"error":"{provider} rate limit reached"}}"#).into_bytes(),
        )
    }
}

/// Provider-agnostic snapshot of remaining capacity and reset time.
///
/// Every field is optional: absence means "unknown", and must never be
/// conflated with zero. `reset_requests_at` / `reset_tokens_at` /
/// `global_reset_at` are absolute epoch milliseconds — adapters that learn a
/// relative duration from the wire must convert it before returning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalizedLimitInfo {
    pub max_requests: Option<i64>,
    pub remaining_requests: Option<i64>,
    pub reset_requests_at: Option<i64>,
    pub max_tokens: Option<i64>,
    pub remaining_tokens: Option<i64>,
    pub reset_tokens_at: Option<i64>,
    pub global_reset_at: Option<i64>,
}

impl NormalizedLimitInfo {
    pub fn new() -> Self {
        Self::default()
    }
}
