//! The error taxonomy shared by every `provider-gateway` crate.

use crate::types::NormalizedResponse;

/// Errors the policy engine can surface.
///
/// Transport, rate-limit, and server errors are retried internally up to a
/// provider's configured `max_retries`; only the last attempt's error ever
/// escapes to the caller. Client and registration errors are terminal and
/// returned immediately.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// The adapter failed to produce a response at all (connection refused,
    /// DNS failure, timeout at the transport layer, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response was classified as a rate limit (status 429, or an
    /// adapter-declared equivalent) and retries have been exhausted.
    #[error("rate limit exceeded and max retries reached (status {status})")]
    RateLimitExceeded { status: u16 },

    /// The response was a 5xx and retries have been exhausted.
    #[error("server error (status {status})")]
    ServerError { status: u16 },

    /// The response was a non-429 4xx. Never retried.
    #[error("client error: {status}")]
    ClientError { status: u16 },

    /// `Dispatcher::request` was called with an unregistered provider name.
    #[error("provider not registered: {name}")]
    ProviderNotRegistered { name: String },
}

/// `Result` alias used throughout this crate family.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// The outcome of one logical dispatcher call.
///
/// A response may be present even when `error` is `Some` — terminal and
/// exhaustion failures still carry whatever the server last returned, so
/// callers can inspect the body instead of working from the error alone.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub response: Option<NormalizedResponse>,
    pub error: Option<GatewayError>,
}

impl DispatchOutcome {
    pub fn success(response: NormalizedResponse) -> Self {
        Self {
            response: Some(response),
            error: None,
        }
    }

    pub fn failure(response: Option<NormalizedResponse>, error: GatewayError) -> Self {
        Self {
            response,
            error: Some(error),
        }
    }

    /// True iff no error was recorded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Converts into a plain `Result`, discarding the response attached to
    /// a failure. Prefer matching on the struct directly when the caller
    /// needs the body of a terminal or exhausted response.
    pub fn into_result(self) -> GatewayResult<NormalizedResponse> {
        match self.error {
            None => Ok(self.response.expect("success outcome always carries a response")),
            Some(err) => Err(err),
        }
    }
}
