//! The adapter contract: the capability set every provider module must implement.

use crate::error::GatewayError;
use crate::types::{NormalizedLimitInfo, NormalizedRequest, NormalizedResponse};
use futures::future::BoxFuture;

/// Default call class used for providers that don't classify requests.
pub const DEFAULT_CALL_CLASS: &str = "rest";

/// Provider-specific HTTP logic.
///
/// Implementations are registered once per provider and live for the
/// lifetime of the [`provider-gateway`](https://docs.rs/provider-gateway)
/// instance that holds them, so `execute_request` and friends take `&self`
/// rather than `&mut self` — any adapter-local mutable state (sliding-window
/// counters, etc.) must be interior-mutable and guarded by its own lock,
/// which the core deliberately never touches.
pub trait Adapter: Send + Sync {
    /// Performs the network call (or synthesizes a response).
    ///
    /// May return a response carrying any status, including a synthetic 429
    /// (see [`NormalizedResponse::synthetic_rate_limited`]) when the adapter
    /// knows locally that the provider's limit is already exhausted. All
    /// response header names must be lowercased before returning.
    fn execute_request(
        &self,
        req: NormalizedRequest,
    ) -> BoxFuture<'_, Result<NormalizedResponse, GatewayError>>;

    /// Extracts a [`NormalizedLimitInfo`] from response headers, or returns
    /// `None` when the provider publishes no usable signal for this
    /// response. Any epoch-seconds fields must be converted to milliseconds.
    fn parse_rate_limit_info(&self, resp: &NormalizedResponse) -> Option<NormalizedLimitInfo>;

    /// True iff this response represents a server-reported rate limit.
    /// Minimally true for status 429; some providers (GitHub among them)
    /// also treat a documented 403 as a rate-limit signal. That choice is
    /// adapter-specific and must not be hard-coded in the core.
    fn is_rate_limit_error(&self, resp: &NormalizedResponse) -> bool {
        resp.status == 429
    }

    /// Supplies initial per-class limits at registration time. A value of
    /// zero means "use the adapter's own internal default." The default
    /// implementation is a no-op for adapters with nothing to configure.
    fn set_rate_limit_defaults_for_type(
        &self,
        _call_class: &str,
        _max_requests: i64,
        _window_secs: i64,
    ) {
    }

    /// Classifies a request into a call-class bucket (e.g. `"rest"`,
    /// `"graphql"`). Adapters that don't distinguish classes can rely on the
    /// default, which always returns [`DEFAULT_CALL_CLASS`].
    fn identify_request_type(&self, _req: &NormalizedRequest) -> String {
        DEFAULT_CALL_CLASS.to_string()
    }
}
