//! `provider-gateway` — a unified policy engine for calling many third-party
//! HTTP APIs.
//!
//! A [`Gateway`] is a registry of provider adapters plus one shared
//! rate-limit store. Callers never talk to an adapter directly: every call
//! goes through [`Gateway::request`], which checks the provider's current
//! limit state, dispatches through the adapter, classifies the result, and
//! retries with jittered backoff according to the provider's
//! [`ProviderConfig`] before handing back a [`DispatchOutcome`].

mod controller;
mod debug;
mod events;
mod registry;

pub use events::{BackoffSource, ControllerEvent, Decision};
pub use provider_gateway_core::{
    Adapter, DispatchOutcome, GatewayError, GatewayResult, NormalizedLimitInfo, NormalizedRequest,
    NormalizedResponse, ProviderConfig, ProviderConfigBuilder,
};
pub use provider_gateway_ratelimit::LimitKey;
pub use registry::ProviderRegistration;

use provider_gateway_core::events::EventListeners;
use provider_gateway_ratelimit::RateLimitStore;
use registry::ProviderRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The entry point of this crate: a registry of providers sharing one
/// rate-limit store and one retry/backoff controller.
///
/// Cheap to clone-by-reference — hold it behind an `Arc` (or just construct
/// one and share `&Gateway`) if multiple tasks need to dispatch through it;
/// every method takes `&self`.
pub struct Gateway {
    registry: ProviderRegistry,
    store: RateLimitStore,
    debug: Arc<AtomicBool>,
    events: EventListeners<ControllerEvent>,
}

impl Gateway {
    /// Builds an empty gateway with no providers registered.
    pub fn new() -> Self {
        #[cfg(feature = "metrics")]
        {
            metrics::describe_counter!(
                "provider_gateway_dispatch_calls_total",
                "Total number of logical dispatches (success or failed, after retries)"
            );
            metrics::describe_histogram!(
                "provider_gateway_dispatch_attempts",
                "Number of ExecuteRequest attempts per logical dispatch"
            );
        }

        let debug = Arc::new(AtomicBool::new(false));
        let mut events = EventListeners::new();
        debug::install_default_listener(&mut events, Arc::clone(&debug));

        Self {
            registry: ProviderRegistry::new(),
            store: RateLimitStore::new(),
            debug,
            events,
        }
    }

    /// Registers a provider under `name`. A second call with the same name
    /// replaces the prior registration.
    pub fn register_provider(
        &self,
        name: impl Into<String>,
        adapter: Arc<dyn Adapter>,
        config: Option<ProviderConfig>,
    ) {
        self.registry.register(name, adapter, config);
    }

    /// Adds a listener that observes every decision the retry/backoff
    /// controller makes, independent of the built-in debug trace.
    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: provider_gateway_core::events::EventListener<ControllerEvent> + 'static,
    {
        self.events.add(listener);
    }

    /// Enables or disables the built-in debug trace of controller decisions.
    pub fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
    }

    /// Dispatches `req` against the named provider, retrying internally per
    /// its registered [`ProviderConfig`] until success, a terminal client
    /// error, or retry exhaustion.
    pub async fn request(&self, provider: &str, req: NormalizedRequest) -> DispatchOutcome {
        let registration = match self.registry.lookup(provider) {
            Ok(registration) => registration,
            Err(err) => return DispatchOutcome::failure(None, err),
        };

        let call_class = registration.adapter.identify_request_type(&req);
        let key = LimitKey::new(provider, call_class);

        controller::execute(
            registration.adapter.as_ref(),
            &registration.config,
            &self.store,
            &key,
            req,
            &self.events,
        )
        .await
    }

    /// A by-value copy of the `"rest"`-class rate-limit snapshot for
    /// `provider`, or `None` if nothing has been observed yet.
    ///
    /// Only the default call class is exposed here; callers that need a
    /// different class's snapshot can build a [`LimitKey`] and go through
    /// the lower-level `provider-gateway-ratelimit` crate directly.
    pub fn get_rate_limit_info(&self, provider: &str) -> Option<NormalizedLimitInfo> {
        self.store.snapshot(provider)
    }

    /// A by-value copy of the snapshot for an explicit call class.
    pub fn get_rate_limit_info_for_class(
        &self,
        provider: &str,
        call_class: &str,
    ) -> Option<NormalizedLimitInfo> {
        self.store.snapshot_class(&LimitKey::new(provider, call_class))
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}
