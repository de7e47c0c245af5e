//! Mapping from provider name to (adapter, config).

use provider_gateway_core::{Adapter, GatewayError, GatewayResult, ProviderConfig};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One registered provider: its adapter and its retry/override policy.
#[derive(Clone)]
pub struct ProviderRegistration {
    pub adapter: Arc<dyn Adapter>,
    pub config: Arc<ProviderConfig>,
}

/// Mapping from provider name to `(adapter, config)`.
///
/// Guarded by a single mutex; critical sections are O(1) lookups and
/// inserts. Once registered, a provider's adapter reference is fixed for
/// the life of the process — `register` with the same name replaces the
/// config but conceptually starts a new registration (last write wins).
pub struct ProviderRegistry {
    providers: Mutex<HashMap<String, ProviderRegistration>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a provider, applying the config's overrides to the
    /// adapter's initial per-class limits. Idempotent per name: a second
    /// `register` under the same name replaces the prior registration.
    pub fn register(&self, name: impl Into<String>, adapter: Arc<dyn Adapter>, config: Option<ProviderConfig>) {
        let config = config.unwrap_or_default();

        adapter.set_rate_limit_defaults_for_type(
            "rest",
            config.max_requests_override.unwrap_or(0),
            config.window_secs_override.unwrap_or(0),
        );

        if config.graphql_max_requests_override.is_some() || config.graphql_window_secs_override.is_some() {
            adapter.set_rate_limit_defaults_for_type(
                "graphql",
                config.graphql_max_requests_override.unwrap_or(0),
                config.graphql_window_secs_override.unwrap_or(0),
            );
        }

        let registration = ProviderRegistration {
            adapter,
            config: Arc::new(config),
        };

        let mut providers = self.providers.lock().expect("provider registry mutex poisoned");
        providers.insert(name.into(), registration);
    }

    /// Looks up a provider's adapter and config, or a registration error.
    pub fn lookup(&self, name: &str) -> GatewayResult<ProviderRegistration> {
        self.providers
            .lock()
            .expect("provider registry mutex poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::ProviderNotRegistered {
                name: name.to_string(),
            })
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provider_gateway_core::{NormalizedLimitInfo, NormalizedRequest, NormalizedResponse};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex as StdMutex;

    struct RecordingAdapter {
        defaults: StdMutex<Vec<(String, i64, i64)>>,
        calls: AtomicI64,
    }

    impl RecordingAdapter {
        fn new() -> Self {
            Self {
                defaults: StdMutex::new(Vec::new()),
                calls: AtomicI64::new(0),
            }
        }
    }

    impl Adapter for RecordingAdapter {
        fn execute_request(
            &self,
            _req: NormalizedRequest,
        ) -> futures::future::BoxFuture<'_, GatewayResult<NormalizedResponse>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(NormalizedResponse::new(200)) })
        }

        fn parse_rate_limit_info(&self, _resp: &NormalizedResponse) -> Option<NormalizedLimitInfo> {
            None
        }

        fn set_rate_limit_defaults_for_type(&self, call_class: &str, max_requests: i64, window_secs: i64) {
            self.defaults
                .lock()
                .unwrap()
                .push((call_class.to_string(), max_requests, window_secs));
        }
    }

    #[test]
    fn lookup_unknown_provider_is_an_error() {
        let registry = ProviderRegistry::new();
        assert!(registry.lookup("nope").is_err());
    }

    #[test]
    fn register_applies_rest_defaults_with_zero_for_unset_overrides() {
        let registry = ProviderRegistry::new();
        let adapter = Arc::new(RecordingAdapter::new());
        registry.register("github", adapter.clone(), None);

        let defaults = adapter.defaults.lock().unwrap();
        assert_eq!(defaults.as_slice(), &[("rest".to_string(), 0, 0)]);
    }

    #[test]
    fn register_applies_graphql_defaults_only_when_configured() {
        let registry = ProviderRegistry::new();
        let adapter = Arc::new(RecordingAdapter::new());
        let config = ProviderConfig::builder()
            .graphql_max_requests_override(5000)
            .graphql_window_secs_override(3600)
            .build();
        registry.register("github", adapter.clone(), Some(config));

        let defaults = adapter.defaults.lock().unwrap();
        assert_eq!(
            defaults.as_slice(),
            &[("rest".to_string(), 0, 0), ("graphql".to_string(), 5000, 3600)]
        );
    }

    #[test]
    fn re_registering_a_name_replaces_the_prior_registration() {
        let registry = ProviderRegistry::new();
        registry.register("p", Arc::new(RecordingAdapter::new()), None);
        let second = Arc::new(RecordingAdapter::new());
        registry.register("p", second.clone(), None);

        let found = registry.lookup("p").unwrap();
        assert!(Arc::ptr_eq(&found.adapter, &(second as Arc<dyn Adapter>)));
    }
}
