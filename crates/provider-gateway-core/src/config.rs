//! Per-provider retry/override policy.

use std::time::Duration;

/// Per-provider retry/override knobs.
///
/// `use_provider_limits = true` means the dispatcher trusts whatever limit
/// numbers the adapter reports; setting it to `false` activates the
/// override fields below, which replace the adapter-reported `max_*` values
/// and clamp the matching `remaining_*` value downward if it would
/// otherwise exceed the new max.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProviderConfig {
    pub use_provider_limits: bool,
    pub max_requests_override: Option<i64>,
    pub window_secs_override: Option<i64>,
    pub max_tokens_override: Option<i64>,
    pub graphql_max_requests_override: Option<i64>,
    pub graphql_window_secs_override: Option<i64>,
    pub max_retries: u32,
    #[cfg_attr(feature = "serde", serde(with = "duration_millis"))]
    pub base_backoff: Duration,
}

impl ProviderConfig {
    /// Builder entry point, mirroring the builder convention used
    /// throughout this crate family.
    pub fn builder() -> ProviderConfigBuilder {
        ProviderConfigBuilder::new()
    }

    /// The effective base backoff: `base_backoff` defaults to one second
    /// when left at zero, per the retry controller's boundary rule.
    pub fn effective_base_backoff(&self) -> Duration {
        if self.base_backoff.is_zero() {
            Duration::from_secs(1)
        } else {
            self.base_backoff
        }
    }
}

impl Default for ProviderConfig {
    /// The config used when a provider is registered with no explicit
    /// config: trust provider limits, retry up to 3 times, default backoff.
    fn default() -> Self {
        Self {
            use_provider_limits: true,
            max_requests_override: None,
            window_secs_override: None,
            max_tokens_override: None,
            graphql_max_requests_override: None,
            graphql_window_secs_override: None,
            max_retries: 3,
            base_backoff: Duration::ZERO,
        }
    }
}

/// Builder for [`ProviderConfig`].
pub struct ProviderConfigBuilder {
    config: ProviderConfig,
}

impl Default for ProviderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ProviderConfig::default(),
        }
    }

    pub fn use_provider_limits(mut self, value: bool) -> Self {
        self.config.use_provider_limits = value;
        self
    }

    pub fn max_requests_override(mut self, value: i64) -> Self {
        self.config.max_requests_override = Some(value);
        self
    }

    pub fn window_secs_override(mut self, value: i64) -> Self {
        self.config.window_secs_override = Some(value);
        self
    }

    pub fn max_tokens_override(mut self, value: i64) -> Self {
        self.config.max_tokens_override = Some(value);
        self
    }

    pub fn graphql_max_requests_override(mut self, value: i64) -> Self {
        self.config.graphql_max_requests_override = Some(value);
        self
    }

    pub fn graphql_window_secs_override(mut self, value: i64) -> Self {
        self.config.graphql_window_secs_override = Some(value);
        self
    }

    pub fn max_retries(mut self, value: u32) -> Self {
        self.config.max_retries = value;
        self
    }

    pub fn base_backoff(mut self, value: Duration) -> Self {
        self.config.base_backoff = value;
        self
    }

    pub fn build(self) -> ProviderConfig {
        self.config
    }
}

#[cfg(feature = "serde")]
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}
