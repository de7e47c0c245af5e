//! Thread-safe map from (provider, call-class) to current limit snapshot.

use crate::key::LimitKey;
use provider_gateway_core::{Clock, NormalizedLimitInfo, ProviderConfig, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Rate-limit state store.
///
/// All reads and writes go through a single mutex; critical sections hold
/// no other lock and perform no I/O. Snapshots are never mutated in place —
/// an update replaces the pointer under the lock, so a reader that copied a
/// snapshot out never observes a half-written value.
pub struct RateLimitStore {
    snapshots: Mutex<HashMap<LimitKey, Arc<NormalizedLimitInfo>>>,
    clock: Arc<dyn Clock>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Builds a store reading `now()` from a caller-supplied clock — tests
    /// use this to substitute a [`provider_gateway_core::TestClock`].
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            snapshots: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Folds a freshly parsed [`NormalizedLimitInfo`] into the store.
    ///
    /// If `config.use_provider_limits` is `false`, the config's overrides
    /// replace the matching `max_*` field and the matching `remaining_*`
    /// field is clamped downward if it would otherwise exceed the new max.
    pub fn update(&self, key: &LimitKey, mut info: NormalizedLimitInfo, config: &ProviderConfig) {
        if !config.use_provider_limits {
            if let Some(max_requests) = config.max_requests_override {
                info.max_requests = Some(max_requests);
                if let Some(remaining) = info.remaining_requests {
                    if remaining > max_requests {
                        info.remaining_requests = Some(max_requests);
                    }
                }
            }
            if let Some(max_tokens) = config.max_tokens_override {
                info.max_tokens = Some(max_tokens);
                if let Some(remaining) = info.remaining_tokens {
                    if remaining > max_tokens {
                        info.remaining_tokens = Some(max_tokens);
                    }
                }
            }
        }

        let mut snapshots = self.snapshots.lock().expect("rate-limit store mutex poisoned");
        snapshots.insert(key.clone(), Arc::new(info));
    }

    /// Whether a request may proceed without waiting.
    ///
    /// True if no snapshot is stored yet, if the snapshot doesn't know
    /// `remaining_requests`, or if `remaining_requests > 0`. False iff
    /// `remaining_requests <= 0` and a `reset_requests_at` is known to still
    /// be in the future.
    pub fn can_proceed(&self, key: &LimitKey) -> bool {
        let snapshot = self.read(key);
        let Some(info) = snapshot else {
            return true;
        };

        match info.remaining_requests {
            None => true,
            Some(remaining) if remaining > 0 => true,
            Some(_) => match info.reset_requests_at {
                Some(reset_at) if reset_at > self.clock.now_millis() => false,
                _ => true,
            },
        }
    }

    /// How long to sleep before the next request, given the current
    /// snapshot. Zero when the gate is already open.
    pub fn delay_before_next_request(&self, key: &LimitKey) -> Duration {
        if self.can_proceed(key) {
            return Duration::ZERO;
        }

        let now = self.clock.now_millis();
        let reset_at = self
            .read(key)
            .and_then(|info| info.reset_requests_at)
            .unwrap_or(now);

        Duration::from_millis((reset_at - now).max(0) as u64)
    }

    /// A by-value copy of the snapshot for an arbitrary call class. Never
    /// hands out a reference callers could use to mutate stored state.
    pub fn snapshot_class(&self, key: &LimitKey) -> Option<NormalizedLimitInfo> {
        self.read(key).map(|info| *info)
    }

    /// A by-value copy of the `"rest"` class snapshot for a provider,
    /// intended as an operator-facing peek.
    pub fn snapshot(&self, provider: &str) -> Option<NormalizedLimitInfo> {
        self.snapshot_class(&LimitKey::new(provider, provider_gateway_core::DEFAULT_CALL_CLASS))
    }

    fn read(&self, key: &LimitKey) -> Option<Arc<NormalizedLimitInfo>> {
        self.snapshots
            .lock()
            .expect("rate-limit store mutex poisoned")
            .get(key)
            .cloned()
    }
}

impl Default for RateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provider_gateway_core::TestClock;

    fn key() -> LimitKey {
        LimitKey::new("github", "rest")
    }

    #[test]
    fn can_proceed_true_when_no_snapshot() {
        let store = RateLimitStore::new();
        assert!(store.can_proceed(&key()));
    }

    #[test]
    fn can_proceed_true_when_remaining_unknown() {
        let store = RateLimitStore::new();
        store.update(&key(), NormalizedLimitInfo::new(), &ProviderConfig::default());
        assert!(store.can_proceed(&key()));
    }

    #[test]
    fn can_proceed_true_when_remaining_positive() {
        let store = RateLimitStore::new();
        let info = NormalizedLimitInfo {
            remaining_requests: Some(5),
            ..Default::default()
        };
        store.update(&key(), info, &ProviderConfig::default());
        assert!(store.can_proceed(&key()));
    }

    #[test]
    fn can_proceed_false_when_exhausted_and_reset_in_future() {
        let clock = Arc::new(TestClock::new(1_000));
        let store = RateLimitStore::with_clock(clock.clone());
        let info = NormalizedLimitInfo {
            remaining_requests: Some(0),
            reset_requests_at: Some(2_000),
            ..Default::default()
        };
        store.update(&key(), info, &ProviderConfig::default());
        assert!(!store.can_proceed(&key()));
    }

    #[test]
    fn can_proceed_true_when_exhausted_but_reset_has_passed() {
        let clock = Arc::new(TestClock::new(5_000));
        let store = RateLimitStore::with_clock(clock);
        let info = NormalizedLimitInfo {
            remaining_requests: Some(0),
            reset_requests_at: Some(2_000),
            ..Default::default()
        };
        store.update(&key(), info, &ProviderConfig::default());
        assert!(store.can_proceed(&key()));
    }

    #[test]
    fn can_proceed_true_when_exhausted_and_reset_unknown() {
        let store = RateLimitStore::new();
        let info = NormalizedLimitInfo {
            remaining_requests: Some(0),
            reset_requests_at: None,
            ..Default::default()
        };
        store.update(&key(), info, &ProviderConfig::default());
        assert!(store.can_proceed(&key()));
    }

    #[test]
    fn delay_is_zero_when_gate_open() {
        let store = RateLimitStore::new();
        assert_eq!(store.delay_before_next_request(&key()), Duration::ZERO);
    }

    #[test]
    fn delay_matches_remaining_window_time() {
        let clock = Arc::new(TestClock::new(1_000));
        let store = RateLimitStore::with_clock(clock);
        let info = NormalizedLimitInfo {
            remaining_requests: Some(0),
            reset_requests_at: Some(1_500),
            ..Default::default()
        };
        store.update(&key(), info, &ProviderConfig::default());
        assert_eq!(
            store.delay_before_next_request(&key()),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn override_shrinks_max_and_clamps_remaining() {
        let store = RateLimitStore::new();
        let config = ProviderConfig::builder()
            .use_provider_limits(false)
            .max_requests_override(10)
            .build();

        let info = NormalizedLimitInfo {
            max_requests: Some(5_000),
            remaining_requests: Some(4_999),
            ..Default::default()
        };
        store.update(&key(), info, &config);

        let snapshot = store.snapshot_class(&key()).unwrap();
        assert_eq!(snapshot.max_requests, Some(10));
        assert_eq!(snapshot.remaining_requests, Some(10));
    }

    #[test]
    fn override_does_not_raise_remaining_below_max() {
        let store = RateLimitStore::new();
        let config = ProviderConfig::builder()
            .use_provider_limits(false)
            .max_requests_override(100)
            .build();

        let info = NormalizedLimitInfo {
            max_requests: Some(5_000),
            remaining_requests: Some(3),
            ..Default::default()
        };
        store.update(&key(), info, &config);

        let snapshot = store.snapshot_class(&key()).unwrap();
        assert_eq!(snapshot.max_requests, Some(100));
        assert_eq!(snapshot.remaining_requests, Some(3));
    }

    #[test]
    fn snapshot_returns_none_for_unknown_provider() {
        let store = RateLimitStore::new();
        assert!(store.snapshot("unknown").is_none());
    }

    #[test]
    fn snapshot_reads_rest_class_by_convention() {
        let store = RateLimitStore::new();
        store.update(
            &LimitKey::new("github", "rest"),
            NormalizedLimitInfo {
                remaining_requests: Some(42),
                ..Default::default()
            },
            &ProviderConfig::default(),
        );

        assert_eq!(store.snapshot("github").unwrap().remaining_requests, Some(42));
    }
}
