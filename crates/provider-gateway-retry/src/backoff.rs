//! Pluggable backoff strategies.

use std::time::Duration;

/// Abstraction for computing retry intervals.
pub trait IntervalFunction: Send + Sync {
    /// Computes the delay before the next retry attempt.
    ///
    /// `attempt` is 0-indexed: the first retry after the initial dispatch
    /// is attempt 0.
    fn next_interval(&self, attempt: usize) -> Duration;
}

/// Fixed interval backoff — the same duration for every retry.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    duration: Duration,
}

impl FixedInterval {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl IntervalFunction for FixedInterval {
    fn next_interval(&self, _attempt: usize) -> Duration {
        self.duration
    }
}

/// Exponential backoff capped at 30 seconds, matching the controller's
/// `min(base * 2^attempts, 30s)` rule.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    multiplier: f64,
    cap: Duration,
}

impl ExponentialBackoff {
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            multiplier: 2.0,
            cap: Duration::from_secs(30),
        }
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn cap(mut self, cap: Duration) -> Self {
        self.cap = cap;
        self
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn next_interval(&self, attempt: usize) -> Duration {
        let interval = self.base.mul_f64(self.multiplier.powi(attempt as i32));
        interval.min(self.cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_interval_returns_same_duration() {
        let backoff = FixedInterval::new(Duration::from_secs(1));
        assert_eq!(backoff.next_interval(0), Duration::from_secs(1));
        assert_eq!(backoff.next_interval(10), Duration::from_secs(1));
    }

    #[test]
    fn exponential_backoff_grows() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(100));
        assert_eq!(backoff.next_interval(0), Duration::from_millis(100));
        assert_eq!(backoff.next_interval(1), Duration::from_millis(200));
        assert_eq!(backoff.next_interval(2), Duration::from_millis(400));
        assert_eq!(backoff.next_interval(3), Duration::from_millis(800));
    }

    #[test]
    fn exponential_backoff_is_capped_at_30s_by_default() {
        let backoff = ExponentialBackoff::new(Duration::from_secs(1));
        assert_eq!(backoff.next_interval(10), Duration::from_secs(30));
    }

    #[test]
    fn exponential_backoff_monotonic_up_to_cap() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(100));
        let mut previous = Duration::ZERO;
        for attempt in 0..8 {
            let interval = backoff.next_interval(attempt);
            assert!(interval >= previous);
            previous = interval;
        }
    }
}
