//! Jitter applied on top of a computed backoff, to avoid synchronized
//! retry storms across concurrent callers hitting the same provider.

use crate::backoff::{ExponentialBackoff, IntervalFunction};
use rand::Rng;
use std::time::Duration;

/// `min(base * 2^attempt, 30s)` plus a uniform random jitter in
/// `[0, backoff * 0.5]` — full-jitter-style spread capped before the
/// jitter is applied.
pub fn backoff_with_jitter(base: Duration, attempt: usize) -> Duration {
    let capped = ExponentialBackoff::new(base).next_interval(attempt);
    capped + jitter_fraction(capped, 0.5)
}

/// A server-supplied `Retry-After: N` wait, plus a uniform random jitter in
/// `[0, N * 0.1]`.
pub fn retry_after_with_jitter(seconds: u64) -> Duration {
    let base = Duration::from_secs(seconds);
    base + jitter_fraction(base, 0.1)
}

/// Draws a uniform random duration in `[0, duration * fraction]`.
fn jitter_fraction(duration: Duration, fraction: f64) -> Duration {
    let max_jitter = duration.mul_f64(fraction);
    if max_jitter.is_zero() {
        return Duration::ZERO;
    }
    let jitter_secs = rand::rng().random_range(0.0..=max_jitter.as_secs_f64());
    Duration::from_secs_f64(jitter_secs)
}

/// Parses a `Retry-After` header value as whole, non-negative seconds only.
/// Floating-point forms (and anything else unparseable) are treated as
/// absent — callers should fall back to [`backoff_with_jitter`] when this
/// returns `None`.
pub fn parse_retry_after_seconds(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_with_jitter_never_goes_below_the_base() {
        for attempt in 0..6 {
            let base = Duration::from_millis(100);
            let capped = ExponentialBackoff::new(base).next_interval(attempt);
            for _ in 0..20 {
                let jittered = backoff_with_jitter(base, attempt);
                assert!(jittered >= capped);
                assert!(jittered <= capped + capped.mul_f64(0.5));
            }
        }
    }

    #[test]
    fn retry_after_with_jitter_stays_within_ten_percent() {
        for _ in 0..20 {
            let jittered = retry_after_with_jitter(10);
            assert!(jittered >= Duration::from_secs(10));
            assert!(jittered <= Duration::from_millis(11_000));
        }
    }

    #[test]
    fn zero_base_has_no_jitter_to_add() {
        assert_eq!(backoff_with_jitter(Duration::ZERO, 0), Duration::ZERO);
    }

    #[test]
    fn parses_integer_seconds() {
        assert_eq!(parse_retry_after_seconds("5"), Some(5));
        assert_eq!(parse_retry_after_seconds(" 12 "), Some(12));
    }

    #[test]
    fn rejects_floating_point_and_garbage() {
        assert_eq!(parse_retry_after_seconds("5.5"), None);
        assert_eq!(parse_retry_after_seconds("soon"), None);
        assert_eq!(parse_retry_after_seconds(""), None);
    }

    #[test]
    fn rejects_negative_values() {
        assert_eq!(parse_retry_after_seconds("-1"), None);
    }
}
