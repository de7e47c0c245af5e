//! Backoff strategies and jitter helpers used by the
//! `provider-gateway` dispatcher's retry controller.

mod backoff;
mod jitter;

pub use backoff::{ExponentialBackoff, FixedInterval, IntervalFunction};
pub use jitter::{backoff_with_jitter, parse_retry_after_seconds, retry_after_with_jitter};
