//! Events the retry/backoff controller emits at each decision point.
//!
//! One [`ControllerEvent`] is emitted per decision: a preemptive wait, a
//! dispatch, a classification, a computed backoff, and the final outcome.
//! This realizes the dispatcher's Debug/Observability surface — when
//! [`crate::Gateway::set_debug`] is enabled, the built-in formatting
//! listener installed at construction prints these; the exact text format
//! is otherwise an internal detail, not a documented wire contract.

use provider_gateway_core::events::GatewayEvent;
use std::fmt;
use std::time::{Duration, Instant};

/// What a classification decided about a response or error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Success,
    RateLimited,
    ServerError,
    ClientError,
    TransportError,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Decision::Success => "success",
            Decision::RateLimited => "rate_limited",
            Decision::ServerError => "server_error",
            Decision::ClientError => "client_error",
            Decision::TransportError => "transport_error",
        };
        f.write_str(label)
    }
}

/// Where a computed backoff's timing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffSource {
    RetryAfterHeader,
    ExponentialJitter,
}

impl fmt::Display for BackoffSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BackoffSource::RetryAfterHeader => "retry-after",
            BackoffSource::ExponentialJitter => "exponential-jitter",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    PreemptiveWait {
        provider: String,
        call_class: String,
        duration: Duration,
        at: Instant,
    },
    Dispatching {
        provider: String,
        call_class: String,
        attempt: usize,
        at: Instant,
    },
    Classified {
        provider: String,
        call_class: String,
        attempt: usize,
        status: Option<u16>,
        decision: Decision,
        at: Instant,
    },
    BackoffComputed {
        provider: String,
        call_class: String,
        attempt: usize,
        delay: Duration,
        source: BackoffSource,
        at: Instant,
    },
    Outcome {
        provider: String,
        call_class: String,
        attempts: usize,
        success: bool,
        at: Instant,
    },
}

impl ControllerEvent {
    fn provider_str(&self) -> &str {
        match self {
            ControllerEvent::PreemptiveWait { provider, .. }
            | ControllerEvent::Dispatching { provider, .. }
            | ControllerEvent::Classified { provider, .. }
            | ControllerEvent::BackoffComputed { provider, .. }
            | ControllerEvent::Outcome { provider, .. } => provider,
        }
    }

    fn at(&self) -> Instant {
        match self {
            ControllerEvent::PreemptiveWait { at, .. }
            | ControllerEvent::Dispatching { at, .. }
            | ControllerEvent::Classified { at, .. }
            | ControllerEvent::BackoffComputed { at, .. }
            | ControllerEvent::Outcome { at, .. } => *at,
        }
    }
}

impl GatewayEvent for ControllerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ControllerEvent::PreemptiveWait { .. } => "preemptive_wait",
            ControllerEvent::Dispatching { .. } => "dispatching",
            ControllerEvent::Classified { .. } => "classified",
            ControllerEvent::BackoffComputed { .. } => "backoff_computed",
            ControllerEvent::Outcome { .. } => "outcome",
        }
    }

    fn timestamp(&self) -> Instant {
        self.at()
    }

    fn provider(&self) -> &str {
        self.provider_str()
    }
}

impl fmt::Display for ControllerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerEvent::PreemptiveWait {
                provider,
                call_class,
                duration,
                ..
            } => write!(
                f,
                "[{provider}/{call_class}] gate closed, waiting {duration:?} before dispatch"
            ),
            ControllerEvent::Dispatching {
                provider,
                call_class,
                attempt,
                ..
            } => write!(f, "[{provider}/{call_class}] dispatching attempt {attempt}"),
            ControllerEvent::Classified {
                provider,
                call_class,
                attempt,
                status,
                decision,
                ..
            } => write!(
                f,
                "[{provider}/{call_class}] attempt {attempt} classified as {decision} (status={status:?})"
            ),
            ControllerEvent::BackoffComputed {
                provider,
                call_class,
                attempt,
                delay,
                source,
                ..
            } => write!(
                f,
                "[{provider}/{call_class}] attempt {attempt} backing off {delay:?} via {source}"
            ),
            ControllerEvent::Outcome {
                provider,
                call_class,
                attempts,
                success,
                ..
            } => write!(
                f,
                "[{provider}/{call_class}] finished after {attempts} attempt(s): {}",
                if *success { "success" } else { "failure" }
            ),
        }
    }
}
