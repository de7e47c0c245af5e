//! Executes one logical request: preemptive wait, dispatch, classification,
//! retry, jitter, and Retry-After handling.

use crate::events::{BackoffSource, ControllerEvent, Decision};
use provider_gateway_core::events::EventListeners;
use provider_gateway_core::{Adapter, DispatchOutcome, GatewayError, NormalizedRequest, ProviderConfig};
use provider_gateway_ratelimit::{LimitKey, RateLimitStore};
use provider_gateway_retry::{backoff_with_jitter, parse_retry_after_seconds, retry_after_with_jitter};
use std::time::Instant;

#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

/// Runs the retry/backoff algorithm for one logical request against one
/// provider/call-class key.
///
/// Within a single call this is strictly sequential — preemptive wait,
/// dispatch, parse, classify — so no two network round-trips for the same
/// call ever overlap. There is no serialization across concurrent calls
/// beyond what the rate-limit store's own lock already provides.
pub async fn execute(
    adapter: &dyn Adapter,
    config: &ProviderConfig,
    store: &RateLimitStore,
    key: &LimitKey,
    req: NormalizedRequest,
    events: &EventListeners<ControllerEvent>,
) -> DispatchOutcome {
    let base_backoff = config.effective_base_backoff();
    let mut attempts: usize = 0;

    loop {
        if !store.can_proceed(key) {
            let wait = store.delay_before_next_request(key);
            events.emit(&ControllerEvent::PreemptiveWait {
                provider: key.provider.clone(),
                call_class: key.call_class.clone(),
                duration: wait,
                at: Instant::now(),
            });
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        }

        events.emit(&ControllerEvent::Dispatching {
            provider: key.provider.clone(),
            call_class: key.call_class.clone(),
            attempt: attempts,
            at: Instant::now(),
        });

        match adapter.execute_request(req.clone()).await {
            Err(transport_err) => {
                events.emit(&ControllerEvent::Classified {
                    provider: key.provider.clone(),
                    call_class: key.call_class.clone(),
                    attempt: attempts,
                    status: None,
                    decision: Decision::TransportError,
                    at: Instant::now(),
                });

                if attempts < config.max_retries as usize {
                    let delay = backoff_with_jitter(base_backoff, attempts);
                    events.emit(&ControllerEvent::BackoffComputed {
                        provider: key.provider.clone(),
                        call_class: key.call_class.clone(),
                        attempt: attempts,
                        delay,
                        source: BackoffSource::ExponentialJitter,
                        at: Instant::now(),
                    });
                    tokio::time::sleep(delay).await;
                    attempts += 1;
                    continue;
                }

                finish(events, key, attempts + 1, false);
                return DispatchOutcome::failure(None, transport_err);
            }
            Ok(resp) => {
                if let Some(info) = adapter.parse_rate_limit_info(&resp) {
                    store.update(key, info, config);
                }

                if adapter.is_rate_limit_error(&resp) {
                    events.emit(&ControllerEvent::Classified {
                        provider: key.provider.clone(),
                        call_class: key.call_class.clone(),
                        attempt: attempts,
                        status: Some(resp.status),
                        decision: Decision::RateLimited,
                        at: Instant::now(),
                    });

                    if attempts < config.max_retries as usize {
                        let (delay, source) = match resp
                            .header("retry-after")
                            .and_then(parse_retry_after_seconds)
                        {
                            Some(seconds) => (retry_after_with_jitter(seconds), BackoffSource::RetryAfterHeader),
                            None => (
                                backoff_with_jitter(base_backoff, attempts),
                                BackoffSource::ExponentialJitter,
                            ),
                        };
                        events.emit(&ControllerEvent::BackoffComputed {
                            provider: key.provider.clone(),
                            call_class: key.call_class.clone(),
                            attempt: attempts,
                            delay,
                            source,
                            at: Instant::now(),
                        });
                        tokio::time::sleep(delay).await;
                        attempts += 1;
                        continue;
                    }

                    finish(events, key, attempts + 1, false);
                    return DispatchOutcome::failure(
                        Some(resp.clone()),
                        GatewayError::RateLimitExceeded { status: resp.status },
                    );
                }

                if resp.status >= 500 {
                    events.emit(&ControllerEvent::Classified {
                        provider: key.provider.clone(),
                        call_class: key.call_class.clone(),
                        attempt: attempts,
                        status: Some(resp.status),
                        decision: Decision::ServerError,
                        at: Instant::now(),
                    });

                    if attempts < config.max_retries as usize {
                        let delay = backoff_with_jitter(base_backoff, attempts);
                        events.emit(&ControllerEvent::BackoffComputed {
                            provider: key.provider.clone(),
                            call_class: key.call_class.clone(),
                            attempt: attempts,
                            delay,
                            source: BackoffSource::ExponentialJitter,
                            at: Instant::now(),
                        });
                        tokio::time::sleep(delay).await;
                        attempts += 1;
                        continue;
                    }

                    finish(events, key, attempts + 1, false);
                    return DispatchOutcome::failure(
                        Some(resp.clone()),
                        GatewayError::ServerError { status: resp.status },
                    );
                }

                if resp.status >= 400 {
                    events.emit(&ControllerEvent::Classified {
                        provider: key.provider.clone(),
                        call_class: key.call_class.clone(),
                        attempt: attempts,
                        status: Some(resp.status),
                        decision: Decision::ClientError,
                        at: Instant::now(),
                    });

                    finish(events, key, attempts + 1, false);
                    return DispatchOutcome::failure(
                        Some(resp.clone()),
                        GatewayError::ClientError { status: resp.status },
                    );
                }

                events.emit(&ControllerEvent::Classified {
                    provider: key.provider.clone(),
                    call_class: key.call_class.clone(),
                    attempt: attempts,
                    status: Some(resp.status),
                    decision: Decision::Success,
                    at: Instant::now(),
                });
                finish(events, key, attempts + 1, true);
                return DispatchOutcome::success(resp);
            }
        }
    }
}

fn finish(events: &EventListeners<ControllerEvent>, key: &LimitKey, attempts: usize, success: bool) {
    events.emit(&ControllerEvent::Outcome {
        provider: key.provider.clone(),
        call_class: key.call_class.clone(),
        attempts,
        success,
        at: Instant::now(),
    });

    #[cfg(feature = "metrics")]
    {
        counter!(
            "provider_gateway_dispatch_calls_total",
            "provider" => key.provider.clone(),
            "call_class" => key.call_class.clone(),
            "result" => if success { "success" } else { "failed" }
        )
        .increment(1);
        histogram!(
            "provider_gateway_dispatch_attempts",
            "provider" => key.provider.clone(),
            "call_class" => key.call_class.clone()
        )
        .record(attempts as f64);
    }
}
