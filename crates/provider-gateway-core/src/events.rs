//! Generic event system shared by the rate-limit store and the dispatcher.
//!
//! Every component that wants to be observable defines its own event enum
//! implementing [`GatewayEvent`] and holds an [`EventListeners`] of that
//! type; this module only provides the plumbing.

#[cfg(feature = "tracing")]
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Trait for events emitted by `provider-gateway` components.
pub trait GatewayEvent: Send + Sync + fmt::Debug {
    /// A short, stable label for this event's kind (e.g. `"retry"`,
    /// `"preemptive_wait"`).
    fn event_type(&self) -> &'static str;

    /// When this event occurred.
    fn timestamp(&self) -> Instant;

    /// The provider this event concerns.
    fn provider(&self) -> &str;
}

/// Trait for listening to gateway events.
pub trait EventListener<E: GatewayEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

pub type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// A collection of event listeners for one event type.
#[derive(Clone)]
pub struct EventListeners<E: GatewayEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: GatewayEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Emits an event to every registered listener.
    ///
    /// A panicking listener is caught so the remaining listeners still run;
    /// this is what lets the dispatcher install a debug-trace listener at
    /// runtime without risking a buggy listener taking the whole call down.
    pub fn emit(&self, event: &E) {
        for (index, listener) in self.listeners.iter().enumerate() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));

            if let Err(_panic_payload) = result {
                #[cfg(feature = "tracing")]
                log_listener_panic(index, event, _panic_payload.as_ref());

                #[cfg(feature = "metrics")]
                record_listener_panic_metric(event);

                #[cfg(not(feature = "tracing"))]
                let _ = index;

                #[cfg(not(feature = "tracing"))]
                let _ = _panic_payload;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: GatewayEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A simple function-based event listener.
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _phantom: std::marker::PhantomData<E>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: GatewayEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}

#[cfg(feature = "tracing")]
fn log_listener_panic<E: GatewayEvent>(index: usize, event: &E, panic_payload: &(dyn Any + Send)) {
    let panic_message = panic_payload
        .downcast_ref::<&'static str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic_payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());

    tracing::warn!(
        listener_index = index,
        provider = event.provider(),
        event_type = event.event_type(),
        panic_message = %panic_message,
        "provider-gateway event listener panicked"
    );
}

#[cfg(feature = "metrics")]
fn record_listener_panic_metric<E: GatewayEvent>(event: &E) {
    let provider_label = event.provider().to_string();
    let event_type_label = event.event_type().to_string();

    metrics::counter!(
        "provider_gateway_event_listener_panics_total",
        "provider" => provider_label,
        "event_type" => event_type_label
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestEvent {
        provider: String,
        at: Instant,
    }

    impl GatewayEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            "test"
        }

        fn timestamp(&self) -> Instant {
            self.at
        }

        fn provider(&self) -> &str {
            &self.provider
        }
    }

    #[test]
    fn empty_collection_reports_empty() {
        let listeners: EventListeners<TestEvent> = EventListeners::new();
        assert!(listeners.is_empty());
        assert_eq!(listeners.len(), 0);
    }

    #[test]
    fn emits_to_all_listeners() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut listeners = EventListeners::new();

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            listeners.add(FnListener::new(move |_: &TestEvent| {
                calls.fetch_add(1, Ordering::SeqCst);
            }));
        }

        listeners.emit(&TestEvent {
            provider: "p".to_string(),
            at: Instant::now(),
        });

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn a_panicking_listener_does_not_stop_the_rest() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut listeners = EventListeners::new();

        listeners.add(FnListener::new(|_: &TestEvent| {
            panic!("boom");
        }));

        let after = Arc::clone(&calls);
        listeners.add(FnListener::new(move |_: &TestEvent| {
            after.fetch_add(1, Ordering::SeqCst);
        }));

        listeners.emit(&TestEvent {
            provider: "p".to_string(),
            at: Instant::now(),
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
