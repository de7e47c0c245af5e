//! The runtime debug toggle.
//!
//! Debug state is process-global to a [`crate::Gateway`] instance, not to
//! the whole process — each `Gateway` owns its own flag, and concurrent
//! toggling is permitted since it's backed by an atomic.

use crate::events::ControllerEvent;
use provider_gateway_core::events::{EventListeners, FnListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Installs the built-in formatting listener, gated on `flag`. The listener
/// is always present in the collection; whether it prints anything is
/// decided per-event by reading the flag, which is what lets
/// `Gateway::set_debug` be a single atomic store rather than a listener
/// add/remove dance.
pub fn install_default_listener(events: &mut EventListeners<ControllerEvent>, flag: Arc<AtomicBool>) {
    events.add(FnListener::new(move |event: &ControllerEvent| {
        if !flag.load(Ordering::Relaxed) {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(target: "provider_gateway", "{event}");

        #[cfg(not(feature = "tracing"))]
        eprintln!("provider_gateway: {event}");
    }));
}
