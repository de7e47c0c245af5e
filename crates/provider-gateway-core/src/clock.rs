//! An injected time source.
//!
//! The state store, the controller, and any Retry-After parsing all read
//! `now()` through this trait so tests can substitute a fake clock instead
//! of sleeping in real time.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Provides the current time as epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// The default clock, backed by [`SystemTime::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the unix epoch")
            .as_millis() as i64
    }
}

/// A clock tests can advance manually.
#[derive(Debug, Clone)]
pub struct TestClock {
    millis: Arc<Mutex<i64>>,
}

impl TestClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            millis: Arc::new(Mutex::new(start_millis)),
        }
    }

    pub fn advance(&self, delta_millis: i64) {
        let mut guard = self.millis.lock().expect("test clock mutex poisoned");
        *guard += delta_millis;
    }

    pub fn set(&self, millis: i64) {
        *self.millis.lock().expect("test clock mutex poisoned") = millis;
    }
}

impl Clock for TestClock {
    fn now_millis(&self) -> i64 {
        *self.millis.lock().expect("test clock mutex poisoned")
    }
}
