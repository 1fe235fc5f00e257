//! Named-event subscription
//!
//! Handlers run synchronously on the emitting task, in registration order.
//! A panicking handler is logged and must not stop the handlers behind it.

use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Minimal named-event emitter
#[derive(Default)]
pub struct EventEmitter {
    handlers: RwLock<HashMap<String, Vec<Handler>>>,
}

impl EventEmitter {
    /// Create an emitter with no subscriptions
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event name
    pub fn on<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.into())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Invoke every handler registered for `name`, in registration order
    pub fn emit(&self, name: &str, payload: &Value) {
        // snapshot outside the lock so handlers may register more handlers
        let snapshot: Vec<Handler> = {
            let guard = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            match guard.get(name) {
                Some(list) => list.clone(),
                None => return,
            }
        };

        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(payload))).is_err() {
                tracing::error!(event = %name, "event handler panicked");
            }
        }
    }

    /// Number of handlers registered for an event name
    #[must_use]
    pub fn handler_count(&self, name: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("EventEmitter")
            .field("events", &guard.len())
            .finish_non_exhaustive()
    }
}
