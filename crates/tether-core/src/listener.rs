//! Listener registration and event fan-out.
//!
//! The registry is safe to mutate from any thread, including from inside a
//! listener callback while a dispatch is in progress: dispatch iterates a
//! snapshot of the registered set, never the live map.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::warn;

use crate::events::{GatewayError, SessionEvent};

/// Callbacks a session observer can implement.
///
/// All methods default to no-ops so observers only implement what they need.
pub trait RealTimeListener: Send + Sync {
    /// The handshake completed; the session is operational.
    fn on_login_complete(&self) {}

    /// The gateway reported an error, during handshake or afterwards.
    fn on_error(&self, _error: &GatewayError) {}

    /// A domain event was decoded.
    fn on_event(&self, _event: &SessionEvent) {}
}

/// Handle identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Thread-safe set of session observers.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: DashMap<u64, Arc<dyn RealTimeListener>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener and return its handle.
    pub fn add(&self, listener: Arc<dyn RealTimeListener>) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.insert(id, listener);
        ListenerId(id)
    }

    /// Deregister a listener.
    ///
    /// Returns `true` if the listener was registered; removing an absent
    /// listener is a no-op.
    pub fn remove(&self, id: ListenerId) -> bool {
        self.listeners.remove(&id.0).is_some()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Notify every listener that the handshake completed.
    pub fn dispatch_login(&self) {
        self.dispatch_with(|listener| listener.on_login_complete());
    }

    /// Notify every listener of a gateway error.
    pub fn dispatch_error(&self, error: &GatewayError) {
        self.dispatch_with(|listener| listener.on_error(error));
    }

    /// Notify every listener of a domain event.
    pub fn dispatch_event(&self, event: &SessionEvent) {
        self.dispatch_with(|listener| listener.on_event(event));
    }

    /// Invoke a callback on a snapshot of the registered listeners.
    ///
    /// A panicking listener is contained and logged; delivery continues to
    /// the remaining listeners.
    fn dispatch_with(&self, mut call: impl FnMut(&dyn RealTimeListener)) {
        let snapshot: Vec<Arc<dyn RealTimeListener>> = self
            .listeners
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| call(listener.as_ref()))).is_err() {
                warn!("Listener panicked during dispatch");
            }
        }
    }
}
