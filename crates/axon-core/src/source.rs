//! Upstream event source contract.
//!
//! An [`EventSource`] is the live connection to the chat platform. Axon only
//! needs two primitives from it: `subscribe` and `unsubscribe`, both keyed
//! by the *upstream* event name (e.g. `"MESSAGE_CREATE"`).
//!
//! Handlers are first-class [`UpstreamHandler`] values with a stable
//! identity. Whoever subscribes keeps the handler value and passes the very
//! same value back to `unsubscribe`, so a handler can never be unbound by
//! accident or bound twice without noticing.
//!
//! [`LocalEventSource`] is an in-process implementation, used for tests and
//! for embedding Axon behind a custom gateway client that pushes events via
//! [`LocalEventSource::emit`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use crate::event::Payload;

/// Counter for handler identities; ids are never reused within a process.
static HANDLER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

type HandlerFn = dyn Fn(Payload) + Send + Sync;

// =============================================================================
// UpstreamHandler
// =============================================================================

/// A callable bound to an upstream event, compared by identity.
///
/// Clones share the same identity.
#[derive(Clone)]
pub struct UpstreamHandler {
    id: u64,
    f: Arc<HandlerFn>,
}

impl UpstreamHandler {
    /// Wraps `f` into a handler with a fresh identity.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Payload) + Send + Sync + 'static,
    {
        Self {
            id: HANDLER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            f: Arc::new(f),
        }
    }

    /// Returns the identity of this handler.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Invokes the handler.
    pub fn call(&self, payload: Payload) {
        (self.f)(payload);
    }
}

impl PartialEq for UpstreamHandler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for UpstreamHandler {}

impl fmt::Debug for UpstreamHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamHandler")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// EventSource
// =============================================================================

/// The upstream event source collaborator.
///
/// Implementations must tolerate `unsubscribe` being called from inside a
/// handler that is currently running.
pub trait EventSource: Send + Sync {
    /// Binds `handler` to the upstream event `event`.
    fn subscribe(&self, event: &str, handler: UpstreamHandler);

    /// Unbinds `handler` from `event`.
    ///
    /// Returns `false` when the handler was not bound.
    fn unsubscribe(&self, event: &str, handler: &UpstreamHandler) -> bool;

    /// Id of the account this source is connected as, once known.
    fn user_id(&self) -> Option<String> {
        None
    }
}

/// Shared pointer to an event source.
pub type BoxedEventSource = Arc<dyn EventSource>;

// =============================================================================
// LocalEventSource
// =============================================================================

/// An in-process event source.
///
/// Events are pushed with [`emit`](Self::emit) and delivered synchronously
/// to every bound handler in binding order.
#[derive(Default)]
pub struct LocalEventSource {
    handlers: RwLock<HashMap<String, Vec<UpstreamHandler>>>,
    user_id: RwLock<Option<String>>,
}

impl LocalEventSource {
    /// Creates a source with no bound handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source connected as `user_id`.
    pub fn with_user_id(user_id: impl Into<String>) -> Self {
        let source = Self::new();
        source.set_user_id(user_id);
        source
    }

    /// Records the account id once the connection is identified.
    pub fn set_user_id(&self, user_id: impl Into<String>) {
        *self.user_id.write() = Some(user_id.into());
    }

    /// Delivers `payload` to every handler bound to `event`.
    ///
    /// The handler list is snapshotted before delivery, so handlers may
    /// subscribe or unsubscribe while running. Returns the number of
    /// handlers invoked.
    pub fn emit(&self, event: &str, payload: impl Into<Payload>) -> usize {
        let handlers = self
            .handlers
            .read()
            .get(event)
            .cloned()
            .unwrap_or_default();
        let payload = payload.into();

        trace!(event = %event, handlers = handlers.len(), "Emitting upstream event");
        for handler in &handlers {
            handler.call(payload.clone());
        }
        handlers.len()
    }

    /// Number of handlers bound to `event`.
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.read().get(event).map_or(0, Vec::len)
    }

    /// Total number of bindings across all events.
    pub fn subscription_count(&self) -> usize {
        self.handlers.read().values().map(Vec::len).sum()
    }
}

impl EventSource for LocalEventSource {
    fn subscribe(&self, event: &str, handler: UpstreamHandler) {
        let mut handlers = self.handlers.write();
        let bound = handlers.entry(event.to_string()).or_default();
        if !bound.contains(&handler) {
            bound.push(handler);
        }
    }

    fn unsubscribe(&self, event: &str, handler: &UpstreamHandler) -> bool {
        let mut handlers = self.handlers.write();
        let Some(bound) = handlers.get_mut(event) else {
            return false;
        };
        let before = bound.len();
        bound.retain(|h| h != handler);
        let removed = bound.len() != before;
        if bound.is_empty() {
            handlers.remove(event);
        }
        removed
    }

    fn user_id(&self) -> Option<String> {
        self.user_id.read().clone()
    }
}

impl fmt::Debug for LocalEventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEventSource")
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_emit_reaches_bound_handlers_in_order() {
        let source = LocalEventSource::new();
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let log = Arc::clone(&log);
            source.subscribe(
                "MESSAGE_CREATE",
                UpstreamHandler::new(move |_| log.lock().push(tag)),
            );
        }

        assert_eq!(source.emit("MESSAGE_CREATE", json!({})), 2);
        assert_eq!(source.emit("MESSAGE_DELETE", json!({})), 0);
        assert_eq!(*log.lock(), ["first", "second"]);
    }

    #[test]
    fn test_unsubscribe_uses_handler_identity() {
        let source = LocalEventSource::new();
        let a = UpstreamHandler::new(|_| {});
        let b = UpstreamHandler::new(|_| {});

        source.subscribe("READY", a.clone());
        source.subscribe("READY", a.clone());
        assert_eq!(source.handler_count("READY"), 1);

        assert!(!source.unsubscribe("READY", &b));
        assert!(source.unsubscribe("READY", &a));
        assert!(!source.unsubscribe("READY", &a));
        assert_eq!(source.subscription_count(), 0);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself_while_running() {
        let source = Arc::new(LocalEventSource::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let slot: Arc<parking_lot::Mutex<Option<UpstreamHandler>>> = Arc::default();

        let handler = {
            let source = Arc::clone(&source);
            let calls = Arc::clone(&calls);
            let slot = Arc::clone(&slot);
            UpstreamHandler::new(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(me) = slot.lock().take() {
                    source.unsubscribe("TYPING_START", &me);
                }
            })
        };
        *slot.lock() = Some(handler.clone());
        source.subscribe("TYPING_START", handler);

        source.emit("TYPING_START", json!({}));
        source.emit("TYPING_START", json!({}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
