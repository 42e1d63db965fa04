//! Listener subscription table and event dispatch.
//!
//! [`EventManager`] is the only component that calls the library's
//! `subscribe` / `unsubscribe`. It keeps one upstream binding per internal
//! event, no matter how many listeners share it:
//!
//! ```text
//! register_listener(a: MessageCreate)  ──► subscribe("MESSAGE_CREATE")   [0 → 1]
//! register_listener(b: MessageCreate)  ──► (append only)                 [1 → 2]
//! unregister_listener(MessageCreate,a) ──► (remove only)                 [2 → 1]
//! unregister_listener(MessageCreate,b) ──► unsubscribe("MESSAGE_CREATE") [1 → 0]
//! ```
//!
//! # Dispatch
//!
//! For each upstream occurrence the scope is resolved once, then every
//! listener for the event is visited in registration order. A listener whose
//! module is disabled in the resolved scope is skipped unless it bypasses
//! the gate. Each listener's closure runs inline; the future it returns is
//! spawned onto the current Tokio runtime, so no listener waits for another.
//!
//! # Ownership
//!
//! The subscription table is shared with the dispatch closures through a
//! weak reference; dropping the manager releases every upstream binding.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Weak};

use axon_core::{BoxedLibrary, EventName, LibraryError, Payload, ScopeResolver, UpstreamHandler};
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tracing::{Level, debug, error, info, span, trace, warn};

use crate::error::{RegistryError, RegistryResult};
use crate::gate::{BoxedGate, ScopeGate};
use crate::listener::{Listener, ListenerContext};
use crate::registry::Entity;

/// One upstream binding and the listeners it fans out to.
struct Subscription {
    handler: UpstreamHandler,
    listeners: Vec<Arc<Listener>>,
}

type SubscriptionTable = RwLock<HashMap<EventName, Subscription>>;

/// Process-wide subscription table.
///
/// Shared as `Arc<EventManager>`; registries and collectors go through
/// [`register_listener`](Self::register_listener) and
/// [`unregister_listener`](Self::unregister_listener) only.
pub struct EventManager {
    library: BoxedLibrary,
    gate: BoxedGate,
    table: Arc<SubscriptionTable>,
}

impl EventManager {
    /// Creates a manager dispatching events from `library`, gated by `gate`.
    pub fn new(library: BoxedLibrary, gate: BoxedGate) -> Self {
        Self {
            library,
            gate,
            table: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn library(&self) -> &BoxedLibrary {
        &self.library
    }

    pub fn gate(&self) -> &BoxedGate {
        &self.gate
    }

    /// Adds `listener` to the dispatch list of its event.
    ///
    /// The first listener of an event binds the upstream event. Fails if a
    /// listener with the same label is already listed for the event, or if
    /// the library cannot bind the event.
    pub fn register_listener(&self, listener: Arc<Listener>) -> RegistryResult<()> {
        let event = listener.event();
        let mut table = self.table.write();

        match table.entry(event) {
            Entry::Occupied(mut entry) => {
                let listeners = &mut entry.get_mut().listeners;
                if listeners.iter().any(|l| l.label() == listener.label()) {
                    return Err(RegistryError::DuplicateRegistration {
                        kind: Listener::KIND,
                        label: listener.label().to_string(),
                        module: listener.module().to_string(),
                    });
                }
                listeners.push(Arc::clone(&listener));
            }
            Entry::Vacant(entry) => {
                let binding =
                    self.library
                        .binding(event)
                        .ok_or_else(|| LibraryError::UnsupportedEvent {
                            event,
                            library: self.library.name(),
                        })?;
                let handler = self.dispatch_handler(event, binding.resolver);
                self.library.subscribe(event, handler.clone())?;
                entry.insert(Subscription {
                    handler,
                    listeners: vec![Arc::clone(&listener)],
                });
                info!(
                    event = %event,
                    upstream = binding.upstream,
                    library = self.library.name(),
                    "Listener bound"
                );
            }
        }

        info!(
            listener = %listener.label(),
            event = %event,
            module = %listener.module(),
            "Listener registered"
        );
        Ok(())
    }

    /// Removes the listener labelled `label` from `event`.
    ///
    /// The last listener of an event unbinds the upstream event. Returns
    /// `false` if no such listener was listed; calling this twice is
    /// harmless.
    pub fn unregister_listener(&self, event: EventName, label: &str) -> bool {
        let mut table = self.table.write();
        let Some(subscription) = table.get_mut(&event) else {
            return false;
        };

        let before = subscription.listeners.len();
        subscription.listeners.retain(|l| l.label() != label);
        let removed = subscription.listeners.len() != before;

        if subscription.listeners.is_empty()
            && let Some(subscription) = table.remove(&event)
        {
            self.library.unsubscribe(event, &subscription.handler);
            info!(event = %event, library = self.library.name(), "Listener unbound");
        }

        if removed {
            info!(listener = %label, event = %event, "Listener unregistered");
        }
        removed
    }

    /// Listeners of `event` in dispatch order.
    pub fn listeners(&self, event: EventName) -> Vec<Arc<Listener>> {
        self.table
            .read()
            .get(&event)
            .map(|s| s.listeners.clone())
            .unwrap_or_default()
    }

    pub fn listener_count(&self, event: EventName) -> usize {
        self.table.read().get(&event).map_or(0, |s| s.listeners.len())
    }

    /// Events currently bound upstream.
    pub fn bound_events(&self) -> Vec<EventName> {
        let table = self.table.read();
        EventName::ALL
            .into_iter()
            .filter(|event| table.contains_key(event))
            .collect()
    }

    /// Unbinds every event and forgets all listeners.
    pub fn clear(&self) {
        let drained: Vec<(EventName, Subscription)> = self.table.write().drain().collect();
        for (event, subscription) in drained {
            self.library.unsubscribe(event, &subscription.handler);
            debug!(
                event = %event,
                listeners = subscription.listeners.len(),
                "Listener unbound on clear"
            );
        }
    }

    fn dispatch_handler(&self, event: EventName, resolver: ScopeResolver) -> UpstreamHandler {
        let table = Arc::downgrade(&self.table);
        let gate = Arc::clone(&self.gate);
        UpstreamHandler::new(move |payload| dispatch(&table, gate.as_ref(), event, resolver, payload))
    }
}

impl Drop for EventManager {
    fn drop(&mut self) {
        self.clear();
    }
}

fn dispatch(
    table: &Weak<SubscriptionTable>,
    gate: &dyn ScopeGate,
    event: EventName,
    resolver: ScopeResolver,
    payload: Payload,
) {
    let Some(table) = table.upgrade() else {
        return;
    };
    // Snapshot so listeners may (un)register while being dispatched to.
    let listeners = match table.read().get(&event) {
        Some(subscription) => subscription.listeners.clone(),
        None => return,
    };
    drop(table);

    let scope = resolver(&payload);
    let span = span!(Level::DEBUG, "dispatch", event = %event, scope = ?scope);
    let _enter = span.enter();

    let runtime = Handle::try_current().ok();
    for listener in listeners {
        if let Some(scope) = &scope
            && !listener.bypasses_gate()
            && !gate.is_enabled(scope, listener.module(), listener.label())
        {
            trace!(listener = %listener.label(), "Listener disabled in scope, skipped");
            continue;
        }

        let work = listener.invoke(ListenerContext {
            event,
            scope: scope.clone(),
            payload: payload.clone(),
        });

        let Some(runtime) = &runtime else {
            warn!(
                listener = %listener.label(),
                "No async runtime available, listener work dropped"
            );
            continue;
        };
        let label = listener.label().to_string();
        runtime.spawn(async move {
            if let Err(e) = work.await {
                error!(listener = %label, event = %event, error = %e, "Listener execution failed");
            }
        });
    }
}
