use std::sync::Arc;

use tracing::debug;

use super::{EntityRegistry, Registry};
use crate::error::RegistryResult;
use crate::event_manager::EventManager;
use crate::listener::Listener;

/// Registry of listeners, kept in sync with the [`EventManager`].
///
/// A listener is in this registry if and only if the event manager
/// dispatches to it.
pub struct ListenerRegistry {
    listeners: EntityRegistry<Listener>,
    events: Arc<EventManager>,
}

impl ListenerRegistry {
    pub fn new(events: Arc<EventManager>) -> Self {
        Self {
            listeners: EntityRegistry::new(),
            events,
        }
    }

    pub fn event_manager(&self) -> &Arc<EventManager> {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Labels in registration order.
    pub fn labels(&self) -> Vec<String> {
        self.listeners.labels()
    }
}

impl Registry for ListenerRegistry {
    type Entity = Listener;

    fn register(&self, listener: Listener) -> RegistryResult<Arc<Listener>> {
        let listener = Arc::new(listener);
        self.listeners.register(Arc::clone(&listener))?;

        if let Err(e) = self.events.register_listener(Arc::clone(&listener)) {
            // Roll back so a failed subscription leaves no dangling entry.
            let _ = self.listeners.unregister(listener.label());
            return Err(e);
        }
        Ok(listener)
    }

    fn unregister(&self, label: &str) -> RegistryResult<Arc<Listener>> {
        let listener = self.listeners.unregister(label)?;
        self.events.unregister_listener(listener.event(), label);

        debug!(
            listener = %label,
            module = %listener.module(),
            "Listener removed from registry"
        );
        Ok(listener)
    }

    fn get(&self, label: &str) -> Option<Arc<Listener>> {
        self.listeners.get(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::testing;
    use axon_core::EventName;

    fn listener(label: &str, event: EventName) -> Listener {
        Listener::new(label, event, |_| async { Ok(()) })
    }

    #[tokio::test]
    async fn test_register_binds_and_unregister_unbinds() {
        let (source, events) = testing::event_manager();
        let registry = ListenerRegistry::new(Arc::clone(&events));

        registry
            .register(listener("log", EventName::MessageCreate))
            .unwrap();
        assert_eq!(registry.labels(), ["log"]);
        assert_eq!(events.listener_count(EventName::MessageCreate), 1);
        assert_eq!(source.active(), 1);

        registry.unregister("log").unwrap();
        assert!(registry.is_empty());
        assert_eq!(events.listener_count(EventName::MessageCreate), 0);
        assert_eq!(source.active(), 0);
        assert!(registry.unregister("log").unwrap_err().is_not_registered());
    }

    #[tokio::test]
    async fn test_event_manager_clash_leaves_no_registry_entry() {
        let (source, events) = testing::event_manager();
        let registry = ListenerRegistry::new(Arc::clone(&events));

        // listed on the event manager directly, unknown to the registry
        events
            .register_listener(Arc::new(listener("log", EventName::MessageCreate)))
            .unwrap();
        let subscribes = source.subscribes();

        let err = registry
            .register(listener("log", EventName::MessageCreate))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRegistration { .. }));
        assert!(registry.get("log").is_none());
        assert!(registry.is_empty());
        assert_eq!(events.listener_count(EventName::MessageCreate), 1);
        assert_eq!(source.subscribes(), subscribes);
        assert_eq!(source.active(), 1);

        // the label is free in the registry for another event
        registry
            .register(listener("log", EventName::MessageDelete))
            .unwrap();
        assert_eq!(registry.get("log").unwrap().event(), EventName::MessageDelete);
    }
}
