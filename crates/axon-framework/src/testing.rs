//! Test doubles shared by the unit tests of this crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axon_core::{BoxedLibrary, EventSource, LocalEventSource, Payload, UpstreamHandler};
use axon_library_gateway::GatewayLibrary;
use serde_json::{Value, json};

use crate::event_manager::EventManager;
use crate::gate::{AllowAll, BoxedGate};

/// Event source that counts upstream subscribe/unsubscribe calls.
#[derive(Default)]
pub struct RecordingSource {
    inner: LocalEventSource,
    subscribes: AtomicUsize,
    unsubscribes: AtomicUsize,
}

impl RecordingSource {
    pub fn new(user_id: &str) -> Arc<Self> {
        let source = Self::default();
        source.inner.set_user_id(user_id);
        Arc::new(source)
    }

    pub fn emit(&self, event: &str, payload: impl Into<Payload>) -> usize {
        self.inner.emit(event, payload)
    }

    pub fn subscribes(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    pub fn unsubscribes(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }

    /// Bindings currently held upstream.
    pub fn active(&self) -> usize {
        self.inner.subscription_count()
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.inner.handler_count(event)
    }
}

impl EventSource for RecordingSource {
    fn subscribe(&self, event: &str, handler: UpstreamHandler) {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribe(event, handler);
    }

    fn unsubscribe(&self, event: &str, handler: &UpstreamHandler) -> bool {
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
        self.inner.unsubscribe(event, handler)
    }

    fn user_id(&self) -> Option<String> {
        self.inner.user_id()
    }
}

/// Id of the bot account in test sources.
pub const SELF_ID: &str = "100000000000000000";

/// A gateway-backed event manager over a fresh recording source.
pub fn event_manager_with(gate: BoxedGate) -> (Arc<RecordingSource>, Arc<EventManager>) {
    let source = RecordingSource::new(SELF_ID);
    let library: BoxedLibrary = Arc::new(GatewayLibrary::new(source.clone()));
    (source, Arc::new(EventManager::new(library, gate)))
}

pub fn event_manager() -> (Arc<RecordingSource>, Arc<EventManager>) {
    event_manager_with(Arc::new(AllowAll))
}

/// A gateway `MESSAGE_CREATE` payload.
pub fn message(id: &str, channel: &str, guild: Option<&str>, author: &str, content: &str) -> Value {
    let mut message = json!({
        "id": id,
        "channel_id": channel,
        "author": {"id": author, "bot": false},
        "content": content,
    });
    if let Some(guild) = guild {
        message["guild_id"] = json!(guild);
    }
    message
}
