//! Event listeners.
//!
//! A [`Listener`] reacts to one internal [`EventName`]. Its execution logic
//! is a closure returning a future:
//!
//! ```rust,ignore
//! let listener = Listener::new("welcome", EventName::GuildMemberAdd, |ctx| async move {
//!     tracing::info!(scope = ?ctx.scope, "Member joined");
//!     Ok(())
//! });
//! ```
//!
//! The closure itself is invoked synchronously while the event is being
//! dispatched, in registration order. The returned future is then spawned,
//! so dispatch never waits for a listener's asynchronous work.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axon_core::{EventName, Payload, ScopeId};
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::registry::Entity;

/// Future returned by listener execution logic.
pub type ListenerFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Type-erased listener execution logic.
pub type ListenerFn = Arc<dyn Fn(ListenerContext) -> ListenerFuture + Send + Sync>;

/// What a listener receives for one event occurrence.
#[derive(Debug, Clone)]
pub struct ListenerContext {
    /// The internal event name.
    pub event: EventName,
    /// Scope resolved by the library interface, `None` outside guilds.
    pub scope: Option<ScopeId>,
    /// Raw upstream arguments.
    pub payload: Payload,
}

/// A labelled reaction to one internal event.
#[derive(Clone)]
pub struct Listener {
    label: String,
    event: EventName,
    module: String,
    description: String,
    bypass_gate: bool,
    execute: ListenerFn,
}

impl Listener {
    /// Creates a listener for `event` running `f`.
    pub fn new<F, Fut>(label: impl Into<String>, event: EventName, f: F) -> Self
    where
        F: Fn(ListenerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            label: label.into(),
            event,
            module: String::new(),
            description: String::new(),
            bypass_gate: false,
            execute: Arc::new(move |ctx| f(ctx).boxed()),
        }
    }

    /// Sets the description shown in listings.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Skips scope enablement checks for this listener.
    pub fn bypass_gate(mut self, bypass: bool) -> Self {
        self.bypass_gate = bypass;
        self
    }

    /// Sets the owning module label.
    ///
    /// Set by the listener loader when the listener is loaded through a module.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn event(&self) -> EventName {
        self.event
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn bypasses_gate(&self) -> bool {
        self.bypass_gate
    }

    /// Runs the synchronous part of the execution logic and returns the
    /// remaining work.
    pub fn invoke(&self, ctx: ListenerContext) -> ListenerFuture {
        (self.execute)(ctx)
    }
}

impl Entity for Listener {
    const KIND: &'static str = "listener";

    fn label(&self) -> &str {
        &self.label
    }

    fn module(&self) -> &str {
        &self.module
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("label", &self.label)
            .field("event", &self.event)
            .field("module", &self.module)
            .field("bypass_gate", &self.bypass_gate)
            .finish_non_exhaustive()
    }
}
