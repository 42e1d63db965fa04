//! Library interface contract.
//!
//! A [`LibraryInterface`] adapts one upstream client library to Axon's
//! internal taxonomy. For every supported [`EventName`] it declares an
//! [`EventBinding`]: the upstream event name to listen on, and the
//! [`ScopeResolver`] that extracts the guild scope from that event's raw
//! payload.
//!
//! ```text
//!                    ┌──────────────────────────────┐
//!  EventName ───────▶│ EventBinding                 │
//!                    │  upstream: "MESSAGE_CREATE"  │──▶ EventSource::subscribe
//!                    │  resolver: fn(&Payload)      │──▶ Option<ScopeId>
//!                    └──────────────────────────────┘
//! ```
//!
//! The interface is chosen once at startup from [`LibraryType`] and never
//! swapped while running.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, LibraryResult};
use crate::event::{EventName, Payload, ScopeId};
use crate::message::{Message, MessageEdit};
use crate::source::{BoxedEventSource, UpstreamHandler};

/// Extracts the scope of one upstream event from its raw payload.
///
/// Resolvers are total: unexpected shapes resolve to `None`, they never
/// panic.
pub type ScopeResolver = fn(&Payload) -> Option<ScopeId>;

/// Binding of one internal event to its upstream counterpart.
#[derive(Clone, Copy)]
pub struct EventBinding {
    /// Internal event name.
    pub event: EventName,
    /// Upstream event name on the source.
    pub upstream: &'static str,
    /// Scope resolver for the upstream payload.
    pub resolver: ScopeResolver,
}

impl fmt::Debug for EventBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinding")
            .field("event", &self.event)
            .field("upstream", &self.upstream)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// LibraryType
// =============================================================================

/// Configured choice of upstream library shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LibraryType {
    /// Raw gateway dispatch payloads: flat objects carrying `guild_id` and
    /// `channel_id` fields, upper-case event names.
    #[default]
    Gateway,
    /// Cache-backed client objects: nested `channel.guild` graphs,
    /// camelCase event names, positional arguments.
    Cached,
}

impl LibraryType {
    /// Returns the configuration name of this library type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gateway => "gateway",
            Self::Cached => "cached",
        }
    }
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LibraryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gateway" => Ok(Self::Gateway),
            "cached" => Ok(Self::Cached),
            other => Err(format!("unknown library type '{other}'")),
        }
    }
}

// =============================================================================
// LibraryInterface
// =============================================================================

/// Adapter between one upstream client library and the internal taxonomy.
pub trait LibraryInterface: Send + Sync {
    /// Which library shape this interface implements.
    fn library_type(&self) -> LibraryType;

    /// The underlying event source.
    fn source(&self) -> &BoxedEventSource;

    /// All event bindings supported by this library.
    fn bindings(&self) -> &'static [EventBinding];

    /// Normalizes a message create / update / delete payload.
    ///
    /// For updates the *new* message is returned. Returns `None` for other
    /// events and for payloads that do not look like a message.
    fn message(&self, event: EventName, payload: &Payload) -> Option<Message>;

    /// Normalizes a message update payload, keeping track of which fields
    /// it carries.
    ///
    /// Defaults to treating [`message`](Self::message) as a full edit.
    fn message_edit(&self, payload: &Payload) -> Option<MessageEdit> {
        self.message(EventName::MessageUpdate, payload).map(MessageEdit::from)
    }

    /// Human-readable name, used in logs.
    fn name(&self) -> &'static str {
        self.library_type().as_str()
    }

    /// Looks up the binding for `event`.
    fn binding(&self, event: EventName) -> Option<&'static EventBinding> {
        self.bindings().iter().find(|b| b.event == event)
    }

    /// Returns `true` if `event` can be subscribed to.
    fn supports(&self, event: EventName) -> bool {
        self.binding(event).is_some()
    }

    /// Resolves the scope of `payload` for `event`.
    ///
    /// Pure; unsupported events and malformed payloads resolve to `None`.
    fn resolve_scope(&self, event: EventName, payload: &Payload) -> Option<ScopeId> {
        self.binding(event).and_then(|b| (b.resolver)(payload))
    }

    /// Binds `handler` to the upstream counterpart of `event`.
    fn subscribe(&self, event: EventName, handler: UpstreamHandler) -> LibraryResult<()> {
        let binding = self
            .binding(event)
            .ok_or(LibraryError::UnsupportedEvent {
                event,
                library: self.name(),
            })?;
        self.source().subscribe(binding.upstream, handler);
        Ok(())
    }

    /// Unbinds `handler` from the upstream counterpart of `event`.
    ///
    /// Returns `false` if the event is unsupported or the handler was not
    /// bound.
    fn unsubscribe(&self, event: EventName, handler: &UpstreamHandler) -> bool {
        self.binding(event)
            .is_some_and(|b| self.source().unsubscribe(b.upstream, handler))
    }

    /// Id of the connected account, used to ignore the bot's own messages.
    fn self_id(&self) -> Option<String> {
        self.source().user_id()
    }
}

/// Shared pointer to a library interface.
pub type BoxedLibrary = std::sync::Arc<dyn LibraryInterface>;
