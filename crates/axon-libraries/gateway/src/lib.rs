//! # Axon Library Interface: Gateway
//!
//! [`LibraryInterface`] for sources that forward raw gateway dispatches.
//!
//! ## Payload Shape
//!
//! Each dispatch is one flat JSON object, and upstream event names are the
//! upper-case gateway names:
//!
//! ```text
//! MESSAGE_CREATE
//! {
//!   "id": "1100", "channel_id": "2200", "guild_id": "3300",
//!   "author": { "id": "4400", "bot": false },
//!   "content": "hello"
//! }
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use axon_core::LocalEventSource;
//! use axon_library_gateway::GatewayLibrary;
//!
//! let source = Arc::new(LocalEventSource::new());
//! let library = GatewayLibrary::new(source.clone());
//! ```

pub mod handlers;

use axon_core::{
    Author, BoxedEventSource, EventBinding, EventName, LibraryInterface, LibraryType, Message,
    MessageEdit, Payload, ScopeId,
};
use serde_json::Value;
use tracing::debug;

/// Library interface for flat gateway payloads.
pub struct GatewayLibrary {
    source: BoxedEventSource,
}

impl GatewayLibrary {
    /// Wraps `source`.
    pub fn new(source: BoxedEventSource) -> Self {
        debug!(library = "gateway", "Library interface created");
        Self { source }
    }
}

impl LibraryInterface for GatewayLibrary {
    fn library_type(&self) -> LibraryType {
        LibraryType::Gateway
    }

    fn source(&self) -> &BoxedEventSource {
        &self.source
    }

    fn bindings(&self) -> &'static [EventBinding] {
        &handlers::BINDINGS
    }

    fn message(&self, event: EventName, payload: &Payload) -> Option<Message> {
        match event {
            EventName::MessageCreate | EventName::MessageUpdate | EventName::MessageDelete => {
                parse_message(payload.first()?)
            }
            _ => None,
        }
    }

    fn message_edit(&self, payload: &Payload) -> Option<MessageEdit> {
        parse_edit(payload.first()?)
    }
}

/// Reads a gateway message object.
///
/// Delete and partial update dispatches only carry ids; missing author and
/// content fields are left empty.
fn parse_message(value: &Value) -> Option<Message> {
    Some(Message {
        id: id_string(value.get("id")?)?,
        channel_id: id_string(value.get("channel_id")?)?,
        guild_id: value.get("guild_id").and_then(ScopeId::from_value),
        author: value
            .get("author")
            .map(|author| Author {
                id: author.get("id").and_then(id_string).unwrap_or_default(),
                bot: author.get("bot").and_then(Value::as_bool).unwrap_or(false),
            })
            .unwrap_or_default(),
        content: value
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Reads an edit, keeping only the author and content the payload carries.
fn parse_edit(value: &Value) -> Option<MessageEdit> {
    let message = parse_message(value)?;
    Some(MessageEdit {
        author: value
            .get("author")
            .filter(|author| author.is_object())
            .map(|_| message.author),
        content: value
            .get("content")
            .and_then(Value::as_str)
            .map(|_| message.content),
        id: message.id,
        channel_id: message.channel_id,
        guild_id: message.guild_id,
    })
}

fn id_string(value: &Value) -> Option<String> {
    ScopeId::from_value(value).map(|id| id.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axon_core::{LocalEventSource, UpstreamHandler};
    use serde_json::json;
    use std::sync::Arc;

    fn library() -> (Arc<LocalEventSource>, GatewayLibrary) {
        let source = Arc::new(LocalEventSource::with_user_id("1"));
        let library = GatewayLibrary::new(source.clone());
        (source, library)
    }

    #[test]
    fn test_resolve_scope_for_guild_and_direct_messages() {
        let (_, library) = library();

        let in_guild = Payload::new(json!({"id": "10", "channel_id": "20", "guild_id": "30"}));
        let direct = Payload::new(json!({"id": "10", "channel_id": "20"}));
        assert_eq!(
            library.resolve_scope(EventName::MessageCreate, &in_guild),
            Some(ScopeId::new("30"))
        );
        assert_eq!(library.resolve_scope(EventName::MessageCreate, &direct), None);
    }

    #[test]
    fn test_guild_events_resolve_to_their_own_id() {
        let (_, library) = library();
        let guild = Payload::new(json!({"id": "30", "name": "axon", "unavailable": false}));
        assert_eq!(
            library.resolve_scope(EventName::GuildCreate, &guild),
            Some(ScopeId::new("30"))
        );
        assert_eq!(library.resolve_scope(EventName::UserUpdate, &guild), None);
    }

    #[test]
    fn test_subscribe_binds_upstream_name() {
        let (source, library) = library();
        let handler = UpstreamHandler::new(|_| {});

        library
            .subscribe(EventName::MessageReactionAdd, handler.clone())
            .unwrap();
        assert_eq!(source.handler_count("MESSAGE_REACTION_ADD"), 1);

        assert!(library.unsubscribe(EventName::MessageReactionAdd, &handler));
        assert_eq!(source.subscription_count(), 0);
    }

    #[test]
    fn test_message_normalization() {
        let (_, library) = library();
        let payload = Payload::new(json!({
            "id": "10",
            "channel_id": 20u64,
            "guild_id": "30",
            "author": {"id": "40", "bot": true},
            "content": "Hello"
        }));

        let message = library.message(EventName::MessageCreate, &payload).unwrap();
        assert_eq!(message.id, "10");
        assert_eq!(message.channel_id, "20");
        assert_eq!(message.guild_id, Some(ScopeId::new("30")));
        assert_eq!(message.author.id, "40");
        assert!(message.author.bot);
        assert_eq!(message.content, "Hello");

        let deleted = Payload::new(json!({"id": "10", "channel_id": "20"}));
        let message = library.message(EventName::MessageDelete, &deleted).unwrap();
        assert!(message.is_direct());
        assert!(message.content.is_empty());

        assert!(library.message(EventName::TypingStart, &payload).is_none());
        assert!(
            library
                .message(EventName::MessageCreate, &Payload::new(json!({"id": "10"})))
                .is_none()
        );
    }

    #[test]
    fn test_partial_update_carries_only_present_fields() {
        let (_, library) = library();
        let embed_only = Payload::new(json!({
            "id": "10",
            "channel_id": "20",
            "guild_id": "30",
            "embeds": []
        }));
        let edit = library.message_edit(&embed_only).unwrap();
        assert_eq!(edit.id, "10");
        assert!(edit.author.is_none());
        assert!(edit.content.is_none());

        let full = Payload::new(json!({
            "id": "10",
            "channel_id": "20",
            "author": {"id": "40"},
            "content": ""
        }));
        let edit = library.message_edit(&full).unwrap();
        assert_eq!(edit.author.unwrap().id, "40");
        assert_eq!(edit.content.as_deref(), Some(""));
    }

    #[test]
    fn test_self_id_comes_from_source() {
        let (_, library) = library();
        assert_eq!(library.self_id().as_deref(), Some("1"));
    }
}
