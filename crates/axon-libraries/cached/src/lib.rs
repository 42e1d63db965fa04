//! # Axon Library Interface: Cached
//!
//! [`LibraryInterface`] for sources backed by a caching client, where
//! events deliver resolved objects as positional arguments and upstream
//! event names are camelCase.
//!
//! ## Payload Shape
//!
//! ```text
//! messageUpdate(message, oldMessage)
//!   message = {
//!     "id": "1100",
//!     "channel": { "id": "2200", "guild": { "id": "3300" } },
//!     "author": { "id": "4400", "bot": false },
//!     "content": "hello"
//!   }
//!
//! guildMemberAdd(guild, member)
//! ```

pub mod handlers;

use axon_core::{
    Author, BoxedEventSource, EventBinding, EventName, LibraryInterface, LibraryType, Message,
    MessageEdit, Payload, ScopeId,
};
use serde_json::Value;
use tracing::debug;

/// Library interface for cached object-graph payloads.
pub struct CachedLibrary {
    source: BoxedEventSource,
}

impl CachedLibrary {
    /// Wraps `source`.
    pub fn new(source: BoxedEventSource) -> Self {
        debug!(library = "cached", "Library interface created");
        Self { source }
    }
}

impl LibraryInterface for CachedLibrary {
    fn library_type(&self) -> LibraryType {
        LibraryType::Cached
    }

    fn source(&self) -> &BoxedEventSource {
        &self.source
    }

    fn bindings(&self) -> &'static [EventBinding] {
        &handlers::BINDINGS
    }

    fn message(&self, event: EventName, payload: &Payload) -> Option<Message> {
        match event {
            // messageUpdate passes the new message first
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

/// Reads a cached message object.
///
/// Uncached deletions only carry `id` and `channel`; the author and content
/// are then left empty.
fn parse_message(value: &Value) -> Option<Message> {
    let channel = value.get("channel")?;
    Some(Message {
        id: id_string(value.get("id")?)?,
        channel_id: id_string(channel.get("id")?)?,
        guild_id: channel.pointer("/guild/id").and_then(ScopeId::from_value),
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

    fn library() -> (Arc<LocalEventSource>, CachedLibrary) {
        let source = Arc::new(LocalEventSource::new());
        let library = CachedLibrary::new(source.clone());
        (source, library)
    }

    fn message(guild: Option<&str>, content: &str) -> Value {
        let mut channel = json!({"id": "20"});
        if let Some(guild) = guild {
            channel["guild"] = json!({"id": guild});
        }
        json!({
            "id": "10",
            "channel": channel,
            "author": {"id": "40", "bot": false},
            "content": content
        })
    }

    #[test]
    fn test_resolve_scope_matches_gateway_semantics() {
        let (_, library) = library();
        let in_guild = Payload::new(message(Some("30"), "hi"));
        let direct = Payload::new(message(None, "hi"));

        assert_eq!(
            library.resolve_scope(EventName::MessageCreate, &in_guild),
            Some(ScopeId::new("30"))
        );
        assert_eq!(library.resolve_scope(EventName::MessageCreate, &direct), None);
        assert_eq!(library.resolve_scope(EventName::Ready, &in_guild), None);
    }

    #[test]
    fn test_update_normalizes_new_message() {
        let (_, library) = library();
        let payload = Payload::from_args(vec![
            message(Some("30"), "after"),
            message(Some("30"), "before"),
        ]);

        let message = library.message(EventName::MessageUpdate, &payload).unwrap();
        assert_eq!(message.content, "after");
        assert_eq!(message.channel_id, "20");
        assert_eq!(message.guild_id, Some(ScopeId::new("30")));
        assert_eq!(message.author.id, "40");
    }

    #[test]
    fn test_partial_edit_omits_missing_author_and_content() {
        let (_, library) = library();
        let payload = Payload::from_args(vec![
            json!({"id": "10", "channel": {"id": "20", "guild": {"id": "30"}}}),
            message(Some("30"), "before"),
        ]);

        let edit = library.message_edit(&payload).unwrap();
        assert_eq!(edit.id, "10");
        assert_eq!(edit.guild_id, Some(ScopeId::new("30")));
        assert!(edit.author.is_none());
        assert!(edit.content.is_none());
    }

    #[test]
    fn test_uncached_delete_has_ids_only() {
        let (_, library) = library();
        let payload = Payload::new(json!({"id": "10", "channel": {"id": "20"}}));
        let message = library.message(EventName::MessageDelete, &payload).unwrap();
        assert_eq!(message.id, "10");
        assert!(message.author.id.is_empty());
    }

    #[test]
    fn test_subscribe_binds_camel_case_name() {
        let (source, library) = library();
        let handler = UpstreamHandler::new(|_| {});

        library
            .subscribe(EventName::GuildMemberAdd, handler.clone())
            .unwrap();
        assert_eq!(source.handler_count("guildMemberAdd"), 1);
        assert_eq!(source.handler_count("GUILD_MEMBER_ADD"), 0);
        assert!(library.unsubscribe(EventName::GuildMemberAdd, &handler));
    }
}
