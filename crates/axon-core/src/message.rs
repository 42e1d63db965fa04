//! Normalized chat message.
//!
//! Both supported library shapes describe messages differently; each
//! [`LibraryInterface`](crate::LibraryInterface) converts its own shape into
//! this struct so that consumers such as the message collector are written
//! once.

use serde::{Deserialize, Serialize};

use crate::event::ScopeId;

/// Author of a [`Message`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// User id.
    pub id: String,
    /// Whether the author is a bot account.
    #[serde(default)]
    pub bot: bool,
}

/// A message in the shape shared by every library interface.
///
/// Deletion payloads may lack author and content; those fields are then
/// left at their defaults. Edits are described by [`MessageEdit`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message id.
    pub id: String,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Guild the channel belongs to, `None` for direct messages.
    #[serde(default)]
    pub guild_id: Option<ScopeId>,
    /// Message author.
    #[serde(default)]
    pub author: Author,
    /// Text content.
    #[serde(default)]
    pub content: String,
}

impl Message {
    /// Returns `true` when the message was posted outside any guild.
    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }
}

/// The fields an update payload actually carries.
///
/// Upstream edits are often partial (an embed resolving, a pin), so author
/// and content are only present when the payload includes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEdit {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub guild_id: Option<ScopeId>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub content: Option<String>,
}

impl MessageEdit {
    /// Applies the carried fields on top of `stored`.
    pub fn apply(self, stored: &Message) -> Message {
        Message {
            id: self.id,
            channel_id: self.channel_id,
            guild_id: self.guild_id.or_else(|| stored.guild_id.clone()),
            author: self.author.unwrap_or_else(|| stored.author.clone()),
            content: self.content.unwrap_or_else(|| stored.content.clone()),
        }
    }
}

impl From<Message> for MessageEdit {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            guild_id: message.guild_id,
            author: Some(message.author),
            content: Some(message.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Message {
        Message {
            id: "10".into(),
            channel_id: "20".into(),
            guild_id: Some(ScopeId::new("30")),
            author: Author {
                id: "40".into(),
                bot: false,
            },
            content: "original".into(),
        }
    }

    #[test]
    fn test_partial_edit_keeps_stored_fields() {
        let edit = MessageEdit {
            id: "10".into(),
            channel_id: "20".into(),
            ..MessageEdit::default()
        };
        assert_eq!(edit.apply(&stored()), stored());
    }

    #[test]
    fn test_edit_replaces_carried_fields() {
        let edit = MessageEdit {
            id: "10".into(),
            channel_id: "20".into(),
            content: Some(String::new()),
            ..MessageEdit::default()
        };
        let edited = edit.apply(&stored());
        assert_eq!(edited.content, "");
        assert_eq!(edited.author.id, "40");
    }
}
