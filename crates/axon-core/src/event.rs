//! Internal event taxonomy for the Axon framework.
//!
//! Upstream client libraries disagree on event naming and payload shape.
//! Axon normalizes them into:
//!
//! - [`EventName`] - the internal event identifier listeners subscribe to
//! - [`ScopeId`] - the logical room (guild) an event occurred in
//! - [`Payload`] - the raw upstream arguments, cheap to clone
//!
//! ```text
//! "MESSAGE_CREATE" (gateway) ─┐
//!                             ├──▶ EventName::MessageCreate
//! "messageCreate"  (cached)  ─┘
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Event Names
// ============================================================================

/// Normalized event name, independent of the upstream library's naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    Ready,
    MessageCreate,
    MessageUpdate,
    MessageDelete,
    MessageDeleteBulk,
    MessageReactionAdd,
    MessageReactionRemove,
    MessageReactionRemoveAll,
    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,
    GuildCreate,
    GuildUpdate,
    GuildDelete,
    GuildBanAdd,
    GuildBanRemove,
    GuildMemberAdd,
    GuildMemberRemove,
    GuildMemberUpdate,
    GuildRoleCreate,
    GuildRoleUpdate,
    GuildRoleDelete,
    TypingStart,
    PresenceUpdate,
    VoiceStateUpdate,
    UserUpdate,
}

impl EventName {
    /// Every internal event, in declaration order.
    pub const ALL: [EventName; 26] = [
        Self::Ready,
        Self::MessageCreate,
        Self::MessageUpdate,
        Self::MessageDelete,
        Self::MessageDeleteBulk,
        Self::MessageReactionAdd,
        Self::MessageReactionRemove,
        Self::MessageReactionRemoveAll,
        Self::ChannelCreate,
        Self::ChannelUpdate,
        Self::ChannelDelete,
        Self::GuildCreate,
        Self::GuildUpdate,
        Self::GuildDelete,
        Self::GuildBanAdd,
        Self::GuildBanRemove,
        Self::GuildMemberAdd,
        Self::GuildMemberRemove,
        Self::GuildMemberUpdate,
        Self::GuildRoleCreate,
        Self::GuildRoleUpdate,
        Self::GuildRoleDelete,
        Self::TypingStart,
        Self::PresenceUpdate,
        Self::VoiceStateUpdate,
        Self::UserUpdate,
    ];

    /// Returns the snake_case identifier of this event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::MessageCreate => "message_create",
            Self::MessageUpdate => "message_update",
            Self::MessageDelete => "message_delete",
            Self::MessageDeleteBulk => "message_delete_bulk",
            Self::MessageReactionAdd => "message_reaction_add",
            Self::MessageReactionRemove => "message_reaction_remove",
            Self::MessageReactionRemoveAll => "message_reaction_remove_all",
            Self::ChannelCreate => "channel_create",
            Self::ChannelUpdate => "channel_update",
            Self::ChannelDelete => "channel_delete",
            Self::GuildCreate => "guild_create",
            Self::GuildUpdate => "guild_update",
            Self::GuildDelete => "guild_delete",
            Self::GuildBanAdd => "guild_ban_add",
            Self::GuildBanRemove => "guild_ban_remove",
            Self::GuildMemberAdd => "guild_member_add",
            Self::GuildMemberRemove => "guild_member_remove",
            Self::GuildMemberUpdate => "guild_member_update",
            Self::GuildRoleCreate => "guild_role_create",
            Self::GuildRoleUpdate => "guild_role_update",
            Self::GuildRoleDelete => "guild_role_delete",
            Self::TypingStart => "typing_start",
            Self::PresenceUpdate => "presence_update",
            Self::VoiceStateUpdate => "voice_state_update",
            Self::UserUpdate => "user_update",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name an internal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventName(pub String);

impl fmt::Display for UnknownEventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event name '{}'", self.0)
    }
}

impl std::error::Error for UnknownEventName {}

impl FromStr for EventName {
    type Err = UnknownEventName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| UnknownEventName(s.to_string()))
    }
}

// ============================================================================
// Scope
// ============================================================================

/// Identifier of the logical scope (guild) an event occurred in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    /// Creates a scope id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reads a scope id out of a JSON id field.
    ///
    /// Upstream ids arrive either as strings or as unsigned integers.
    /// Anything else (including empty strings) yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => n.as_u64().map(|n| Self(n.to_string())),
            _ => None,
        }
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ScopeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ============================================================================
// Payload
// ============================================================================

/// The raw arguments of one upstream event occurrence.
///
/// Gateway-style sources deliver a single JSON object; cached clients may
/// deliver several positional arguments (e.g. new and old message). The
/// arguments are shared behind an `Arc`, so cloning a payload for every
/// listener is cheap.
#[derive(Clone, PartialEq)]
pub struct Payload {
    args: Arc<[Value]>,
}

impl Payload {
    /// Creates a payload with a single argument.
    pub fn new(value: Value) -> Self {
        Self {
            args: Arc::from(vec![value]),
        }
    }

    /// Creates a payload from positional arguments.
    pub fn from_args(args: Vec<Value>) -> Self {
        Self {
            args: Arc::from(args),
        }
    }

    /// Returns the first argument, if any.
    pub fn first(&self) -> Option<&Value> {
        self.args.first()
    }

    /// Returns the argument at `index`, if any.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Returns all arguments.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Looks up a JSON pointer inside the argument at `index`.
    ///
    /// Returns `None` for missing arguments, missing paths and JSON nulls.
    pub fn pointer(&self, index: usize, pointer: &str) -> Option<&Value> {
        self.arg(index)
            .and_then(|v| v.pointer(pointer))
            .filter(|v| !v.is_null())
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("args", &self.args.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_name_round_trips_through_str() {
        for event in EventName::ALL {
            assert_eq!(event.as_str().parse::<EventName>(), Ok(event));
        }
        assert!("messageCreate".parse::<EventName>().is_err());
    }

    #[test]
    fn test_event_name_serde_matches_as_str() {
        let json = serde_json::to_string(&EventName::GuildMemberAdd).unwrap();
        assert_eq!(json, "\"guild_member_add\"");
    }

    #[test]
    fn test_scope_from_value() {
        assert_eq!(
            ScopeId::from_value(&json!("123")),
            Some(ScopeId::new("123"))
        );
        assert_eq!(
            ScopeId::from_value(&json!(456u64)),
            Some(ScopeId::new("456"))
        );
        assert_eq!(ScopeId::from_value(&json!("")), None);
        assert_eq!(ScopeId::from_value(&json!(null)), None);
        assert_eq!(ScopeId::from_value(&json!({"id": "1"})), None);
    }

    #[test]
    fn test_payload_pointer_skips_nulls() {
        let payload = Payload::from_args(vec![json!({"guild": null, "id": "1"}), json!(null)]);
        assert_eq!(payload.pointer(0, "/id"), Some(&json!("1")));
        assert_eq!(payload.pointer(0, "/guild"), None);
        assert_eq!(payload.pointer(0, "/guild/id"), None);
        assert_eq!(payload.pointer(3, "/id"), None);
    }
}
