//! Scope resolvers for cache-backed client payloads.
//!
//! Cached clients hand out resolved objects as positional arguments:
//! messages point at their channel, channels point at their guild, and
//! guild-level events pass the guild object first.

use axon_core::{EventBinding, EventName, Payload, ScopeId, ScopeResolver};

fn resolve(payload: &Payload, index: usize, pointer: &str) -> Option<ScopeId> {
    payload.pointer(index, pointer).and_then(ScopeId::from_value)
}

/// Message events: `message.channel.guild.id`.
///
/// Messages in direct channels have no `guild` and resolve to `None`.
pub fn message_guild(payload: &Payload) -> Option<ScopeId> {
    resolve(payload, 0, "/channel/guild/id")
}

/// Bulk deletions: the guild of the first deleted message.
pub fn bulk_guild(payload: &Payload) -> Option<ScopeId> {
    resolve(payload, 0, "/0/channel/guild/id")
}

/// Channel, typing, presence and voice events: `arg0.guild.id`.
pub fn parent_guild(payload: &Payload) -> Option<ScopeId> {
    resolve(payload, 0, "/guild/id")
}

/// Guild-level events whose first argument is the guild itself.
pub fn guild(payload: &Payload) -> Option<ScopeId> {
    resolve(payload, 0, "/id")
}

/// Events that never belong to a guild.
pub fn unscoped(_: &Payload) -> Option<ScopeId> {
    None
}

const fn bind(event: EventName, upstream: &'static str, resolver: ScopeResolver) -> EventBinding {
    EventBinding {
        event,
        upstream,
        resolver,
    }
}

/// Binding table for the cached library.
pub static BINDINGS: [EventBinding; 26] = [
    bind(EventName::Ready, "ready", unscoped),
    bind(EventName::MessageCreate, "messageCreate", message_guild),
    bind(EventName::MessageUpdate, "messageUpdate", message_guild),
    bind(EventName::MessageDelete, "messageDelete", message_guild),
    bind(EventName::MessageDeleteBulk, "messageDeleteBulk", bulk_guild),
    bind(EventName::MessageReactionAdd, "messageReactionAdd", message_guild),
    bind(EventName::MessageReactionRemove, "messageReactionRemove", message_guild),
    bind(
        EventName::MessageReactionRemoveAll,
        "messageReactionRemoveAll",
        message_guild,
    ),
    bind(EventName::ChannelCreate, "channelCreate", parent_guild),
    bind(EventName::ChannelUpdate, "channelUpdate", parent_guild),
    bind(EventName::ChannelDelete, "channelDelete", parent_guild),
    bind(EventName::GuildCreate, "guildCreate", guild),
    bind(EventName::GuildUpdate, "guildUpdate", guild),
    bind(EventName::GuildDelete, "guildDelete", guild),
    bind(EventName::GuildBanAdd, "guildBanAdd", guild),
    bind(EventName::GuildBanRemove, "guildBanRemove", guild),
    bind(EventName::GuildMemberAdd, "guildMemberAdd", guild),
    bind(EventName::GuildMemberRemove, "guildMemberRemove", guild),
    bind(EventName::GuildMemberUpdate, "guildMemberUpdate", guild),
    bind(EventName::GuildRoleCreate, "guildRoleCreate", guild),
    bind(EventName::GuildRoleUpdate, "guildRoleUpdate", guild),
    bind(EventName::GuildRoleDelete, "guildRoleDelete", guild),
    bind(EventName::TypingStart, "typingStart", parent_guild),
    bind(EventName::PresenceUpdate, "presenceUpdate", parent_guild),
    bind(EventName::VoiceStateUpdate, "voiceStateUpdate", parent_guild),
    bind(EventName::UserUpdate, "userUpdate", unscoped),
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_guild_follows_channel_graph() {
        let message = Payload::new(json!({
            "id": "10",
            "channel": {"id": "20", "guild": {"id": "30"}}
        }));
        assert_eq!(message_guild(&message), Some(ScopeId::new("30")));

        let direct = Payload::new(json!({"id": "10", "channel": {"id": "20"}}));
        assert_eq!(message_guild(&direct), None);
    }

    #[test]
    fn test_bulk_guild_uses_first_message() {
        let payload = Payload::new(json!([
            {"id": "10", "channel": {"id": "20", "guild": {"id": "30"}}},
            {"id": "11", "channel": {"id": "20", "guild": {"id": "30"}}}
        ]));
        assert_eq!(bulk_guild(&payload), Some(ScopeId::new("30")));
        assert_eq!(bulk_guild(&Payload::new(json!([]))), None);
    }

    #[test]
    fn test_guild_member_add_reads_first_argument() {
        let payload = Payload::from_args(vec![
            json!({"id": "30", "name": "axon"}),
            json!({"id": "40", "user": {"id": "40"}}),
        ]);
        assert_eq!(guild(&payload), Some(ScopeId::new("30")));
    }

    #[test]
    fn test_every_event_is_bound_once() {
        for event in EventName::ALL {
            let count = BINDINGS.iter().filter(|b| b.event == event).count();
            assert_eq!(count, 1, "{event} bound {count} times");
        }
    }
}
