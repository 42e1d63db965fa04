//! Scope resolvers for gateway dispatch payloads.
//!
//! Every dispatch arrives as a single flat JSON object. Events that happen
//! inside a guild carry a top-level `guild_id`; guild lifecycle events carry
//! the guild object itself, whose `id` is the scope.

use axon_core::{EventBinding, EventName, Payload, ScopeId};

/// Scope from a top-level `guild_id` field.
pub fn guild_field(payload: &Payload) -> Option<ScopeId> {
    payload.pointer(0, "/guild_id").and_then(ScopeId::from_value)
}

/// Scope from the `id` of a guild object payload.
///
/// Unavailable guilds still carry their id, so a `GUILD_DELETE` for an
/// outage resolves to the affected guild.
pub fn guild_object(payload: &Payload) -> Option<ScopeId> {
    payload.pointer(0, "/id").and_then(ScopeId::from_value)
}

/// Events that never belong to a guild.
pub fn unscoped(_: &Payload) -> Option<ScopeId> {
    None
}

const fn bind(
    event: EventName,
    upstream: &'static str,
    resolver: axon_core::ScopeResolver,
) -> EventBinding {
    EventBinding {
        event,
        upstream,
        resolver,
    }
}

/// Binding table for the gateway library.
pub static BINDINGS: [EventBinding; 26] = [
    bind(EventName::Ready, "READY", unscoped),
    bind(EventName::MessageCreate, "MESSAGE_CREATE", guild_field),
    bind(EventName::MessageUpdate, "MESSAGE_UPDATE", guild_field),
    bind(EventName::MessageDelete, "MESSAGE_DELETE", guild_field),
    bind(EventName::MessageDeleteBulk, "MESSAGE_DELETE_BULK", guild_field),
    bind(EventName::MessageReactionAdd, "MESSAGE_REACTION_ADD", guild_field),
    bind(EventName::MessageReactionRemove, "MESSAGE_REACTION_REMOVE", guild_field),
    bind(
        EventName::MessageReactionRemoveAll,
        "MESSAGE_REACTION_REMOVE_ALL",
        guild_field,
    ),
    bind(EventName::ChannelCreate, "CHANNEL_CREATE", guild_field),
    bind(EventName::ChannelUpdate, "CHANNEL_UPDATE", guild_field),
    bind(EventName::ChannelDelete, "CHANNEL_DELETE", guild_field),
    bind(EventName::GuildCreate, "GUILD_CREATE", guild_object),
    bind(EventName::GuildUpdate, "GUILD_UPDATE", guild_object),
    bind(EventName::GuildDelete, "GUILD_DELETE", guild_object),
    bind(EventName::GuildBanAdd, "GUILD_BAN_ADD", guild_field),
    bind(EventName::GuildBanRemove, "GUILD_BAN_REMOVE", guild_field),
    bind(EventName::GuildMemberAdd, "GUILD_MEMBER_ADD", guild_field),
    bind(EventName::GuildMemberRemove, "GUILD_MEMBER_REMOVE", guild_field),
    bind(EventName::GuildMemberUpdate, "GUILD_MEMBER_UPDATE", guild_field),
    bind(EventName::GuildRoleCreate, "GUILD_ROLE_CREATE", guild_field),
    bind(EventName::GuildRoleUpdate, "GUILD_ROLE_UPDATE", guild_field),
    bind(EventName::GuildRoleDelete, "GUILD_ROLE_DELETE", guild_field),
    bind(EventName::TypingStart, "TYPING_START", guild_field),
    bind(EventName::PresenceUpdate, "PRESENCE_UPDATE", guild_field),
    bind(EventName::VoiceStateUpdate, "VOICE_STATE_UPDATE", guild_field),
    bind(EventName::UserUpdate, "USER_UPDATE", unscoped),
];
