//! Command policy value objects.
//!
//! A module carries default [`CommandOptions`] and [`CommandPermissions`];
//! commands that do not set their own inherit them when loaded.

use serde::{Deserialize, Serialize};

/// Execution options of a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandOptions {
    /// Refuse to run outside a guild.
    pub guild_only: bool,
    /// Omit from help listings.
    pub hidden: bool,
    /// Per-user cooldown in milliseconds, `0` for none.
    pub cooldown_ms: u64,
}

/// Permission requirements of a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandPermissions {
    /// Platform permission names the invoking member must hold.
    pub required: Vec<String>,
    /// Restrict to bot staff.
    pub staff_only: bool,
}
