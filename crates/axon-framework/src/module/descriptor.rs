//! Module descriptor: the static, `Copy` definition of a module.

use std::sync::Arc;

use super::{Module, ModuleInfo};
use crate::command::Command;
use crate::listener::Listener;
use crate::policy::{CommandOptions, CommandPermissions};
use crate::registry::{CommandRegistry, ListenerRegistry};

fn no_commands() -> Vec<Command> {
    Vec::new()
}

fn no_listeners() -> Vec<Listener> {
    Vec::new()
}

/// A static, `Copy` definition that instantiates a [`Module`].
///
/// Descriptors can live in `static` items and are handed to the runtime,
/// which builds the module and loads the entities the factories produce.
///
/// ```rust,ignore
/// pub static FUN: ModuleDescriptor = ModuleDescriptor::new("fun")
///     .info("Fun", "games", "Dice and coins")
///     .commands(fun_commands);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ModuleDescriptor {
    /// Unique module label.
    pub label: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub enabled: bool,
    pub server_bypass: bool,
    /// Module-level default command options.
    pub options: fn() -> CommandOptions,
    /// Module-level default command permissions.
    pub permissions: fn() -> CommandPermissions,
    /// Factory producing the module's commands.
    pub commands: fn() -> Vec<Command>,
    /// Factory producing the module's listeners.
    pub listeners: fn() -> Vec<Listener>,
}

impl ModuleDescriptor {
    /// An enabled module with no entities and default policies.
    pub const fn new(label: &'static str) -> Self {
        Self {
            label,
            name: label,
            category: "",
            description: "",
            enabled: true,
            server_bypass: false,
            options: CommandOptions::default,
            permissions: CommandPermissions::default,
            commands: no_commands,
            listeners: no_listeners,
        }
    }

    pub const fn info(
        mut self,
        name: &'static str,
        category: &'static str,
        description: &'static str,
    ) -> Self {
        self.name = name;
        self.category = category;
        self.description = description;
        self
    }

    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub const fn server_bypass(mut self, bypass: bool) -> Self {
        self.server_bypass = bypass;
        self
    }

    pub const fn options(mut self, options: fn() -> CommandOptions) -> Self {
        self.options = options;
        self
    }

    pub const fn permissions(mut self, permissions: fn() -> CommandPermissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub const fn commands(mut self, commands: fn() -> Vec<Command>) -> Self {
        self.commands = commands;
        self
    }

    pub const fn listeners(mut self, listeners: fn() -> Vec<Listener>) -> Self {
        self.listeners = listeners;
        self
    }

    /// Builds the (not yet initialised) module.
    pub fn instantiate(
        &self,
        commands: Arc<CommandRegistry>,
        listeners: Arc<ListenerRegistry>,
    ) -> Module {
        Module::new(self.label, commands, listeners)
            .with_info(ModuleInfo {
                name: self.name.to_string(),
                category: self.category.to_string(),
                description: self.description.to_string(),
            })
            .with_enabled(self.enabled)
            .with_server_bypass(self.server_bypass)
            .with_options((self.options)())
            .with_permissions((self.permissions)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use axon_core::EventName;

    fn commands() -> Vec<Command> {
        vec![Command::new("roll", |_| async { Ok(()) })]
    }

    fn listeners() -> Vec<Listener> {
        vec![Listener::new("greeter", EventName::GuildMemberAdd, |_| async {
            Ok(())
        })]
    }

    fn staff() -> CommandPermissions {
        CommandPermissions {
            staff_only: true,
            ..CommandPermissions::default()
        }
    }

    static FUN: ModuleDescriptor = ModuleDescriptor::new("fun")
        .info("Fun", "games", "Dice")
        .permissions(staff)
        .commands(commands)
        .listeners(listeners);

    #[tokio::test]
    async fn test_descriptor_instantiates_configured_module() {
        let (_, events) = testing::event_manager();
        let commands = Arc::new(CommandRegistry::new());
        let listeners = Arc::new(ListenerRegistry::new(events));

        let module = FUN.instantiate(commands.clone(), listeners);
        assert_eq!(module.label(), "fun");
        assert_eq!(module.info().category, "games");

        module.init((FUN.commands)(), (FUN.listeners)()).unwrap();
        let roll = commands.resolve("roll").unwrap();
        assert!(roll.permissions().unwrap().staff_only);
    }
}
