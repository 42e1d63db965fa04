//! Modules: groups of commands and listeners activated as one unit.
//!
//! ```text
//! Module::init(commands, listeners)
//!   ├── CommandLoader::load_all   ──► CommandRegistry   (policy inherited)
//!   └── ListenerLoader::load_all  ──► ListenerRegistry ──► EventManager
//!
//! Module::unload()
//!   ├── CommandLoader::unload_all   (NotRegistered tolerated)
//!   └── ListenerLoader::unload_all  (NotRegistered tolerated)
//! ```
//!
//! The two sets are loaded independently: a listener failure does not roll
//! back the commands already loaded. `init` reports the first failure and
//! leaves the decision to retract the module to the caller.

mod descriptor;
mod loader;

pub use descriptor::ModuleDescriptor;
pub use loader::{CommandLoader, ListenerLoader};

use std::fmt;
use std::sync::Arc;

use axon_core::KeyedContainer;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::command::Command;
use crate::error::ModuleResult;
use crate::listener::Listener;
use crate::policy::{CommandOptions, CommandPermissions};
use crate::registry::{CommandRegistry, ListenerRegistry};

/// Descriptive module metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleInfo {
    /// Display name.
    pub name: String,
    /// Category used to group modules in listings.
    pub category: String,
    pub description: String,
}

/// A named group of commands and listeners.
pub struct Module {
    label: String,
    info: ModuleInfo,
    enabled: bool,
    server_bypass: bool,
    options: CommandOptions,
    permissions: CommandPermissions,
    commands: RwLock<KeyedContainer<Arc<Command>>>,
    listeners: RwLock<KeyedContainer<Arc<Listener>>>,
    command_loader: CommandLoader,
    listener_loader: ListenerLoader,
}

impl Module {
    /// Creates an empty module loading into the given registries.
    pub fn new(
        label: impl Into<String>,
        commands: Arc<CommandRegistry>,
        listeners: Arc<ListenerRegistry>,
    ) -> Self {
        let label = label.into();
        Self {
            info: ModuleInfo {
                name: label.clone(),
                ..ModuleInfo::default()
            },
            label,
            enabled: true,
            server_bypass: false,
            options: CommandOptions::default(),
            permissions: CommandPermissions::default(),
            commands: RwLock::new(KeyedContainer::new()),
            listeners: RwLock::new(KeyedContainer::new()),
            command_loader: CommandLoader::new(commands),
            listener_loader: ListenerLoader::new(listeners),
        }
    }

    pub fn with_info(mut self, info: ModuleInfo) -> Self {
        self.info = info;
        self
    }

    /// Default options inherited by commands without their own.
    pub fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    /// Default permissions inherited by commands without their own.
    pub fn with_permissions(mut self, permissions: CommandPermissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Exempts this module's listeners from scope enablement checks.
    pub fn with_server_bypass(mut self, bypass: bool) -> Self {
        self.server_bypass = bypass;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn info(&self) -> &ModuleInfo {
        &self.info
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn server_bypass(&self) -> bool {
        self.server_bypass
    }

    pub fn options(&self) -> &CommandOptions {
        &self.options
    }

    pub fn permissions(&self) -> &CommandPermissions {
        &self.permissions
    }

    /// Labels of the loaded commands, in load order.
    pub fn command_labels(&self) -> Vec<String> {
        self.commands.read().keys().map(str::to_string).collect()
    }

    /// Labels of the loaded listeners, in load order.
    pub fn listener_labels(&self) -> Vec<String> {
        self.listeners.read().keys().map(str::to_string).collect()
    }

    pub fn command(&self, label: &str) -> Option<Arc<Command>> {
        self.commands.read().get(label).cloned()
    }

    pub fn listener(&self, label: &str) -> Option<Arc<Listener>> {
        self.listeners.read().get(label).cloned()
    }

    /// Loads `commands` and `listeners` into the shared registries.
    ///
    /// Both sets are always attempted; the first error (commands before
    /// listeners) is returned. Entities loaded before a failure stay loaded.
    pub fn init(&self, commands: Vec<Command>, listeners: Vec<Listener>) -> ModuleResult<()> {
        let commands = self.command_loader.load_all(self, commands);
        let listeners = self.listener_loader.load_all(self, listeners);

        match (&commands, &listeners) {
            (Ok(command_count), Ok(listener_count)) => info!(
                module = %self.label,
                commands = command_count,
                listeners = listener_count,
                "Module initialised"
            ),
            _ => warn!(
                module = %self.label,
                commands = self.commands.read().len(),
                listeners = self.listeners.read().len(),
                "Module partially initialised"
            ),
        }

        commands?;
        listeners?;
        Ok(())
    }

    /// Unregisters every loaded command and listener.
    ///
    /// Entities already unregistered elsewhere are skipped.
    pub fn unload(&self) {
        let commands = self.command_loader.unload_all(self);
        let listeners = self.listener_loader.unload_all(self);
        info!(
            module = %self.label,
            commands,
            listeners,
            "Module unloaded"
        );
    }

    fn track_command(&self, command: Arc<Command>) {
        let label = command.label().to_string();
        if self.commands.write().add(label, command).is_err() {
            warn!(module = %self.label, "Command tracked twice");
        }
    }

    fn track_listener(&self, listener: Arc<Listener>) {
        let label = listener.label().to_string();
        if self.listeners.write().add(label, listener).is_err() {
            warn!(module = %self.label, "Listener tracked twice");
        }
    }

    fn take_commands(&self) -> Vec<(String, Arc<Command>)> {
        std::mem::take(&mut *self.commands.write()).into_entries()
    }

    fn take_listeners(&self) -> Vec<(String, Arc<Listener>)> {
        std::mem::take(&mut *self.listeners.write()).into_entries()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("label", &self.label)
            .field("enabled", &self.enabled)
            .field("server_bypass", &self.server_bypass)
            .field("commands", &self.commands.read().len())
            .field("listeners", &self.listeners.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::registry::Registry;
    use crate::testing;
    use axon_core::EventName;

    struct Harness {
        source: Arc<testing::RecordingSource>,
        commands: Arc<CommandRegistry>,
        listeners: Arc<ListenerRegistry>,
    }

    impl Harness {
        fn new() -> Self {
            let (source, events) = testing::event_manager();
            Self {
                source,
                commands: Arc::new(CommandRegistry::new()),
                listeners: Arc::new(ListenerRegistry::new(events)),
            }
        }

        fn module(&self, label: &str) -> Module {
            Module::new(label, self.commands.clone(), self.listeners.clone())
        }
    }

    fn command(label: &str) -> Command {
        Command::new(label, |_| async { Ok(()) })
    }

    fn listener(label: &str, event: EventName) -> Listener {
        Listener::new(label, event, |_| async { Ok(()) })
    }

    #[tokio::test]
    async fn test_init_and_unload_round_trip() {
        let h = Harness::new();
        let module = h.module("fun").with_options(CommandOptions {
            hidden: true,
            ..CommandOptions::default()
        });

        module
            .init(
                vec![command("roll"), command("flip").alias("coin")],
                vec![
                    listener("greeter", EventName::GuildMemberAdd),
                    listener("counter", EventName::MessageCreate),
                ],
            )
            .unwrap();

        assert_eq!(module.command_labels(), ["roll", "flip"]);
        assert_eq!(module.listener_labels(), ["greeter", "counter"]);
        assert_eq!(h.commands.resolve("coin").unwrap().module(), "fun");
        assert!(h.commands.get("roll").unwrap().options().unwrap().hidden);
        assert_eq!(h.source.active(), 2);

        module.unload();
        assert!(h.commands.is_empty());
        assert!(h.listeners.is_empty());
        assert_eq!(h.source.active(), 0);
        assert!(module.command_labels().is_empty());
    }

    #[tokio::test]
    async fn test_init_twice_is_duplicate_registration() {
        let h = Harness::new();
        let module = h.module("fun");
        module.init(vec![command("roll")], vec![]).unwrap();

        let err = module.init(vec![command("roll")], vec![]).unwrap_err();
        assert_eq!(err.module, "fun");
        assert_eq!(err.kind, "command");
        assert_eq!(err.label, "roll");
        assert!(matches!(err.source, RegistryError::DuplicateRegistration { .. }));
        assert_eq!(h.commands.len(), 1);
    }

    #[tokio::test]
    async fn test_listener_failure_keeps_loaded_commands() {
        let h = Harness::new();
        let core = h.module("core");
        core.init(vec![], vec![listener("logger", EventName::MessageCreate)])
            .unwrap();

        let fun = h.module("fun");
        let err = fun
            .init(
                vec![command("roll"), command("flip")],
                vec![
                    listener("welcome", EventName::GuildMemberAdd),
                    listener("logger", EventName::MessageDelete),
                    listener("never", EventName::Ready),
                ],
            )
            .unwrap_err();

        assert_eq!(err.kind, "listener");
        assert_eq!(err.label, "logger");
        assert_eq!(fun.command_labels(), ["roll", "flip"]);
        assert_eq!(fun.listener_labels(), ["welcome"]);
        assert!(h.listeners.get("never").is_none());
    }

    #[tokio::test]
    async fn test_teardown_after_partial_activation_leaves_no_subscription() {
        let h = Harness::new();
        let core = h.module("core");
        core.init(vec![], vec![listener("logger", EventName::MessageCreate)])
            .unwrap();

        let fun = h.module("fun");
        assert!(
            fun.init(
                vec![],
                vec![
                    listener("welcome", EventName::GuildMemberAdd),
                    listener("logger", EventName::TypingStart),
                ],
            )
            .is_err()
        );

        // someone already removed one of the module's listeners
        h.listeners.unregister("welcome").unwrap();
        fun.unload();

        let events = h.listeners.event_manager();
        assert_eq!(events.bound_events(), [EventName::MessageCreate]);
        for event in EventName::ALL {
            for l in events.listeners(event) {
                assert!(h.listeners.get(l.label()).is_some());
            }
        }
        assert_eq!(h.source.active(), 1);
    }

    #[tokio::test]
    async fn test_unload_leaves_label_reused_by_another_module() {
        let h = Harness::new();
        let fun = h.module("fun");
        fun.init(
            vec![command("roll")],
            vec![listener("counter", EventName::MessageCreate)],
        )
        .unwrap();

        // both labels are freed and taken over by another module
        h.commands.unregister("roll").unwrap();
        h.listeners.unregister("counter").unwrap();
        let games = h.module("games");
        games
            .init(
                vec![command("roll")],
                vec![listener("counter", EventName::MessageCreate)],
            )
            .unwrap();

        fun.unload();
        assert_eq!(h.commands.get("roll").unwrap().module(), "games");
        assert_eq!(h.listeners.get("counter").unwrap().module(), "games");
        assert_eq!(
            h.listeners
                .event_manager()
                .listener_count(EventName::MessageCreate),
            1
        );
        assert_eq!(h.source.active(), 1);

        games.unload();
        assert!(h.commands.is_empty());
        assert_eq!(h.source.active(), 0);
    }

    #[tokio::test]
    async fn test_server_bypass_marks_listeners() {
        let h = Harness::new();
        let module = h.module("core").with_server_bypass(true);
        module
            .init(vec![], vec![listener("audit", EventName::GuildBanAdd)])
            .unwrap();
        assert!(module.listener("audit").unwrap().bypasses_gate());
    }
}
