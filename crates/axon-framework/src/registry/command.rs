use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::{Entity, EntityRegistry, Registry};
use crate::command::Command;
use crate::error::{RegistryError, RegistryResult};

/// Registry of commands with an alias table.
///
/// Labels and aliases share one namespace: an alias that equals a label or
/// another alias is rejected as a duplicate.
#[derive(Default)]
pub struct CommandRegistry {
    commands: EntityRegistry<Command>,
    /// alias -> label
    aliases: RwLock<HashMap<String, String>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a command by label or alias.
    pub fn resolve(&self, name: &str) -> Option<Arc<Command>> {
        if let Some(command) = self.commands.get(name) {
            return Some(command);
        }
        let label = self.aliases.read().get(name).cloned()?;
        self.commands.get(&label)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Labels in registration order.
    pub fn labels(&self) -> Vec<String> {
        self.commands.labels()
    }

    fn duplicate(command: &Command, name: &str) -> RegistryError {
        RegistryError::DuplicateRegistration {
            kind: Command::KIND,
            label: name.to_string(),
            module: command.module().to_string(),
        }
    }
}

impl Registry for CommandRegistry {
    type Entity = Command;

    fn register(&self, command: Command) -> RegistryResult<Arc<Command>> {
        let command = Arc::new(command);
        // Held across the label insert so alias checks and inserts are atomic.
        let mut aliases = self.aliases.write();

        if aliases.contains_key(command.label()) {
            return Err(Self::duplicate(&command, command.label()));
        }
        for (i, alias) in command.aliases().iter().enumerate() {
            let repeated = command.aliases()[..i].contains(alias);
            if repeated
                || alias == command.label()
                || aliases.contains_key(alias)
                || self.commands.has(alias)
            {
                return Err(Self::duplicate(&command, alias));
            }
        }

        self.commands.register(Arc::clone(&command))?;
        for alias in command.aliases() {
            aliases.insert(alias.clone(), command.label().to_string());
        }

        info!(
            command = %command.label(),
            module = %command.module(),
            aliases = command.aliases().len(),
            "Command registered"
        );
        Ok(command)
    }

    fn unregister(&self, label: &str) -> RegistryResult<Arc<Command>> {
        let mut aliases = self.aliases.write();
        let command = self.commands.unregister(label)?;
        aliases.retain(|_, target| target != label);

        debug!(command = %label, module = %command.module(), "Command unregistered");
        Ok(command)
    }

    fn get(&self, label: &str) -> Option<Arc<Command>> {
        self.commands.get(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(label: &str) -> Command {
        Command::new(label, |_| async { Ok(()) }).with_module("core")
    }

    #[test]
    fn test_resolve_by_label_or_alias() {
        let registry = CommandRegistry::new();
        registry
            .register(command("help").alias("h").alias("?"))
            .unwrap();

        assert_eq!(registry.resolve("help").unwrap().label(), "help");
        assert_eq!(registry.resolve("h").unwrap().label(), "help");
        assert_eq!(registry.resolve("?").unwrap().label(), "help");
        assert!(registry.resolve("hlp").is_none());
    }

    #[test]
    fn test_alias_collisions_are_duplicates() {
        let registry = CommandRegistry::new();
        registry.register(command("help").alias("h")).unwrap();

        // alias colliding with an existing alias
        let err = registry.register(command("hello").alias("h")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRegistration { ref label, .. } if label == "h"));

        // label colliding with an existing alias
        assert!(registry.register(command("h")).is_err());

        // alias colliding with an existing label
        assert!(registry.register(command("assist").alias("help")).is_err());

        assert_eq!(registry.labels(), ["help"]);
        assert!(registry.resolve("hello").is_none());
    }

    #[test]
    fn test_unregister_drops_aliases() {
        let registry = CommandRegistry::new();
        registry.register(command("help").alias("h")).unwrap();

        registry.unregister("help").unwrap();
        assert!(registry.resolve("h").is_none());
        assert!(registry.unregister("help").unwrap_err().is_not_registered());

        // the alias is free again
        registry.register(command("hint").alias("h")).unwrap();
        assert_eq!(registry.resolve("h").unwrap().label(), "hint");
    }
}
