//! Batch loaders binding a module's entities to the shared registries.
//!
//! Loading walks the batch in order and stops at the first failure; entities
//! loaded before it stay loaded. Unloading walks the module's own container
//! and only removes registry entries that are still the ones it loaded.

use std::sync::Arc;

use tracing::{debug, warn};

use super::Module;
use crate::command::Command;
use crate::error::{ModuleError, ModuleResult, RegistryError};
use crate::listener::Listener;
use crate::registry::{CommandRegistry, Entity, ListenerRegistry, Registry};

fn module_error<T: Entity>(module: &Module, label: &str, source: RegistryError) -> ModuleError {
    ModuleError {
        module: module.label().to_string(),
        kind: T::KIND,
        label: label.to_string(),
        source,
    }
}

/// Unregisters the tracked `entities` from `registry`.
///
/// Entries already absent are skipped, as are labels that now resolve to an
/// entity registered by someone else.
fn unload_tracked<R: Registry>(
    registry: &R,
    module: &Module,
    entities: Vec<(String, Arc<R::Entity>)>,
) -> usize {
    let mut unloaded = 0;
    for (label, tracked) in entities {
        match registry.get(&label) {
            None => {
                debug!(
                    module = %module.label(),
                    kind = R::Entity::KIND,
                    label = %label,
                    "Entity already unregistered"
                );
                continue;
            }
            Some(current) if !Arc::ptr_eq(&current, &tracked) => {
                debug!(
                    module = %module.label(),
                    owner = %current.module(),
                    kind = R::Entity::KIND,
                    label = %label,
                    "Label reused by another registration, left in place"
                );
                continue;
            }
            Some(_) => {}
        }

        match registry.unregister(&label) {
            Ok(_) => unloaded += 1,
            Err(e) if e.is_not_registered() => {}
            Err(e) => {
                warn!(module = %module.label(), label = %label, error = %e, "Failed to unload entity");
            }
        }
    }
    unloaded
}

// =============================================================================
// CommandLoader
// =============================================================================

/// Loads commands, applying the module's default policies.
pub struct CommandLoader {
    registry: Arc<CommandRegistry>,
}

impl CommandLoader {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    /// Registers `commands` on behalf of `module`.
    ///
    /// Returns the number of commands loaded.
    pub fn load_all(&self, module: &Module, commands: Vec<Command>) -> ModuleResult<usize> {
        let mut loaded = 0;
        for command in commands {
            let label = command.label().to_string();
            let mut command = command.with_module(module.label());
            command.inherit(module.options(), module.permissions());

            let command = self
                .registry
                .register(command)
                .map_err(|e| module_error::<Command>(module, &label, e))?;
            module.track_command(command);
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Unregisters every command tracked by `module`.
    pub fn unload_all(&self, module: &Module) -> usize {
        unload_tracked(self.registry.as_ref(), module, module.take_commands())
    }
}

// =============================================================================
// ListenerLoader
// =============================================================================

/// Loads listeners, binding them through the event manager.
pub struct ListenerLoader {
    registry: Arc<ListenerRegistry>,
}

impl ListenerLoader {
    pub fn new(registry: Arc<ListenerRegistry>) -> Self {
        Self { registry }
    }

    /// Registers `listeners` on behalf of `module`.
    ///
    /// Listeners of a module with `server_bypass` are never gated.
    pub fn load_all(&self, module: &Module, listeners: Vec<Listener>) -> ModuleResult<usize> {
        let mut loaded = 0;
        for listener in listeners {
            let label = listener.label().to_string();
            let mut listener = listener.with_module(module.label());
            if module.server_bypass() {
                listener = listener.bypass_gate(true);
            }

            let listener = self
                .registry
                .register(listener)
                .map_err(|e| module_error::<Listener>(module, &label, e))?;
            module.track_listener(listener);
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Unregisters every listener tracked by `module`.
    pub fn unload_all(&self, module: &Module) -> usize {
        unload_tracked(self.registry.as_ref(), module, module.take_listeners())
    }
}
