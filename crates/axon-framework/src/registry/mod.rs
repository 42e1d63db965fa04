//! Entity registries.
//!
//! Every pluggable entity kind implements [`Entity`] and is stored in an
//! [`EntityRegistry`], an insertion-ordered [`KeyedContainer`] behind a lock
//! that turns container errors into registry errors:
//!
//! | Operation | Failure |
//! |-----------|---------|
//! | `register` with a taken label | [`RegistryError::DuplicateRegistration`] |
//! | `unregister` of an absent label | [`RegistryError::NotRegistered`] |
//!
//! Kind-specific registries ([`CommandRegistry`], [`ListenerRegistry`])
//! compose an `EntityRegistry` with their extra bookkeeping and implement
//! [`Registry`] so loaders can drive them uniformly.

mod command;
mod listener;

pub use command::CommandRegistry;
pub use listener::ListenerRegistry;

use std::sync::Arc;

use axon_core::KeyedContainer;
use parking_lot::RwLock;

use crate::error::{RegistryError, RegistryResult};

/// A labelled, module-owned unit of behaviour.
pub trait Entity: Send + Sync + 'static {
    /// Kind name used in errors and logs.
    const KIND: &'static str;

    /// Label, unique within the entity's registry.
    fn label(&self) -> &str;

    /// Label of the owning module.
    fn module(&self) -> &str;
}

/// Register/unregister contract shared by kind-specific registries.
pub trait Registry: Send + Sync {
    type Entity: Entity;

    /// Registers `entity`, returning the shared handle stored.
    fn register(&self, entity: Self::Entity) -> RegistryResult<Arc<Self::Entity>>;

    /// Unregisters the entity labelled `label`.
    fn unregister(&self, label: &str) -> RegistryResult<Arc<Self::Entity>>;

    /// Looks up an entity by label.
    fn get(&self, label: &str) -> Option<Arc<Self::Entity>>;
}

// =============================================================================
// EntityRegistry
// =============================================================================

/// Insertion-ordered store of one entity kind.
pub struct EntityRegistry<T: Entity> {
    entries: RwLock<KeyedContainer<Arc<T>>>,
}

impl<T: Entity> EntityRegistry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(KeyedContainer::new()),
        }
    }

    /// Inserts `entity` under its label.
    pub fn register(&self, entity: Arc<T>) -> RegistryResult<()> {
        let label = entity.label().to_string();
        self.entries
            .write()
            .add(label.clone(), Arc::clone(&entity))
            .map_err(|_| RegistryError::DuplicateRegistration {
                kind: T::KIND,
                label,
                module: entity.module().to_string(),
            })
    }

    /// Removes and returns the entity labelled `label`.
    pub fn unregister(&self, label: &str) -> RegistryResult<Arc<T>> {
        self.entries
            .write()
            .remove(label)
            .ok_or_else(|| RegistryError::NotRegistered {
                kind: T::KIND,
                label: label.to_string(),
            })
    }

    pub fn get(&self, label: &str) -> Option<Arc<T>> {
        self.entries.read().get(label).cloned()
    }

    pub fn has(&self, label: &str) -> bool {
        self.entries.read().has(label)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Labels in registration order.
    pub fn labels(&self) -> Vec<String> {
        self.entries.read().keys().map(str::to_string).collect()
    }

    /// Entities in registration order.
    pub fn entities(&self) -> Vec<Arc<T>> {
        self.entries.read().values().cloned().collect()
    }
}

impl<T: Entity> Default for EntityRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
