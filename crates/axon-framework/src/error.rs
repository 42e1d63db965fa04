//! Error types for the Axon framework.

use axon_core::LibraryError;
use thiserror::Error;

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors raised by entity registries and the event manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An entity with this label (or alias) is already registered.
    #[error("{kind} '{label}' is already registered (module '{module}')")]
    DuplicateRegistration {
        /// Entity kind, e.g. `"command"`.
        kind: &'static str,
        /// The offending label.
        label: String,
        /// Owning module of the entity being registered.
        module: String,
    },

    /// No entity with this label is registered.
    #[error("{kind} '{label}' is not registered")]
    NotRegistered {
        /// Entity kind, e.g. `"listener"`.
        kind: &'static str,
        /// The missing label.
        label: String,
    },

    /// The selected library cannot bind the listener's event.
    #[error(transparent)]
    UnsupportedEvent(#[from] LibraryError),
}

impl RegistryError {
    /// Returns `true` for [`RegistryError::NotRegistered`].
    pub fn is_not_registered(&self) -> bool {
        matches!(self, Self::NotRegistered { .. })
    }
}

// =============================================================================
// Module Errors
// =============================================================================

/// A module failed to load or unload one of its entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("module '{module}': {kind} '{label}' failed: {source}")]
pub struct ModuleError {
    /// Label of the module being loaded.
    pub module: String,
    /// Kind of the entity that failed.
    pub kind: &'static str,
    /// Label of the entity that failed.
    pub label: String,
    /// Underlying registry error.
    pub source: RegistryError,
}

// =============================================================================
// Collector Errors
// =============================================================================

/// Errors raised by the message collector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectorError {
    /// The deadline passed before the collection ended.
    #[error("message collection timed out")]
    TimedOut,

    /// No collected message has this id.
    #[error("message '{id}' not found in collector")]
    NotFound {
        /// The requested id.
        id: String,
    },

    /// The value is not a message id.
    #[error("'{id}' is not a valid message id")]
    InvalidId {
        /// The rejected value.
        id: String,
    },

    /// `run` was called while a collection is in progress.
    #[error("collector is already running")]
    AlreadyRunning,

    /// The collector's listeners could not be registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for module operations.
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Result type for collector operations.
pub type CollectorResult<T> = Result<T, CollectorError>;
