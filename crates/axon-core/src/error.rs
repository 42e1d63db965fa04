//! Error types for the Axon core layer.
//!
//! Framework-level errors (registries, modules, collectors) live in
//! `axon-framework`.

use thiserror::Error;

use crate::event::EventName;

// =============================================================================
// Container Errors
// =============================================================================

/// Errors raised by [`KeyedContainer`](crate::KeyedContainer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// The label is already present.
    #[error("duplicate key '{key}'")]
    DuplicateKey {
        /// The offending label.
        key: String,
    },
}

// =============================================================================
// Library Errors
// =============================================================================

/// Errors raised by a [`LibraryInterface`](crate::LibraryInterface).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    /// The library has no upstream binding for this internal event.
    #[error("event '{event}' is not supported by the {library} library interface")]
    UnsupportedEvent {
        /// The internal event name.
        event: EventName,
        /// Name of the library interface.
        library: &'static str,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Result type for library interface operations.
pub type LibraryResult<T> = Result<T, LibraryError>;
