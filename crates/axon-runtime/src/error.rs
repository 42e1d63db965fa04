//! Runtime error types.

use axon_framework::ModuleError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A module failed to activate completely. It stays loaded.
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// No module with this label is loaded.
    #[error("Module not loaded: {0}")]
    UnknownModule(String),

    /// A module with this label is already loaded.
    #[error("Module already loaded: {0}")]
    ModuleExists(String),

    /// Installing the shutdown signal handler failed.
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
