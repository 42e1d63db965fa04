//! # Axon Framework
//!
//! Pluggable entities, their registries, and event dispatch.
//!
//! This layer provides:
//! - [`Command`] and [`Listener`] entities, grouped into [`Module`]s
//! - [`EntityRegistry`] plus the kind-specific [`CommandRegistry`] (with
//!   aliases) and [`ListenerRegistry`]
//! - [`EventManager`], the single owner of upstream subscriptions
//! - [`CommandLoader`] / [`ListenerLoader`] for bulk module activation
//! - [`MessageCollector`], a time-boxed channel message collector
//! - [`ScopeGate`] for per-scope enablement checks
//!
//! ```text
//! ModuleDescriptor ──instantiate──► Module ──init──► CommandLoader  ──► CommandRegistry
//!                                          └───────► ListenerLoader ──► ListenerRegistry
//!                                                                           │
//!                     upstream event ──► LibraryInterface ──► EventManager ◄┘
//!                                                                 │
//!                                                     ScopeGate ──┴──► Listener
//! ```

pub mod collector;
pub mod command;
pub mod error;
pub mod event_manager;
pub mod gate;
pub mod listener;
pub mod module;
pub mod policy;
pub mod registry;

#[cfg(test)]
mod testing;

pub use collector::{
    CollectorEvent, CollectorOptions, CollectorState, MessageCollector, RunOptions,
    UPDATE_SETTLE_DELAY,
};
pub use command::{Command, CommandContext, CommandFn};
pub use error::{
    CollectorError, CollectorResult, ModuleError, ModuleResult, RegistryError, RegistryResult,
};
pub use event_manager::EventManager;
pub use gate::{AllowAll, BoxedGate, DisabledModules, ScopeGate};
pub use listener::{Listener, ListenerContext, ListenerFn, ListenerFuture};
pub use module::{CommandLoader, ListenerLoader, Module, ModuleDescriptor, ModuleInfo};
pub use policy::{CommandOptions, CommandPermissions};
pub use registry::{CommandRegistry, Entity, EntityRegistry, ListenerRegistry, Registry};
