//! # Axon
//!
//! A modular framework for commands and event listeners on top of an
//! upstream event source whose payload shape varies by client library.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌──────────────┐     ┌──────────────────────┐
//! │ EventSource │────▶│ LibraryInterface │────▶│ EventManager │────▶│ Module "fun"         │
//! │ (upstream)  │     │ gateway / cached │     │  ScopeGate   │────▶│ Module "moderation"  │
//! └─────────────┘     └──────────────────┘     └──────────────┘     └──────────────────────┘
//! ```
//!
//! - **Libraries**: map internal events to upstream names and resolve the
//!   scope (guild) each event occurred in
//! - **EventManager**: binds each upstream event once and fans it out to
//!   the listeners registered for it
//! - **Modules**: groups of commands and listeners loaded and unloaded as
//!   one unit
//! - **Collectors**: gather a channel's messages until a count or deadline
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use axon::prelude::*;
//!
//! fn listeners() -> Vec<Listener> {
//!     vec![Listener::new("welcome", EventName::GuildMemberAdd, |ctx| async move {
//!         tracing::info!(scope = ?ctx.scope, "member joined");
//!         Ok(())
//!     })]
//! }
//!
//! static GREETER: ModuleDescriptor = ModuleDescriptor::new("greeter").listeners(listeners);
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = AxonRuntime::new(Arc::new(LocalEventSource::new()));
//!     runtime.load_module(&GREETER)?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use axon_core as core;
pub use axon_framework as framework;
pub use axon_runtime as runtime;

/// Upstream library interfaces.
pub mod libraries {
    pub use axon_library_cached::CachedLibrary;
    pub use axon_library_gateway::GatewayLibrary;
}

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use axon::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use axon_runtime::{AxonConfig, AxonRuntime};

    // Modules and their entities
    pub use axon_framework::{
        Command, CommandContext, CommandOptions, CommandPermissions, Listener, ListenerContext,
        Module, ModuleDescriptor,
    };

    // Collection
    pub use axon_framework::{MessageCollector, RunOptions};

    // Core types
    pub use axon_core::{
        EventName, EventSource, LibraryType, LocalEventSource, Message, Payload, ScopeId,
    };
}
