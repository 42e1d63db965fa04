//! Axon Runtime - configuration, logging and module orchestration.
//!
//! This crate provides:
//! - Layered configuration ([`AxonConfig`], [`ConfigLoader`])
//! - `tracing-subscriber` setup ([`LoggingBuilder`])
//! - Library selection from the configured [`LibraryType`](axon_core::LibraryType)
//! - [`AxonRuntime`], which owns the registries and loads modules
//!
//! ```ignore
//! use std::sync::Arc;
//! use axon_core::LocalEventSource;
//! use axon_runtime::AxonRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = AxonRuntime::new(Arc::new(LocalEventSource::new()));
//!     runtime.load_modules(&[fun::MODULE, moderation::MODULE])?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{AxonConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{AxonRuntime, RuntimeBuilder, select_library};
