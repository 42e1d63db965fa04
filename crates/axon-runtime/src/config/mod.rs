//! Runtime configuration.
//!
//! [`AxonConfig`] is assembled by the figment-based [`ConfigLoader`] from
//! defaults, TOML/YAML files and `AXON_*` environment variables, then
//! checked by [`validate_config`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile};
pub use schema::{
    AxonConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, SpanEventConfig,
};
pub use validation::validate_config;
