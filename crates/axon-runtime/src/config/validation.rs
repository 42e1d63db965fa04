//! Configuration validation utilities.

use std::collections::HashSet;

use axon_framework::CollectorOptions;

use super::error::{ConfigError, ConfigResult};
use super::schema::{AxonConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &AxonConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_collector_options(&config.collector)?;
    validate_disabled_modules(&config.disabled_modules)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

fn validate_collector_options(collector: &CollectorOptions) -> ConfigResult<()> {
    if collector.timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Collector timeout must be greater than 0",
        ));
    }

    if collector.count == 0 {
        return Err(ConfigError::validation(
            "Collector count must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_disabled_modules(labels: &[String]) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for label in labels {
        if label.trim().is_empty() {
            return Err(ConfigError::validation("Disabled module label is empty"));
        }

        if !seen.insert(label) {
            return Err(ConfigError::validation(format!(
                "Module {label} is disabled twice"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&AxonConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_collector_timeout() {
        let mut config = AxonConfig::default();
        config.collector.timeout_ms = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_zero_collector_count() {
        let mut config = AxonConfig::default();
        config.collector.count = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_file_output_requires_path() {
        let mut config = AxonConfig::default();
        config.logging.output = LogOutput::File;

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::MissingField { .. })));

        config.logging.file_path = Some("logs/axon.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_duplicate_disabled_module() {
        let config = AxonConfig {
            disabled_modules: vec!["fun".into(), "fun".into()],
            ..AxonConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
