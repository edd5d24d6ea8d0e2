//! Configuration validation
//!
//! This module provides validation logic to ensure configuration values
//! are consistent and within valid ranges.

use crate::{ConfigError, ConfigResult, FpnnConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

const SCHEDULERS: [&str; 2] = ["sequential", "parallel"];
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate the complete configuration
///
/// Checks for:
/// - Recognized scheduler name
/// - Non-zero barrier timeout
/// - Recognized log level
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with details if validation fails
pub fn validate_config(config: &FpnnConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    if !SCHEDULERS.contains(&config.engine.scheduler.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "engine.scheduler".to_string(),
            reason: format!(
                "'{}' is not one of: {}",
                config.engine.scheduler,
                SCHEDULERS.join(", ")
            ),
        });
    }
    if config.engine.barrier_timeout_ms == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "engine.barrier_timeout_ms".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!(
                "'{}' is not one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(validate_config(&FpnnConfig::default()).is_ok());
    }

    #[test]
    fn test_unknown_scheduler_rejected() {
        let mut config = FpnnConfig::default();
        config.engine.scheduler = "quantum".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = FpnnConfig::default();
        config.engine.barrier_timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_log_level_case_insensitive() {
        let mut config = FpnnConfig::default();
        config.logging.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
