// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines the configuration structs that map to sections in
//! `fpnn_configuration.toml`.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FpnnConfig {
    pub engine: EngineSection,
    pub logging: LoggingSection,
}

/// Wave engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSection {
    /// Evaluation strategy: "sequential" or "parallel".
    pub scheduler: String,
    /// Deadline in milliseconds for every barrier wait in the parallel
    /// runtime and for output collection.
    pub barrier_timeout_ms: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            scheduler: "sequential".to_string(),
            barrier_timeout_ms: 5000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", or "error".
    pub level: String,
    /// Include the emitting module path in each log line.
    pub show_target: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_target: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FpnnConfig::default();
        assert_eq!(config.engine.scheduler, "sequential");
        assert_eq!(config.engine.barrier_timeout_ms, 5000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: FpnnConfig = toml::from_str(
            r#"
            [engine]
            scheduler = "parallel"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.scheduler, "parallel");
        assert_eq!(config.engine.barrier_timeout_ms, 5000);
        assert_eq!(config.logging.level, "info");
    }
}
