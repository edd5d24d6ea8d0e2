// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, FpnnConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Find the FPNN configuration file
///
/// Search order:
/// 1. `FPNN_CONFIG_PATH` environment variable
/// 2. Current working directory: `./fpnn_configuration.toml`
/// 3. Ancestor directories (up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("FPNN_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by FPNN_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join("fpnn_configuration.toml"));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join("fpnn_configuration.toml"));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "FPNN configuration file 'fpnn_configuration.toml' not found in any of these locations:\n{}\n\nSet FPNN_CONFIG_PATH environment variable to specify custom location.",
        search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<FpnnConfig> {
    let config_file = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        find_config_file()?
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: FpnnConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `FPNN_SCHEDULER` -> `engine.scheduler`
/// - `FPNN_BARRIER_TIMEOUT_MS` -> `engine.barrier_timeout_ms`
/// - `FPNN_LOG_LEVEL` -> `logging.level`
/// - `FPNN_LOG_SHOW_TARGET` -> `logging.show_target`
pub fn apply_environment_overrides(config: &mut FpnnConfig) {
    if let Ok(value) = env::var("FPNN_SCHEDULER") {
        config.engine.scheduler = value;
    }
    if let Ok(value) = env::var("FPNN_BARRIER_TIMEOUT_MS") {
        if let Ok(ms) = value.parse::<u64>() {
            config.engine.barrier_timeout_ms = ms;
        }
    }
    if let Ok(value) = env::var("FPNN_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("FPNN_LOG_SHOW_TARGET") {
        config.logging.show_target =
            value.to_lowercase() == "true" || value == "1" || value.to_lowercase() == "yes";
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"scheduler": "parallel"}`)
pub fn apply_cli_overrides(config: &mut FpnnConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("scheduler") {
        config.engine.scheduler = value.clone();
    }
    if let Some(value) = cli_args.get("barrier_timeout_ms") {
        if let Ok(ms) = value.parse::<u64>() {
            config.engine.barrier_timeout_ms = ms;
        }
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("FPNN_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("FPNN_CONFIG_PATH");

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("fpnn_configuration.toml");

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[engine]").unwrap();
        writeln!(file, "scheduler = \"parallel\"").unwrap();
        writeln!(file, "barrier_timeout_ms = 250").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.engine.scheduler, "parallel");
        assert_eq!(config.engine.barrier_timeout_ms, 250);

        // Untouched section keeps its defaults.
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = FpnnConfig::default();

        env::set_var("FPNN_SCHEDULER", "parallel");
        env::set_var("FPNN_LOG_LEVEL", "debug");

        apply_environment_overrides(&mut config);

        env::remove_var("FPNN_SCHEDULER");
        env::remove_var("FPNN_LOG_LEVEL");

        assert_eq!(config.engine.scheduler, "parallel");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("fpnn_configuration.toml");

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[engine]").unwrap();
        writeln!(file, "scheduler = \"sequential\"").unwrap();
        writeln!(file, "barrier_timeout_ms = 1000").unwrap();

        env::set_var("FPNN_SCHEDULER", "parallel");
        env::set_var("FPNN_BARRIER_TIMEOUT_MS", "2000");

        let mut cli_args = HashMap::new();
        cli_args.insert("scheduler".to_string(), "sequential".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("FPNN_SCHEDULER");
        env::remove_var("FPNN_BARRIER_TIMEOUT_MS");

        // CLI wins for scheduler, env wins for the timeout (no CLI override).
        assert_eq!(config.engine.scheduler, "sequential");
        assert_eq!(config.engine.barrier_timeout_ms, 2000);
    }
}
