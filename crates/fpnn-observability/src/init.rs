// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for FPNN
//!
//! Console output only; `RUST_LOG` takes precedence over the configured
//! level so individual crates can be dialed up without touching config.

use crate::config::LoggingConfig;
use crate::KNOWN_CRATES;
use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Comma-joined filter directives: the base level plus one per FPNN
/// crate, so the workspace crates follow the configured level even when
/// a stricter global default applies.
fn filter_directives(level: &str) -> String {
    let mut directives = vec![level.to_string()];
    directives.extend(
        KNOWN_CRATES
            .iter()
            .map(|target| format!("{target}={level}")),
    );
    directives.join(",")
}

/// Initialize logging with console output
///
/// # Errors
///
/// Fails if a global subscriber is already installed or the configured
/// level is not a valid filter directive.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(&config.level))
            .with_context(|| format!("Invalid log level: {}", config.level))?,
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(config.show_target)
        .with_file(false)
        .with_line_number(false);

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    Ok(())
}

/// Initialize logging with default settings
pub fn init_logging_default() -> Result<()> {
    init_logging(&LoggingConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_cover_workspace_crates() {
        let directives = filter_directives("debug");
        assert!(directives.starts_with("debug,"));
        for target in KNOWN_CRATES {
            assert!(directives.contains(&format!("{target}=debug")));
        }
    }

    #[test]
    fn test_invalid_level_rejected() {
        let config = LoggingConfig {
            level: "not-a-level=".to_string(),
            show_target: false,
        };
        // Either the filter parse fails or a subscriber from another test
        // is already installed; both are errors, neither panics.
        let _ = init_logging(&config);
    }

    #[test]
    fn test_default_init_does_not_panic() {
        let _ = init_logging_default();
    }
}
