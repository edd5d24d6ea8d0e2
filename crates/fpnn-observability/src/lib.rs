// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # fpnn-observability
//!
//! Observability infrastructure for FPNN: structured console logging
//! built on `tracing`, with per-crate filtering via `RUST_LOG` or an
//! explicit level in the logging configuration.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod init;

pub use config::LoggingConfig;
pub use init::{init_logging, init_logging_default};

/// FPNN crate names, usable as `tracing` filter targets.
pub const KNOWN_CRATES: &[&str] = &[
    "fpnn",
    "fpnn_graph",
    "fpnn_wave_engine",
    "fpnn_config",
];
