// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # FPNN - Flow-based Parallel Neural Network
//!
//! A dataflow evaluation engine where a neural network is a graph of
//! communicating actors. Nodes accumulate scalar values through a shared
//! activator; links apply an affine transform (`y = W*x + T`) and
//! broadcast to their consumers. A wave pushes one set of external input
//! vectors through the graph and returns one value per output node.
//!
//! ## Quick Start
//!
//! ```rust
//! use fpnn::prelude::*;
//!
//! let mut g = Graph::new("xor-ish");
//! let n_in = g.add_input_node(1)?;
//! let link = g.add_link(2.0, 1.0)?;
//! let n_out = g.add_output_node(Activator::identity(), 0.0, 1)?;
//! g.connect(Handle::Node(n_in), Handle::Link(link))?;
//! g.connect(Handle::Link(link), Handle::Node(n_out))?;
//!
//! let mut brain = Brain::new(g);
//! let out = brain.evaluate(&[vec![3.0]])?;
//! assert_eq!(out, vec![7.0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - **`config`** (default): TOML configuration loading
//!   (`fpnn_configuration.toml` plus environment and CLI overrides)
//! - **`observability`** (default): `tracing` subscriber initialization
//!   helpers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: fpnn-graph                                 │
//! │  (Activator, Link, Node, Graph arena, wiring rules)     │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Execution: fpnn-wave-engine                            │
//! │  (Brain facade, sequential scheduler, actor runtime)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Infrastructure: fpnn-config, fpnn-observability        │
//! │  (TOML config + overrides, logging init)                │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export foundation
pub use fpnn_graph as graph;

// Re-export execution layer
pub use fpnn_wave_engine as wave_engine;

// Re-export infrastructure
#[cfg(feature = "config")]
pub use fpnn_config as config;

#[cfg(feature = "observability")]
pub use fpnn_observability as observability;

/// Build an [`wave_engine::EngineConfig`] from the loaded TOML
/// configuration.
///
/// Unknown scheduler names fall back to the sequential default; run
/// `fpnn_config::validate_config` first to reject them instead.
#[cfg(feature = "config")]
pub fn engine_config_from(config: &fpnn_config::FpnnConfig) -> fpnn_wave_engine::EngineConfig {
    use fpnn_wave_engine::{EngineConfig, SchedulerKind};
    use std::time::Duration;

    let scheduler = match config.engine.scheduler.as_str() {
        "parallel" => SchedulerKind::Parallel,
        _ => SchedulerKind::Sequential,
    };
    EngineConfig {
        scheduler,
        barrier_timeout: Duration::from_millis(config.engine.barrier_timeout_ms),
    }
}

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::graph::{
        Activator, Graph, GraphError, GraphResult, Handle, Link, LinkId, Node, NodeId, NodeRole,
        WaveError, WaveResult,
    };
    pub use crate::wave_engine::{
        Brain, EngineConfig, ParallelEngine, SchedulerKind, SequentialEngine, WaveStats,
    };

    #[cfg(feature = "config")]
    pub use crate::config::{load_config, validate_config, FpnnConfig};

    #[cfg(feature = "observability")]
    pub use crate::observability::{init_logging, init_logging_default, LoggingConfig};
}
