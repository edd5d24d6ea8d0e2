// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # FPNN Wave Engine
//!
//! Drives waves of scalar values through an `fpnn-graph` actor graph.
//! Two interchangeable schedulers implement the same semantics:
//!
//! - [`SequentialEngine`]: single-threaded, strict-FIFO task queue.
//! - [`ParallelEngine`]: one thread per actor, ACK-barrier synchronized.
//!
//! [`Brain`] is the owner-facing facade: it holds the graph, validates
//! external input shapes, dispatches to the configured scheduler, and
//! returns the output vector in declaration order.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod runtime;
pub mod sequential;
pub mod stats;

pub use config::{EngineConfig, SchedulerKind};
pub use runtime::ParallelEngine;
pub use sequential::SequentialEngine;
pub use stats::WaveStats;

use fpnn_graph::{Graph, WaveError, WaveResult};

/// Check the external input vectors against the graph's declared input
/// nodes: one vector per input node, each matching the node's width.
pub(crate) fn validate_inputs(graph: &Graph, inputs: &[Vec<f64>]) -> WaveResult<()> {
    let expected = graph.input_order().len();
    if inputs.len() != expected {
        return Err(WaveError::InputCountMismatch {
            expected,
            actual: inputs.len(),
        });
    }
    for (vector, &node_id) in inputs.iter().zip(graph.input_order()) {
        let width = graph[node_id]
            .width()
            .expect("input order holds input nodes only");
        if vector.len() != width {
            return Err(WaveError::ShapeMismatch {
                node: node_id,
                expected: width,
                actual: vector.len(),
            });
        }
    }
    Ok(())
}

/// Owns a graph and evaluates waves against it with the configured
/// scheduler.
#[derive(Debug)]
pub struct Brain {
    graph: Graph,
    config: EngineConfig,
    sequential: SequentialEngine,
    parallel: ParallelEngine,
}

impl Brain {
    pub fn new(graph: Graph) -> Self {
        Self::with_config(graph, EngineConfig::default())
    }

    pub fn with_config(graph: Graph, config: EngineConfig) -> Self {
        let parallel = ParallelEngine::new(&config);
        Self {
            graph,
            config,
            sequential: SequentialEngine::new(),
            parallel,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Wiring may continue between waves; wave-time state is reset at the
    /// start of each evaluation.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Statistics of the currently configured scheduler.
    pub fn stats(&self) -> &WaveStats {
        match self.config.scheduler {
            SchedulerKind::Sequential => self.sequential.stats(),
            SchedulerKind::Parallel => self.parallel.stats(),
        }
    }

    /// Evaluate one wave: `inputs[i]` feeds the i-th declared input node;
    /// the result holds one value per declared output node.
    pub fn evaluate(&mut self, inputs: &[Vec<f64>]) -> WaveResult<Vec<f64>> {
        match self.config.scheduler {
            SchedulerKind::Sequential => self.sequential.evaluate(&mut self.graph, inputs),
            SchedulerKind::Parallel => self.parallel.evaluate(&self.graph, inputs),
        }
    }
}
