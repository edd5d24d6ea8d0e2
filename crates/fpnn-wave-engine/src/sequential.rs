// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Sequential wave scheduler
//!
//! Single-threaded cooperative evaluation: a strict-FIFO pending-work
//! queue of `(link, value)` pairs, seeded from the external inputs and
//! drained until empty. Ordering is deterministic, which is what the
//! golden-output tests rely on.
//!
//! The dataflow is confluent for acyclic wiring, so this scheduler and
//! the parallel actor runtime produce numerically identical results.

use crate::stats::WaveStats;
use crate::validate_inputs;
use fpnn_graph::{Graph, Handle, LinkId, NodeRole, WaveError, WaveResult};
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, trace};

#[derive(Debug, Default)]
pub struct SequentialEngine {
    stats: WaveStats,
}

impl SequentialEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &WaveStats {
        &self.stats
    }

    /// Propagate one wave of external input vectors through the graph.
    ///
    /// `inputs[i]` feeds the i-th declared input node and must match its
    /// width; the result holds one value per declared output node, in
    /// declaration order.
    pub fn evaluate(&mut self, graph: &mut Graph, inputs: &[Vec<f64>]) -> WaveResult<Vec<f64>> {
        validate_inputs(graph, inputs)?;
        let started = Instant::now();
        graph.reset_wave_state();

        let mut outputs: Vec<Option<f64>> = vec![None; graph.output_order().len()];
        let mut queue: VecDeque<(LinkId, f64)> = VecDeque::new();

        // Seed: each input node broadcasts each vector component to all of
        // its successor links, in declaration order.
        for (vec_idx, &node_id) in graph.input_order().iter().enumerate() {
            let successors: Vec<LinkId> = graph[node_id].output_links().to_vec();
            for &component in &inputs[vec_idx] {
                for &link_id in &successors {
                    queue.push_back((link_id, component));
                }
            }
        }
        debug!(graph = %graph.name(), seeded = queue.len(), "wave seeded");

        while let Some((link_id, value)) = queue.pop_front() {
            let producer = graph[link_id]
                .producer()
                .expect("pending work queued for an unbound link");
            graph[link_id].submit(producer, value)?;
            let transformed = graph[link_id].fire()?;
            self.stats.total_values_propagated += 1;
            trace!(link = %link_id, value, transformed, "link fired");

            let consumers = graph[link_id].consumers().to_vec();
            for consumer in consumers {
                graph[consumer].write(link_id, transformed)?;
                let raw = graph[consumer]
                    .consume(link_id)
                    .expect("register written above");

                // Virtual forwarding strictly precedes the accumulator
                // update for this same value.
                for &target in graph[consumer].virtual_targets(link_id) {
                    queue.push_back((target, raw));
                }

                if let Some(activated) = graph[consumer].accumulate(raw) {
                    self.stats.total_nodes_fired += 1;
                    trace!(node = %consumer, activated, "node activated");
                    match graph[consumer].role() {
                        NodeRole::Output { index } => {
                            let index = *index;
                            if outputs[index].is_some() {
                                return Err(WaveError::AckOverflow {
                                    target: Handle::Node(consumer),
                                    count: 2,
                                    max: 1,
                                });
                            }
                            outputs[index] = Some(activated);
                        }
                        _ => {
                            for &succ in graph[consumer].output_links() {
                                queue.push_back((succ, activated));
                            }
                        }
                    }
                }
            }
        }

        // The queue drained; every declared output must have reported.
        let result = outputs
            .into_iter()
            .enumerate()
            .map(|(output_index, value)| value.ok_or(WaveError::DisconnectedGraph { output_index }))
            .collect::<WaveResult<Vec<f64>>>()?;

        self.stats.total_waves += 1;
        self.stats.total_processing_time_us += started.elapsed().as_micros() as u64;
        debug!(graph = %graph.name(), outputs = result.len(), "wave complete");
        Ok(result)
    }
}
