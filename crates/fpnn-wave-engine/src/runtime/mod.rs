// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Parallel actor runtime
//!
//! One OS thread per actor (node or link), wired edge-for-edge with
//! single-slot data channels and per-actor ack channels. A wave builds a
//! fresh fabric, pushes the input vectors in, and collects `(index,
//! value)` reports from the output actors.
//!
//! ```text
//! Brain ---vector---> [InputActor] --data--> [LinkActor] --data--> [NodeActor]
//!   ^                      ^ ack                 ^ ack                 |
//!   |                      '---------------------'---------------------'
//!   '----(index, value)----------------------------------------------- '
//! ```
//!
//! Every barrier wait carries the configured deadline, so a wiring
//! mistake or stalled actor surfaces as a `WaveError` instead of a
//! deadlock. Teardown drops the shutdown channel, which wakes and stops
//! every actor; the thread handles join on drop.

mod actors;
mod channels;
mod worker;

use crate::config::EngineConfig;
use crate::stats::WaveStats;
use crate::validate_inputs;
use actors::{run_input, run_link, run_node, ActorCtx, InputActor, LinkActor, NodeActor};
use ahash::AHashMap;
use channels::{ack_channel, edge_channel, InEdge, OutEdge};
use crossbeam::channel::{bounded, Receiver, Sender};
use fpnn_graph::{Graph, Handle, LinkId, NodeId, NodeRole, WaveError, WaveResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use worker::ActorThread;

#[derive(Debug)]
pub struct ParallelEngine {
    timeout: Duration,
    stats: WaveStats,
}

impl ParallelEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            timeout: config.barrier_timeout,
            stats: WaveStats::default(),
        }
    }

    pub fn stats(&self) -> &WaveStats {
        &self.stats
    }

    /// Propagate one wave through a freshly spawned actor fabric.
    ///
    /// Numerically equivalent to `SequentialEngine::evaluate` on the same
    /// graph and inputs; only the scheduling differs.
    pub fn evaluate(&mut self, graph: &Graph, inputs: &[Vec<f64>]) -> WaveResult<Vec<f64>> {
        validate_inputs(graph, inputs)?;
        check_output_report_counts(graph)?;
        let started = Instant::now();
        let fabric = Fabric::build(graph, self.timeout);
        let deadline = Instant::now() + self.timeout;
        let timeout_ms = self.timeout.as_millis() as u64;

        for (i, tx) in fabric.input_txs.iter().enumerate() {
            if tx.send(inputs[i].clone()).is_err() {
                return Err(fabric.take_error().unwrap_or(WaveError::WorkerPanic {
                    actor: Handle::Node(graph.input_order()[i]),
                }));
            }
        }

        // All input vectors fully delivered before results are awaited.
        for (i, done_rx) in fabric.done_rxs.iter().enumerate() {
            if done_rx.recv_deadline(deadline).is_err() {
                return Err(fabric.take_error().unwrap_or(WaveError::BarrierTimeout {
                    actor: Handle::Node(graph.input_order()[i]),
                    timeout_ms,
                }));
            }
        }
        debug!(graph = %graph.name(), "input barrier passed");

        let expected = graph.output_order().len();
        let mut outputs: Vec<Option<f64>> = vec![None; expected];
        let mut remaining = expected;
        while remaining > 0 {
            match fabric.result_rx.recv_deadline(deadline) {
                Ok((index, value)) => {
                    if outputs[index].is_some() {
                        return Err(WaveError::AckOverflow {
                            target: Handle::Node(graph.output_order()[index]),
                            count: 2,
                            max: 1,
                        });
                    }
                    outputs[index] = Some(value);
                    remaining -= 1;
                }
                Err(_) => {
                    let output_index =
                        outputs.iter().position(Option::is_none).unwrap_or(0);
                    return Err(fabric
                        .take_error()
                        .unwrap_or(WaveError::DisconnectedGraph { output_index }));
                }
            }
        }

        // A report for an already-filled slot that arrives after the loop
        // above exits is the same protocol violation it checks for.
        if let Ok((index, _)) = fabric.result_rx.try_recv() {
            return Err(WaveError::AckOverflow {
                target: Handle::Node(graph.output_order()[index]),
                count: 2,
                max: 1,
            });
        }

        self.stats.total_waves += 1;
        self.stats.total_values_propagated += fabric.propagated.load(Ordering::Relaxed);
        self.stats.total_nodes_fired += fabric.fired.load(Ordering::Relaxed);
        self.stats.total_processing_time_us += started.elapsed().as_micros() as u64;
        debug!(graph = %graph.name(), outputs = expected, "wave complete");

        Ok(outputs
            .into_iter()
            .map(|v| v.expect("all outputs collected"))
            .collect())
    }
}

/// Reject wiring that would fire an output node more than once per wave.
///
/// Fire counts are fully determined by the wiring (input widths, fan-out,
/// iteration thresholds), so the violation the sequential scheduler trips
/// over mid-wave is known before any thread spawns. Counts are undefined
/// when virtual routes close a cycle; the check is skipped there and the
/// late-report drain in `evaluate` remains the only guard.
fn check_output_report_counts(graph: &Graph) -> WaveResult<()> {
    let mut counts = FireCounts::new(graph);
    for &node_id in graph.output_order() {
        if let Some(fires) = counts.node_fires(node_id) {
            if fires > 1 {
                return Err(WaveError::AckOverflow {
                    target: Handle::Node(node_id),
                    count: 2,
                    max: 1,
                });
            }
        }
    }
    Ok(())
}

/// Per-wave fire counts derived from the wiring alone.
///
/// A link fires once per value it receives, a node once per `iterate_max`
/// arrivals, an input node once per vector component. Memoized recursion
/// over producers; `None` marks a dependency cycle.
struct FireCounts<'g> {
    graph: &'g Graph,
    /// Virtual target link -> inbound links whose raw arrivals echo into it.
    virtual_feeds: AHashMap<LinkId, Vec<LinkId>>,
    link_memo: AHashMap<LinkId, Option<u64>>,
    node_memo: AHashMap<NodeId, Option<u64>>,
}

impl<'g> FireCounts<'g> {
    fn new(graph: &'g Graph) -> Self {
        let mut virtual_feeds: AHashMap<LinkId, Vec<LinkId>> = AHashMap::new();
        for node in graph.nodes() {
            if let NodeRole::Hidden { virtual_routes } = node.role() {
                for (&inbound, targets) in virtual_routes {
                    for &target in targets {
                        virtual_feeds.entry(target).or_default().push(inbound);
                    }
                }
            }
        }
        Self {
            graph,
            virtual_feeds,
            link_memo: AHashMap::new(),
            node_memo: AHashMap::new(),
        }
    }

    fn link_fires(&mut self, id: LinkId) -> Option<u64> {
        if let Some(&memo) = self.link_memo.get(&id) {
            return memo;
        }
        // In-progress marker; hitting it again means a cycle.
        self.link_memo.insert(id, None);
        let mut fires = 0u64;
        if let Some(producer) = self.graph[id].producer() {
            if self.graph[producer].output_links().contains(&id) {
                fires += self.node_fires(producer)?;
            }
        }
        let feeds = self.virtual_feeds.get(&id).cloned().unwrap_or_default();
        for inbound in feeds {
            fires += self.link_fires(inbound)?;
        }
        self.link_memo.insert(id, Some(fires));
        Some(fires)
    }

    fn node_fires(&mut self, id: NodeId) -> Option<u64> {
        if let Some(&memo) = self.node_memo.get(&id) {
            return memo;
        }
        self.node_memo.insert(id, None);
        let fires = match self.graph[id].role() {
            NodeRole::Input { width } => *width as u64,
            _ => {
                let mut arrivals = 0u64;
                for inbound in self.graph[id].input_links().to_vec() {
                    arrivals += self.link_fires(inbound)?;
                }
                arrivals / u64::from(self.graph[id].iterate_max())
            }
        };
        self.node_memo.insert(id, Some(fires));
        Some(fires)
    }
}

/// One wave's worth of channels and threads.
///
/// Field order matters: dropping `shutdown_tx` first disconnects every
/// actor's shutdown receiver, so the subsequent `ActorThread` drops can
/// join promptly.
struct Fabric {
    _shutdown_tx: Sender<()>,
    _actors: Vec<ActorThread>,
    /// External-vector senders, aligned with the graph's input order.
    input_txs: Vec<Sender<Vec<f64>>>,
    done_rxs: Vec<Receiver<()>>,
    result_rx: Receiver<(usize, f64)>,
    err_rx: Receiver<WaveError>,
    propagated: Arc<AtomicU64>,
    fired: Arc<AtomicU64>,
}

impl Fabric {
    /// First actor error reported so far, if any.
    fn take_error(&self) -> Option<WaveError> {
        self.err_rx.try_recv().ok()
    }

    fn build(graph: &Graph, timeout: Duration) -> Self {
        let n_links = graph.links().len();
        let n_actors = n_links + graph.nodes().len();

        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let (err_tx, err_rx) = bounded(n_actors.max(1));
        let (result_tx, result_rx) = bounded(graph.output_order().len().max(1));
        let propagated = Arc::new(AtomicU64::new(0));
        let fired = Arc::new(AtomicU64::new(0));
        let ctx = ActorCtx {
            shutdown_rx,
            err_tx,
            timeout,
            propagated: Arc::clone(&propagated),
            fired: Arc::clone(&fired),
        };

        // Ack channel per actor, sized to its fan-out.
        let link_ack: Vec<(Sender<()>, Receiver<()>)> = graph
            .links()
            .iter()
            .map(|l| ack_channel(l.consumers().len()))
            .collect();
        let node_ack: Vec<(Sender<()>, Receiver<()>)> = graph
            .nodes()
            .iter()
            .map(|n| {
                let virtual_fan_out: usize = n
                    .input_links()
                    .iter()
                    .map(|&inbound| n.virtual_targets(inbound).len())
                    .sum();
                ack_channel(n.output_links().len() + virtual_fan_out)
            })
            .collect();

        // Producer-to-link edges. The sending half goes to whichever node
        // produces into the link (ordinary binding or virtual route).
        let mut to_link_tx: Vec<Sender<f64>> = Vec::with_capacity(n_links);
        let mut to_link_rx: Vec<Receiver<f64>> = Vec::with_capacity(n_links);
        for _ in 0..n_links {
            let (tx, rx) = edge_channel();
            to_link_tx.push(tx);
            to_link_rx.push(rx);
        }

        // Link-to-consumer edges, receivers parked for node assembly.
        let mut consumer_rx: AHashMap<(LinkId, NodeId), Receiver<f64>> = AHashMap::new();
        let mut link_out: Vec<Vec<OutEdge>> = Vec::with_capacity(n_links);
        for link in graph.links() {
            let mut edges = Vec::with_capacity(link.consumers().len());
            for &consumer in link.consumers() {
                let (tx, rx) = edge_channel();
                edges.push(OutEdge {
                    to: Handle::Node(consumer),
                    tx,
                });
                consumer_rx.insert((link.id(), consumer), rx);
            }
            link_out.push(edges);
        }

        let mut actors = Vec::with_capacity(n_actors);
        for (i, link) in graph.links().iter().enumerate() {
            let ack_tx = match link.producer() {
                Some(producer) => node_ack[producer.index()].0.clone(),
                // Unbound link: the edge never carries data, the ack goes
                // nowhere.
                None => ack_channel(1).0,
            };
            let actor = LinkActor {
                link: link.clone(),
                in_edge: InEdge {
                    rx: to_link_rx[i].clone(),
                    ack_tx,
                },
                out_edges: std::mem::take(&mut link_out[i]),
                ack_rx: link_ack[i].1.clone(),
            };
            let ctx = ctx.clone();
            actors.push(ActorThread::spawn(format!("fpnn-{}", link.name()), move || {
                run_link(actor, ctx)
            }));
        }

        // Iteration in id order preserves input declaration order, so
        // `input_txs[i]` pairs with `graph.input_order()[i]`.
        let mut input_txs = Vec::with_capacity(graph.input_order().len());
        let mut done_rxs = Vec::with_capacity(graph.input_order().len());
        for node in graph.nodes() {
            let mut node_copy = node.clone();
            node_copy.reset_wave_state();
            let ack_rx = node_ack[node.id().index()].1.clone();
            let out_edges: Vec<OutEdge> = node
                .output_links()
                .iter()
                .map(|&l| OutEdge {
                    to: Handle::Link(l),
                    tx: to_link_tx[l.index()].clone(),
                })
                .collect();
            let name = format!("fpnn-{}", node.name());
            let ctx = ctx.clone();

            match node.role() {
                NodeRole::Input { .. } => {
                    let (vector_tx, vector_rx) = bounded(1);
                    let (done_tx, done_rx) = bounded(1);
                    input_txs.push(vector_tx);
                    done_rxs.push(done_rx);
                    let actor = InputActor {
                        node: node_copy,
                        vector_rx,
                        out_edges,
                        ack_rx,
                        done_tx,
                    };
                    actors.push(ActorThread::spawn(name, move || run_input(actor, ctx)));
                }
                role => {
                    let in_edges: Vec<InEdge> = node
                        .input_links()
                        .iter()
                        .map(|&l| InEdge {
                            rx: consumer_rx
                                .remove(&(l, node.id()))
                                .expect("edge channel built from consumer lists"),
                            ack_tx: link_ack[l.index()].0.clone(),
                        })
                        .collect();
                    let virtual_out: AHashMap<LinkId, Vec<OutEdge>> = node
                        .input_links()
                        .iter()
                        .filter_map(|&inbound| {
                            let targets = node.virtual_targets(inbound);
                            if targets.is_empty() {
                                return None;
                            }
                            let edges = targets
                                .iter()
                                .map(|&t| OutEdge {
                                    to: Handle::Link(t),
                                    tx: to_link_tx[t.index()].clone(),
                                })
                                .collect();
                            Some((inbound, edges))
                        })
                        .collect();
                    let result_tx = matches!(role, NodeRole::Output { .. })
                        .then(|| result_tx.clone());
                    let actor = NodeActor {
                        node: node_copy,
                        in_edges,
                        out_edges,
                        virtual_out,
                        ack_rx,
                        result_tx,
                    };
                    actors.push(ActorThread::spawn(name, move || run_node(actor, ctx)));
                }
            }
        }
        debug!(graph = %graph.name(), actors = actors.len(), "fabric spawned");

        Self {
            _shutdown_tx: shutdown_tx,
            _actors: actors,
            input_txs,
            done_rxs,
            result_rx,
            err_rx,
            propagated,
            fired,
        }
    }
}
