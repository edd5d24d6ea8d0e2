// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Actor loops for the parallel runtime
//!
//! One loop body per actor kind. Each loop blocks on its shutdown
//! channel plus its inbound edge(s); a disconnected shutdown channel is
//! the stop signal. Values are acknowledged immediately after being
//! taken off the edge register, and every send is followed by an ack
//! barrier so no producer can overrun a single-slot edge.

use crate::runtime::channels::{InEdge, OutEdge};
use ahash::AHashMap;
use crossbeam::channel::{select, Receiver, Select, Sender, TrySendError};
use fpnn_graph::{Handle, Link, LinkId, Node, WaveError, WaveResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

/// Shared per-wave context handed to every actor loop.
#[derive(Clone)]
pub(crate) struct ActorCtx {
    /// Never written to; dropping the sending half stops all actors.
    pub shutdown_rx: Receiver<()>,
    pub err_tx: Sender<WaveError>,
    pub timeout: Duration,
    pub propagated: Arc<AtomicU64>,
    pub fired: Arc<AtomicU64>,
}

impl ActorCtx {
    fn report(&self, err: WaveError) {
        warn!(%err, "actor aborting wave");
        let _ = self.err_tx.try_send(err);
    }
}

/// Push `value` to every edge, then wait for one ack per edge.
///
/// A full edge register means the downstream actor has not consumed the
/// previous value, which the ack barrier should have prevented.
fn broadcast(
    source: Handle,
    value: f64,
    edges: &[OutEdge],
    ack_rx: &Receiver<()>,
    timeout: Duration,
) -> WaveResult<()> {
    for edge in edges {
        match edge.tx.try_send(value) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                return Err(WaveError::SlotOccupied { target: edge.to });
            }
            Err(TrySendError::Disconnected(_)) => {
                return Err(WaveError::WorkerPanic { actor: edge.to });
            }
        }
    }
    for _ in edges {
        ack_rx
            .recv_timeout(timeout)
            .map_err(|_| WaveError::BarrierTimeout {
                actor: source,
                timeout_ms: timeout.as_millis() as u64,
            })?;
    }
    Ok(())
}

pub(crate) struct LinkActor {
    pub link: Link,
    pub in_edge: InEdge,
    pub out_edges: Vec<OutEdge>,
    pub ack_rx: Receiver<()>,
}

/// Link loop: receive, ack, transform, broadcast.
pub(crate) fn run_link(actor: LinkActor, ctx: ActorCtx) {
    let LinkActor {
        link,
        in_edge,
        out_edges,
        ack_rx,
    } = actor;
    let handle = Handle::Link(link.id());

    loop {
        select! {
            recv(ctx.shutdown_rx) -> _ => break,
            recv(in_edge.rx) -> msg => {
                let value = match msg {
                    Ok(v) => v,
                    Err(_) => break,
                };
                if in_edge.ack_tx.send(()).is_err() {
                    break;
                }
                let transformed = link.transform(value);
                ctx.propagated.fetch_add(1, Ordering::Relaxed);
                trace!(link = %link.id(), value, transformed, "link fired");
                if let Err(e) = broadcast(handle, transformed, &out_edges, &ack_rx, ctx.timeout) {
                    ctx.report(e);
                    break;
                }
            }
        }
    }
}

pub(crate) struct NodeActor {
    pub node: Node,
    /// Aligned with `node.input_links()` declaration order.
    pub in_edges: Vec<InEdge>,
    /// Ordinary successor edges.
    pub out_edges: Vec<OutEdge>,
    /// Virtual-route edges, keyed by inbound link.
    pub virtual_out: AHashMap<LinkId, Vec<OutEdge>>,
    pub ack_rx: Receiver<()>,
    /// Present on output nodes only.
    pub result_tx: Option<Sender<(usize, f64)>>,
}

/// Hidden/output node loop: receive on any bound edge, ack, forward
/// virtual routes, accumulate, emit on activation.
pub(crate) fn run_node(actor: NodeActor, ctx: ActorCtx) {
    let NodeActor {
        mut node,
        in_edges,
        out_edges,
        virtual_out,
        ack_rx,
        result_tx,
    } = actor;
    let handle = Handle::Node(node.id());

    // Shutdown is registered first; edge operations map to index - 1.
    let mut sel = Select::new();
    sel.recv(&ctx.shutdown_rx);
    for edge in &in_edges {
        sel.recv(&edge.rx);
    }

    loop {
        let op = sel.select();
        let index = op.index();
        if index == 0 {
            let _ = op.recv(&ctx.shutdown_rx);
            break;
        }
        let edge = &in_edges[index - 1];
        let value = match op.recv(&edge.rx) {
            Ok(v) => v,
            Err(_) => break,
        };
        if edge.ack_tx.send(()).is_err() {
            break;
        }
        let inbound = node.input_links()[index - 1];
        trace!(node = %node.id(), %inbound, value, "value accepted");

        // Raw value out through virtual routes before it touches the
        // accumulator.
        if let Some(edges) = virtual_out.get(&inbound) {
            if let Err(e) = broadcast(handle, value, edges, &ack_rx, ctx.timeout) {
                ctx.report(e);
                break;
            }
        }

        if let Some(activated) = node.accumulate(value) {
            ctx.fired.fetch_add(1, Ordering::Relaxed);
            trace!(node = %node.id(), activated, "node activated");
            match &result_tx {
                Some(tx) => {
                    let index = node
                        .output_index()
                        .expect("result channel implies output role");
                    if tx.send((index, activated)).is_err() {
                        break;
                    }
                }
                None => {
                    if let Err(e) =
                        broadcast(handle, activated, &out_edges, &ack_rx, ctx.timeout)
                    {
                        ctx.report(e);
                        break;
                    }
                }
            }
        }
    }
}

pub(crate) struct InputActor {
    pub node: Node,
    /// External vectors from the Brain, one per wave.
    pub vector_rx: Receiver<Vec<f64>>,
    pub out_edges: Vec<OutEdge>,
    pub ack_rx: Receiver<()>,
    /// Signals the Brain that the whole vector has been delivered.
    pub done_tx: Sender<()>,
}

/// Input node loop: broadcast each vector component to every successor
/// edge in declaration order, with a full ack barrier between
/// components.
pub(crate) fn run_input(actor: InputActor, ctx: ActorCtx) {
    let InputActor {
        node,
        vector_rx,
        out_edges,
        ack_rx,
        done_tx,
    } = actor;
    let handle = Handle::Node(node.id());

    loop {
        select! {
            recv(ctx.shutdown_rx) -> _ => break,
            recv(vector_rx) -> msg => {
                let vector = match msg {
                    Ok(v) => v,
                    Err(_) => break,
                };
                let mut aborted = false;
                for &component in &vector {
                    trace!(node = %node.id(), component, "input component dispatched");
                    if let Err(e) = broadcast(handle, component, &out_edges, &ack_rx, ctx.timeout) {
                        ctx.report(e);
                        aborted = true;
                        break;
                    }
                }
                if aborted || done_tx.send(()).is_err() {
                    break;
                }
            }
        }
    }
}
