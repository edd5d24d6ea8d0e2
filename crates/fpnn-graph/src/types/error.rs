// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for FPNN operations
//!
//! Two tiers, matching the propagation policy:
//! - `GraphError`: construction/wiring problems. Local and recoverable -
//!   the offending call is rejected and the graph stays usable.
//! - `WaveError`: evaluation-time problems. Protocol violations and
//!   shape/connectivity errors abort the whole wave; nothing is retried.

use super::ids::{Handle, LinkId, NodeId};
use thiserror::Error;

/// Build-time errors (construction + wiring)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Invalid parameter for {entity}: {reason}")]
    InvalidParameter { entity: String, reason: String },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Link not found: {0}")]
    LinkNotFound(LinkId),

    #[error("{link} already has producer {producer}, cannot rebind to {attempted}")]
    AlreadyBound {
        link: LinkId,
        producer: NodeId,
        attempted: NodeId,
    },

    #[error("{link} is already connected to consumer {consumer}")]
    DuplicateConnection { link: LinkId, consumer: NodeId },

    #[error("Loopback rejected: {node} is on both sides of {link}")]
    Loopback { link: LinkId, node: NodeId },

    #[error("Invalid edge {from} -> {to}: edges must alternate Node -> Link -> Node")]
    TypeMismatch { from: Handle, to: Handle },

    #[error("Edge {from} -> {to} would close a cycle through ordinary links")]
    CycleDetected { from: Handle, to: Handle },

    #[error("{0} is not a hidden node; virtual routes are a hidden-node capability")]
    NotAHiddenNode(NodeId),

    #[error("Virtual route rejected: {link} is not a bound input of {node}")]
    RouteNotBound { node: NodeId, link: LinkId },
}

/// Evaluation-time errors (protocol violations + shape/connectivity)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WaveError {
    /// Single-slot discipline violated: a value was written into a register
    /// that still holds the previous, unconsumed value. Indicates the ACK
    /// barrier failed to prevent overlap; the wave is not recoverable.
    #[error("Slot occupied on {target}: second write before the previous value was consumed")]
    SlotOccupied { target: Handle },

    #[error("{target} received a value from {sender}, which is not its registered producer")]
    UnknownSender { target: Handle, sender: Handle },

    /// More acknowledgements arrived than consumers exist for the edge, or
    /// an output slot was reported twice within one wave.
    #[error("Acknowledgement overflow on {target}: {count} acks for {max} consumers")]
    AckOverflow {
        target: Handle,
        count: u32,
        max: u32,
    },

    #[error("{link} fired with an empty input slot")]
    FiredEmpty { link: LinkId },

    #[error("Input shape mismatch on {node}: expected {expected} values, got {actual}")]
    ShapeMismatch {
        node: NodeId,
        expected: usize,
        actual: usize,
    },

    #[error("Expected {expected} input vectors (one per input node), got {actual}")]
    InputCountMismatch { expected: usize, actual: usize },

    #[error("Output {output_index} never received a value; graph is disconnected")]
    DisconnectedGraph { output_index: usize },

    #[error("Barrier wait exceeded {timeout_ms}ms on {actor}")]
    BarrierTimeout { actor: Handle, timeout_ms: u64 },

    #[error("Worker thread for {actor} terminated unexpectedly")]
    WorkerPanic { actor: Handle },
}

pub type GraphResult<T> = core::result::Result<T, GraphError>;
pub type WaveResult<T> = core::result::Result<T, WaveError>;
