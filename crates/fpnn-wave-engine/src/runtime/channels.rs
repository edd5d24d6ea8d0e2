// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Channel fabric primitives
//!
//! Every dataflow edge is a `bounded(1)` crossbeam channel: the one-deep
//! buffer is the edge's single-slot register, and a `try_send` into a
//! full channel is the runtime's slot-occupied protocol violation.
//! Acknowledgements travel backwards on a per-actor ack channel sized to
//! the actor's fan-out.

use crossbeam::channel::{bounded, Receiver, Sender};
use fpnn_graph::Handle;

/// One-deep data channel backing a single edge register.
pub(crate) fn edge_channel() -> (Sender<f64>, Receiver<f64>) {
    bounded(1)
}

/// Ack channel for an actor with the given fan-out; consumers ack on it
/// after taking a value off the edge register.
pub(crate) fn ack_channel(fan_out: usize) -> (Sender<()>, Receiver<()>) {
    bounded(fan_out.max(1))
}

/// Receiving half of an edge, paired with the ack channel of whichever
/// actor sends on it.
pub(crate) struct InEdge {
    pub rx: Receiver<f64>,
    pub ack_tx: Sender<()>,
}

/// Sending half of an edge; `to` identifies the receiving actor for
/// error reporting.
pub(crate) struct OutEdge {
    pub to: Handle,
    pub tx: Sender<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_channel_holds_exactly_one_value() {
        let (tx, rx) = edge_channel();
        tx.try_send(1.0).unwrap();
        assert!(tx.try_send(2.0).is_err());
        assert_eq!(rx.recv().unwrap(), 1.0);
        tx.try_send(2.0).unwrap();
    }

    #[test]
    fn test_ack_channel_never_zero_capacity() {
        let (tx, _rx) = ack_channel(0);
        tx.try_send(()).unwrap();
    }
}
