// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Link
//!
//! A weighted, biased edge between nodes. Every value submitted by the
//! bound producer passes through the affine transform and is broadcast to
//! all connected consumers:
//!
//! ```text
//! fire:  y = W * x + T
//! ```
//!
//! A link has exactly one producer and one single-slot input register;
//! fan-out to multiple consumers is allowed (the same `y` is broadcast to
//! each consumer once per firing). Transform parameters are immutable
//! after construction.

use crate::types::{GraphError, GraphResult, Handle, LinkId, NodeId, WaveError, WaveResult};

#[derive(Debug, Clone)]
pub struct Link {
    id: LinkId,
    name: String,
    weight: f64,
    bias: f64,
    producer: Option<NodeId>,
    consumers: Vec<NodeId>,
    /// Single-slot input register. A second submit before `fire` consumes
    /// the slot is a protocol violation, never a silent overwrite.
    slot: Option<f64>,
}

impl Link {
    pub(crate) fn new(id: LinkId, weight: f64, bias: f64, name: Option<&str>) -> GraphResult<Self> {
        if !weight.is_finite() || !bias.is_finite() {
            return Err(GraphError::InvalidParameter {
                entity: format!("{}", id),
                reason: format!("weight/bias must be finite, got W={weight}, T={bias}"),
            });
        }
        Ok(Self {
            id,
            name: name.map_or_else(|| format!("Link{}", id.0), str::to_owned),
            weight,
            bias,
            producer: None,
            consumers: Vec::new(),
            slot: None,
        })
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn producer(&self) -> Option<NodeId> {
        self.producer
    }

    pub fn consumers(&self) -> &[NodeId] {
        &self.consumers
    }

    /// The pure affine map. Same input, bit-identical output.
    #[inline(always)]
    pub fn transform(&self, x: f64) -> f64 {
        self.weight * x + self.bias
    }

    /// Register the single permitted input source.
    pub(crate) fn bind(&mut self, producer: NodeId) -> GraphResult<()> {
        if let Some(existing) = self.producer {
            if existing != producer {
                return Err(GraphError::AlreadyBound {
                    link: self.id,
                    producer: existing,
                    attempted: producer,
                });
            }
            // Re-binding the same producer is a duplicate edge.
            return Err(GraphError::DuplicateConnection {
                link: self.id,
                consumer: producer,
            });
        }
        if self.consumers.contains(&producer) {
            return Err(GraphError::Loopback {
                link: self.id,
                node: producer,
            });
        }
        self.producer = Some(producer);
        Ok(())
    }

    /// Register one downstream consumer edge.
    pub(crate) fn connect(&mut self, consumer: NodeId) -> GraphResult<()> {
        if self.consumers.contains(&consumer) {
            return Err(GraphError::DuplicateConnection {
                link: self.id,
                consumer,
            });
        }
        if self.producer == Some(consumer) {
            return Err(GraphError::Loopback {
                link: self.id,
                node: consumer,
            });
        }
        self.consumers.push(consumer);
        Ok(())
    }

    /// Queue one value from the bound producer into the input slot.
    pub fn submit(&mut self, from: NodeId, value: f64) -> WaveResult<()> {
        if self.producer != Some(from) {
            return Err(WaveError::UnknownSender {
                target: Handle::Link(self.id),
                sender: Handle::Node(from),
            });
        }
        if self.slot.is_some() {
            return Err(WaveError::SlotOccupied {
                target: Handle::Link(self.id),
            });
        }
        self.slot = Some(value);
        Ok(())
    }

    /// Pop the queued value and apply the affine transform.
    ///
    /// The caller broadcasts the result to every consumer.
    pub fn fire(&mut self) -> WaveResult<f64> {
        let x = self
            .slot
            .take()
            .ok_or(WaveError::FiredEmpty { link: self.id })?;
        Ok(self.transform(x))
    }

    pub(crate) fn clear_slot(&mut self) {
        self.slot = None;
    }
}
