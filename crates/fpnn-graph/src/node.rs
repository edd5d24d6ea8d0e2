// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Node
//!
//! One node entity with a role discriminant (Input / Hidden / Output)
//! sharing a single accumulate/emit state machine. The source material
//! modeled these as three near-duplicate classes; here the differing
//! input-acceptance and emission policies hang off [`NodeRole`].
//!
//! ## State machine
//!
//! ```text
//! Idle -> Accumulating -> Ready -> Emitting -> Idle
//!
//! Idle:          acc = theta, c = 0
//! On value v:    acc = iterate(acc, v); c += 1
//! When c == a:   output = finalize(acc); acc = theta; c = 0; emit
//! ```
//!
//! Hidden nodes additionally own the virtual-link routing table. Virtual
//! forwarding of a raw incoming value strictly precedes the accumulator
//! update for that same value and never touches the accumulator.
//!
//! Each bound input edge has a single-slot register: writing into an
//! occupied register is a fatal protocol violation, not a local error.

use crate::activator::Activator;
use crate::types::{GraphError, GraphResult, Handle, LinkId, NodeId, WaveError, WaveResult};
use ahash::AHashMap;
use std::sync::Arc;

/// Role discriminant: what a node accepts and where it emits.
#[derive(Debug, Clone)]
pub enum NodeRole {
    /// Receives an external vector of `width` scalars from the Brain and
    /// broadcasts each component to all successor links, in order.
    Input { width: usize },
    /// Accumulates via the activator; may re-route raw inputs through
    /// virtual links (inbound link -> outbound links, pre-iteration).
    Hidden {
        virtual_routes: AHashMap<LinkId, Vec<LinkId>>,
    },
    /// Accumulates like Hidden but reports `(value, index)` to the Brain
    /// instead of pushing to successor links.
    Output { index: usize },
}

#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    name: String,
    role: NodeRole,
    activator: Arc<Activator>,
    /// Accumulator reset value.
    theta: f64,
    /// Iteration threshold `a`: arrivals per activation.
    iterate_max: u32,
    /// Accumulator `x`.
    acc: f64,
    /// Iteration counter `c`, bounded by `iterate_max`.
    count: u32,
    /// Bound input edges, declaration order.
    input_links: Vec<LinkId>,
    /// Single-slot register per bound input edge.
    registers: AHashMap<LinkId, Option<f64>>,
    /// Ordinary successor edges, declaration order.
    output_links: Vec<LinkId>,
}

impl Node {
    pub(crate) fn new_input(id: NodeId, width: usize, name: Option<&str>) -> GraphResult<Self> {
        if width == 0 {
            return Err(GraphError::InvalidParameter {
                entity: format!("{}", id),
                reason: "input width must be >= 1".to_string(),
            });
        }
        Ok(Self::base(
            id,
            NodeRole::Input { width },
            Activator::identity(),
            0.0,
            1,
            name.map_or_else(|| format!("InputNode{}", id.0), str::to_owned),
        ))
    }

    pub(crate) fn new_hidden(
        id: NodeId,
        activator: Arc<Activator>,
        theta: f64,
        iterate_max: u32,
        name: Option<&str>,
    ) -> GraphResult<Self> {
        Self::check_activation_params(id, theta, iterate_max)?;
        Ok(Self::base(
            id,
            NodeRole::Hidden {
                virtual_routes: AHashMap::new(),
            },
            activator,
            theta,
            iterate_max,
            name.map_or_else(|| format!("HiddenNode{}", id.0), str::to_owned),
        ))
    }

    pub(crate) fn new_output(
        id: NodeId,
        activator: Arc<Activator>,
        theta: f64,
        iterate_max: u32,
        index: usize,
        name: Option<&str>,
    ) -> GraphResult<Self> {
        Self::check_activation_params(id, theta, iterate_max)?;
        Ok(Self::base(
            id,
            NodeRole::Output { index },
            activator,
            theta,
            iterate_max,
            name.map_or_else(|| format!("OutputNode{}", id.0), str::to_owned),
        ))
    }

    fn check_activation_params(id: NodeId, theta: f64, iterate_max: u32) -> GraphResult<()> {
        if !theta.is_finite() {
            return Err(GraphError::InvalidParameter {
                entity: format!("{}", id),
                reason: format!("theta must be finite, got {theta}"),
            });
        }
        if iterate_max == 0 {
            return Err(GraphError::InvalidParameter {
                entity: format!("{}", id),
                reason: "iteration threshold `a` must be >= 1".to_string(),
            });
        }
        Ok(())
    }

    fn base(
        id: NodeId,
        role: NodeRole,
        activator: Arc<Activator>,
        theta: f64,
        iterate_max: u32,
        name: String,
    ) -> Self {
        Self {
            id,
            name,
            role,
            activator,
            theta,
            iterate_max,
            acc: theta,
            count: 0,
            input_links: Vec::new(),
            registers: AHashMap::new(),
            output_links: Vec::new(),
        }
    }

    // ---- identity / inspection -------------------------------------------------

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &NodeRole {
        &self.role
    }

    pub fn activator(&self) -> &Arc<Activator> {
        &self.activator
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn iterate_max(&self) -> u32 {
        self.iterate_max
    }

    /// External vector width for input nodes, `None` otherwise.
    pub fn width(&self) -> Option<usize> {
        match self.role {
            NodeRole::Input { width } => Some(width),
            _ => None,
        }
    }

    /// Declaration-order result index for output nodes, `None` otherwise.
    pub fn output_index(&self) -> Option<usize> {
        match self.role {
            NodeRole::Output { index } => Some(index),
            _ => None,
        }
    }

    pub fn input_links(&self) -> &[LinkId] {
        &self.input_links
    }

    pub fn output_links(&self) -> &[LinkId] {
        &self.output_links
    }

    /// Virtual-route targets registered for an inbound link (hidden only).
    pub fn virtual_targets(&self, inbound: LinkId) -> &[LinkId] {
        match &self.role {
            NodeRole::Hidden { virtual_routes } => virtual_routes
                .get(&inbound)
                .map_or(&[], Vec::as_slice),
            _ => &[],
        }
    }

    // ---- wiring (driven by Graph) ----------------------------------------------

    pub(crate) fn bind_input(&mut self, link: LinkId) -> GraphResult<()> {
        if self.registers.contains_key(&link) {
            return Err(GraphError::DuplicateConnection {
                link,
                consumer: self.id,
            });
        }
        self.input_links.push(link);
        self.registers.insert(link, None);
        Ok(())
    }

    pub(crate) fn add_output_link(&mut self, link: LinkId) {
        self.output_links.push(link);
    }

    pub(crate) fn add_virtual_route(&mut self, inbound: LinkId, target: LinkId) -> GraphResult<()> {
        match &mut self.role {
            NodeRole::Hidden { virtual_routes } => {
                let targets = virtual_routes.entry(inbound).or_default();
                if targets.contains(&target) {
                    return Err(GraphError::DuplicateConnection {
                        link: target,
                        consumer: self.id,
                    });
                }
                targets.push(target);
                Ok(())
            }
            _ => Err(GraphError::NotAHiddenNode(self.id)),
        }
    }

    // ---- wave-time state machine ------------------------------------------------

    /// Write a value into the register bound to `link`.
    ///
    /// The register must exist and must be empty; both failures indicate
    /// the synchronization protocol broke down upstream.
    pub fn write(&mut self, link: LinkId, value: f64) -> WaveResult<()> {
        match self.registers.get_mut(&link) {
            None => Err(WaveError::UnknownSender {
                target: Handle::Node(self.id),
                sender: Handle::Link(link),
            }),
            Some(slot) if slot.is_some() => Err(WaveError::SlotOccupied {
                target: Handle::Node(self.id),
            }),
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
        }
    }

    /// Take the pending value off a register, freeing the slot.
    pub fn consume(&mut self, link: LinkId) -> Option<f64> {
        self.registers.get_mut(&link).and_then(Option::take)
    }

    /// Fold one accepted value into the accumulator.
    ///
    /// Returns `Some(output)` when this arrival completes the iteration
    /// threshold; the accumulator and counter reset before returning.
    #[inline]
    pub fn accumulate(&mut self, value: f64) -> Option<f64> {
        self.acc = self.activator.iterate(self.acc, value);
        self.count += 1;
        if self.count == self.iterate_max {
            let output = self.activator.finalize(self.acc);
            self.acc = self.theta;
            self.count = 0;
            Some(output)
        } else {
            None
        }
    }

    /// Reset accumulator, counter, and registers for a fresh wave.
    ///
    /// Partial state from an aborted wave must never leak into the next.
    pub fn reset_wave_state(&mut self) {
        self.acc = self.theta;
        self.count = 0;
        for slot in self.registers.values_mut() {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden(a: u32) -> Node {
        Node::new_hidden(NodeId(0), Activator::sum_tanh(), 0.0, a, None).unwrap()
    }

    #[test]
    fn test_rejects_zero_iteration_threshold() {
        let err = Node::new_hidden(NodeId(0), Activator::sum(), 0.0, 0, None).unwrap_err();
        assert!(matches!(err, GraphError::InvalidParameter { .. }));
    }

    #[test]
    fn test_rejects_zero_width_input() {
        assert!(Node::new_input(NodeId(0), 0, None).is_err());
    }

    #[test]
    fn test_accumulates_exactly_a_steps_then_resets() {
        let mut n = hidden(3);
        assert_eq!(n.accumulate(1.0), None);
        assert_eq!(n.accumulate(2.0), None);
        let out = n.accumulate(0.5).expect("third arrival must activate");
        assert_eq!(out, 3.5f64.tanh());

        // Accumulator reset to theta: the next cycle starts clean.
        assert_eq!(n.accumulate(1.0), None);
        assert_eq!(n.accumulate(1.0), None);
        assert_eq!(n.accumulate(1.0).unwrap(), 3.0f64.tanh());
    }

    #[test]
    fn test_fewer_than_a_steps_never_emits() {
        let mut n = hidden(4);
        for v in [1.0, 2.0, 3.0] {
            assert_eq!(n.accumulate(v), None);
        }
    }

    #[test]
    fn test_register_single_slot_discipline() {
        let mut n = hidden(1);
        n.bind_input(LinkId(7)).unwrap();
        n.write(LinkId(7), 1.0).unwrap();
        let err = n.write(LinkId(7), 2.0).unwrap_err();
        assert!(matches!(err, WaveError::SlotOccupied { .. }));

        assert_eq!(n.consume(LinkId(7)), Some(1.0));
        n.write(LinkId(7), 2.0).unwrap();
    }

    #[test]
    fn test_write_from_unbound_link_rejected() {
        let mut n = hidden(1);
        let err = n.write(LinkId(3), 1.0).unwrap_err();
        assert!(matches!(err, WaveError::UnknownSender { .. }));
    }

    #[test]
    fn test_duplicate_bind_rejected() {
        let mut n = hidden(1);
        n.bind_input(LinkId(1)).unwrap();
        assert!(matches!(
            n.bind_input(LinkId(1)),
            Err(GraphError::DuplicateConnection { .. })
        ));
    }

    #[test]
    fn test_virtual_routes_only_on_hidden() {
        let mut out = Node::new_output(NodeId(1), Activator::sum(), 0.0, 1, 0, None).unwrap();
        assert!(matches!(
            out.add_virtual_route(LinkId(0), LinkId(1)),
            Err(GraphError::NotAHiddenNode(_))
        ));

        let mut h = hidden(1);
        h.add_virtual_route(LinkId(0), LinkId(1)).unwrap();
        h.add_virtual_route(LinkId(0), LinkId(2)).unwrap();
        assert_eq!(h.virtual_targets(LinkId(0)), &[LinkId(1), LinkId(2)]);
        assert!(h.virtual_targets(LinkId(9)).is_empty());
    }

    #[test]
    fn test_reset_wave_state_clears_everything() {
        let mut n = hidden(3);
        n.bind_input(LinkId(0)).unwrap();
        n.write(LinkId(0), 9.0).unwrap();
        n.accumulate(1.0);
        n.reset_wave_state();
        assert_eq!(n.consume(LinkId(0)), None);
        // Counter was reset: three fresh arrivals are needed again.
        assert_eq!(n.accumulate(1.0), None);
        assert_eq!(n.accumulate(1.0), None);
        assert!(n.accumulate(1.0).is_some());
    }
}
