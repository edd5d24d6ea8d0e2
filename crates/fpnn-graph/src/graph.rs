// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Graph
//!
//! Owner and builder of the actor graph: an arena of nodes and links
//! indexed by small integer handles. Names are display-only.
//!
//! ## Invariants
//! - Every link has exactly one producer and at least one consumer edge.
//! - Edges alternate Node -> Link -> Node; direct Node-to-Node (or
//!   Link-to-Link) edges are rejected.
//! - Ordinary edges stay acyclic; an insertion that would close a cycle is
//!   rejected at connect time. Only virtual routes may close cycles.

use crate::activator::Activator;
use crate::node::{Node, NodeRole};
use crate::link::Link;
use crate::types::{GraphError, GraphResult, Handle, LinkId, NodeId};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Graph {
    name: String,
    nodes: Vec<Node>,
    links: Vec<Link>,
    /// Input nodes in declaration order; positions define the expected
    /// layout of the external input vectors.
    input_order: Vec<NodeId>,
    /// Output nodes in declaration order; positions define the layout of
    /// the result vector.
    output_order: Vec<NodeId>,
    /// Every committed edge in insertion order, for inspection/rendering.
    edges: Vec<(Handle, Handle)>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ---- construction ----------------------------------------------------------

    /// Create a link with affine parameters `y = W*x + T`.
    pub fn add_link(&mut self, weight: f64, bias: f64) -> GraphResult<LinkId> {
        self.add_link_named(weight, bias, None)
    }

    pub fn add_link_named(
        &mut self,
        weight: f64,
        bias: f64,
        name: Option<&str>,
    ) -> GraphResult<LinkId> {
        let id = LinkId(self.links.len() as u32);
        self.links.push(Link::new(id, weight, bias, name)?);
        Ok(id)
    }

    /// Create an input node expecting `width` scalars per external vector.
    pub fn add_input_node(&mut self, width: usize) -> GraphResult<NodeId> {
        self.add_input_node_named(width, None)
    }

    pub fn add_input_node_named(&mut self, width: usize, name: Option<&str>) -> GraphResult<NodeId> {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new_input(id, width, name)?);
        self.input_order.push(id);
        Ok(id)
    }

    /// Create a hidden node accumulating `a` values from `theta` before
    /// activation.
    pub fn add_hidden_node(
        &mut self,
        activator: Arc<Activator>,
        theta: f64,
        iterate_max: u32,
    ) -> GraphResult<NodeId> {
        self.add_hidden_node_named(activator, theta, iterate_max, None)
    }

    pub fn add_hidden_node_named(
        &mut self,
        activator: Arc<Activator>,
        theta: f64,
        iterate_max: u32,
        name: Option<&str>,
    ) -> GraphResult<NodeId> {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes
            .push(Node::new_hidden(id, activator, theta, iterate_max, name)?);
        Ok(id)
    }

    /// Create an output node; its result index is its declaration order.
    pub fn add_output_node(
        &mut self,
        activator: Arc<Activator>,
        theta: f64,
        iterate_max: u32,
    ) -> GraphResult<NodeId> {
        self.add_output_node_named(activator, theta, iterate_max, None)
    }

    pub fn add_output_node_named(
        &mut self,
        activator: Arc<Activator>,
        theta: f64,
        iterate_max: u32,
        name: Option<&str>,
    ) -> GraphResult<NodeId> {
        let id = NodeId(self.nodes.len() as u32);
        let index = self.output_order.len();
        self.nodes.push(Node::new_output(
            id,
            activator,
            theta,
            iterate_max,
            index,
            name,
        )?);
        self.output_order.push(id);
        Ok(id)
    }

    // ---- wiring ----------------------------------------------------------------

    /// Wire one producer to one consumer.
    ///
    /// `Node -> Link` binds the node as the link's single producer;
    /// `Link -> Node` registers the node as one of the link's consumers.
    /// All validation happens before any mutation, so a rejected call
    /// leaves the graph exactly as it was.
    pub fn connect(&mut self, from: Handle, to: Handle) -> GraphResult<()> {
        match (from, to) {
            (Handle::Node(node_id), Handle::Link(link_id)) => {
                self.check_node(node_id)?;
                self.check_link(link_id)?;
                // Output nodes report to the Brain; they never produce
                // into links.
                if matches!(self.nodes[node_id.index()].role(), NodeRole::Output { .. }) {
                    return Err(GraphError::TypeMismatch { from, to });
                }
                // Binding n as producer of l creates the edge n -> l; a
                // cycle exists iff n is already reachable from l.
                if self.reachable(Handle::Link(link_id), Handle::Node(node_id)) {
                    return Err(GraphError::CycleDetected { from, to });
                }
                self.links[link_id.index()].bind(node_id)?;
                self.nodes[node_id.index()].add_output_link(link_id);
            }
            (Handle::Link(link_id), Handle::Node(node_id)) => {
                self.check_link(link_id)?;
                self.check_node(node_id)?;
                if matches!(self.nodes[node_id.index()].role(), NodeRole::Input { .. }) {
                    return Err(GraphError::TypeMismatch { from, to });
                }
                if self.reachable(Handle::Node(node_id), Handle::Link(link_id)) {
                    return Err(GraphError::CycleDetected { from, to });
                }
                // Validate the node side first; Link::connect mutates.
                if self.nodes[node_id.index()]
                    .input_links()
                    .contains(&link_id)
                {
                    return Err(GraphError::DuplicateConnection {
                        link: link_id,
                        consumer: node_id,
                    });
                }
                self.links[link_id.index()].connect(node_id)?;
                self.nodes[node_id.index()]
                    .bind_input(link_id)
                    .expect("node side validated above");
            }
            _ => return Err(GraphError::TypeMismatch { from, to }),
        }
        debug!(graph = %self.name, %from, %to, "edge committed");
        self.edges.push((from, to));
        Ok(())
    }

    /// Register a virtual route on a hidden node: raw values arriving on
    /// `inbound` are echoed to `target` before accumulation.
    ///
    /// `target`'s producer binding is created (or validated) here, outside
    /// the ordinary successor list and without the acyclicity check -
    /// virtual routes are the one sanctioned way to close a cycle.
    pub fn add_virtual_route(
        &mut self,
        node_id: NodeId,
        inbound: LinkId,
        target: LinkId,
    ) -> GraphResult<()> {
        self.check_node(node_id)?;
        self.check_link(inbound)?;
        self.check_link(target)?;

        if !matches!(self.nodes[node_id.index()].role(), NodeRole::Hidden { .. }) {
            return Err(GraphError::NotAHiddenNode(node_id));
        }
        if !self.nodes[node_id.index()].input_links().contains(&inbound) {
            return Err(GraphError::RouteNotBound {
                node: node_id,
                link: inbound,
            });
        }
        // A link cannot be both an ordinary successor and a virtual target
        // of the same node: it would take two writes per wave.
        if self.nodes[node_id.index()].output_links().contains(&target) {
            return Err(GraphError::DuplicateConnection {
                link: target,
                consumer: node_id,
            });
        }
        match self.links[target.index()].producer() {
            None => self.links[target.index()].bind(node_id)?,
            Some(existing) if existing == node_id => {}
            Some(existing) => {
                return Err(GraphError::AlreadyBound {
                    link: target,
                    producer: existing,
                    attempted: node_id,
                })
            }
        }
        self.nodes[node_id.index()].add_virtual_route(inbound, target)?;
        debug!(graph = %self.name, node = %node_id, %inbound, %target, "virtual route committed");
        self.edges
            .push((Handle::Node(node_id), Handle::Link(target)));
        Ok(())
    }

    // ---- inspection ------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> GraphResult<&Node> {
        self.nodes.get(id.index()).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> GraphResult<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .ok_or(GraphError::NodeNotFound(id))
    }

    pub fn link(&self, id: LinkId) -> GraphResult<&Link> {
        self.links.get(id.index()).ok_or(GraphError::LinkNotFound(id))
    }

    pub fn link_mut(&mut self, id: LinkId) -> GraphResult<&mut Link> {
        self.links
            .get_mut(id.index())
            .ok_or(GraphError::LinkNotFound(id))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn input_order(&self) -> &[NodeId] {
        &self.input_order
    }

    pub fn output_order(&self) -> &[NodeId] {
        &self.output_order
    }

    /// Committed edges (ordinary and virtual) in insertion order.
    ///
    /// Read-only view for external renderers and adjacency checks.
    pub fn edges(&self) -> &[(Handle, Handle)] {
        &self.edges
    }

    /// Successor handles of an actor along ordinary edges.
    pub fn successors(&self, handle: Handle) -> GraphResult<Vec<Handle>> {
        match handle {
            Handle::Node(id) => Ok(self
                .node(id)?
                .output_links()
                .iter()
                .map(|l| Handle::Link(*l))
                .collect()),
            Handle::Link(id) => Ok(self
                .link(id)?
                .consumers()
                .iter()
                .map(|n| Handle::Node(*n))
                .collect()),
        }
    }

    /// Predecessor handles of an actor along ordinary edges.
    pub fn predecessors(&self, handle: Handle) -> GraphResult<Vec<Handle>> {
        match handle {
            Handle::Node(id) => Ok(self
                .node(id)?
                .input_links()
                .iter()
                .map(|l| Handle::Link(*l))
                .collect()),
            Handle::Link(id) => Ok(self
                .link(id)?
                .producer()
                .map(Handle::Node)
                .into_iter()
                .collect()),
        }
    }

    /// Sum of declared input widths.
    pub fn total_input_width(&self) -> usize {
        self.input_order
            .iter()
            .filter_map(|id| self.nodes[id.index()].width())
            .sum()
    }

    /// Reset all wave-time node and link state (accumulators, counters,
    /// registers, link slots).
    pub fn reset_wave_state(&mut self) {
        for node in &mut self.nodes {
            node.reset_wave_state();
        }
        for link in &mut self.links {
            link.clear_slot();
        }
    }

    // ---- internals -------------------------------------------------------------

    fn check_node(&self, id: NodeId) -> GraphResult<()> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(GraphError::NodeNotFound(id))
        }
    }

    fn check_link(&self, id: LinkId) -> GraphResult<()> {
        if id.index() < self.links.len() {
            Ok(())
        } else {
            Err(GraphError::LinkNotFound(id))
        }
    }

    /// DFS over ordinary edges only; virtual routes are excluded so they
    /// may close feedback cycles.
    fn reachable(&self, from: Handle, target: Handle) -> bool {
        let mut stack = vec![from];
        let mut seen: Vec<Handle> = Vec::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            match current {
                Handle::Node(id) => {
                    for l in self.nodes[id.index()].output_links() {
                        stack.push(Handle::Link(*l));
                    }
                }
                Handle::Link(id) => {
                    for n in self.links[id.index()].consumers() {
                        stack.push(Handle::Node(*n));
                    }
                }
            }
        }
        false
    }
}

// Infallible indexing for engine-internal hot paths; ids handed out by
// this graph are always in range. Out-of-range ids panic like slice
// indexing does.
impl std::ops::Index<NodeId> for Graph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl std::ops::IndexMut<NodeId> for Graph {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}

impl std::ops::Index<LinkId> for Graph {
    type Output = Link;

    fn index(&self, id: LinkId) -> &Link {
        &self.links[id.index()]
    }
}

impl std::ops::IndexMut<LinkId> for Graph {
    fn index_mut(&mut self, id: LinkId) -> &mut Link {
        &mut self.links[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_chain() -> (Graph, NodeId, LinkId, NodeId) {
        let mut g = Graph::new("test");
        let n_in = g.add_input_node(1).unwrap();
        let link = g.add_link(2.0, 1.0).unwrap();
        let n_out = g.add_output_node(Activator::identity(), 0.0, 1).unwrap();
        g.connect(Handle::Node(n_in), Handle::Link(link)).unwrap();
        g.connect(Handle::Link(link), Handle::Node(n_out)).unwrap();
        (g, n_in, link, n_out)
    }

    #[test]
    fn test_chain_adjacency() {
        let (g, n_in, link, n_out) = simple_chain();
        assert_eq!(
            g.successors(Handle::Node(n_in)).unwrap(),
            vec![Handle::Link(link)]
        );
        assert_eq!(
            g.successors(Handle::Link(link)).unwrap(),
            vec![Handle::Node(n_out)]
        );
        assert_eq!(
            g.predecessors(Handle::Node(n_out)).unwrap(),
            vec![Handle::Link(link)]
        );
        assert_eq!(g.edges().len(), 2);
    }

    #[test]
    fn test_node_to_node_edge_rejected() {
        let mut g = Graph::new("test");
        let a = g.add_input_node(1).unwrap();
        let b = g.add_hidden_node(Activator::sum(), 0.0, 1).unwrap();
        let err = g.connect(Handle::Node(a), Handle::Node(b)).unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { .. }));
    }

    #[test]
    fn test_link_into_input_node_rejected() {
        let mut g = Graph::new("test");
        let n = g.add_input_node(1).unwrap();
        let l = g.add_link(1.0, 0.0).unwrap();
        let err = g.connect(Handle::Link(l), Handle::Node(n)).unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { .. }));
    }

    #[test]
    fn test_output_node_as_link_producer_rejected() {
        let mut g = Graph::new("test");
        let out = g.add_output_node(Activator::identity(), 0.0, 1).unwrap();
        let l = g.add_link(1.0, 0.0).unwrap();
        let err = g.connect(Handle::Node(out), Handle::Link(l)).unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { .. }));
        // The rejected call bound nothing.
        assert!(g.link(l).unwrap().producer().is_none());
    }

    #[test]
    fn test_cycle_through_ordinary_edges_rejected() {
        let mut g = Graph::new("test");
        let h1 = g.add_hidden_node(Activator::sum(), 0.0, 1).unwrap();
        let h2 = g.add_hidden_node(Activator::sum(), 0.0, 1).unwrap();
        let l12 = g.add_link(1.0, 0.0).unwrap();
        let l21 = g.add_link(1.0, 0.0).unwrap();
        g.connect(Handle::Node(h1), Handle::Link(l12)).unwrap();
        g.connect(Handle::Link(l12), Handle::Node(h2)).unwrap();
        g.connect(Handle::Node(h2), Handle::Link(l21)).unwrap();
        let err = g
            .connect(Handle::Link(l21), Handle::Node(h1))
            .unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected { .. }));

        // The rejected call left the graph usable: l21 still has no consumer.
        assert!(g.link(l21).unwrap().consumers().is_empty());
    }

    #[test]
    fn test_virtual_route_may_close_cycle() {
        let mut g = Graph::new("test");
        let h1 = g.add_hidden_node(Activator::sum(), 0.0, 2).unwrap();
        let h2 = g.add_hidden_node(Activator::sum(), 0.0, 1).unwrap();
        let l12 = g.add_link(1.0, 0.0).unwrap();
        let l21 = g.add_link(1.0, 0.0).unwrap();
        g.connect(Handle::Node(h1), Handle::Link(l12)).unwrap();
        g.connect(Handle::Link(l12), Handle::Node(h2)).unwrap();
        g.connect(Handle::Link(l21), Handle::Node(h1)).unwrap();
        // Feedback h2 -> l21 -> h1 is legal as a virtual route.
        g.add_virtual_route(h2, l12, l21).unwrap();
        assert_eq!(g.node(h2).unwrap().virtual_targets(l12), &[l21]);
    }

    #[test]
    fn test_virtual_route_requires_bound_inbound() {
        let mut g = Graph::new("test");
        let h = g.add_hidden_node(Activator::sum(), 0.0, 1).unwrap();
        let l = g.add_link(1.0, 0.0).unwrap();
        let t = g.add_link(1.0, 0.0).unwrap();
        let err = g.add_virtual_route(h, l, t).unwrap_err();
        assert!(matches!(err, GraphError::RouteNotBound { .. }));
    }

    #[test]
    fn test_construction_is_idempotent() {
        let build = || {
            let mut g = Graph::new("twin");
            let n1 = g.add_input_node(2).unwrap();
            let h = g.add_hidden_node(Activator::sum_tanh(), 0.0, 2).unwrap();
            let o = g.add_output_node(Activator::sum(), 0.0, 1).unwrap();
            let l1 = g.add_link(3.0, 4.0).unwrap();
            let l2 = g.add_link(15.0, 8.0).unwrap();
            g.connect(Handle::Node(n1), Handle::Link(l1)).unwrap();
            g.connect(Handle::Link(l1), Handle::Node(h)).unwrap();
            g.connect(Handle::Node(h), Handle::Link(l2)).unwrap();
            g.connect(Handle::Link(l2), Handle::Node(o)).unwrap();
            g
        };
        let g1 = build();
        let g2 = build();
        assert_eq!(g1.edges(), g2.edges());
        assert_eq!(g1.input_order(), g2.input_order());
        assert_eq!(g1.output_order(), g2.output_order());
        for (a, b) in g1.links().iter().zip(g2.links()) {
            assert_eq!(a.producer(), b.producer());
            assert_eq!(a.consumers(), b.consumers());
        }
    }

    #[test]
    fn test_total_input_width() {
        let mut g = Graph::new("test");
        g.add_input_node(2).unwrap();
        g.add_input_node(1).unwrap();
        g.add_hidden_node(Activator::sum(), 0.0, 1).unwrap();
        assert_eq!(g.total_input_width(), 3);
    }
}
