// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # FPNN Graph
//!
//! Platform-agnostic data model for the Flow-based Parallel Neural
//! Network: activators, links, nodes, and the graph arena.
//!
//! ## Architecture
//! - Actors are arena-entries addressed by integer handles ([`NodeId`],
//!   [`LinkId`]); names are display-only attributes.
//! - Wiring invariants (single producer per link, Node -> Link -> Node
//!   alternation, acyclic ordinary edges) are enforced at build time.
//! - Wave-time state machines live on the entities themselves; the
//!   execution engines in `fpnn-wave-engine` drive them.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod activator;
pub mod graph;
pub mod link;
pub mod node;
pub mod types;

pub use activator::Activator;
pub use graph::Graph;
pub use link::Link;
pub use node::{Node, NodeRole};
pub use types::{GraphError, GraphResult, Handle, LinkId, NodeId, WaveError, WaveResult};
