// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Wiring validation and failure-path behavior through the public API.

use fpnn::prelude::*;
use std::time::Duration;

#[test]
fn test_rejected_wiring_leaves_graph_usable() {
    let mut g = Graph::new("recover");
    let n_in = g.add_input_node(1).unwrap();
    let link = g.add_link(2.0, 0.0).unwrap();
    let out = g.add_output_node(Activator::identity(), 0.0, 1).unwrap();

    g.connect(Handle::Node(n_in), Handle::Link(link)).unwrap();

    // A second producer for the same link is rejected...
    let intruder = g.add_hidden_node(Activator::sum(), 0.0, 1).unwrap();
    let err = g
        .connect(Handle::Node(intruder), Handle::Link(link))
        .unwrap_err();
    assert!(matches!(err, GraphError::AlreadyBound { .. }));

    // ...and the graph still evaluates normally afterwards.
    g.connect(Handle::Link(link), Handle::Node(out)).unwrap();
    let mut brain = Brain::new(g);
    assert_eq!(brain.evaluate(&[vec![2.0]]).unwrap(), vec![4.0]);
}

#[test]
fn test_duplicate_edge_rejected() {
    let mut g = Graph::new("dup");
    let n_in = g.add_input_node(1).unwrap();
    let link = g.add_link(1.0, 0.0).unwrap();
    let out = g.add_output_node(Activator::identity(), 0.0, 1).unwrap();
    g.connect(Handle::Node(n_in), Handle::Link(link)).unwrap();
    g.connect(Handle::Link(link), Handle::Node(out)).unwrap();

    let err = g
        .connect(Handle::Link(link), Handle::Node(out))
        .unwrap_err();
    assert!(matches!(err, GraphError::DuplicateConnection { .. }));
}

#[test]
fn test_ordinary_cycle_rejected_virtual_route_allowed() {
    let mut g = Graph::new("feedback");
    let n_in = g.add_input_node(1).unwrap();
    let l_in = g.add_link(1.0, 0.0).unwrap();
    let h1 = g.add_hidden_node(Activator::sum(), 0.0, 1).unwrap();
    let l_fwd = g.add_link(1.0, 0.0).unwrap();
    let h2 = g.add_hidden_node(Activator::sum(), 0.0, 2).unwrap();
    let l_back = g.add_link(0.5, 0.0).unwrap();

    g.connect(Handle::Node(n_in), Handle::Link(l_in)).unwrap();
    g.connect(Handle::Link(l_in), Handle::Node(h1)).unwrap();
    g.connect(Handle::Node(h1), Handle::Link(l_fwd)).unwrap();
    g.connect(Handle::Link(l_fwd), Handle::Node(h2)).unwrap();
    g.connect(Handle::Link(l_back), Handle::Node(h1)).unwrap();

    // Closing the loop with an ordinary edge is refused.
    let err = g
        .connect(Handle::Node(h2), Handle::Link(l_back))
        .unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected { .. }));

    // The same loop is legal as a virtual route on h2.
    g.add_virtual_route(h2, l_fwd, l_back).unwrap();
    assert_eq!(g.node(h2).unwrap().virtual_targets(l_fwd), &[l_back]);
}

#[test]
fn test_input_count_and_shape_validation() {
    let mut g = Graph::new("shapes");
    let a = g.add_input_node(2).unwrap();
    let link = g.add_link(1.0, 0.0).unwrap();
    let out = g.add_output_node(Activator::sum(), 0.0, 2).unwrap();
    g.connect(Handle::Node(a), Handle::Link(link)).unwrap();
    g.connect(Handle::Link(link), Handle::Node(out)).unwrap();

    let mut brain = Brain::new(g);

    let err = brain.evaluate(&[]).unwrap_err();
    assert_eq!(
        err,
        WaveError::InputCountMismatch {
            expected: 1,
            actual: 0
        }
    );

    let err = brain.evaluate(&[vec![1.0]]).unwrap_err();
    assert!(matches!(
        err,
        WaveError::ShapeMismatch {
            expected: 2,
            actual: 1,
            ..
        }
    ));

    // A failed wave leaves the brain usable.
    assert_eq!(brain.evaluate(&[vec![1.0, 2.0]]).unwrap(), vec![3.0]);
}

#[test]
fn test_disconnected_output_fails_both_schedulers() {
    let build = || {
        let mut g = Graph::new("dangling");
        let n_in = g.add_input_node(1).unwrap();
        let link = g.add_link(1.0, 0.0).unwrap();
        let wired = g.add_output_node(Activator::identity(), 0.0, 1).unwrap();
        g.connect(Handle::Node(n_in), Handle::Link(link)).unwrap();
        g.connect(Handle::Link(link), Handle::Node(wired)).unwrap();
        // Declared but never wired.
        g.add_output_node(Activator::identity(), 0.0, 1).unwrap();
        g
    };

    let mut seq = Brain::with_config(build(), EngineConfig::sequential());
    assert_eq!(
        seq.evaluate(&[vec![1.0]]).unwrap_err(),
        WaveError::DisconnectedGraph { output_index: 1 }
    );

    // The parallel runtime must fail within the barrier deadline rather
    // than hang.
    let config = EngineConfig::parallel().with_barrier_timeout(Duration::from_millis(200));
    let mut par = Brain::with_config(build(), config);
    assert_eq!(
        par.evaluate(&[vec![1.0]]).unwrap_err(),
        WaveError::DisconnectedGraph { output_index: 1 }
    );
}

#[test]
fn test_zero_consumer_link_is_legal_wiring() {
    let mut g = Graph::new("dead-end");
    let n_in = g.add_input_node(1).unwrap();
    let live = g.add_link(2.0, 0.0).unwrap();
    let dead = g.add_link(9.0, 9.0).unwrap();
    let out = g.add_output_node(Activator::identity(), 0.0, 1).unwrap();

    g.connect(Handle::Node(n_in), Handle::Link(live)).unwrap();
    // `dead` gets a producer but no consumer; construction accepts it.
    g.connect(Handle::Node(n_in), Handle::Link(dead)).unwrap();
    g.connect(Handle::Link(live), Handle::Node(out)).unwrap();

    let mut brain = Brain::new(g);
    assert_eq!(brain.evaluate(&[vec![1.0]]).unwrap(), vec![2.0]);
}

#[test]
fn test_nonfinite_parameters_rejected_at_construction() {
    let mut g = Graph::new("params");
    assert!(matches!(
        g.add_link(f64::NAN, 0.0),
        Err(GraphError::InvalidParameter { .. })
    ));
    assert!(matches!(
        g.add_hidden_node(Activator::sum(), f64::INFINITY, 1),
        Err(GraphError::InvalidParameter { .. })
    ));
    assert!(matches!(
        g.add_output_node(Activator::sum(), 0.0, 0),
        Err(GraphError::InvalidParameter { .. })
    ));
    assert!(g.add_input_node(0).is_err());
}
