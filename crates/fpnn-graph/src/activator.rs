// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Activator
//!
//! The per-node compute kernel: an associative iterate combinator folded
//! over incoming values, and a final activate transform.
//!
//! ## Dynamics
//!
//! ```text
//! Accumulation (per accepted input value):
//!     acc(t+1) = iterate(acc(t), v)
//!
//! Activation (after exactly `a` accepted values):
//!     output = finalize(acc)
//!     acc resets to theta, counter resets to 0
//! ```
//!
//! Activators are stateless: all per-node state (`acc`, counter) lives in
//! the owning [`Node`](crate::node::Node). One `Activator` instance is
//! shared by reference (`Arc`) across many nodes, so the closures must be
//! `Send + Sync` and must not capture mutable state.

use std::fmt;
use std::sync::Arc;

type IterateFn = dyn Fn(f64, f64) -> f64 + Send + Sync;
type FinalizeFn = dyn Fn(f64) -> f64 + Send + Sync;

/// A named (iterate, finalize) function pair.
pub struct Activator {
    name: String,
    iterate: Box<IterateFn>,
    finalize: Box<FinalizeFn>,
}

impl Activator {
    /// Create an activator from user-supplied functions.
    pub fn new<I, F>(name: impl Into<String>, iterate: I, finalize: F) -> Arc<Self>
    where
        I: Fn(f64, f64) -> f64 + Send + Sync + 'static,
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.into(),
            iterate: Box::new(iterate),
            finalize: Box::new(finalize),
        })
    }

    /// Identity passthrough: keeps the last value, activates with it unchanged.
    ///
    /// Used by input nodes and by single-input relays.
    pub fn identity() -> Arc<Self> {
        Self::new("identity", |_acc, v| v, |acc| acc)
    }

    /// Sum accumulation with identity activation.
    pub fn sum() -> Arc<Self> {
        Self::new("sum", |acc, v| acc + v, |acc| acc)
    }

    /// Sum accumulation with tanh activation (the classic FPNN kernel).
    pub fn sum_tanh() -> Arc<Self> {
        Self::new("sum_tanh", |acc, v| acc + v, f64::tanh)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fold one incoming value into the accumulator.
    #[inline(always)]
    pub fn iterate(&self, acc: f64, incoming: f64) -> f64 {
        (self.iterate)(acc, incoming)
    }

    /// Apply the final activate transform to a completed accumulator.
    #[inline(always)]
    pub fn finalize(&self, acc: f64) -> f64 {
        (self.finalize)(acc)
    }
}

impl fmt::Debug for Activator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activator").field("name", &self.name).finish()
    }
}
