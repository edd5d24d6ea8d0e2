// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Engine configuration types

use std::time::Duration;

/// Which evaluation strategy drives a wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerKind {
    /// Single-threaded cooperative task-queue traversal. Strict FIFO
    /// ordering, deterministic traces.
    #[default]
    Sequential,
    /// One worker thread per actor, synchronized with per-edge ACK
    /// barriers.
    Parallel,
}

/// Wave engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub scheduler: SchedulerKind,
    /// Deadline applied to every barrier wait in the parallel runtime and
    /// to the Brain's output collection. Converts indefinite waits into
    /// fallible, time-bounded operations so a malformed graph surfaces as
    /// an error instead of a deadlock.
    pub barrier_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerKind::default(),
            barrier_timeout: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    pub fn sequential() -> Self {
        Self {
            scheduler: SchedulerKind::Sequential,
            ..Self::default()
        }
    }

    pub fn parallel() -> Self {
        Self {
            scheduler: SchedulerKind::Parallel,
            ..Self::default()
        }
    }

    pub fn with_barrier_timeout(mut self, timeout: Duration) -> Self {
        self.barrier_timeout = timeout;
        self
    }
}
