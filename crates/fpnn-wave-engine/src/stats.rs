// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Wave engine performance statistics

/// Wave engine performance statistics
#[derive(Debug, Clone, Default)]
pub struct WaveStats {
    pub total_waves: u64,
    /// Link firings: one per value carried over an edge. Identical for
    /// both schedulers on the same graph and inputs.
    pub total_values_propagated: u64,
    /// Node activations (hidden and output).
    pub total_nodes_fired: u64,
    pub total_processing_time_us: u64,
}

impl WaveStats {
    /// Get average propagated values per wave
    pub fn avg_values_per_wave(&self) -> f64 {
        if self.total_waves == 0 {
            0.0
        } else {
            self.total_values_propagated as f64 / self.total_waves as f64
        }
    }

    /// Get average processing time per wave (microseconds)
    pub fn avg_processing_time_us(&self) -> f64 {
        if self.total_waves == 0 {
            0.0
        } else {
            self.total_processing_time_us as f64 / self.total_waves as f64
        }
    }

    /// Get average node activations per wave
    pub fn avg_nodes_fired_per_wave(&self) -> f64 {
        if self.total_waves == 0 {
            0.0
        } else {
            self.total_nodes_fired as f64 / self.total_waves as f64
        }
    }
}
