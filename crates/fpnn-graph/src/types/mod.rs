// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core type definitions for the FPNN graph

pub mod error;
pub mod ids;

pub use error::{GraphError, GraphResult, WaveError, WaveResult};
pub use ids::{Handle, LinkId, NodeId};
