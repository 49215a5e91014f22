// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

pub mod api {
    pub mod error;
}

pub mod config;
pub mod progress;
pub mod termination;

pub mod graph {
    pub mod traversal;
}

// Re-exports for convenience
pub use api::error::{Result, SimilarityError};
pub use config::{NodeSimilarityConfig, OutputMode, RankOrder, SimilarityMetric};
pub use graph::traversal::{Direction, Graph, NodeId};
pub use progress::{NoopProgressTracker, ProgressTracker, TracingProgressTracker};
pub use termination::TerminationFlag;
