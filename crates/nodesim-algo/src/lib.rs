// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

pub mod algo;

pub use algo::node_similarity::{
    NodeSimilarity, NodeSimilarityResult, SimilarityGraph, SimilarityGraphResult,
    SimilarityResult, SimilarityStream, TopKGraph, TopKMap, TopNList,
};
pub use algo::projection::{GraphProjection, ProjectionBuilder, ProjectionView};
pub use nodesim_common::{
    Direction, Graph, NodeId, NodeSimilarityConfig, NoopProgressTracker, OutputMode,
    ProgressTracker, RankOrder, SimilarityError, SimilarityMetric, TerminationFlag,
    TracingProgressTracker,
};
