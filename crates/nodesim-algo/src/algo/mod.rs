// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Node Similarity Engine
//!
//! Computes pairwise similarity between nodes from their neighbor sets.
//!
//! # Architecture
//!
//! - **GraphProjection**: dense CSR adjacency. Input graphs are usually
//!   projections, and similarity results without Top-K are materialized into one.
//!
//! - **NodeSimilarity**: two phases separated by a full barrier. `prepare`
//!   extracts one sorted neighbor vector per node in parallel; `compute` scores
//!   candidate pairs into a Top-K map, a Top-N list or a plain stream.
//!
//! # Example
//!
//! ```ignore
//! use nodesim_algo::{NodeSimilarity, NodeSimilarityConfig, ProjectionBuilder};
//!
//! let projection = ProjectionBuilder::new(4)
//!     .edges([(0, 2), (0, 3), (1, 2)])
//!     .build()?;
//!
//! let config = NodeSimilarityConfig { top_k: 1, ..Default::default() };
//! let results = NodeSimilarity::new(&projection, config)?
//!     .compute_to_stream()?
//!     .collect::<Result<Vec<_>, _>>()?;
//! ```

pub mod node_similarity;
pub mod projection;

#[cfg(test)]
pub mod test_utils;
