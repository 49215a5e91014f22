// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Node similarity configuration.
//!
//! Configuration is validated once, up front. Nothing in here is re-checked
//! while the algorithm runs.

use fxhash::FxHashSet;
use serde::Deserialize;
use serde_json::Value;

use crate::api::error::{Result, SimilarityError};
use crate::graph::traversal::NodeId;

pub const TOP_K_DEFAULT: i32 = 10;
pub const TOP_N_DEFAULT: u32 = 0;
pub const DEGREE_CUTOFF_DEFAULT: u32 = 1;
pub const SIMILARITY_CUTOFF_DEFAULT: f64 = 1e-42;
pub const CONCURRENCY_DEFAULT: usize = 4;

/// Scoring function applied to two neighbor vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SimilarityMetric {
    #[default]
    Jaccard,
    Overlap,
    Cosine,
}

/// Which end of the score range a bounded ranking keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    /// Keep the highest scores (positive `topK`).
    Descending,
    /// Keep the lowest scores (negative `topK`).
    Ascending,
}

impl RankOrder {
    /// Sort key under which smaller means better.
    #[inline]
    pub fn rank_key(self, score: f64) -> f64 {
        match self {
            RankOrder::Descending => -score,
            RankOrder::Ascending => score,
        }
    }
}

/// Shape of the produced result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputMode {
    #[default]
    Stream,
    Graph,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct NodeSimilarityConfig {
    pub similarity_metric: SimilarityMetric,
    /// Pairs scoring below this never appear downstream.
    pub similarity_cutoff: f64,
    /// Minimum distinct degree for a node to be compared.
    pub degree_cutoff: u32,
    /// Maximum distinct degree for a node to be compared.
    pub upper_degree_cutoff: u32,
    /// Per-node ranking size; the sign selects highest-first (positive) or
    /// lowest-first (negative). Zero disables Top-K.
    pub top_k: i32,
    /// Global ranking size. Zero disables Top-N.
    pub top_n: u32,
    pub concurrency: usize,
    /// Score with relationship properties instead of plain set overlap.
    pub weighted: bool,
    pub output: OutputMode,
    /// Only these nodes act as the first node of a pair.
    pub source_nodes: Option<FxHashSet<NodeId>>,
    /// Only these nodes act as the second node of a pair.
    pub target_nodes: Option<FxHashSet<NodeId>>,
}

impl Default for NodeSimilarityConfig {
    fn default() -> Self {
        Self {
            similarity_metric: SimilarityMetric::Jaccard,
            similarity_cutoff: SIMILARITY_CUTOFF_DEFAULT,
            degree_cutoff: DEGREE_CUTOFF_DEFAULT,
            upper_degree_cutoff: u32::MAX,
            top_k: TOP_K_DEFAULT,
            top_n: TOP_N_DEFAULT,
            concurrency: CONCURRENCY_DEFAULT,
            weighted: false,
            output: OutputMode::Stream,
            source_nodes: None,
            target_nodes: None,
        }
    }
}

impl NodeSimilarityConfig {
    /// Parse a JSON argument map (camelCase keys) and validate it.
    pub fn from_json(args: &Value) -> Result<Self> {
        let config: Self = serde_json::from_value(args.clone())
            .map_err(|e| SimilarityError::invalid_argument("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject every combination that cannot run.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_cutoff) {
            return Err(SimilarityError::invalid_argument(
                "similarityCutoff",
                format!("must be within [0, 1], got {}", self.similarity_cutoff),
            ));
        }
        if self.degree_cutoff == 0 {
            return Err(SimilarityError::invalid_argument(
                "degreeCutoff",
                "must be at least 1",
            ));
        }
        if self.upper_degree_cutoff < self.degree_cutoff {
            return Err(SimilarityError::invalid_argument(
                "upperDegreeCutoff",
                format!(
                    "must be at least degreeCutoff ({}), got {}",
                    self.degree_cutoff, self.upper_degree_cutoff
                ),
            ));
        }
        if self.top_k == i32::MIN {
            return Err(SimilarityError::invalid_argument(
                "topK",
                format!("magnitude overflows, got {}", self.top_k),
            ));
        }
        if self.concurrency == 0 {
            return Err(SimilarityError::invalid_argument(
                "concurrency",
                "must be at least 1",
            ));
        }
        if self.output == OutputMode::Graph && self.has_top_k() && self.has_top_n() {
            return Err(SimilarityError::InvalidOutputMode {
                message: "a similarity graph needs one ranking per node; \
                          topK and topN cannot both be set"
                    .to_string(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn has_top_k(&self) -> bool {
        self.top_k != 0
    }

    #[inline]
    pub fn has_top_n(&self) -> bool {
        self.top_n != 0
    }

    #[inline]
    pub fn is_parallel(&self) -> bool {
        self.concurrency > 1
    }

    /// Whether source or target restrictions are configured.
    #[inline]
    pub fn is_restricted(&self) -> bool {
        self.source_nodes.is_some() || self.target_nodes.is_some()
    }

    pub fn top_k_ordering(&self) -> RankOrder {
        if self.top_k < 0 {
            RankOrder::Ascending
        } else {
            RankOrder::Descending
        }
    }

    /// Unsigned Top-K size.
    pub fn top_k_size(&self) -> usize {
        self.top_k.unsigned_abs() as usize
    }

    /// Whether a degree passes both cutoffs.
    #[inline]
    pub fn accepts_degree(&self, degree: usize) -> bool {
        degree >= self.degree_cutoff as usize && degree <= self.upper_degree_cutoff as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_are_valid() {
        let config = NodeSimilarityConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.has_top_k());
        assert!(!config.has_top_n());
        assert_eq!(config.top_k_ordering(), RankOrder::Descending);
    }

    #[test]
    fn test_from_json() {
        let config = NodeSimilarityConfig::from_json(&json!({
            "similarityMetric": "OVERLAP",
            "similarityCutoff": 0.5,
            "topK": -3,
            "topN": 7,
            "concurrency": 1,
            "sourceNodes": [0, 2]
        }))
        .unwrap();

        assert_eq!(config.similarity_metric, SimilarityMetric::Overlap);
        assert_eq!(config.top_k_size(), 3);
        assert_eq!(config.top_k_ordering(), RankOrder::Ascending);
        assert_eq!(config.top_n, 7);
        assert!(!config.is_parallel());
        assert!(config.is_restricted());
        assert!(config.source_nodes.unwrap().contains(&2));
    }

    #[test]
    fn test_rejects_unknown_and_malformed_fields() {
        assert!(NodeSimilarityConfig::from_json(&json!({ "topK": "ten" })).is_err());
        assert!(NodeSimilarityConfig::from_json(&json!({ "bogus": 1 })).is_err());
        assert!(NodeSimilarityConfig::from_json(&json!({ "topN": -1 })).is_err());
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            json!({ "similarityCutoff": 1.5 }),
            json!({ "similarityCutoff": -0.1 }),
            json!({ "degreeCutoff": 0 }),
            json!({ "degreeCutoff": 5, "upperDegreeCutoff": 4 }),
            json!({ "topK": i32::MIN }),
            json!({ "concurrency": 0 }),
        ];
        for case in cases {
            let err = NodeSimilarityConfig::from_json(&case).unwrap_err();
            assert!(
                matches!(err, SimilarityError::InvalidArgument { .. }),
                "{case}: {err}"
            );
        }
    }

    #[test]
    fn test_graph_output_rejects_top_k_with_top_n() {
        let err = NodeSimilarityConfig::from_json(&json!({
            "output": "GRAPH",
            "topK": 1,
            "topN": 1
        }))
        .unwrap_err();
        assert!(matches!(err, SimilarityError::InvalidOutputMode { .. }));

        // Either ranking alone is fine.
        assert!(NodeSimilarityConfig::from_json(&json!({ "output": "GRAPH", "topK": 1 })).is_ok());
        assert!(
            NodeSimilarityConfig::from_json(&json!({ "output": "GRAPH", "topK": 0, "topN": 1 }))
                .is_ok()
        );
    }

    #[test]
    fn test_degree_window() {
        let config = NodeSimilarityConfig {
            degree_cutoff: 2,
            upper_degree_cutoff: 3,
            ..Default::default()
        };
        assert!(!config.accepts_degree(1));
        assert!(config.accepts_degree(2));
        assert!(config.accepts_degree(3));
        assert!(!config.accepts_degree(4));
    }
}
