// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Node Similarity Algorithm.
//!
//! Compares nodes by the sets of neighbors they reach and reports scored pairs,
//! either as a stream or as a graph of the best matches per node.
//!
//! A run has two phases with a full barrier between them:
//!
//! 1. **prepare**: every node's neighbor vector is extracted in parallel. Nodes
//!    outside the degree window are dropped from the eligible set.
//! 2. **compute**: eligible pairs are enumerated and scored into a Top-K map, a
//!    Top-N list, or straight into the output.
//!
//! Multi-threaded Top-K uses full enumeration: each worker owns a contiguous
//! range of source nodes and only writes their lists. Single-threaded Top-K
//! scores each unordered pair once and writes both ends.

pub mod graph;
pub mod metric;
pub mod node_filter;
pub mod pairs;
pub mod ranking;
pub mod result;
pub mod topk;
pub mod topn;
pub mod vectors;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use nodesim_common::progress::poll_interval;
use nodesim_common::{
    Direction, Graph, NodeSimilarityConfig, OutputMode, ProgressTracker, Result, SimilarityError,
    TerminationFlag, TracingProgressTracker,
};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::algo::projection::ProjectionBuilder;
use metric::VectorScorer;
use node_filter::SparseIdSet;
use pairs::{Enumeration, PairSpace, rank_partitions};

pub use graph::{SimilarityGraph, SimilarityGraphResult, TopKGraph};
pub use node_filter::NodeFilter;
pub use ranking::{BoundedRankingList, RankingEntry};
pub use result::{SimilarityResult, SimilarityStream};
pub use topk::TopKMap;
pub use topn::TopNList;

const ALGORITHM_NAME: &str = "NodeSimilarity";

/// Output of [`NodeSimilarity::compute`], shaped by the configured output mode.
#[derive(Debug)]
pub enum NodeSimilarityResult {
    Stream(SimilarityStream),
    Graph(SimilarityGraphResult),
}

/// Coordinator for one similarity computation over a borrowed graph.
pub struct NodeSimilarity<'g, G: Graph> {
    graph: &'g G,
    config: NodeSimilarityConfig,
    progress: Arc<dyn ProgressTracker>,
    termination: TerminationFlag,
}

impl<'g, G: Graph> NodeSimilarity<'g, G> {
    /// Validate `config` against `graph`. Nothing is traversed yet.
    pub fn new(graph: &'g G, config: NodeSimilarityConfig) -> Result<Self> {
        config.validate()?;
        let direction = graph.direction();
        if direction == Direction::Both {
            return Err(SimilarityError::UnsupportedDirection { direction });
        }
        Ok(Self {
            graph,
            config,
            progress: Arc::new(TracingProgressTracker::new(ALGORITHM_NAME)),
            termination: TerminationFlag::running(),
        })
    }

    pub fn with_progress_tracker(mut self, progress: Arc<dyn ProgressTracker>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_termination_flag(mut self, termination: TerminationFlag) -> Self {
        self.termination = termination;
        self
    }

    pub fn config(&self) -> &NodeSimilarityConfig {
        &self.config
    }

    /// Run and materialize according to `config.output`.
    pub fn compute(&self) -> Result<NodeSimilarityResult> {
        match self.config.output {
            OutputMode::Stream => self.compute_to_stream().map(NodeSimilarityResult::Stream),
            OutputMode::Graph => self.compute_to_graph().map(NodeSimilarityResult::Graph),
        }
    }

    /// Scored pairs: all of them, per-node Top-K, or global Top-N.
    ///
    /// Without Top-K or Top-N on a single thread, pairs are scored lazily as
    /// the stream is consumed.
    #[instrument(skip(self), fields(top_k = self.config.top_k, top_n = self.config.top_n))]
    pub fn compute_to_stream(&self) -> Result<SimilarityStream> {
        let space = Arc::new(self.prepare()?);
        self.stream_from(space)
    }

    /// A graph whose relationships are similarity pairs.
    ///
    /// With Top-K this is a view over the frozen Top-K map. Otherwise the
    /// result stream is materialized into a projection.
    #[instrument(skip(self), fields(top_k = self.config.top_k, top_n = self.config.top_n))]
    pub fn compute_to_graph(&self) -> Result<SimilarityGraphResult> {
        if self.config.has_top_k() && self.config.has_top_n() {
            return Err(SimilarityError::InvalidOutputMode {
                message: "a similarity graph needs one ranking per node; \
                          topK and topN cannot both be set"
                    .to_string(),
            });
        }

        let space = Arc::new(self.prepare()?);
        let compared_nodes = space.vectors().filter().len();
        let node_count = self.graph.node_count();

        if self.config.has_top_k() {
            self.progress.begin_task("compute");
            let map = self.compute_top_k(&space)?;
            self.progress.end_task("compute");
            info!(
                compared_nodes,
                relationships = map.total_pair_count(),
                "Built Top-K similarity graph"
            );
            return Ok(SimilarityGraphResult {
                graph: SimilarityGraph::TopK(TopKGraph::new(node_count, map)),
                compared_nodes,
                is_top_k_graph: true,
            });
        }

        let edges = self
            .stream_from(space)?
            .map(|r| r.map(|r| (r.node1, r.node2, r.similarity)))
            .collect::<Result<Vec<_>>>()?;
        let relationships = edges.len();
        let projection = ProjectionBuilder::new(node_count)
            .weighted_edges(edges)
            .build()?;
        info!(compared_nodes, relationships, "Materialized similarity graph");

        Ok(SimilarityGraphResult {
            graph: SimilarityGraph::Materialized(projection),
            compared_nodes,
            is_top_k_graph: false,
        })
    }

    #[instrument(skip(self), level = "debug")]
    fn prepare(&self) -> Result<PairSpace> {
        self.progress.begin_task("prepare");
        let vectors =
            vectors::extract(self.graph, &self.config, self.progress.as_ref(), &self.termination)?;

        let eligible = vectors.filter();
        let sources = match &self.config.source_nodes {
            Some(nodes) => eligible.retain(|id| nodes.contains(&id)),
            None => eligible.clone(),
        };
        let targets = match &self.config.target_nodes {
            Some(nodes) => eligible.retain(|id| nodes.contains(&id)),
            None => eligible.clone(),
        };
        info!(
            node_count = vectors.node_count(),
            compared_nodes = eligible.len(),
            sources = sources.len(),
            targets = targets.len(),
            "Prepared neighbor vectors"
        );
        self.progress.end_task("prepare");

        let scorer = VectorScorer::new(
            self.config.similarity_metric,
            self.config.similarity_cutoff,
            self.config.weighted,
        );
        Ok(PairSpace::new(
            vectors,
            sources,
            targets,
            scorer,
            self.config.is_restricted(),
        ))
    }

    fn stream_from(&self, space: Arc<PairSpace>) -> Result<SimilarityStream> {
        self.progress.begin_task("compute");
        let results = match (self.config.has_top_k(), self.config.has_top_n()) {
            (false, false) if !self.config.is_parallel() => {
                debug!("Streaming all pairs lazily");
                // The stream closes the "compute" task once exhausted
                return Ok(SimilarityStream::all_pairs(
                    space,
                    Arc::clone(&self.progress),
                    self.termination.clone(),
                ));
            }
            (false, false) => self.compute_all_pairs(&space)?,
            (true, false) => self.compute_top_k(&space)?.iter_sorted().collect(),
            (false, true) => self.compute_top_n(&space)?.into_results(),
            (true, true) => {
                let map = self.compute_top_k(&space)?;
                debug!(
                    candidates = map.total_pair_count(),
                    "Selecting Top-N from Top-K map"
                );
                TopNList::from_top_k(
                    &map,
                    self.config.top_n as usize,
                    self.config.top_k_ordering(),
                    !space.is_restricted(),
                )
                .into_results()
            }
        };
        self.progress.end_task("compute");
        Ok(SimilarityStream::materialized(results))
    }

    fn strategy(&self, space: &PairSpace) -> Enumeration {
        if space.is_restricted() || self.config.is_parallel() {
            Enumeration::Full
        } else {
            Enumeration::UpperTriangular
        }
    }

    /// Progress and termination poll shared by the compute loops.
    fn checkpoint(&self, processed: &AtomicU64, interval: u64, total: u64) -> Result<()> {
        let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
        if done % interval == 0 {
            self.termination.assert_running()?;
            self.progress.log_progress(done, total);
        }
        Ok(())
    }

    #[instrument(skip(self, space), level = "debug")]
    fn compute_top_k(&self, space: &PairSpace) -> Result<TopKMap> {
        let sources = space.sources();
        let capacity = self.config.top_k_size().min(space.max_partners());
        let mut map = TopKMap::new(sources.clone(), capacity, self.config.top_k_ordering());

        let total = sources.len() as u64;
        let interval = poll_interval(total);
        let processed = AtomicU64::new(0);

        match self.strategy(space) {
            Enumeration::UpperTriangular => {
                debug!(capacity, "Top-K over upper triangle, single writer");
                for node1 in sources.iter() {
                    space.for_each_scored_partner(node1, Enumeration::UpperTriangular, |node2, score| {
                        map.offer(node1, node2, score);
                        map.offer(node2, node1, score);
                    });
                    self.checkpoint(&processed, interval, total)?;
                }
            }
            Enumeration::Full => {
                let ranges = rank_partitions(sources.len(), self.config.concurrency);
                debug!(capacity, partitions = ranges.len(), "Top-K over full matrix");
                map.partitions_mut(&ranges)
                    .into_par_iter()
                    .try_for_each(|mut partition| {
                        for rank in partition.ranks() {
                            let node1 = sources.member(rank);
                            space.for_each_scored_partner(node1, Enumeration::Full, |node2, score| {
                                partition.offer(node1, node2, score);
                            });
                            self.checkpoint(&processed, interval, total)?;
                        }
                        Ok::<_, SimilarityError>(())
                    })?;
            }
        }
        Ok(map)
    }

    /// Direct Top-N on the calling thread.
    #[instrument(skip(self, space), level = "debug")]
    fn compute_top_n(&self, space: &PairSpace) -> Result<TopNList> {
        let strategy = if space.is_restricted() {
            Enumeration::Full
        } else {
            Enumeration::UpperTriangular
        };
        let sources = space.sources();
        let total = sources.len() as u64;
        let interval = poll_interval(total);
        let processed = AtomicU64::new(0);

        let mut top_n = TopNList::new(self.config.top_n as usize, self.config.top_k_ordering());
        for node1 in sources.iter() {
            space.for_each_scored_partner(node1, strategy, |node2, score| {
                top_n.offer(node1, node2, score);
            });
            self.checkpoint(&processed, interval, total)?;
        }
        Ok(top_n)
    }

    /// Every pair, scored by `concurrency` partitions and concatenated in
    /// source order.
    #[instrument(skip(self, space), level = "debug")]
    fn compute_all_pairs(&self, space: &PairSpace) -> Result<Vec<SimilarityResult>> {
        let strategy = if space.is_restricted() {
            Enumeration::Full
        } else {
            Enumeration::UpperTriangular
        };
        let sources = space.sources();
        let total = sources.len() as u64;
        let interval = poll_interval(total);
        let processed = AtomicU64::new(0);

        let chunks = rank_partitions(sources.len(), self.config.concurrency)
            .into_par_iter()
            .map(|ranks| -> Result<Vec<SimilarityResult>> {
                let mut chunk = Vec::new();
                for rank in ranks {
                    let node1 = sources.member(rank);
                    space.for_each_scored_partner(node1, strategy, |node2, score| {
                        chunk.push(SimilarityResult::new(node1, node2, score));
                    });
                    self.checkpoint(&processed, interval, total)?;
                }
                Ok(chunk)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(chunks.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::projection::GraphProjection;
    use crate::algo::test_utils::build_test_graph;

    const EPS: f64 = 1e-9;

    /// A -> {X, Y, Z}, B -> {X, Y}, C -> {Z} with A=0, B=1, C=2, X=3, Y=4, Z=5.
    fn abc_graph() -> GraphProjection {
        build_test_graph(6, vec![(0, 3), (0, 4), (0, 5), (1, 3), (1, 4), (2, 5)])
    }

    fn config(top_k: i32, cutoff: f64) -> NodeSimilarityConfig {
        NodeSimilarityConfig {
            top_k,
            similarity_cutoff: cutoff,
            concurrency: 1,
            ..Default::default()
        }
    }

    fn stream(graph: &GraphProjection, config: NodeSimilarityConfig) -> Vec<SimilarityResult> {
        NodeSimilarity::new(graph, config)
            .unwrap()
            .with_progress_tracker(Arc::new(nodesim_common::NoopProgressTracker))
            .compute_to_stream()
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    fn assert_pairs(actual: &[SimilarityResult], expected: &[(u32, u32, f64)]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?}");
        for (r, &(n1, n2, s)) in actual.iter().zip(expected) {
            assert_eq!((r.node1, r.node2), (n1, n2), "{actual:?}");
            assert!((r.similarity - s).abs() < EPS, "{actual:?}");
        }
    }

    #[test]
    fn test_all_pairs_with_zero_cutoff() {
        let results = stream(&abc_graph(), config(0, 0.0));
        assert_pairs(
            &results,
            &[(0, 1, 2.0 / 3.0), (0, 2, 1.0 / 3.0), (1, 2, 0.0)],
        );
    }

    #[test]
    fn test_cutoff_drops_disjoint_pair() {
        let results = stream(&abc_graph(), config(0, 0.1));
        assert_pairs(&results, &[(0, 1, 2.0 / 3.0), (0, 2, 1.0 / 3.0)]);
    }

    #[test]
    fn test_top_k_graph() {
        let graph = abc_graph();
        let config = NodeSimilarityConfig {
            output: OutputMode::Graph,
            ..config(1, 0.0)
        };
        let Ok(NodeSimilarityResult::Graph(result)) =
            NodeSimilarity::new(&graph, config).unwrap().compute()
        else {
            panic!("expected a graph result");
        };
        assert!(result.is_top_k_graph);
        assert_eq!(result.compared_nodes, 3);
        assert_eq!(result.graph.relationship_count(), 3);

        let mut edges = Vec::new();
        for node in 0..result.graph.node_count() as u32 {
            result.graph.for_each_relationship_with_property(node, 0.0, |s, t, w| {
                edges.push((s, t, w));
                true
            });
        }
        let expected = [(0, 1, 2.0 / 3.0), (1, 0, 2.0 / 3.0), (2, 0, 1.0 / 3.0)];
        assert_eq!(edges.len(), expected.len());
        for ((s, t, w), (es, et, ew)) in edges.into_iter().zip(expected) {
            assert_eq!((s, t), (es, et));
            assert!((w - ew).abs() < EPS);
        }
    }

    #[test]
    fn test_materialized_graph_without_top_k() {
        let graph = abc_graph();
        let config = NodeSimilarityConfig {
            output: OutputMode::Graph,
            top_n: 1,
            ..config(0, 0.0)
        };
        let result = NodeSimilarity::new(&graph, config)
            .unwrap()
            .compute_to_graph()
            .unwrap();

        assert!(!result.is_top_k_graph);
        assert_eq!(result.graph.relationship_count(), 1);
        assert_eq!(result.graph.degree(0), 1);
        assert!(result.graph.has_relationship_property());
    }

    #[test]
    fn test_graph_rejects_top_k_with_top_n() {
        let graph = abc_graph();
        let config = NodeSimilarityConfig {
            top_n: 2,
            ..config(1, 0.0)
        };
        let err = NodeSimilarity::new(&graph, config)
            .unwrap()
            .compute_to_graph()
            .unwrap_err();
        assert!(matches!(err, SimilarityError::InvalidOutputMode { .. }));
    }

    #[test]
    fn test_rejects_both_directions() {
        let graph = abc_graph();
        let view = graph.oriented(Direction::Both).unwrap();
        let err = NodeSimilarity::new(&view, NodeSimilarityConfig::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            SimilarityError::UnsupportedDirection {
                direction: Direction::Both
            }
        ));
    }

    #[test]
    fn test_parallel_all_pairs_matches_lazy_stream() {
        let graph = abc_graph();
        let lazy = stream(&graph, config(0, 0.0));
        let parallel = stream(
            &graph,
            NodeSimilarityConfig {
                concurrency: 3,
                ..config(0, 0.0)
            },
        );
        assert_eq!(lazy, parallel);
    }
}
