// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Neighbor vector extraction.

use std::sync::atomic::{AtomicU64, Ordering};

use nodesim_common::progress::poll_interval;
use nodesim_common::{
    Graph, NodeId, NodeSimilarityConfig, ProgressTracker, Result, SimilarityError, TerminationFlag,
};
use rayon::prelude::*;

use super::node_filter::NodeFilter;

/// Sorted, duplicate-free, self-loop-free targets of one node, with optional
/// weights of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborVector {
    pub targets: Box<[NodeId]>,
    pub weights: Option<Box<[f64]>>,
}

impl NeighborVector {
    #[inline]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Output of the prepare phase.
#[derive(Debug, Clone)]
pub struct NeighborVectors {
    /// Indexed by node id; `None` for nodes outside the degree window.
    vectors: Vec<Option<NeighborVector>>,
    filter: NodeFilter,
}

impl NeighborVectors {
    #[inline]
    pub fn get(&self, node: NodeId) -> Option<&NeighborVector> {
        self.vectors.get(node as usize).and_then(Option::as_ref)
    }

    /// Nodes with a vector.
    pub fn filter(&self) -> &NodeFilter {
        &self.filter
    }

    pub fn node_count(&self) -> usize {
        self.vectors.len()
    }
}

/// Counts distinct targets and collects them, skipping self-loops and
/// collapsing consecutive duplicates.
///
/// Relies on the traversal yielding targets sorted per node. Unsorted adjacency
/// leaves non-adjacent duplicates in place.
struct DedupCursor {
    last_target: Option<NodeId>,
}

impl DedupCursor {
    fn new() -> Self {
        Self { last_target: None }
    }

    #[inline]
    fn accept(&mut self, source: NodeId, target: NodeId) -> bool {
        let fresh = source != target && self.last_target != Some(target);
        self.last_target = Some(target);
        fresh
    }
}

fn distinct_degree<G: Graph>(graph: &G, node: NodeId) -> usize {
    let mut cursor = DedupCursor::new();
    let mut degree = 0;
    graph.for_each_relationship(node, |source, target| {
        if cursor.accept(source, target) {
            degree += 1;
        }
        true
    });
    degree
}

fn collect_vector<G: Graph>(graph: &G, node: NodeId, degree: usize, weighted: bool) -> NeighborVector {
    let mut cursor = DedupCursor::new();
    let mut targets = Vec::with_capacity(degree);
    if weighted {
        let mut weights = Vec::with_capacity(degree);
        graph.for_each_relationship_with_property(node, 1.0, |source, target, weight| {
            if cursor.accept(source, target) {
                targets.push(target);
                weights.push(weight);
            }
            true
        });
        NeighborVector {
            targets: targets.into_boxed_slice(),
            weights: Some(weights.into_boxed_slice()),
        }
    } else {
        graph.for_each_relationship(node, |source, target| {
            if cursor.accept(source, target) {
                targets.push(target);
            }
            true
        });
        NeighborVector {
            targets: targets.into_boxed_slice(),
            weights: None,
        }
    }
}

/// Build every node's neighbor vector in parallel.
///
/// Each node writes only its own output slot. Nodes outside the degree window
/// get no vector and stay out of the filter, but still count as processed.
pub fn extract<G: Graph>(
    graph: &G,
    config: &NodeSimilarityConfig,
    progress: &dyn ProgressTracker,
    termination: &TerminationFlag,
) -> Result<NeighborVectors> {
    let node_count = graph.node_count();
    let Ok(id_bound) = NodeId::try_from(node_count) else {
        return Err(SimilarityError::InvalidArgument {
            arg: "nodeCount".to_string(),
            message: format!("{node_count} nodes exceed the u32 id space"),
        });
    };
    let total = node_count as u64;
    let interval = poll_interval(total);
    let processed = AtomicU64::new(0);

    let vectors = (0..id_bound)
        .into_par_iter()
        .map(|node| -> Result<Option<NeighborVector>> {
            let degree = distinct_degree(graph, node);
            let vector = config
                .accepts_degree(degree)
                .then(|| collect_vector(graph, node, degree, config.weighted));

            let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % interval == 0 {
                termination.assert_running()?;
                progress.log_progress(done, total);
            }
            Ok(vector)
        })
        .collect::<Result<Vec<_>>>()?;

    let members = vectors
        .iter()
        .enumerate()
        .filter_map(|(node, v)| v.as_ref().map(|_| node as NodeId))
        .collect();

    Ok(NeighborVectors {
        filter: NodeFilter::from_sorted(node_count, members),
        vectors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::node_similarity::node_filter::SparseIdSet;
    use crate::algo::projection::ProjectionBuilder;
    use nodesim_common::NoopProgressTracker;

    fn run(
        builder: ProjectionBuilder,
        config: &NodeSimilarityConfig,
    ) -> NeighborVectors {
        let graph = builder.build().unwrap();
        extract(&graph, config, &NoopProgressTracker, &TerminationFlag::running()).unwrap()
    }

    #[test]
    fn test_dedup_and_self_loops() {
        let builder = ProjectionBuilder::new(4).edges([(0, 0), (0, 2), (0, 2), (0, 1), (0, 3)]);
        let vectors = run(builder, &NodeSimilarityConfig::default());

        let v0 = vectors.get(0).unwrap();
        assert_eq!(&*v0.targets, &[1, 2, 3]);
        assert!(v0.weights.is_none());
        // Nodes without outgoing edges fail the default cutoff of 1
        assert!(vectors.get(1).is_none());
        assert_eq!(vectors.filter().members(), &[0]);
    }

    #[test]
    fn test_degree_window() {
        let builder = ProjectionBuilder::new(6).edges([
            (0, 5),
            (1, 4),
            (1, 5),
            (2, 3),
            (2, 4),
            (2, 5),
        ]);
        let config = NodeSimilarityConfig {
            degree_cutoff: 2,
            upper_degree_cutoff: 2,
            ..Default::default()
        };
        let vectors = run(builder, &config);

        assert_eq!(vectors.filter().members(), &[1]);
        assert_eq!(vectors.filter().len(), 1);
        assert_eq!(vectors.node_count(), 6);
    }

    #[test]
    fn test_weighted_vectors_keep_first_parallel_edge() {
        let builder = ProjectionBuilder::new(3).weighted_edges([(0, 1, 0.5), (0, 1, 4.0), (0, 2, 2.0)]);
        let config = NodeSimilarityConfig {
            weighted: true,
            ..Default::default()
        };
        let vectors = run(builder, &config);

        let v0 = vectors.get(0).unwrap();
        assert_eq!(&*v0.targets, &[1, 2]);
        assert_eq!(v0.weights.as_deref(), Some(&[0.5, 2.0][..]));
    }

    #[test]
    fn test_weighted_without_property_uses_fallback() {
        let builder = ProjectionBuilder::new(3).edges([(0, 1), (0, 2)]);
        let config = NodeSimilarityConfig {
            weighted: true,
            ..Default::default()
        };
        let vectors = run(builder, &config);

        assert_eq!(vectors.get(0).unwrap().weights.as_deref(), Some(&[1.0, 1.0][..]));
    }

    #[test]
    fn test_terminated_before_start() {
        let graph = ProjectionBuilder::new(2).edge(0, 1).build().unwrap();
        let flag = TerminationFlag::running();
        flag.terminate();

        let result = extract(&graph, &NodeSimilarityConfig::default(), &NoopProgressTracker, &flag);
        assert!(result.is_err());
    }

    /// Claims more nodes than `NodeId` can address and has no edges.
    #[cfg(target_pointer_width = "64")]
    struct OversizedGraph;

    #[cfg(target_pointer_width = "64")]
    impl Graph for OversizedGraph {
        fn node_count(&self) -> usize {
            u32::MAX as usize + 1
        }

        fn relationship_count(&self) -> usize {
            0
        }

        fn degree(&self, _node: NodeId) -> usize {
            0
        }

        fn direction(&self) -> nodesim_common::Direction {
            nodesim_common::Direction::Outgoing
        }

        fn has_relationship_property(&self) -> bool {
            false
        }

        fn for_each_relationship<F>(&self, _node: NodeId, _consumer: F)
        where
            F: FnMut(NodeId, NodeId) -> bool,
        {
        }

        fn for_each_relationship_with_property<F>(&self, _node: NodeId, _fallback: f64, _consumer: F)
        where
            F: FnMut(NodeId, NodeId, f64) -> bool,
        {
        }
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_rejects_node_count_beyond_id_space() {
        let err = extract(
            &OversizedGraph,
            &NodeSimilarityConfig::default(),
            &NoopProgressTracker,
            &TerminationFlag::running(),
        )
        .unwrap_err();
        assert!(matches!(err, SimilarityError::InvalidArgument { ref arg, .. } if arg == "nodeCount"));
    }
}
