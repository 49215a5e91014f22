// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Similarity results exposed as a graph.

use nodesim_common::{Direction, Graph, NodeId};

use super::ranking::RankingEntry;
use super::topk::TopKMap;
use crate::algo::projection::GraphProjection;

/// Read-only graph over a frozen Top-K map.
///
/// Each owner has one outgoing relationship per ranking entry, carrying the
/// score as its property, in neighbor id order. Nodes without a list have
/// degree 0.
#[derive(Debug, Clone)]
pub struct TopKGraph {
    node_count: usize,
    map: TopKMap,
}

impl TopKGraph {
    pub(crate) fn new(node_count: usize, map: TopKMap) -> Self {
        Self { node_count, map }
    }

    pub fn top_k_map(&self) -> &TopKMap {
        &self.map
    }
}

impl Graph for TopKGraph {
    fn node_count(&self) -> usize {
        self.node_count
    }

    fn relationship_count(&self) -> usize {
        self.map.total_pair_count()
    }

    fn degree(&self, node: NodeId) -> usize {
        self.map.degree(node)
    }

    fn direction(&self) -> Direction {
        Direction::Outgoing
    }

    fn has_relationship_property(&self) -> bool {
        true
    }

    fn for_each_relationship<F>(&self, node: NodeId, mut consumer: F)
    where
        F: FnMut(NodeId, NodeId) -> bool,
    {
        self.for_each_relationship_with_property(node, f64::NAN, |source, target, _| {
            consumer(source, target)
        });
    }

    fn for_each_relationship_with_property<F>(&self, node: NodeId, _fallback: f64, mut consumer: F)
    where
        F: FnMut(NodeId, NodeId, f64) -> bool,
    {
        let Some(list) = self.map.get(node) else {
            return;
        };
        // Traversals yield targets in id order
        let mut entries: Vec<RankingEntry> = list.entries().collect();
        entries.sort_unstable_by_key(|entry| entry.neighbor);
        for entry in entries {
            if !consumer(node, entry.neighbor, entry.score) {
                break;
            }
        }
    }
}

/// Either a view over the Top-K map or a projection materialized from a
/// result stream.
#[derive(Debug, Clone)]
pub enum SimilarityGraph {
    TopK(TopKGraph),
    Materialized(GraphProjection),
}

impl Graph for SimilarityGraph {
    fn node_count(&self) -> usize {
        match self {
            SimilarityGraph::TopK(g) => g.node_count(),
            SimilarityGraph::Materialized(g) => g.node_count(),
        }
    }

    fn relationship_count(&self) -> usize {
        match self {
            SimilarityGraph::TopK(g) => g.relationship_count(),
            SimilarityGraph::Materialized(g) => g.relationship_count(),
        }
    }

    fn degree(&self, node: NodeId) -> usize {
        match self {
            SimilarityGraph::TopK(g) => g.degree(node),
            SimilarityGraph::Materialized(g) => g.degree(node),
        }
    }

    fn direction(&self) -> Direction {
        Direction::Outgoing
    }

    fn has_relationship_property(&self) -> bool {
        match self {
            SimilarityGraph::TopK(g) => g.has_relationship_property(),
            SimilarityGraph::Materialized(g) => g.has_relationship_property(),
        }
    }

    fn for_each_relationship<F>(&self, node: NodeId, consumer: F)
    where
        F: FnMut(NodeId, NodeId) -> bool,
    {
        match self {
            SimilarityGraph::TopK(g) => g.for_each_relationship(node, consumer),
            SimilarityGraph::Materialized(g) => g.for_each_relationship(node, consumer),
        }
    }

    fn for_each_relationship_with_property<F>(&self, node: NodeId, fallback: f64, consumer: F)
    where
        F: FnMut(NodeId, NodeId, f64) -> bool,
    {
        match self {
            SimilarityGraph::TopK(g) => g.for_each_relationship_with_property(node, fallback, consumer),
            SimilarityGraph::Materialized(g) => {
                g.for_each_relationship_with_property(node, fallback, consumer)
            }
        }
    }
}

/// Graph output of a run.
#[derive(Debug, Clone)]
pub struct SimilarityGraphResult {
    pub graph: SimilarityGraph,
    /// Nodes that passed the degree cutoffs.
    pub compared_nodes: usize,
    pub is_top_k_graph: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::node_similarity::node_filter::NodeFilter;
    use nodesim_common::RankOrder;

    fn graph() -> TopKGraph {
        let mut map = TopKMap::new(NodeFilter::from_sorted(4, vec![0, 1, 3]), 2, RankOrder::Descending);
        map.offer(0, 1, 0.5);
        map.offer(0, 3, 0.75);
        map.offer(1, 0, 0.5);
        TopKGraph::new(4, map)
    }

    #[test]
    fn test_top_k_graph_shape() {
        let g = graph();
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.relationship_count(), 3);
        assert_eq!(g.degree(0), 2);
        assert_eq!(g.degree(2), 0);
        assert_eq!(g.degree(3), 0);
        assert!(g.has_relationship_property());
        assert_eq!(g.top_k_map().total_pair_count(), 3);
    }

    #[test]
    fn test_top_k_graph_replays_lists() {
        let g = graph();
        let mut edges = Vec::new();
        g.for_each_relationship_with_property(0, 1.0, |s, t, w| {
            edges.push((s, t, w));
            true
        });
        assert_eq!(edges, vec![(0, 1, 0.5), (0, 3, 0.75)]);

        let mut first = Vec::new();
        g.for_each_relationship(0, |s, t| {
            first.push((s, t));
            false
        });
        assert_eq!(first, vec![(0, 1)]);
    }
}
