// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Candidate pair enumeration.

use std::ops::Range;

use nodesim_common::NodeId;

use super::metric::VectorScorer;
use super::node_filter::{NodeFilter, SparseIdSet};
use super::vectors::NeighborVectors;

/// Which partners a source node is scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enumeration {
    /// Targets with a larger id only. Each unordered pair is scored once.
    UpperTriangular,
    /// Every target except the source itself. Each unordered pair is scored
    /// from both ends.
    Full,
}

/// Frozen output of the prepare phase: vectors, eligible sources and targets,
/// and the scoring strategy.
#[derive(Debug)]
pub struct PairSpace {
    vectors: NeighborVectors,
    sources: NodeFilter,
    targets: NodeFilter,
    scorer: VectorScorer,
    restricted: bool,
}

impl PairSpace {
    /// Without restrictions, sources and targets are both the full filter.
    pub fn new(
        vectors: NeighborVectors,
        sources: NodeFilter,
        targets: NodeFilter,
        scorer: VectorScorer,
        restricted: bool,
    ) -> Self {
        Self {
            vectors,
            sources,
            targets,
            scorer,
            restricted,
        }
    }

    pub fn vectors(&self) -> &NeighborVectors {
        &self.vectors
    }

    pub fn sources(&self) -> &NodeFilter {
        &self.sources
    }

    pub fn targets(&self) -> &NodeFilter {
        &self.targets
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Largest number of partners any source can have.
    pub fn max_partners(&self) -> usize {
        if self.restricted {
            self.targets.len()
        } else {
            self.targets.len().saturating_sub(1)
        }
    }

    /// Score `node1` against its partners, calling `consumer(node2, score)` for
    /// every pair at or above the cutoff. Partners arrive in ascending id order.
    #[inline]
    pub fn for_each_scored_partner<F>(&self, node1: NodeId, strategy: Enumeration, mut consumer: F)
    where
        F: FnMut(NodeId, f64),
    {
        let Some(vector1) = self.vectors.get(node1) else {
            return;
        };
        let start = match strategy {
            Enumeration::UpperTriangular => node1.saturating_add(1),
            Enumeration::Full => 0,
        };
        for node2 in self.targets.iter_from(start) {
            if node2 == node1 {
                continue;
            }
            if let Some(vector2) = self.vectors.get(node2)
                && let Some(score) = self.scorer.score(vector1, vector2)
            {
                consumer(node2, score);
            }
        }
    }
}

/// Split `0..len` into at most `parts` contiguous, non-empty ranges of nearly
/// equal size.
pub fn rank_partitions(len: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.clamp(1, len.max(1));
    let base = len / parts;
    let extra = len % parts;

    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let size = base + usize::from(i < extra);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}
