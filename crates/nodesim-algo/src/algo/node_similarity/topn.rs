// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Global Top-N selection.

use nodesim_common::{NodeId, RankOrder};
use rayon::prelude::*;

use super::ranking::BoundedHeap;
use super::result::SimilarityResult;
use super::topk::TopKMap;

/// The `N` best pairs over the whole run. Filled by one thread only.
#[derive(Debug, Clone)]
pub struct TopNList {
    heap: BoundedHeap<(NodeId, NodeId)>,
}

impl TopNList {
    pub fn new(capacity: usize, order: RankOrder) -> Self {
        Self {
            heap: BoundedHeap::new(capacity, order),
        }
    }

    /// Equal scores keep the pair offered first.
    #[inline]
    pub fn offer(&mut self, node1: NodeId, node2: NodeId, score: f64) -> bool {
        let tie = ((node1 as u64) << 32) | node2 as u64;
        self.heap.offer(score, tie, (node1, node2))
    }

    /// Select from a frozen Top-K map.
    ///
    /// With `symmetric` set, both directions of a pair collapse into one
    /// `(min, max)` candidate, matching what upper-triangular enumeration would
    /// offer. Candidates are collected in parallel and offered in pair order, so
    /// the outcome equals direct enumeration whenever `K >= N`.
    pub fn from_top_k(map: &TopKMap, capacity: usize, order: RankOrder, symmetric: bool) -> Self {
        let mut candidates: Vec<SimilarityResult> = map
            .par_lists()
            .flat_map_iter(|(owner, list)| {
                list.entries().map(move |entry| {
                    let pair = SimilarityResult::new(owner, entry.neighbor, entry.score);
                    if symmetric && pair.node2 < pair.node1 {
                        pair.reverse()
                    } else {
                        pair
                    }
                })
            })
            .collect();

        candidates.par_sort_unstable_by_key(|r| (r.node1, r.node2));
        candidates.dedup_by_key(|r| (r.node1, r.node2));

        let mut top_n = Self::new(capacity, order);
        for r in candidates {
            top_n.offer(r.node1, r.node2, r.similarity);
        }
        top_n
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.len() == 0
    }

    /// Selected pairs, best first.
    pub fn into_results(self) -> Vec<SimilarityResult> {
        self.heap
            .sorted()
            .into_iter()
            .map(|(score, &(node1, node2))| SimilarityResult::new(node1, node2, score))
            .collect()
    }
}
