// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Per-node Top-K rankings.
//!
//! Lists live in one dense arena indexed by owner rank. Parallel scoring splits
//! the arena into disjoint [`TopKPartition`]s, one per worker, so every list has
//! exactly one writer and no lock is taken.

use std::ops::Range;

use nodesim_common::{NodeId, RankOrder};
use rayon::prelude::*;

use super::node_filter::{NodeFilter, SparseIdSet};
use super::ranking::{BoundedRankingList, RankingEntry};
use super::result::SimilarityResult;

/// One bounded ranking list per owner node.
#[derive(Debug, Clone)]
pub struct TopKMap {
    owners: NodeFilter,
    lists: Vec<BoundedRankingList>,
}

impl TopKMap {
    pub(crate) fn new(owners: NodeFilter, capacity: usize, order: RankOrder) -> Self {
        let lists = (0..owners.len())
            .map(|_| BoundedRankingList::new(capacity, order))
            .collect();
        Self { owners, lists }
    }

    /// Nodes that own a list.
    pub fn owners(&self) -> &NodeFilter {
        &self.owners
    }

    /// Single-writer insert. Panics if `owner` has no list.
    pub(crate) fn offer(&mut self, owner: NodeId, neighbor: NodeId, score: f64) -> bool {
        let Some(rank) = self.owners.rank(owner) else {
            panic!("node {owner} owns no Top-K list");
        };
        self.lists[rank].offer(neighbor, score)
    }

    /// Split the arena into one partition per contiguous rank range.
    ///
    /// `ranges` must tile `0..owners.len()` in order.
    pub(crate) fn partitions_mut(&mut self, ranges: &[Range<usize>]) -> Vec<TopKPartition<'_>> {
        let mut rest: &mut [BoundedRankingList] = &mut self.lists;
        let mut next = 0;
        let mut partitions = Vec::with_capacity(ranges.len());
        for range in ranges {
            assert_eq!(range.start, next, "rank ranges must be contiguous");
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
            partitions.push(TopKPartition {
                first_rank: range.start,
                lists: head,
                owners: &self.owners,
            });
            rest = tail;
            next = range.end;
        }
        assert!(rest.is_empty(), "rank ranges must cover every owner");
        partitions
    }

    /// The owner's list, `None` for nodes that own none.
    pub fn get(&self, owner: NodeId) -> Option<&BoundedRankingList> {
        self.owners.rank(owner).map(|rank| &self.lists[rank])
    }

    /// Number of entries in the owner's list, 0 for nodes that own none.
    pub fn degree(&self, owner: NodeId) -> usize {
        self.get(owner).map_or(0, BoundedRankingList::len)
    }

    /// Sum of all list sizes. Symmetric pairs count once per direction.
    pub fn total_pair_count(&self) -> usize {
        self.lists.iter().map(BoundedRankingList::len).sum()
    }

    /// `(owner, list)` in owner order.
    pub fn lists(&self) -> impl Iterator<Item = (NodeId, &BoundedRankingList)> + '_ {
        self.owners.members().iter().copied().zip(&self.lists)
    }

    pub(crate) fn par_lists(&self) -> impl IndexedParallelIterator<Item = (NodeId, &BoundedRankingList)> + '_ {
        self.owners.members().par_iter().copied().zip(self.lists.par_iter())
    }

    /// Every entry as a directed result, owners ascending, each list in heap
    /// order. Nothing is sorted.
    pub fn entries(&self) -> impl Iterator<Item = SimilarityResult> + '_ {
        self.lists().flat_map(|(owner, list)| {
            list.entries()
                .map(move |RankingEntry { neighbor, score }| SimilarityResult::new(owner, neighbor, score))
        })
    }

    /// Like [`entries`](Self::entries) but each list best first. Sorts every
    /// list on the way.
    pub fn iter_sorted(&self) -> impl Iterator<Item = SimilarityResult> + '_ {
        self.lists().flat_map(|(owner, list)| {
            list.sorted_entries()
                .into_iter()
                .map(move |RankingEntry { neighbor, score }| SimilarityResult::new(owner, neighbor, score))
        })
    }
}

/// Exclusive view over the lists of a contiguous owner rank range.
#[derive(Debug)]
pub(crate) struct TopKPartition<'a> {
    first_rank: usize,
    lists: &'a mut [BoundedRankingList],
    owners: &'a NodeFilter,
}

impl TopKPartition<'_> {
    /// Rank range owned by this partition.
    pub(crate) fn ranks(&self) -> Range<usize> {
        self.first_rank..self.first_rank + self.lists.len()
    }

    /// Insert into a list this partition owns. Panics on any other owner.
    #[inline]
    pub(crate) fn offer(&mut self, owner: NodeId, neighbor: NodeId, score: f64) -> bool {
        let rank = self.owners.rank(owner);
        let Some(local) = rank
            .and_then(|r| r.checked_sub(self.first_rank))
            .filter(|&local| local < self.lists.len())
        else {
            panic!("node {owner} is not owned by partition {:?}", self.ranks());
        };
        self.lists[local].offer(neighbor, score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owners() -> NodeFilter {
        NodeFilter::from_sorted(6, vec![0, 2, 3, 5])
    }

    #[test]
    fn test_offer_and_get() {
        let mut map = TopKMap::new(owners(), 2, RankOrder::Descending);
        map.offer(0, 2, 0.5);
        map.offer(0, 3, 0.7);
        map.offer(0, 5, 0.1);
        map.offer(3, 0, 0.7);

        assert_eq!(map.degree(0), 2);
        assert_eq!(map.degree(3), 1);
        assert_eq!(map.degree(1), 0);
        assert!(map.get(1).is_none());
        assert_eq!(map.total_pair_count(), 3);

        let results: Vec<_> = map.iter_sorted().collect();
        assert_eq!(
            results,
            vec![
                SimilarityResult::new(0, 3, 0.7),
                SimilarityResult::new(0, 2, 0.5),
                SimilarityResult::new(3, 0, 0.7),
            ]
        );

        let mut unsorted: Vec<_> = map.entries().collect();
        assert_eq!(unsorted.len(), 3);
        unsorted.sort_by_key(|r| (r.node1, r.node2));
        assert_eq!(
            unsorted,
            vec![
                SimilarityResult::new(0, 2, 0.5),
                SimilarityResult::new(0, 3, 0.7),
                SimilarityResult::new(3, 0, 0.7),
            ]
        );
    }

    #[test]
    fn test_partitions_are_disjoint() {
        let mut map = TopKMap::new(owners(), 3, RankOrder::Descending);
        {
            let mut parts = map.partitions_mut(&[0..1, 1..3, 3..4]);
            assert_eq!(parts.len(), 3);
            assert_eq!(parts[1].ranks(), 1..3);

            parts[0].offer(0, 5, 0.25);
            parts[1].offer(2, 0, 0.5);
            parts[1].offer(3, 0, 0.75);
            parts[2].offer(5, 0, 1.0);
        }
        assert_eq!(map.total_pair_count(), 4);
        assert_eq!(map.get(5).unwrap().sorted_entries()[0].score, 1.0);
    }

    #[test]
    #[should_panic(expected = "is not owned by partition")]
    fn test_partition_rejects_foreign_owner() {
        let mut map = TopKMap::new(owners(), 3, RankOrder::Descending);
        let mut parts = map.partitions_mut(&[0..2, 2..4]);
        parts[0].offer(5, 0, 0.5);
    }

    #[test]
    #[should_panic(expected = "owns no Top-K list")]
    fn test_offer_rejects_non_owner() {
        let mut map = TopKMap::new(owners(), 3, RankOrder::Descending);
        map.offer(1, 0, 0.5);
    }
}
