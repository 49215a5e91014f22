// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Fixed-capacity rankings shared by the per-node and global selectors.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use nodesim_common::{NodeId, RankOrder};

/// Largest up-front allocation for a single heap. Lists grow past this lazily.
const PREALLOCATION_LIMIT: usize = 64;

/// Heap slot ordered by `(key, tie)`, so the heap top is the worst entry.
///
/// `key` is the score mapped so that smaller is better under the configured
/// order. `tie` only orders equal keys for output and never decides eviction.
#[derive(Debug, Clone)]
struct Slot<T> {
    key: f64,
    tie: u64,
    score: f64,
    item: T,
}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Slot<T> {}

impl<T> PartialOrd for Slot<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Slot<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .total_cmp(&other.key)
            .then(self.tie.cmp(&other.tie))
    }
}

/// Bounded max-heap keeping the `capacity` best entries.
///
/// Once full, a candidate replaces the worst entry only if its score is
/// strictly better, so among equal scores the first one offered is kept.
#[derive(Debug, Clone)]
pub(crate) struct BoundedHeap<T> {
    heap: BinaryHeap<Slot<T>>,
    capacity: usize,
    order: RankOrder,
}

impl<T> BoundedHeap<T> {
    pub(crate) fn new(capacity: usize, order: RankOrder) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity.min(PREALLOCATION_LIMIT)),
            capacity,
            order,
        }
    }

    /// Returns whether the candidate was retained.
    pub(crate) fn offer(&mut self, score: f64, tie: u64, item: T) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let slot = Slot {
            key: self.order.rank_key(score),
            tie,
            score,
            item,
        };
        if self.heap.len() < self.capacity {
            self.heap.push(slot);
            return true;
        }
        match self.heap.peek_mut() {
            Some(mut worst) if slot.key.total_cmp(&worst.key) == Ordering::Less => {
                *worst = slot;
                true
            }
            _ => false,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn order(&self) -> RankOrder {
        self.order
    }

    /// `(score, item)` in heap order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (f64, &T)> + '_ {
        self.heap.iter().map(|slot| (slot.score, &slot.item))
    }

    /// `(score, item)` best first.
    pub(crate) fn sorted(&self) -> Vec<(f64, &T)> {
        let mut slots: Vec<&Slot<T>> = self.heap.iter().collect();
        slots.sort_unstable();
        slots.into_iter().map(|slot| (slot.score, &slot.item)).collect()
    }
}

/// A neighbor and its similarity to the list owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingEntry {
    pub neighbor: NodeId,
    pub score: f64,
}

/// Ranking of one owner's best neighbors.
#[derive(Debug, Clone)]
pub struct BoundedRankingList {
    heap: BoundedHeap<NodeId>,
}

impl BoundedRankingList {
    pub fn new(capacity: usize, order: RankOrder) -> Self {
        Self {
            heap: BoundedHeap::new(capacity, order),
        }
    }

    /// Insert if under capacity or strictly better than the current worst.
    #[inline]
    pub fn offer(&mut self, neighbor: NodeId, score: f64) -> bool {
        self.heap.offer(score, neighbor as u64, neighbor)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.heap.capacity()
    }

    pub fn order(&self) -> RankOrder {
        self.heap.order()
    }

    /// Entries in heap order.
    pub fn entries(&self) -> impl Iterator<Item = RankingEntry> + '_ {
        self.heap.iter().map(|(score, &neighbor)| RankingEntry { neighbor, score })
    }

    /// Entries best first.
    pub fn sorted_entries(&self) -> Vec<RankingEntry> {
        self.heap
            .sorted()
            .into_iter()
            .map(|(score, &neighbor)| RankingEntry { neighbor, score })
            .collect()
    }
}
