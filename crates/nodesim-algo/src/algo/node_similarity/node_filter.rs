// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Sets of nodes eligible for comparison.

use nodesim_common::NodeId;

const ABSENT: u32 = u32::MAX;

/// Membership test plus ordered, rank-addressable iteration over a subset of
/// `0..node_count`.
///
/// Ranks are dense positions `0..len()` in ascending id order. Per-node state is
/// stored by rank, so a contiguous rank range is a contiguous slice of that state.
pub trait SparseIdSet: Sync {
    fn contains(&self, id: NodeId) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of `id` among the members.
    fn rank(&self, id: NodeId) -> Option<usize>;

    /// Member at `rank`. Panics if `rank >= len()`.
    fn member(&self, rank: usize) -> NodeId;

    /// Members `>= start`, ascending.
    fn iter_from(&self, start: NodeId) -> impl Iterator<Item = NodeId> + '_;

    fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter_from(0)
    }
}

/// Nodes whose distinct degree passed the cutoffs, optionally narrowed by a
/// source or target restriction. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    members: Vec<NodeId>,
    /// node id -> rank, `ABSENT` for non-members
    ranks: Vec<u32>,
}

impl NodeFilter {
    /// Build from members in strictly ascending order.
    pub fn from_sorted(node_count: usize, members: Vec<NodeId>) -> Self {
        debug_assert!(members.windows(2).all(|w| w[0] < w[1]));
        let mut ranks = vec![ABSENT; node_count];
        for (rank, &id) in members.iter().enumerate() {
            ranks[id as usize] = rank as u32;
        }
        Self { members, ranks }
    }

    /// Members of `self` accepted by `keep`.
    pub fn retain(&self, keep: impl Fn(NodeId) -> bool) -> Self {
        let members = self.members.iter().copied().filter(|&id| keep(id)).collect();
        Self::from_sorted(self.ranks.len(), members)
    }

    pub fn members(&self) -> &[NodeId] {
        &self.members
    }
}

impl SparseIdSet for NodeFilter {
    #[inline]
    fn contains(&self, id: NodeId) -> bool {
        self.ranks.get(id as usize).is_some_and(|&r| r != ABSENT)
    }

    #[inline]
    fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    fn rank(&self, id: NodeId) -> Option<usize> {
        match self.ranks.get(id as usize) {
            Some(&r) if r != ABSENT => Some(r as usize),
            _ => None,
        }
    }

    #[inline]
    fn member(&self, rank: usize) -> NodeId {
        self.members[rank]
    }

    fn iter_from(&self, start: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let from = self.members.partition_point(|&id| id < start);
        self.members[from..].iter().copied()
    }
}
