// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Traversal capability consumed by node similarity.
//!
//! Node similarity never loads or owns graph storage. It reads adjacency through
//! the [`Graph`] trait, and its graph-shaped output implements the same trait so
//! that any consumer of "a graph" can read similarity results directly.

use serde::{Deserialize, Serialize};

/// Dense node handle in `0..node_count`.
pub type NodeId = u32;

/// Direction for neighbor traversal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Outgoing,
    Incoming,
    Both,
}

/// Read-only adjacency over a single traversal direction.
///
/// `for_each_relationship` must yield targets sorted ascending per source node
/// for node similarity to deduplicate correctly. Consumers return `false` to
/// stop the iteration early.
pub trait Graph: Sync {
    /// Number of nodes; node ids are `0..node_count()`.
    fn node_count(&self) -> usize;

    /// Total number of relationships visible through this view.
    fn relationship_count(&self) -> usize;

    /// Number of relationships of `node` in this view's direction.
    fn degree(&self, node: NodeId) -> usize;

    /// Direction the view traverses.
    fn direction(&self) -> Direction;

    /// Whether relationships carry a numeric property.
    fn has_relationship_property(&self) -> bool;

    /// Visit `(source, target)` for every relationship of `node`.
    fn for_each_relationship<F>(&self, node: NodeId, consumer: F)
    where
        F: FnMut(NodeId, NodeId) -> bool;

    /// Visit `(source, target, property)` for every relationship of `node`.
    /// `fallback` is reported when the view carries no property.
    fn for_each_relationship_with_property<F>(&self, node: NodeId, fallback: f64, consumer: F)
    where
        F: FnMut(NodeId, NodeId, f64) -> bool;
}
