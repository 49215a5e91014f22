// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Graph Projection - Dense CSR representation for algorithm execution.
//!
//! A `GraphProjection` is a materialized, algorithm-optimized graph.
//! It provides:
//! - Dense node indexing (0..V) for efficient array-based state
//! - CSR format with targets sorted per source, as node similarity requires
//! - Optional reverse edges for incoming traversal
//! - Optional edge weights for weighted similarity

use nodesim_common::{Direction, Graph, NodeId, Result, SimilarityError};

/// Edge list for CSR construction: (source_slot, destination_slot, weight) triples.
type WeightedEdgeList = Vec<(u32, u32, f64)>;

/// Dense CSR representation optimized for algorithm execution.
#[derive(Debug, Clone)]
pub struct GraphProjection {
    /// Number of vertices in the projection
    pub(crate) vertex_count: usize,

    /// Outbound edges: CSR format
    pub(crate) out_offsets: Vec<u32>, // [V+1] vertex slot -> edge start
    pub(crate) out_neighbors: Vec<u32>, // [E] neighbor slots

    /// Inbound edges: CSR format (optional)
    pub(crate) has_reverse: bool,
    pub(crate) in_offsets: Vec<u32>, // [V+1]
    pub(crate) in_neighbors: Vec<u32>, // [E]

    /// Optional edge weights, parallel to the neighbor arrays
    pub(crate) out_weights: Option<Vec<f64>>,
    pub(crate) in_weights: Option<Vec<f64>>,
}

impl GraphProjection {
    /// Number of vertices in the projection.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of edges in the projection.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.out_neighbors.len()
    }

    /// Outbound neighbors of a vertex (by slot).
    #[inline]
    pub fn out_neighbors(&self, slot: u32) -> &[u32] {
        let (start, end) = bounds(&self.out_offsets, slot);
        &self.out_neighbors[start..end]
    }

    /// Outbound degree of a vertex.
    #[inline]
    pub fn out_degree(&self, slot: u32) -> u32 {
        self.out_offsets[slot as usize + 1] - self.out_offsets[slot as usize]
    }

    /// Inbound neighbors of a vertex (by slot).
    ///
    /// Empty for every vertex if the projection was built without reverse edges.
    #[inline]
    pub fn in_neighbors(&self, slot: u32) -> &[u32] {
        let (start, end) = bounds(&self.in_offsets, slot);
        &self.in_neighbors[start..end]
    }

    /// Inbound degree of a vertex.
    #[inline]
    pub fn in_degree(&self, slot: u32) -> u32 {
        self.in_offsets[slot as usize + 1] - self.in_offsets[slot as usize]
    }

    /// Weights of the outbound edges of a vertex, parallel to `out_neighbors`.
    #[inline]
    pub fn out_weights(&self, slot: u32) -> Option<&[f64]> {
        let (start, end) = bounds(&self.out_offsets, slot);
        self.out_weights.as_ref().map(|w| &w[start..end])
    }

    /// Weights of the inbound edges of a vertex, parallel to `in_neighbors`.
    #[inline]
    pub fn in_weights(&self, slot: u32) -> Option<&[f64]> {
        let (start, end) = bounds(&self.in_offsets, slot);
        self.in_weights.as_ref().map(|w| &w[start..end])
    }

    /// Check if weights are available.
    #[inline]
    pub fn has_weights(&self) -> bool {
        self.out_weights.is_some()
    }

    /// Check if reverse edges are available.
    #[inline]
    pub fn has_reverse(&self) -> bool {
        self.has_reverse
    }

    /// Traverse the projection in `direction`.
    ///
    /// `Direction::Both` visits outbound then inbound edges, so targets are not
    /// sorted per node. Node similarity rejects such views.
    ///
    /// Fails for `Incoming` and `Both` unless the projection was built with
    /// reverse edges.
    pub fn oriented(&self, direction: Direction) -> Result<ProjectionView<'_>> {
        if direction != Direction::Outgoing && !self.has_reverse {
            return Err(SimilarityError::InvalidArgument {
                arg: "direction".to_string(),
                message: format!(
                    "{direction:?} traversal needs reverse edges; build the projection with include_reverse(true)"
                ),
            });
        }
        Ok(self.view(direction))
    }

    #[inline]
    fn view(&self, direction: Direction) -> ProjectionView<'_> {
        ProjectionView {
            projection: self,
            direction,
        }
    }
}

#[inline]
fn bounds(offsets: &[u32], slot: u32) -> (usize, usize) {
    (
        offsets[slot as usize] as usize,
        offsets[slot as usize + 1] as usize,
    )
}

/// Adjacency of one vertex: neighbor slots and their weights.
type AdjacencySlice<'a> = (&'a [u32], Option<&'a [f64]>);

const NO_ADJACENCY: AdjacencySlice<'static> = (&[], None);

/// The projection read in a fixed direction.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionView<'a> {
    projection: &'a GraphProjection,
    direction: Direction,
}

impl ProjectionView<'_> {
    fn adjacency(&self, slot: u32) -> [AdjacencySlice<'_>; 2] {
        let p = self.projection;
        let out = (p.out_neighbors(slot), p.out_weights(slot));
        let inc = (p.in_neighbors(slot), p.in_weights(slot));
        match self.direction {
            Direction::Outgoing => [out, NO_ADJACENCY],
            Direction::Incoming => [inc, NO_ADJACENCY],
            Direction::Both => [out, inc],
        }
    }
}

impl Graph for ProjectionView<'_> {
    fn node_count(&self) -> usize {
        self.projection.vertex_count
    }

    fn relationship_count(&self) -> usize {
        let p = self.projection;
        match self.direction {
            Direction::Outgoing => p.out_neighbors.len(),
            Direction::Incoming => p.in_neighbors.len(),
            Direction::Both => p.out_neighbors.len() + p.in_neighbors.len(),
        }
    }

    fn degree(&self, node: NodeId) -> usize {
        self.adjacency(node).iter().map(|(n, _)| n.len()).sum()
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn has_relationship_property(&self) -> bool {
        match self.direction {
            Direction::Incoming => self.projection.in_weights.is_some(),
            _ => self.projection.out_weights.is_some(),
        }
    }

    fn for_each_relationship<F>(&self, node: NodeId, mut consumer: F)
    where
        F: FnMut(NodeId, NodeId) -> bool,
    {
        for (neighbors, _) in self.adjacency(node) {
            for &target in neighbors {
                if !consumer(node, target) {
                    return;
                }
            }
        }
    }

    fn for_each_relationship_with_property<F>(&self, node: NodeId, fallback: f64, mut consumer: F)
    where
        F: FnMut(NodeId, NodeId, f64) -> bool,
    {
        for (neighbors, weights) in self.adjacency(node) {
            for (idx, &target) in neighbors.iter().enumerate() {
                let weight = weights.map_or(fallback, |w| w[idx]);
                if !consumer(node, target, weight) {
                    return;
                }
            }
        }
    }
}

/// A bare projection is read in its outbound direction.
impl Graph for GraphProjection {
    fn node_count(&self) -> usize {
        self.vertex_count
    }

    fn relationship_count(&self) -> usize {
        self.edge_count()
    }

    fn degree(&self, node: NodeId) -> usize {
        self.out_degree(node) as usize
    }

    fn direction(&self) -> Direction {
        Direction::Outgoing
    }

    fn has_relationship_property(&self) -> bool {
        self.has_weights()
    }

    fn for_each_relationship<F>(&self, node: NodeId, consumer: F)
    where
        F: FnMut(NodeId, NodeId) -> bool,
    {
        self.view(Direction::Outgoing)
            .for_each_relationship(node, consumer)
    }

    fn for_each_relationship_with_property<F>(&self, node: NodeId, fallback: f64, consumer: F)
    where
        F: FnMut(NodeId, NodeId, f64) -> bool,
    {
        self.view(Direction::Outgoing)
            .for_each_relationship_with_property(node, fallback, consumer)
    }
}

/// Builder for constructing a `GraphProjection` from an edge list.
///
/// Adjacency is sorted by target per source, keeping insertion order among
/// parallel edges.
#[derive(Debug, Clone)]
pub struct ProjectionBuilder {
    vertex_count: usize,
    edges: WeightedEdgeList,
    weighted: bool,
    include_reverse: bool,
}

impl ProjectionBuilder {
    /// Create a builder for vertices `0..vertex_count`.
    pub fn new(vertex_count: usize) -> Self {
        Self {
            vertex_count,
            edges: Vec::new(),
            weighted: false,
            include_reverse: false,
        }
    }

    /// Add an unweighted edge.
    pub fn edge(mut self, src: u32, dst: u32) -> Self {
        self.edges.push((src, dst, 1.0));
        self
    }

    /// Add unweighted edges.
    pub fn edges(mut self, edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        self.edges
            .extend(edges.into_iter().map(|(src, dst)| (src, dst, 1.0)));
        self
    }

    /// Add weighted edges. The projection keeps weights once any are added.
    pub fn weighted_edges(mut self, edges: impl IntoIterator<Item = (u32, u32, f64)>) -> Self {
        self.weighted = true;
        self.edges.extend(edges);
        self
    }

    /// Include reverse edges for incoming traversal.
    pub fn include_reverse(mut self, enabled: bool) -> Self {
        self.include_reverse = enabled;
        self
    }

    /// Build the projection.
    pub fn build(mut self) -> Result<GraphProjection> {
        let vertex_count = self.vertex_count;
        if vertex_count > u32::MAX as usize {
            return Err(SimilarityError::InvalidArgument {
                arg: "vertexCount".to_string(),
                message: format!("{vertex_count} exceeds the u32 id space"),
            });
        }
        if let Some(&(src, dst, _)) = self
            .edges
            .iter()
            .find(|(src, dst, _)| *src as usize >= vertex_count || *dst as usize >= vertex_count)
        {
            return Err(SimilarityError::InvalidArgument {
                arg: "edges".to_string(),
                message: format!("edge ({src}, {dst}) references a vertex >= {vertex_count}"),
            });
        }

        // Stable sort keeps insertion order among parallel edges
        self.edges.sort_by_key(|&(src, dst, _)| (src, dst));
        let (out_offsets, out_neighbors, out_weights) =
            build_csr(vertex_count, &self.edges, self.weighted);

        let (in_offsets, in_neighbors, in_weights) = if self.include_reverse {
            let mut reversed: WeightedEdgeList = self
                .edges
                .iter()
                .map(|&(src, dst, w)| (dst, src, w))
                .collect();
            reversed.sort_by_key(|&(src, dst, _)| (src, dst));
            build_csr(vertex_count, &reversed, self.weighted)
        } else {
            (vec![0; vertex_count + 1], Vec::new(), None)
        };

        Ok(GraphProjection {
            vertex_count,
            out_offsets,
            out_neighbors,
            has_reverse: self.include_reverse,
            in_offsets,
            in_neighbors,
            out_weights,
            in_weights,
        })
    }
}

/// Build CSR from an edge list sorted by source.
fn build_csr(
    vertex_count: usize,
    edges: &[(u32, u32, f64)],
    include_weights: bool,
) -> (Vec<u32>, Vec<u32>, Option<Vec<f64>>) {
    if vertex_count == 0 {
        return (vec![0], Vec::new(), include_weights.then(Vec::new));
    }

    // Count degrees
    let mut degrees = vec![0u32; vertex_count];
    for &(src, _, _) in edges {
        degrees[src as usize] += 1;
    }

    // Build offsets (prefix sum)
    let mut offsets = vec![0u32; vertex_count + 1];
    for i in 0..vertex_count {
        offsets[i + 1] = offsets[i] + degrees[i];
    }

    // Fill neighbors
    let mut neighbors = vec![0u32; edges.len()];
    let mut weights = if include_weights {
        Some(vec![0.0; edges.len()])
    } else {
        None
    };
    let mut current = offsets.clone();

    for &(src, dst, w) in edges {
        let idx = current[src as usize] as usize;
        neighbors[idx] = dst;
        if let Some(ws) = &mut weights {
            ws[idx] = w;
        }
        current[src as usize] += 1;
    }

    (offsets, neighbors, weights)
}
