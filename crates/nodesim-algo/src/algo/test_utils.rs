// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

use crate::algo::projection::GraphProjection;

/// Unweighted projection over `0..node_count` with both adjacency directions.
pub fn build_test_graph(node_count: usize, edges: Vec<(u32, u32)>) -> GraphProjection {
    let mut out_adj: Vec<Vec<u32>> = vec![Vec::new(); node_count];
    let mut in_adj: Vec<Vec<u32>> = vec![Vec::new(); node_count];
    for &(src, dst) in &edges {
        assert!(
            (src as usize) < node_count && (dst as usize) < node_count,
            "edge ({src}, {dst}) out of range"
        );
        out_adj[src as usize].push(dst);
        in_adj[dst as usize].push(src);
    }

    let (out_offsets, out_neighbors) = flatten(out_adj);
    let (in_offsets, in_neighbors) = flatten(in_adj);

    GraphProjection {
        vertex_count: node_count,
        out_offsets,
        out_neighbors,
        has_reverse: true,
        in_offsets,
        in_neighbors,
        out_weights: None,
        in_weights: None,
    }
}

fn flatten(mut adjacency: Vec<Vec<u32>>) -> (Vec<u32>, Vec<u32>) {
    let mut offsets = vec![0u32; adjacency.len() + 1];
    let mut neighbors = Vec::new();

    for (i, targets) in adjacency.iter_mut().enumerate() {
        targets.sort_unstable();
        offsets[i + 1] = offsets[i] + targets.len() as u32;
        neighbors.extend_from_slice(targets);
    }
    (offsets, neighbors)
}
