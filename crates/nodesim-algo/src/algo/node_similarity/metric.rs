// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Similarity scores over neighbor vectors.
//!
//! Every score is in `[0, 1]`. A zero denominator yields 0.0, never NaN.

use nodesim_common::{NodeId, SimilarityMetric};

use super::vectors::NeighborVector;

/// One metric plus the cutoff below which a score is discarded.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityComputer {
    metric: SimilarityMetric,
    cutoff: f64,
}

impl SimilarityComputer {
    pub fn new(metric: SimilarityMetric, cutoff: f64) -> Self {
        Self { metric, cutoff }
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    #[inline]
    fn keep(&self, score: f64) -> Option<f64> {
        (score >= self.cutoff).then_some(score)
    }

    /// Set similarity of two sorted id slices, `None` below the cutoff.
    #[inline]
    pub fn unweighted(&self, a: &[NodeId], b: &[NodeId]) -> Option<f64> {
        let intersection = intersect_sorted_len(a, b) as f64;
        let (len_a, len_b) = (a.len() as f64, b.len() as f64);
        let score = match self.metric {
            SimilarityMetric::Jaccard => ratio(intersection, len_a + len_b - intersection),
            SimilarityMetric::Overlap => ratio(intersection, len_a.min(len_b)),
            SimilarityMetric::Cosine => ratio(intersection, (len_a * len_b).sqrt()),
        };
        self.keep(score)
    }

    /// Weighted similarity of two sorted id slices with parallel weights.
    pub fn weighted(&self, a: (&[NodeId], &[f64]), b: (&[NodeId], &[f64])) -> Option<f64> {
        let sums = WeightSums::merge(a, b);
        let score = match self.metric {
            SimilarityMetric::Jaccard => ratio(sums.min, sums.max),
            SimilarityMetric::Overlap => ratio(sums.min, sums.total_a.min(sums.total_b)),
            SimilarityMetric::Cosine => ratio(sums.dot, (sums.square_a * sums.square_b).sqrt()),
        };
        self.keep(score)
    }
}

/// Scoring strategy chosen once per run.
#[derive(Debug, Clone, Copy)]
pub enum VectorScorer {
    Unweighted(SimilarityComputer),
    Weighted(SimilarityComputer),
}

impl VectorScorer {
    pub fn new(metric: SimilarityMetric, cutoff: f64, weighted: bool) -> Self {
        let computer = SimilarityComputer::new(metric, cutoff);
        if weighted {
            VectorScorer::Weighted(computer)
        } else {
            VectorScorer::Unweighted(computer)
        }
    }

    #[inline]
    pub fn score(&self, a: &NeighborVector, b: &NeighborVector) -> Option<f64> {
        match self {
            VectorScorer::Unweighted(computer) => computer.unweighted(&a.targets, &b.targets),
            VectorScorer::Weighted(computer) => {
                let weights_a = a.weights.as_deref().unwrap_or(&[]);
                let weights_b = b.weights.as_deref().unwrap_or(&[]);
                computer.weighted((&a.targets[..], weights_a), (&b.targets[..], weights_b))
            }
        }
    }
}

#[inline]
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Intersection size of two sorted, duplicate-free slices.
#[inline]
pub fn intersect_sorted_len(a: &[u32], b: &[u32]) -> usize {
    let mut i = 0;
    let mut j = 0;
    let mut count = 0;

    // Branchless merge
    while i < a.len() && j < b.len() {
        let va = a[i];
        let vb = b[j];

        let le = va <= vb;
        let ge = va >= vb;

        count += (le && ge) as usize;
        i += le as usize;
        j += ge as usize;
    }
    count
}

#[derive(Debug, Default)]
struct WeightSums {
    /// sum of min over the union, absent entries count as 0
    min: f64,
    /// sum of max over the union
    max: f64,
    dot: f64,
    total_a: f64,
    total_b: f64,
    square_a: f64,
    square_b: f64,
}

impl WeightSums {
    fn merge((ids_a, wa): (&[NodeId], &[f64]), (ids_b, wb): (&[NodeId], &[f64])) -> Self {
        let mut sums = WeightSums::default();
        let weight = |ws: &[f64], idx: usize| ws.get(idx).copied().unwrap_or(1.0);

        let (mut i, mut j) = (0, 0);
        while i < ids_a.len() || j < ids_b.len() {
            let next_a = ids_a.get(i).copied();
            let next_b = ids_b.get(j).copied();
            match (next_a, next_b) {
                (Some(x), Some(y)) if x == y => {
                    let (a, b) = (weight(wa, i), weight(wb, j));
                    sums.add_a(a);
                    sums.add_b(b);
                    sums.min += a.min(b);
                    sums.max += a.max(b);
                    sums.dot += a * b;
                    i += 1;
                    j += 1;
                }
                (Some(x), Some(y)) if x < y => {
                    sums.only_a(weight(wa, i));
                    i += 1;
                }
                (Some(_), None) => {
                    sums.only_a(weight(wa, i));
                    i += 1;
                }
                _ => {
                    sums.only_b(weight(wb, j));
                    j += 1;
                }
            }
        }
        sums
    }

    #[inline]
    fn add_a(&mut self, w: f64) {
        self.total_a += w;
        self.square_a += w * w;
    }

    #[inline]
    fn add_b(&mut self, w: f64) {
        self.total_b += w;
        self.square_b += w * w;
    }

    #[inline]
    fn only_a(&mut self, w: f64) {
        self.add_a(w);
        self.min += 0.0_f64.min(w);
        self.max += 0.0_f64.max(w);
    }

    #[inline]
    fn only_b(&mut self, w: f64) {
        self.add_b(w);
        self.min += 0.0_f64.min(w);
        self.max += 0.0_f64.max(w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn all(metric: SimilarityMetric) -> SimilarityComputer {
        SimilarityComputer::new(metric, 0.0)
    }

    #[test]
    fn test_intersect_sorted_len() {
        assert_eq!(intersect_sorted_len(&[1, 2, 3], &[2, 3, 4]), 2);
        assert_eq!(intersect_sorted_len(&[], &[2, 3, 4]), 0);
        assert_eq!(intersect_sorted_len(&[1, 5], &[2, 3, 4]), 0);
        assert_eq!(intersect_sorted_len(&[7], &[7]), 1);
    }

    #[test]
    fn test_unweighted_metrics() {
        let a = [1, 2, 3];
        let b = [1, 2];

        let jaccard = all(SimilarityMetric::Jaccard).unweighted(&a, &b).unwrap();
        let overlap = all(SimilarityMetric::Overlap).unweighted(&a, &b).unwrap();
        let cosine = all(SimilarityMetric::Cosine).unweighted(&a, &b).unwrap();

        assert!((jaccard - 2.0 / 3.0).abs() < EPS);
        assert!((overlap - 1.0).abs() < EPS);
        assert!((cosine - 2.0 / 6.0_f64.sqrt()).abs() < EPS);
    }

    #[test]
    fn test_disjoint_and_empty() {
        let jaccard = all(SimilarityMetric::Jaccard);
        assert_eq!(jaccard.unweighted(&[1, 2], &[3]), Some(0.0));
        assert_eq!(jaccard.unweighted(&[], &[]), Some(0.0));
        assert_eq!(all(SimilarityMetric::Cosine).unweighted(&[], &[1]), Some(0.0));
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let computer = SimilarityComputer::new(SimilarityMetric::Jaccard, 0.5);
        assert_eq!(computer.unweighted(&[1, 2], &[2, 3]), None);
        assert_eq!(computer.unweighted(&[1, 2], &[2]), Some(0.5));
    }

    #[test]
    fn test_weighted_jaccard() {
        // union {1, 2, 3}: min 1 + 0 + 0, max 2 + 1 + 3
        let score = all(SimilarityMetric::Jaccard)
            .weighted((&[1, 2], &[1.0, 1.0]), (&[1, 3], &[2.0, 3.0]))
            .unwrap();
        assert!((score - 1.0 / 6.0).abs() < EPS);
    }

    #[test]
    fn test_weighted_overlap_and_cosine() {
        let a: (&[NodeId], &[f64]) = (&[1, 2], &[2.0, 1.0]);
        let b: (&[NodeId], &[f64]) = (&[1, 2], &[2.0, 1.0]);

        let overlap = all(SimilarityMetric::Overlap).weighted(a, b).unwrap();
        let cosine = all(SimilarityMetric::Cosine).weighted(a, b).unwrap();
        assert!((overlap - 1.0).abs() < EPS);
        assert!((cosine - 1.0).abs() < EPS);

        let c: (&[NodeId], &[f64]) = (&[3], &[5.0]);
        assert_eq!(all(SimilarityMetric::Cosine).weighted(a, c), Some(0.0));
    }

    #[test]
    fn test_unit_weights_match_unweighted() {
        let a = [0, 3, 4, 9];
        let b = [3, 9, 11];
        for metric in [
            SimilarityMetric::Jaccard,
            SimilarityMetric::Overlap,
            SimilarityMetric::Cosine,
        ] {
            let computer = all(metric);
            let plain = computer.unweighted(&a, &b).unwrap();
            let weighted = computer
                .weighted((&a, &[1.0; 4]), (&b, &[1.0; 3]))
                .unwrap();
            assert!((plain - weighted).abs() < EPS, "{metric:?}");
        }
    }
}
