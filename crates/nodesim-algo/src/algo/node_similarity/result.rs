// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Streamed similarity results.

use std::sync::Arc;

use nodesim_common::progress::poll_interval;
use nodesim_common::{NodeId, ProgressTracker, Result, TerminationFlag};

use super::node_filter::SparseIdSet;
use super::pairs::{Enumeration, PairSpace};

/// A directed, scored pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityResult {
    pub node1: NodeId,
    pub node2: NodeId,
    pub similarity: f64,
}

impl SimilarityResult {
    pub fn new(node1: NodeId, node2: NodeId, similarity: f64) -> Self {
        Self {
            node1,
            node2,
            similarity,
        }
    }

    /// The same pair seen from `node2`.
    pub fn reverse(self) -> Self {
        Self::new(self.node2, self.node1, self.similarity)
    }
}

/// Single-pass sequence of similarity results.
///
/// Yields `Err(Terminated)` once if the run is cancelled while the stream is
/// being consumed, then ends.
pub struct SimilarityStream {
    source: StreamSource,
}

enum StreamSource {
    AllPairs(Box<AllPairs>),
    Materialized(std::vec::IntoIter<SimilarityResult>),
}

impl SimilarityStream {
    pub(crate) fn materialized(results: Vec<SimilarityResult>) -> Self {
        Self {
            source: StreamSource::Materialized(results.into_iter()),
        }
    }

    /// Lazily score every unordered pair (or directed pair when restricted).
    pub(crate) fn all_pairs(
        space: Arc<PairSpace>,
        progress: Arc<dyn ProgressTracker>,
        termination: TerminationFlag,
    ) -> Self {
        let strategy = if space.is_restricted() {
            Enumeration::Full
        } else {
            Enumeration::UpperTriangular
        };
        let total = space.sources().len() as u64;
        Self {
            source: StreamSource::AllPairs(Box::new(AllPairs {
                space,
                strategy,
                next_rank: 0,
                buffer: Vec::new().into_iter(),
                progress,
                termination,
                interval: poll_interval(total),
                total,
                finished: false,
            })),
        }
    }
}

impl Iterator for SimilarityStream {
    type Item = Result<SimilarityResult>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            StreamSource::AllPairs(pairs) => pairs.next(),
            StreamSource::Materialized(results) => results.next().map(Ok),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.source {
            StreamSource::AllPairs(pairs) => (pairs.buffer.len(), None),
            StreamSource::Materialized(results) => results.size_hint(),
        }
    }
}

impl std::fmt::Debug for SimilarityStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.source {
            StreamSource::AllPairs(_) => "AllPairs",
            StreamSource::Materialized(_) => "Materialized",
        };
        f.debug_struct("SimilarityStream").field("source", &kind).finish()
    }
}

/// Scores one source node at a time and buffers its partners.
struct AllPairs {
    space: Arc<PairSpace>,
    strategy: Enumeration,
    next_rank: usize,
    buffer: std::vec::IntoIter<SimilarityResult>,
    progress: Arc<dyn ProgressTracker>,
    termination: TerminationFlag,
    interval: u64,
    total: u64,
    finished: bool,
}

impl AllPairs {
    fn next(&mut self) -> Option<Result<SimilarityResult>> {
        loop {
            if let Some(result) = self.buffer.next() {
                return Some(Ok(result));
            }
            if self.finished {
                return None;
            }
            if let Err(e) = self.refill() {
                self.finished = true;
                return Some(Err(e));
            }
        }
    }

    fn refill(&mut self) -> Result<()> {
        let sources = self.space.sources();
        if self.next_rank >= sources.len() {
            self.finished = true;
            self.progress.end_task("compute");
            return Ok(());
        }

        let node1 = sources.member(self.next_rank);
        self.next_rank += 1;

        let done = self.next_rank as u64;
        if done % self.interval == 0 {
            self.termination.assert_running()?;
            self.progress.log_progress(done, self.total);
        }

        let mut scored = Vec::new();
        self.space
            .for_each_scored_partner(node1, self.strategy, |node2, score| {
                scored.push(SimilarityResult::new(node1, node2, score));
            });
        self.buffer = scored.into_iter();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialized_stream() {
        let stream = SimilarityStream::materialized(vec![
            SimilarityResult::new(0, 1, 0.5),
            SimilarityResult::new(1, 0, 0.5),
        ]);
        assert_eq!(stream.size_hint(), (2, Some(2)));

        let results: Vec<_> = stream.collect::<Result<_>>().unwrap();
        assert_eq!(results[1], SimilarityResult::new(0, 1, 0.5).reverse());
    }
}
