// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Progress reporting collaborator.
//!
//! The algorithm reports coarse task boundaries ("prepare", "compute") and
//! periodic counts. Formatting and persistence belong to the implementation.

use tracing::info;

/// Upper bound on the interval between two progress or termination polls.
pub const MAXIMUM_LOG_INTERVAL: u64 = 1 << 13;

/// Receiver of phase boundaries and progress counts.
pub trait ProgressTracker: Send + Sync {
    fn begin_task(&self, task: &str);

    fn end_task(&self, task: &str);

    /// `done` units of `total` have been processed in the current task.
    fn log_progress(&self, done: u64, total: u64);
}

/// Polling interval for a workload of `total` units.
///
/// Nearest power of two of `total / 100`, clamped to `[1, MAXIMUM_LOG_INTERVAL]`,
/// so the number of polls stays roughly constant relative to the work.
pub fn poll_interval(total: u64) -> u64 {
    nearby_power_of_two(total / 100).clamp(1, MAXIMUM_LOG_INTERVAL)
}

fn nearby_power_of_two(x: u64) -> u64 {
    if x <= 1 {
        return 1;
    }
    let higher = x.next_power_of_two();
    let lower = higher >> 1;
    if higher - x < x - lower { higher } else { lower }
}

/// Emits progress as `tracing` events.
#[derive(Debug, Default, Clone)]
pub struct TracingProgressTracker {
    algorithm: &'static str,
}

impl TracingProgressTracker {
    pub fn new(algorithm: &'static str) -> Self {
        Self { algorithm }
    }
}

impl ProgressTracker for TracingProgressTracker {
    fn begin_task(&self, task: &str) {
        info!(algorithm = self.algorithm, task, "Start");
    }

    fn end_task(&self, task: &str) {
        info!(algorithm = self.algorithm, task, "Finish");
    }

    fn log_progress(&self, done: u64, total: u64) {
        let percent = if total == 0 {
            100.0
        } else {
            done as f64 * 100.0 / total as f64
        };
        info!(
            algorithm = self.algorithm,
            done,
            total,
            "{:.0}% done",
            percent.min(100.0)
        );
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressTracker;

impl ProgressTracker for NoopProgressTracker {
    fn begin_task(&self, _task: &str) {}

    fn end_task(&self, _task: &str) {}

    fn log_progress(&self, _done: u64, _total: u64) {}
}
