// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Dragonscale Team

//! Cooperative cancellation for long-running computations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::api::error::{Result, SimilarityError};

/// Shared flag polled by workers at a bounded cadence.
///
/// Cloning shares the flag. Tripping it never interrupts a worker mid-node;
/// the worker notices on its next poll and returns [`SimilarityError::Terminated`].
#[derive(Clone, Debug)]
pub struct TerminationFlag {
    running: Arc<AtomicBool>,
}

impl TerminationFlag {
    /// Create a flag in the running state.
    pub fn running() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Request termination of every computation observing this flag.
    pub fn terminate(&self) {
        self.running.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Returns `Err(Terminated)` once [`terminate`](Self::terminate) was called.
    #[inline]
    pub fn assert_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(SimilarityError::Terminated)
        }
    }
}

impl Default for TerminationFlag {
    fn default() -> Self {
        Self::running()
    }
}
