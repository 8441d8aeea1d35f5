//! Query session tracking
//!
//! Each incoming user query takes a generation id before dispatching to
//! the coordinator. A fetch result is only allowed to mutate shared
//! display state while its generation is still the latest; this is the
//! mechanism that defeats the "slow response overtakes fast response"
//! race. Generations are strictly increasing per process.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic per-process generation counter
#[derive(Debug, Default)]
pub struct QuerySessionTracker {
    latest: AtomicU64,
}

impl QuerySessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next generation id
    ///
    /// Called exactly once per incoming user query, before the
    /// coordinator is consulted.
    pub fn next_generation(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently issued generation (0 before any query)
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Whether `generation` is still the latest issued
    pub fn is_latest(&self, generation: u64) -> bool {
        self.latest() == generation
    }
}
