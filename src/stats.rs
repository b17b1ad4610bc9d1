//! Engine self-observability counters.

use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicU64;

/// Health counters for the engine itself, updated with relaxed atomic
/// operations from the hot paths that own them.
#[derive(Debug, Default)]
pub struct EngineStats {
    /// Events consumed from the queue, whether or not they applied
    /// cleanly.
    pub events_processed: AtomicU64,
    /// Events whose apply was rejected by the registry.
    pub apply_failures: AtomicU64,
    /// Dump snapshots published so far.
    pub snapshots_published: AtomicU64,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Point-in-time copy of the engine's health counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Events consumed from the queue since engine construction.
    pub events_processed: u64,
    /// Events discarded by the bounded-queue drop policy.
    pub events_dropped: u64,
    /// Events that failed to apply to the registry.
    pub apply_failures: u64,
    /// Dump snapshots published.
    pub snapshots_published: u64,
    /// Approximate number of events currently queued.
    pub queue_depth: usize,
}
