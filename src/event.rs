use std::sync::Arc;

use crate::clock::Timestamp;

/// One instrumentation operation and its operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    IncrementCounter(u64),
    DecrementCounter(u64),
    SetGauge(f64),
    AddGauge(f64),
    /// Recorded duration in nanoseconds.
    RecordDuration(u64),
}

impl EventKind {
    /// Name of the metric kind this event targets, for diagnostics.
    pub fn metric_kind(&self) -> &'static str {
        match self {
            EventKind::IncrementCounter(_) | EventKind::DecrementCounter(_) => "counter",
            EventKind::SetGauge(_) | EventKind::AddGauge(_) => "gauge",
            EventKind::RecordDuration(_) => "timer",
        }
    }
}

/// A single instrumentation event.
///
/// Created on the producer thread with the clock timestamp of the moment
/// of emission, moved into the queue, and consumed exactly once by the
/// processor. Ownership transfer through the queue is what guarantees the
/// single-consumption invariant.
#[derive(Debug, Clone)]
pub struct Event {
    pub timestamp: Timestamp,
    pub key: Arc<str>,
    pub kind: EventKind,
}

impl Event {
    pub fn new(timestamp: Timestamp, key: Arc<str>, kind: EventKind) -> Self {
        Self {
            timestamp,
            key,
            kind,
        }
    }
}
