//! Background processing loop and lifecycle state machine.
//!
//! One dedicated thread owns all metric mutation: it drains the event
//! queue, applies events to the registry, and feeds the dump store a
//! current timestamp every iteration so snapshot refresh is
//! timestamp-driven. The loop exits only by observing the enabled flag
//! go false, which finalize guarantees it does within one idle-sleep
//! bound.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::clock::{Clock, Timestamp};
use crate::dump::{DumpSnapshot, DumpStore};
use crate::event::{Event, EventKind};
use crate::metrics::MetricValue;
use crate::queue::EventQueue;
use crate::registry::MetricRegistry;
use crate::stats::EngineStats;

/// Lifecycle of the collection engine.
///
/// `Uninitialized → Running → Finalized`, with `Finalized → Running`
/// additionally permitted: a finalized engine restarts cleanly, resuming
/// collection into the same registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Running,
    Finalized,
}

/// Shared engine state: everything the processor thread, the producer
/// handles, and the readers touch.
pub(crate) struct EngineCore {
    pub(crate) clock: Clock,
    pub(crate) queue: EventQueue,
    pub(crate) registry: MetricRegistry,
    pub(crate) dump: DumpStore,
    pub(crate) stats: EngineStats,
    /// Collection switch. Acquire loads on the hot paths, release stores
    /// from lifecycle transitions.
    pub(crate) enabled: AtomicBool,
    pub(crate) idle_sleep: Duration,
}

impl EngineCore {
    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Producer-side emission: timestamp the operation and hand it to the
    /// queue. A disabled engine discards the emission before it costs
    /// anything.
    pub(crate) fn emit(&self, key: Arc<str>, kind: EventKind) {
        if !self.is_enabled() {
            return;
        }

        let timestamp = self.clock.now();
        self.queue.push(Event::new(timestamp, key, kind));
    }

    /// Consume one event: failures are counted and contained, never
    /// propagated out of the loop iteration.
    fn apply(&self, event: Event) {
        if let Err(error) = self.registry.apply(&event) {
            self.stats.apply_failures.fetch_add(1, Ordering::Relaxed);
            debug!(%error, "event failed to apply");
        }
        self.stats.events_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Apply everything still queued. Called after the processor thread
    /// has exited.
    pub(crate) fn drain(&self) {
        while let Some(event) = self.queue.pop() {
            self.apply(event);
        }
    }

    /// Materialize the full dump, folding the engine's own health
    /// counters in under reserved names.
    fn build_snapshot(&self, now: Timestamp) -> DumpSnapshot {
        let mut values = self.registry.collect();

        values.insert(
            "pulse.events.processed".to_string(),
            MetricValue::Counter(self.stats.events_processed.load(Ordering::Relaxed)),
        );
        values.insert(
            "pulse.events.dropped".to_string(),
            MetricValue::Counter(self.queue.dropped()),
        );
        values.insert(
            "pulse.apply.failures".to_string(),
            MetricValue::Counter(self.stats.apply_failures.load(Ordering::Relaxed)),
        );
        values.insert(
            "pulse.queue.size".to_string(),
            MetricValue::Gauge(self.queue.len() as f64),
        );
        values.insert(
            "pulse.snapshots.published".to_string(),
            MetricValue::Counter(self.stats.snapshots_published.load(Ordering::Relaxed)),
        );

        DumpSnapshot {
            taken_at: self.clock.to_system_time(now),
            timestamp_ns: now.as_nanos(),
            values,
        }
    }

    fn update_dump(&self, now: Timestamp) {
        let published = self.dump.update(now, || self.build_snapshot(now));
        if published {
            self.stats.snapshots_published.fetch_add(1, Ordering::Relaxed);
            trace!(timestamp_ns = now.as_nanos(), "published dump snapshot");
        }
    }

    /// Final drain and unconditional publish, run by finalize after the
    /// join so the last dump reflects every accepted event.
    pub(crate) fn finalize_flush(&self) {
        self.drain();
        let now = self.clock.now();
        self.dump.publish(now, self.build_snapshot(now));
        self.stats.snapshots_published.fetch_add(1, Ordering::Relaxed);
    }
}

/// Processor thread body.
///
/// Each iteration consumes at most one event; when the queue is empty the
/// loop takes the current time instead and sleeps the idle bound. Either
/// way the dump store sees a timestamp every iteration.
pub(crate) fn run(core: Arc<EngineCore>) {
    debug!("processor loop started");

    while core.is_enabled() {
        let now = match core.queue.pop() {
            Some(event) => {
                let timestamp = event.timestamp;
                core.apply(event);
                timestamp
            }
            None => {
                let now = core.clock.now();
                std::thread::sleep(core.idle_sleep);
                now
            }
        };

        core.update_dump(now);
    }

    debug!("processor loop stopped");
}
