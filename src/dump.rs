//! Periodically refreshed snapshot of all metric state.
//!
//! The processor builds a complete [`DumpSnapshot`] on its own thread and
//! swaps it into an [`ArcSwapOption`]; readers load the current `Arc`
//! without blocking and observe either the fully previous or the fully
//! next snapshot, never a partial mix. A superseded snapshot drains
//! naturally through its reference count once the last reader drops it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::metrics::{MetricValue, TimerSummary};

/// A complete, internally consistent copy of all metric state at a point
/// in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpSnapshot {
    /// Wall-clock time of the refresh, derived from the engine clock's
    /// calibration anchor.
    pub taken_at: SystemTime,
    /// Monotonic engine time of the refresh, in nanoseconds.
    pub timestamp_ns: u64,
    /// Every metric's value at the refresh, ordered by name. Engine
    /// self-metrics appear under reserved `pulse.*` names.
    pub values: BTreeMap<String, MetricValue>,
}

impl DumpSnapshot {
    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.values.get(name)
    }

    pub fn counter(&self, name: &str) -> Option<u64> {
        match self.values.get(name) {
            Some(MetricValue::Counter(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn gauge(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(MetricValue::Gauge(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn timer(&self, name: &str) -> Option<&TimerSummary> {
        match self.values.get(name) {
            Some(MetricValue::Timer(summary)) => Some(summary),
            _ => None,
        }
    }

    /// Serialize the snapshot for an exporter.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

const NEVER_PUBLISHED: u64 = u64::MAX;

/// Holds the most recently published snapshot.
pub struct DumpStore {
    current: ArcSwapOption<DumpSnapshot>,
    publish_interval: Duration,
    /// Monotonic nanoseconds of the last publish; written only by the
    /// consumer side.
    last_publish_ns: AtomicU64,
}

impl DumpStore {
    pub fn new(publish_interval: Duration) -> Self {
        Self {
            current: ArcSwapOption::from(None),
            publish_interval,
            last_publish_ns: AtomicU64::new(NEVER_PUBLISHED),
        }
    }

    /// Consumer-side refresh hook, called every processor iteration.
    ///
    /// Invokes `build` and publishes the result only when the configured
    /// interval has elapsed since the last publish (the first call always
    /// publishes). Returns whether a publish happened.
    pub fn update<F>(&self, now: Timestamp, build: F) -> bool
    where
        F: FnOnce() -> DumpSnapshot,
    {
        let last = self.last_publish_ns.load(Ordering::Relaxed);
        if last != NEVER_PUBLISHED {
            let elapsed = now.as_nanos().saturating_sub(last);
            if elapsed < self.publish_interval.as_nanos() as u64 {
                return false;
            }
        }

        self.publish(now, build());
        true
    }

    /// Publish a snapshot unconditionally.
    pub fn publish(&self, now: Timestamp, snapshot: DumpSnapshot) {
        self.current.store(Some(Arc::new(snapshot)));
        self.last_publish_ns.store(now.as_nanos(), Ordering::Relaxed);
    }

    /// Latest published snapshot, from any thread, without blocking.
    /// `None` until the first publish.
    pub fn snapshot(&self) -> Option<Arc<DumpSnapshot>> {
        self.current.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(timestamp_ns: u64) -> DumpSnapshot {
        DumpSnapshot {
            taken_at: SystemTime::now(),
            timestamp_ns,
            values: BTreeMap::new(),
        }
    }

    #[test]
    fn test_unpublished_store_reads_none() {
        let store = DumpStore::new(Duration::from_millis(100));
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_first_update_always_publishes() {
        let store = DumpStore::new(Duration::from_secs(3600));

        let published = store.update(Timestamp::from_nanos(5), || snapshot(5));
        assert!(published);
        assert_eq!(store.snapshot().expect("snapshot").timestamp_ns, 5);
    }

    #[test]
    fn test_update_throttles_by_interval() {
        let store = DumpStore::new(Duration::from_nanos(100));

        assert!(store.update(Timestamp::from_nanos(0), || snapshot(0)));
        assert!(!store.update(Timestamp::from_nanos(50), || snapshot(50)));
        assert!(!store.update(Timestamp::from_nanos(99), || snapshot(99)));
        assert!(store.update(Timestamp::from_nanos(100), || snapshot(100)));

        assert_eq!(store.snapshot().expect("snapshot").timestamp_ns, 100);
    }

    #[test]
    fn test_zero_interval_publishes_every_update() {
        let store = DumpStore::new(Duration::ZERO);

        assert!(store.update(Timestamp::from_nanos(1), || snapshot(1)));
        assert!(store.update(Timestamp::from_nanos(1), || snapshot(2)));
        assert_eq!(store.snapshot().expect("snapshot").timestamp_ns, 2);
    }

    #[test]
    fn test_throttled_update_does_not_build() {
        let store = DumpStore::new(Duration::from_secs(3600));
        assert!(store.update(Timestamp::from_nanos(0), || snapshot(0)));

        store.update(Timestamp::from_nanos(1), || {
            panic!("throttled update must not invoke the builder")
        });
    }

    #[test]
    fn test_readers_keep_superseded_snapshots_alive() {
        let store = DumpStore::new(Duration::ZERO);

        store.update(Timestamp::from_nanos(1), || snapshot(1));
        let held = store.snapshot().expect("snapshot");

        store.update(Timestamp::from_nanos(2), || snapshot(2));
        assert_eq!(held.timestamp_ns, 1);
        assert_eq!(store.snapshot().expect("snapshot").timestamp_ns, 2);
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let mut values = BTreeMap::new();
        values.insert("requests".to_string(), MetricValue::Counter(7));
        values.insert("depth".to_string(), MetricValue::Gauge(1.5));
        let dump = DumpSnapshot {
            taken_at: SystemTime::UNIX_EPOCH,
            timestamp_ns: 42,
            values,
        };

        let json = dump.to_json().expect("serialize");
        let parsed: DumpSnapshot = serde_json::from_str(&json).expect("parse");

        assert_eq!(parsed.timestamp_ns, 42);
        assert_eq!(parsed.counter("requests"), Some(7));
        assert_eq!(parsed.gauge("depth"), Some(1.5));
        assert_eq!(parsed.counter("depth"), None);
    }
}
