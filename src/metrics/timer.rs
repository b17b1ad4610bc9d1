use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Duration statistics for one timer metric, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerSummary {
    pub count: u64,
    pub sum_ns: u64,
    /// Zero when no durations have been recorded.
    pub min_ns: u64,
    pub max_ns: u64,
    pub last_ns: u64,
    pub mean_ns: f64,
}

/// Aggregated duration statistics kept as individual atomics.
#[derive(Debug)]
pub struct Timer {
    count: AtomicU64,
    sum: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,
    last: AtomicU64,
}

impl Default for Timer {
    fn default() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            min: AtomicU64::new(u64::MAX),
            max: AtomicU64::new(0),
            last: AtomicU64::new(0),
        }
    }
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, nanos: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(nanos, Ordering::Relaxed);
        self.min.fetch_min(nanos, Ordering::Relaxed);
        self.max.fetch_max(nanos, Ordering::Relaxed);
        self.last.store(nanos, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> TimerSummary {
        let count = self.count.load(Ordering::Relaxed);
        let sum = self.sum.load(Ordering::Relaxed);
        let min = self.min.load(Ordering::Relaxed);

        TimerSummary {
            count,
            sum_ns: sum,
            min_ns: if count == 0 { 0 } else { min },
            max_ns: self.max.load(Ordering::Relaxed),
            last_ns: self.last.load(Ordering::Relaxed),
            mean_ns: if count == 0 {
                0.0
            } else {
                sum as f64 / count as f64
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_empty_summary() {
        let timer = Timer::new();
        let summary = timer.summary();

        assert_eq!(summary.count, 0);
        assert_eq!(summary.sum_ns, 0);
        assert_eq!(summary.min_ns, 0);
        assert_eq!(summary.max_ns, 0);
        assert_eq!(summary.last_ns, 0);
        assert_eq!(summary.mean_ns, 0.0);
    }

    #[test]
    fn test_timer_record_statistics() {
        let timer = Timer::new();

        timer.record(100);
        timer.record(300);
        timer.record(200);

        let summary = timer.summary();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.sum_ns, 600);
        assert_eq!(summary.min_ns, 100);
        assert_eq!(summary.max_ns, 300);
        assert_eq!(summary.last_ns, 200);
        assert_eq!(summary.mean_ns, 200.0);
    }
}
