//! Concrete metric state mutated by the processor.
//!
//! All metric types are plain atomics so a dump walk can read them while
//! the consumer keeps applying events; cross-metric consistency comes
//! from the dump store building snapshots on the consumer thread, not
//! from coordination here.

mod counter;
mod gauge;
mod timer;

pub use counter::Counter;
pub use gauge::Gauge;
pub use timer::{Timer, TimerSummary};

use serde::{Deserialize, Serialize};

use crate::error::ApplyError;
use crate::event::EventKind;

/// Externally visible value of one metric, as captured into a dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricValue {
    Counter(u64),
    Gauge(f64),
    Timer(TimerSummary),
}

/// One registered metric.
#[derive(Debug)]
pub enum Metric {
    Counter(Counter),
    Gauge(Gauge),
    Timer(Timer),
}

impl Metric {
    /// Fresh metric state of the kind an event targets.
    pub fn new_for(kind: &EventKind) -> Self {
        match kind {
            EventKind::IncrementCounter(_) | EventKind::DecrementCounter(_) => {
                Metric::Counter(Counter::new())
            }
            EventKind::SetGauge(_) | EventKind::AddGauge(_) => Metric::Gauge(Gauge::new()),
            EventKind::RecordDuration(_) => Metric::Timer(Timer::new()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Metric::Counter(_) => "counter",
            Metric::Gauge(_) => "gauge",
            Metric::Timer(_) => "timer",
        }
    }

    /// Apply one event's effect. A kind mismatch leaves the metric
    /// untouched and reports an [`ApplyError`].
    pub fn apply(&self, key: &str, kind: &EventKind) -> Result<(), ApplyError> {
        match (self, kind) {
            (Metric::Counter(counter), EventKind::IncrementCounter(value)) => {
                counter.increment(*value);
                Ok(())
            }
            (Metric::Counter(counter), EventKind::DecrementCounter(value)) => {
                counter.decrement(*value);
                Ok(())
            }
            (Metric::Gauge(gauge), EventKind::SetGauge(value)) => {
                gauge.set(*value);
                Ok(())
            }
            (Metric::Gauge(gauge), EventKind::AddGauge(value)) => {
                gauge.add(*value);
                Ok(())
            }
            (Metric::Timer(timer), EventKind::RecordDuration(nanos)) => {
                timer.record(*nanos);
                Ok(())
            }
            _ => Err(ApplyError::KindMismatch {
                key: key.to_string(),
                existing: self.kind(),
                requested: kind.metric_kind(),
            }),
        }
    }

    pub fn value(&self) -> MetricValue {
        match self {
            Metric::Counter(counter) => MetricValue::Counter(counter.get()),
            Metric::Gauge(gauge) => MetricValue::Gauge(gauge.get()),
            Metric::Timer(timer) => MetricValue::Timer(timer.summary()),
        }
    }
}
