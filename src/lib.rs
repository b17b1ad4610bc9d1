//! # Pulse
//!
//! A high-performance in-process telemetry collection engine, featuring:
//! - Lock-free event transport from producer threads to a single
//!   processing thread
//! - A cycle-counter clock calibrated once at startup, stamping events in
//!   tens of nanoseconds without a system call
//! - Counter, gauge and timer metrics folded on a dedicated background
//!   thread
//! - Consistent dump snapshots readable from any thread while collection
//!   keeps running
//!
//! ## Architecture
//!
//! Producer threads stamp each instrumentation event with the calibrated
//! clock and push it onto a multi-producer/single-consumer queue; the
//! push never blocks and never surfaces a failure. A dedicated processor
//! thread drains the queue, applies events to the metric registry, and
//! periodically publishes an immutable snapshot of all metric state that
//! exporters read without contending with producers:
//!
//! ```text
//! producer ──► Clock ──► EventQueue ──► Processor ──► MetricRegistry
//!                                           │
//!                                           └──► DumpStore ──► reader
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use pulse::{Config, Telemetry};
//! use std::time::Duration;
//!
//! fn main() -> pulse::Result<()> {
//!     let config = Config {
//!         publish_interval: Duration::from_millis(100),
//!         ..Config::default()
//!     };
//!
//!     let telemetry = Telemetry::new(config)?;
//!     telemetry.initialize()?;
//!
//!     let handle = telemetry.handle();
//!     handle.increment_counter("requests.total", 1);
//!     handle.record_timer("request.duration", Duration::from_micros(250));
//!
//!     telemetry.finalize();
//!
//!     let dump = telemetry.dump().expect("final snapshot");
//!     assert_eq!(dump.counter("requests.total"), Some(1));
//!     Ok(())
//! }
//! ```

/// Calibrated monotonic clock and timestamps
pub mod clock;

/// Engine configuration with TOML loading and validation
pub mod config;

/// Dump store and snapshot types exposed to exporters
pub mod dump;

/// Error types surfaced by the engine
pub mod error;

/// Instrumentation event records
pub mod event;

/// Concrete metric state: counters, gauges, timers
pub mod metrics;

/// Multi-producer/single-consumer event transport
pub mod queue;

/// Metric registry mapping identity to live state
pub mod registry;

/// Engine self-observability counters
pub mod stats;

mod processor;
mod telemetry;

pub use clock::{Clock, Timestamp};
pub use config::Config;
pub use dump::{DumpSnapshot, DumpStore};
pub use error::{ApplyError, Result, TelemetryError};
pub use event::{Event, EventKind};
pub use metrics::{Counter, Gauge, Metric, MetricValue, Timer, TimerSummary};
pub use processor::Lifecycle;
pub use queue::EventQueue;
pub use registry::MetricRegistry;
pub use stats::{EngineStats, StatsSnapshot};
pub use telemetry::{Telemetry, TelemetryHandle, TimerGuard};
