//! Public engine surface: the context object owned by the hosting
//! application and the cloneable handle producers emit through.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{error, info};

use crate::clock::{Clock, Timestamp};
use crate::config::Config;
use crate::dump::{DumpSnapshot, DumpStore};
use crate::error::TelemetryError;
use crate::event::EventKind;
use crate::processor::{self, EngineCore, Lifecycle};
use crate::queue::EventQueue;
use crate::registry::MetricRegistry;
use crate::stats::{EngineStats, StatsSnapshot};

struct ProcessorState {
    lifecycle: Lifecycle,
    thread: Option<JoinHandle<()>>,
}

/// In-process telemetry collection engine.
///
/// `Telemetry` is an explicit context object: it owns the clock, the
/// event queue, the metric registry, the dump store and the processor
/// thread, and the hosting application decides where it lives. Share it
/// behind an `Arc` (or hand out [`TelemetryHandle`]s) rather than
/// reaching for a process-wide global.
///
/// # Lifecycle
///
/// [`initialize`] and [`finalize`] are idempotent and serialized against
/// each other by an internal mutex. A finalized engine can be
/// initialized again: collection resumes into the same registry and the
/// dump published at finalize stays readable until the restarted
/// processor publishes a fresh one.
///
/// [`initialize`]: Telemetry::initialize
/// [`finalize`]: Telemetry::finalize
///
/// # Example
///
/// ```rust
/// use pulse::{Config, Telemetry};
/// use std::time::Duration;
///
/// fn main() -> pulse::Result<()> {
///     let config = Config {
///         publish_interval: Duration::ZERO,
///         ..Config::default()
///     };
///     let telemetry = Telemetry::new(config)?;
///     telemetry.initialize()?;
///
///     let handle = telemetry.handle();
///     handle.increment_counter("requests.total", 1);
///     handle.set_gauge("pool.connections", 3.0);
///
///     telemetry.finalize();
///
///     let dump = telemetry.dump().expect("final snapshot");
///     assert_eq!(dump.counter("requests.total"), Some(1));
///     assert_eq!(dump.gauge("pool.connections"), Some(3.0));
///     Ok(())
/// }
/// ```
pub struct Telemetry {
    core: Arc<EngineCore>,
    config: Config,
    state: Mutex<ProcessorState>,
}

impl Telemetry {
    /// Build an engine from configuration. Calibrates the clock, which
    /// blocks for the configured calibration window.
    pub fn new(config: Config) -> crate::Result<Self> {
        config.validate()?;

        let core = Arc::new(EngineCore {
            clock: Clock::calibrate(config.calibration_window),
            queue: EventQueue::new(config.queue_capacity),
            registry: MetricRegistry::new(),
            dump: DumpStore::new(config.publish_interval),
            stats: EngineStats::new(),
            enabled: std::sync::atomic::AtomicBool::new(false),
            idle_sleep: config.idle_sleep,
        });

        Ok(Self {
            core,
            config,
            state: Mutex::new(ProcessorState {
                lifecycle: Lifecycle::Uninitialized,
                thread: None,
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, ProcessorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start collection. No-op when already running.
    ///
    /// When collection is disabled by configuration the engine still
    /// becomes `Running` administratively, but no thread is started and
    /// emissions are discarded at the producer.
    ///
    /// The only propagated failure is the OS refusing to spawn the
    /// processor thread.
    pub fn initialize(&self) -> crate::Result<()> {
        let mut state = self.state();
        if state.lifecycle == Lifecycle::Running {
            return Ok(());
        }

        if !self.config.enabled {
            info!("telemetry collection disabled by configuration");
            state.lifecycle = Lifecycle::Running;
            return Ok(());
        }

        self.core.enabled.store(true, Ordering::Release);

        let core = Arc::clone(&self.core);
        let thread = std::thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || processor::run(core))
            .map_err(|source| {
                self.core.enabled.store(false, Ordering::Release);
                TelemetryError::Spawn { source }
            })?;

        state.thread = Some(thread);
        state.lifecycle = Lifecycle::Running;
        info!(thread = %self.config.thread_name, "telemetry processor started");
        Ok(())
    }

    /// Stop collection. No-op when not running.
    ///
    /// Flips the enabled flag, joins the processor thread (bounded by the
    /// idle-sleep observation latency), drains whatever is still queued,
    /// and publishes a final snapshot so the dump reflects every accepted
    /// event.
    pub fn finalize(&self) {
        let mut state = self.state();
        if state.lifecycle != Lifecycle::Running {
            return;
        }

        self.core.enabled.store(false, Ordering::Release);
        if let Some(thread) = state.thread.take() {
            if thread.join().is_err() {
                error!("processor thread panicked before shutdown");
            }
        }

        self.core.finalize_flush();
        state.lifecycle = Lifecycle::Finalized;
        info!("telemetry processor stopped");
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.state().lifecycle
    }

    /// Whether the processor is collecting.
    pub fn is_enabled(&self) -> bool {
        self.core.is_enabled()
    }

    /// Cheap cloneable producer handle.
    pub fn handle(&self) -> TelemetryHandle {
        TelemetryHandle {
            core: Arc::clone(&self.core),
        }
    }

    /// Latest published dump snapshot; `None` before the first publish.
    pub fn dump(&self) -> Option<Arc<DumpSnapshot>> {
        self.core.dump.snapshot()
    }

    /// Point-in-time engine health counters.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_processed: self.core.stats.events_processed.load(Ordering::Relaxed),
            events_dropped: self.core.queue.dropped(),
            apply_failures: self.core.stats.apply_failures.load(Ordering::Relaxed),
            snapshots_published: self.core.stats.snapshots_published.load(Ordering::Relaxed),
            queue_depth: self.core.queue.len(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("lifecycle", &self.lifecycle())
            .field("enabled", &self.is_enabled())
            .field("config", &self.config)
            .finish()
    }
}

/// Producer-facing instrumentation handle.
///
/// Every method stamps the operation with the engine clock and enqueues
/// it; nothing here blocks, fails, or returns an error to the caller.
/// Cloning shares the underlying engine.
#[derive(Clone)]
pub struct TelemetryHandle {
    core: Arc<EngineCore>,
}

impl TelemetryHandle {
    pub fn increment_counter(&self, name: impl Into<Arc<str>>, value: u64) {
        self.core.emit(name.into(), EventKind::IncrementCounter(value));
    }

    pub fn decrement_counter(&self, name: impl Into<Arc<str>>, value: u64) {
        self.core.emit(name.into(), EventKind::DecrementCounter(value));
    }

    pub fn set_gauge(&self, name: impl Into<Arc<str>>, value: f64) {
        self.core.emit(name.into(), EventKind::SetGauge(value));
    }

    pub fn add_gauge(&self, name: impl Into<Arc<str>>, value: f64) {
        self.core.emit(name.into(), EventKind::AddGauge(value));
    }

    pub fn record_timer(&self, name: impl Into<Arc<str>>, duration: Duration) {
        self.core.emit(
            name.into(),
            EventKind::RecordDuration(duration.as_nanos() as u64),
        );
    }

    /// Start a scope timer that records its elapsed time when dropped.
    pub fn timer(&self, name: impl Into<Arc<str>>) -> TimerGuard {
        TimerGuard {
            core: Arc::clone(&self.core),
            key: name.into(),
            start: self.core.clock.now(),
        }
    }
}

impl std::fmt::Debug for TelemetryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryHandle")
            .field("enabled", &self.core.is_enabled())
            .finish()
    }
}

/// Measures the duration of a scope and records it as a timer event on
/// drop.
pub struct TimerGuard {
    core: Arc<EngineCore>,
    key: Arc<str>,
    start: Timestamp,
}

impl std::fmt::Debug for TimerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerGuard")
            .field("key", &self.key)
            .field("start", &self.start)
            .finish()
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        let elapsed = self.core.clock.now().saturating_duration_since(self.start);
        self.core.emit(
            Arc::clone(&self.key),
            EventKind::RecordDuration(elapsed.as_nanos() as u64),
        );
    }
}
