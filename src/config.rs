use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::TelemetryError;

/// Engine configuration, resolved once before [`initialize`] completes.
///
/// [`initialize`]: crate::Telemetry::initialize
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Master switch. When false, [`initialize`] performs its setup but
    /// never starts the processor thread, and producer emissions are
    /// discarded without touching the queue.
    ///
    /// [`initialize`]: crate::Telemetry::initialize
    pub enabled: bool,

    /// How long the processor sleeps when the queue is empty.
    ///
    /// This bounds both idle CPU usage and the latency with which the
    /// processor observes a shutdown request (default: 10 microseconds).
    pub idle_sleep: Duration,

    /// Minimum interval between two published dump snapshots.
    ///
    /// A zero interval publishes on every processor iteration, which is
    /// useful in tests but wasteful with a large metric population
    /// (default: 500 milliseconds).
    pub publish_interval: Duration,

    /// Event queue capacity. `None` means unbounded; with a bound set,
    /// events pushed against a full queue are silently dropped and
    /// counted, never blocking the producer.
    pub queue_capacity: Option<usize>,

    /// OS-level name assigned to the processor thread.
    pub thread_name: String,

    /// Length of the clock calibration window sampled once at engine
    /// construction.
    pub calibration_window: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            idle_sleep: Duration::from_micros(10),
            publish_interval: Duration::from_millis(500),
            queue_capacity: None,
            thread_name: "pulse-processor".to_string(),
            calibration_window: Duration::from_millis(10),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TelemetryError::Config {
            message: format!("failed to read config file: {}", e),
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| TelemetryError::Config {
            message: format!("failed to parse config file: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate tunables that have no sensible degenerate interpretation.
    pub fn validate(&self) -> crate::Result<()> {
        if self.idle_sleep.is_zero() {
            return Err(TelemetryError::Config {
                message: "idle_sleep must be non-zero".to_string(),
            });
        }

        if self.queue_capacity == Some(0) {
            return Err(TelemetryError::Config {
                message: "queue_capacity must be at least 1 when bounded".to_string(),
            });
        }

        if self.thread_name.is_empty() {
            return Err(TelemetryError::Config {
                message: "thread_name must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
