use thiserror::Error;

/// Errors surfaced by the telemetry engine.
///
/// Only setup-time failures are ever propagated to callers. Producers
/// never observe errors from the hot path: a full queue is a counted
/// drop and a malformed event is a counted apply failure, both handled
/// internally by the processor.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to spawn processor thread: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },
}

/// Error applying a single event to the metric registry.
///
/// Contained by the processor loop: counted, logged at debug severity,
/// never propagated past the loop iteration that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error("metric `{key}` is registered as a {existing}, cannot apply a {requested} event")]
    KindMismatch {
        key: String,
        existing: &'static str,
        requested: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
