use std::time::Duration;

use pulse::{Config, Lifecycle, Telemetry};

fn test_config() -> Config {
    Config {
        calibration_window: Duration::from_millis(2),
        ..Config::default()
    }
}

#[test]
fn test_finalize_before_initialize_is_noop() {
    let telemetry = Telemetry::new(test_config()).expect("build engine");

    telemetry.finalize();

    assert_eq!(telemetry.lifecycle(), Lifecycle::Uninitialized);
    assert!(!telemetry.is_enabled());
    assert!(telemetry.dump().is_none());

    // The engine is still usable afterwards.
    telemetry.initialize().expect("initialize after stray finalize");
    assert_eq!(telemetry.lifecycle(), Lifecycle::Running);
    telemetry.finalize();
}

#[test]
fn test_initialize_is_idempotent() {
    let telemetry = Telemetry::new(test_config()).expect("build engine");

    telemetry.initialize().expect("first initialize");
    telemetry.initialize().expect("second initialize");
    assert_eq!(telemetry.lifecycle(), Lifecycle::Running);

    let handle = telemetry.handle();
    for _ in 0..10 {
        handle.increment_counter("requests.total", 1);
    }

    telemetry.finalize();

    let dump = telemetry.dump().expect("final snapshot");
    assert_eq!(dump.counter("requests.total"), Some(10));
}

#[test]
fn test_finalize_stops_collection() {
    let telemetry = Telemetry::new(test_config()).expect("build engine");
    telemetry.initialize().expect("initialize");
    assert!(telemetry.is_enabled());

    telemetry.finalize();

    assert_eq!(telemetry.lifecycle(), Lifecycle::Finalized);
    assert!(!telemetry.is_enabled());

    // Emissions after finalize are discarded at the producer.
    let processed_before = telemetry.stats().events_processed;
    let handle = telemetry.handle();
    handle.increment_counter("late.counter", 1);

    assert_eq!(telemetry.stats().events_processed, processed_before);
    assert_eq!(telemetry.stats().queue_depth, 0);
    assert!(telemetry.dump().expect("final snapshot").counter("late.counter").is_none());
}

#[test]
fn test_finalize_is_idempotent() {
    let telemetry = Telemetry::new(test_config()).expect("build engine");
    telemetry.initialize().expect("initialize");

    let handle = telemetry.handle();
    handle.increment_counter("requests.total", 2);

    telemetry.finalize();
    telemetry.finalize();

    assert_eq!(telemetry.lifecycle(), Lifecycle::Finalized);
    let dump = telemetry.dump().expect("final snapshot");
    assert_eq!(dump.counter("requests.total"), Some(2));
}

#[test]
fn test_restart_after_finalize_resumes_collection() {
    let telemetry = Telemetry::new(test_config()).expect("build engine");
    let handle = telemetry.handle();

    telemetry.initialize().expect("first initialize");
    for _ in 0..10 {
        handle.increment_counter("requests.total", 1);
    }
    telemetry.finalize();
    assert_eq!(
        telemetry.dump().expect("first snapshot").counter("requests.total"),
        Some(10)
    );

    telemetry.initialize().expect("restart");
    assert_eq!(telemetry.lifecycle(), Lifecycle::Running);
    assert!(telemetry.is_enabled());

    for _ in 0..5 {
        handle.increment_counter("requests.total", 1);
    }
    telemetry.finalize();

    // Collection resumed into the same registry.
    let dump = telemetry.dump().expect("final snapshot");
    assert_eq!(dump.counter("requests.total"), Some(15));
}

#[test]
fn test_drop_finalizes_running_engine() {
    let telemetry = Telemetry::new(test_config()).expect("build engine");
    telemetry.initialize().expect("initialize");

    let handle = telemetry.handle();
    handle.increment_counter("requests.total", 1);

    // Dropping must join the processor thread without hanging or
    // panicking; the handle outliving the engine is fine because it
    // only shares the core.
    drop(telemetry);
    handle.increment_counter("requests.total", 1);
}
