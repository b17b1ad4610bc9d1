use std::io::Write;
use std::time::Duration;

use pulse::Config;

#[test]
fn test_load_config_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    write!(
        file,
        r#"
enabled = true
thread_name = "telemetry-worker"
queue_capacity = 4096

[idle_sleep]
secs = 0
nanos = 50000

[publish_interval]
secs = 1
nanos = 0
"#
    )
    .expect("write config");

    let config = Config::load_from_file(file.path()).expect("load config");

    assert!(config.enabled);
    assert_eq!(config.thread_name, "telemetry-worker");
    assert_eq!(config.queue_capacity, Some(4096));
    assert_eq!(config.idle_sleep, Duration::from_micros(50));
    assert_eq!(config.publish_interval, Duration::from_secs(1));
    // Unspecified fields keep their defaults.
    assert_eq!(config.calibration_window, Duration::from_millis(10));
}

#[test]
fn test_load_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    write!(
        file,
        r#"
queue_capacity = 0
"#
    )
    .expect("write config");

    let result = Config::load_from_file(file.path());
    assert!(result.is_err(), "zero capacity must fail validation");
}

#[test]
fn test_load_missing_file_fails() {
    let result = Config::load_from_file("/nonexistent/pulse-config.toml");
    assert!(result.is_err());
}
