//! End-to-end walkthrough: configure the engine, emit from several worker
//! threads, watch live dumps, and read the final snapshot after shutdown.
//!
//! Run with: `cargo run --example usage`

use std::time::Duration;

use pulse::{Config, Telemetry};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config {
        publish_interval: Duration::from_millis(100),
        ..Config::default()
    };
    let telemetry = Telemetry::new(config)?;
    telemetry.initialize()?;

    println!("=== Worker Simulation ===");
    let mut workers = Vec::new();
    for worker_id in 0..4 {
        let handle = telemetry.handle();
        workers.push(std::thread::spawn(move || {
            for request in 0..500 {
                handle.increment_counter("requests.total", 1);
                handle.set_gauge("worker.active", (worker_id + 1) as f64);

                let _scope = handle.timer("request.duration");
                if request % 50 == 0 {
                    std::thread::sleep(Duration::from_micros(200));
                }
            }
        }));
    }

    // Observe a live dump while the workers run.
    std::thread::sleep(Duration::from_millis(150));
    if let Some(dump) = telemetry.dump() {
        println!(
            "live dump: {} metrics, requests so far: {:?}",
            dump.values.len(),
            dump.counter("requests.total")
        );
    }

    for worker in workers {
        worker.join().expect("worker panicked");
    }

    telemetry.finalize();

    println!("\n=== Final Dump ===");
    let dump = telemetry.dump().expect("final snapshot");
    for (name, value) in &dump.values {
        println!("{name}: {value:?}");
    }

    if let Some(summary) = dump.timer("request.duration") {
        println!(
            "\nrequest.duration: count={} mean={:.0}ns max={}ns",
            summary.count, summary.mean_ns, summary.max_ns
        );
    }

    println!("\n=== Engine Stats ===");
    let stats = telemetry.stats();
    println!(
        "processed={} dropped={} apply_failures={} snapshots={}",
        stats.events_processed,
        stats.events_dropped,
        stats.apply_failures,
        stats.snapshots_published
    );

    println!("\n=== JSON Export ===");
    println!("{}", dump.to_json()?);

    Ok(())
}
