use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use pulse::{Clock, Config, Event, EventKind, EventQueue, Telemetry, Timestamp};

fn benchmark_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("clock");
    let clock = Clock::calibrate(Duration::from_millis(10));

    group.bench_function("now", |b| {
        b.iter(|| {
            black_box(clock.now());
        });
    });

    group.finish();
}

fn benchmark_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue");

    group.bench_function("push_pop", |b| {
        let queue = EventQueue::new(None);
        let key: Arc<str> = Arc::from("bench.counter");
        b.iter(|| {
            queue.push(Event::new(
                Timestamp::from_nanos(0),
                Arc::clone(&key),
                EventKind::IncrementCounter(1),
            ));
            black_box(queue.pop());
        });
    });

    group.finish();
}

fn benchmark_producer_hot_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");

    let config = Config {
        // Keep the processor from competing for the benchmark core more
        // than it would in production.
        idle_sleep: Duration::from_micros(100),
        ..Config::default()
    };
    let telemetry = Telemetry::new(config).expect("build engine");
    telemetry.initialize().expect("initialize");
    let handle = telemetry.handle();
    let counter_key: Arc<str> = Arc::from("bench.requests");
    let timer_key: Arc<str> = Arc::from("bench.latency");

    group.bench_function("increment_counter", |b| {
        b.iter(|| {
            handle.increment_counter(black_box(Arc::clone(&counter_key)), black_box(1));
        });
    });

    group.bench_function("record_timer", |b| {
        b.iter(|| {
            handle.record_timer(
                black_box(Arc::clone(&timer_key)),
                black_box(Duration::from_micros(5)),
            );
        });
    });

    group.finish();
    telemetry.finalize();
}

criterion_group!(
    benches,
    benchmark_clock,
    benchmark_queue,
    benchmark_producer_hot_path
);
criterion_main!(benches);
