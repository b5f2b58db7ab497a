use click_throttle::infrastructure::mocks::{MockDirectory, RecordingGateway};
use click_throttle::{
    ActorDirectory, ActorId, ClickKind, ClickThrottle, RateWindow, SessionGateway,
    ThrottleSettings,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Directory with no permissions and a fixed latency.
struct FixedLatency(Duration);

impl ActorDirectory for FixedLatency {
    fn has_permission(&self, _actor: ActorId, _permission: &str) -> bool {
        false
    }

    fn half_rtt(&self, _actor: ActorId) -> Option<Duration> {
        Some(self.0)
    }
}

/// Gateway that drops everything.
struct Discard;

impl SessionGateway for Discard {
    fn notify(&self, _actor: ActorId, _message: &str) {}
    fn eject(&self, _actor: ActorId, _reason: &str) {}
}

fn throttle(primary_threshold: u32) -> ClickThrottle {
    ClickThrottle::builder()
        .with_settings(ThrottleSettings {
            primary_threshold,
            ..ThrottleSettings::default()
        })
        .with_directory(Arc::new(FixedLatency(Duration::from_millis(40))))
        .with_gateway(Arc::new(Discard))
        .build()
        .unwrap()
}

/// Benchmark the raw window operations
fn bench_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("window");
    let window = Duration::from_millis(1050);

    group.bench_function("record_and_prune_steady_state", |b| {
        let mut w = RateWindow::new();
        let mut now = Instant::now();
        b.iter(|| {
            now += Duration::from_millis(50);
            w.record_monotonic(now);
            black_box(w.prune_and_count(now, window))
        })
    });

    for size in [10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("prune_everything", size), &size, |b, &size| {
            let start = Instant::now();
            b.iter_batched(
                || {
                    let mut w = RateWindow::new();
                    for i in 0..size {
                        w.record_monotonic(start + Duration::from_micros(i as u64));
                    }
                    w
                },
                |mut w| black_box(w.prune_and_count(start + Duration::from_secs(5), window)),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

/// Benchmark single-threaded decision throughput
fn bench_single_threaded(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_threaded");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("on_click", |b| {
        let throttle = throttle(u32::MAX);
        let actor = ActorId::new(1);
        b.iter(|| {
            let now = Instant::now();
            for _ in 0..1000 {
                throttle.on_click(black_box(actor), ClickKind::Primary, now);
            }
        })
    });

    group.bench_function("check_primary_confirmation", |b| {
        let throttle = throttle(u32::MAX);
        let actor = ActorId::new(1);
        for _ in 0..10 {
            throttle.on_click(actor, ClickKind::Primary, Instant::now());
        }
        b.iter(|| {
            for _ in 0..1000 {
                black_box(throttle.check_primary_confirmation(black_box(actor)));
            }
        })
    });

    group.bench_function("check_secondary_action_many_actors", |b| {
        let throttle = throttle(u32::MAX);
        let mut next = 0u128;
        b.iter(|| {
            for _ in 0..1000 {
                next = (next + 1) % 4096;
                black_box(throttle.check_secondary_action(ActorId::new(next)));
            }
        })
    });

    group.bench_function("check_primary_with_mock_directory", |b| {
        let throttle = ClickThrottle::builder()
            .with_directory(Arc::new(MockDirectory::new()))
            .with_gateway(Arc::new(RecordingGateway::new()))
            .build()
            .unwrap();
        let actor = ActorId::new(1);
        b.iter(|| {
            for _ in 0..1000 {
                black_box(throttle.check_primary_confirmation(black_box(actor)));
            }
        })
    });

    group.finish();
}

/// Benchmark multi-threaded click recording and checking
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for num_threads in [2, 4, 8].iter() {
        group.throughput(Throughput::Elements((*num_threads as u64) * 1000));

        group.bench_with_input(
            BenchmarkId::new("distinct_actors", num_threads),
            num_threads,
            |b, &num_threads| {
                let throttle = throttle(u32::MAX);
                b.iter(|| {
                    let handles: Vec<_> = (0..num_threads)
                        .map(|i| {
                            let throttle = throttle.clone();
                            std::thread::spawn(move || {
                                // Each thread uses its own actor to avoid contention
                                let actor = ActorId::new(i as u128);
                                let now = Instant::now();
                                for _ in 0..500 {
                                    throttle.on_click(actor, ClickKind::Primary, now);
                                    black_box(throttle.check_primary_confirmation(actor));
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("shared_actor", num_threads),
            num_threads,
            |b, &num_threads| {
                let throttle = throttle(u32::MAX);
                b.iter(|| {
                    let handles: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let throttle = throttle.clone();
                            std::thread::spawn(move || {
                                let actor = ActorId::new(0);
                                let now = Instant::now();
                                for _ in 0..500 {
                                    throttle.on_click(actor, ClickKind::Primary, now);
                                    black_box(throttle.check_primary_confirmation(actor));
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                })
            },
        );
    }

    group.finish();
}

/// Benchmark session teardown
fn bench_session_end(c: &mut Criterion) {
    c.bench_function("session_end_after_activity", |b| {
        let throttle = throttle(u32::MAX);
        let actor = ActorId::new(9);
        b.iter(|| {
            let now = Instant::now();
            throttle.on_click(actor, ClickKind::Primary, now);
            throttle.on_click(actor, ClickKind::Secondary, now);
            throttle.on_session_end(black_box(actor));
        })
    });
}

criterion_group!(
    benches,
    bench_window,
    bench_single_threaded,
    bench_concurrent,
    bench_session_end
);
criterion_main!(benches);
