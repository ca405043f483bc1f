//! # Crossing Contract Benchmarks
//!
//! | Path | What is measured |
//! |------|------------------|
//! | `request_slot` | Simulate + commit of a slot request on an open crossing |
//! | `read_crossing` | Evaluate with the lease rule applied |
//! | `train_cycle` | Request, grant and release of a clear crossing |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lc_crossing_contract::prelude::*;

fn seeded(lanes: usize, capacity: usize) -> CrossingService<ManualClock> {
    let service = create_test_service();
    service
        .submit(
            &StaticIdentity::infra_controller(),
            &Invocation::CreateCrossing {
                crossing_id: "1001".to_string(),
                status: CrossingStatus::FreeToCross,
                validity_time: u64::MAX / 2,
                lane_count: lanes,
                lane_capacity: capacity,
            },
        )
        .expect("seed crossing");
    service
}

fn bench_request_slot(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_slot");
    let request = Invocation::RequestSlot {
        crossing_id: "1001".to_string(),
    };

    for capacity in [4usize, 64, 1024] {
        group.throughput(Throughput::Elements(capacity as u64));
        group.bench_with_input(BenchmarkId::new("fill_grid", capacity), &capacity, |b, &capacity| {
            b.iter_batched(
                || seeded(1, capacity),
                |service| {
                    for i in 0..capacity {
                        let car = StaticIdentity::vehicle(&format!("CAR-{i}"));
                        black_box(service.submit(&car, &request).expect("slot"));
                    }
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_read_crossing(c: &mut Criterion) {
    let service = seeded(4, 16);
    let reader = StaticIdentity::vehicle("READER");
    let read = Invocation::ReadCrossing {
        crossing_id: "1001".to_string(),
    };

    c.bench_function("read_crossing", |b| {
        b.iter(|| black_box(service.evaluate(&reader, &read).expect("read")))
    });
}

fn bench_train_cycle(c: &mut Criterion) {
    let service = seeded(2, 4);
    service
        .submit(
            &StaticIdentity::infra_controller(),
            &Invocation::CreateTrain {
                train_id: "T1".to_string(),
                status: TrainStatus::Go,
                timeout: 600,
            },
        )
        .expect("seed train");
    let operator = StaticIdentity::railway_operator();
    let request = Invocation::RequestCrossing {
        crossing_id: "1001".to_string(),
        train_id: "T1".to_string(),
    };
    let release = Invocation::ReleaseCrossing {
        crossing_id: "1001".to_string(),
        train_id: "T1".to_string(),
    };

    c.bench_function("train_cycle", |b| {
        b.iter(|| {
            black_box(service.submit(&operator, &request).expect("request"));
            black_box(service.submit(&operator, &release).expect("release"));
        })
    });
}

criterion_group!(benches, bench_request_slot, bench_read_crossing, bench_train_cycle);
criterion_main!(benches);
