#[macro_use]
extern crate criterion;

use std::time::Duration;

use criterion::black_box;
use criterion::Criterion;

use pv_curve_tracer::backend::SimulatedCell;
use pv_curve_tracer::{locate_mpp, run_sweep, SweepConfig};

fn criterion_config() -> Criterion {
    Criterion::default()
        .measurement_time(Duration::from_secs(1))
        .sample_size(10)
}

fn criterion_benchmark(c: &mut Criterion) {
    let config = SweepConfig {
        step: 0.001,
        dwell: Duration::from_millis(0),
        ..SweepConfig::default()
    };

    c.bench_function("simulated sweep", |b| {
        b.iter(|| {
            let mut cell = SimulatedCell::default();
            black_box(run_sweep(&mut cell, &config).expect("sweep failed"))
        })
    });

    let table = run_sweep(&mut SimulatedCell::default(), &config)
        .expect("sweep failed")
        .table;
    c.bench_function("locate MPP", |b| {
        b.iter(|| black_box(locate_mpp(&table).expect("empty table").power()))
    });
}

criterion_group!(
  name = benches;
  config = criterion_config();
  targets = criterion_benchmark
);
criterion_main!(benches);
