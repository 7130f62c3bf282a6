//! Benchmark for noise sampling.
//!
//! Measures cold sampling (every point new) against warm sampling (every
//! point already memoized).
//!
//! Run with: cargo bench --package terrafield_procedural --bench noise_benchmark

// Benchmarks don't need strict docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use terrafield_procedural::noise::{FieldSeed, NoiseField};

fn benchmark_cold_sample(c: &mut Criterion) {
    let mut noise = NoiseField::new(FieldSeed::new(42));

    c.bench_function("cold_noise_sample", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(noise.sample(black_box(x), black_box(x * 0.7)))
        });
    });
}

fn benchmark_warm_sample(c: &mut Criterion) {
    let mut noise = NoiseField::new(FieldSeed::new(42));
    noise.sample(12.3, 45.6);

    c.bench_function("warm_noise_sample", |b| {
        b.iter(|| black_box(noise.sample(black_box(12.3), black_box(45.6))));
    });
}

fn benchmark_cell_lattice(c: &mut Criterion) {
    let mut group = c.benchmark_group("cell_lattice");
    group.throughput(Throughput::Elements(100 * 100));
    group.sample_size(20);

    // Fresh field per batch so every sample misses the memo
    group.bench_function("100x100_cells_at_0.08", |b| {
        b.iter_batched(
            || NoiseField::new(FieldSeed::new(2)),
            |mut noise| {
                for x in 0..100 {
                    for y in 0..100 {
                        black_box(noise.sample(f64::from(x) * 0.08, f64::from(y) * 0.08));
                    }
                }
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_cold_sample,
    benchmark_warm_sample,
    benchmark_cell_lattice
);
criterion_main!(benches);
