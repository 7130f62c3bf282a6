//! Benchmark for cell materialization, index upkeep, and proximity queries.
//!
//! Run with: cargo bench --package terrafield_procedural --bench grid_benchmark

// Benchmarks don't need strict docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use terrafield_procedural::{Body, CellCoord, EntityId, EntityKind, Grid};
use terrafield_shared::Vec2;

fn populated_grid(entities: u64, extent: f64) -> (Grid, Vec<Body>) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut grid = Grid::default();
    let mut bodies: Vec<Body> = (0..entities)
        .map(|id| {
            let position = Vec2::new(
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
            );
            Body::new(EntityId::new(id), EntityKind::Animal, position)
        })
        .collect();
    for body in &mut bodies {
        grid.add_entity(body);
    }
    (grid, bodies)
}

fn benchmark_materialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize");
    group.throughput(Throughput::Elements(64 * 64));
    group.sample_size(20);

    group.bench_function("64x64_cells", |b| {
        b.iter_batched(
            Grid::default,
            |mut grid| {
                for x in -32..32 {
                    for y in -32..32 {
                        black_box(grid.cell(x, y).height());
                    }
                }
                grid
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn benchmark_update_entity(c: &mut Criterion) {
    let (mut grid, mut bodies) = populated_grid(1_000, 2_000.0);

    c.bench_function("update_1000_entities", |b| {
        let mut step = 0.0f64;
        b.iter(|| {
            step += 1.0;
            for body in &mut bodies {
                let heading = Vec2::from_angle(step * 0.01 + body.id.value() as f64);
                body.move_to(body.position + heading * 3.0);
                black_box(grid.update_entity(body));
            }
        });
    });
}

fn benchmark_radius_query(c: &mut Criterion) {
    let (grid, _) = populated_grid(10_000, 5_000.0);

    c.bench_function("radius_query_r200_10k_entities", |b| {
        let mut x = -4_000.0f64;
        b.iter(|| {
            x = if x > 4_000.0 { -4_000.0 } else { x + 37.0 };
            black_box(grid.entities_in_radius(black_box(x), black_box(x * 0.5), 200.0))
        });
    });
}

fn benchmark_flow_field(c: &mut Criterion) {
    c.bench_function("flow_field_32x32", |b| {
        b.iter_batched(
            || {
                let mut grid = Grid::default();
                for x in -16..16 {
                    for y in -16..16 {
                        grid.cell(x, y);
                    }
                }
                grid
            },
            |mut grid| {
                for x in -16..16 {
                    for y in -16..16 {
                        black_box(grid.flow_direction(CellCoord::new(x, y)));
                    }
                }
                grid
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    benchmark_materialize,
    benchmark_update_entity,
    benchmark_radius_query,
    benchmark_flow_field
);
criterion_main!(benches);
