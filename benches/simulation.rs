//! Performance benchmarks for VENTWORLD

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ventworld::fields::ScalarField;
use ventworld::kernels;
use ventworld::{Config, Stats, World};

fn benchmark_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");

    for grid in [64usize, 128, 256].iter() {
        let mut config = Config::default();
        config.grid.width = *grid;
        config.grid.height = *grid;
        config.reductant.center_x = *grid as f32 / 2.0;
        config.reductant.center_y = *grid as f32 / 2.0;

        let mut world = World::new_with_seed(config, 42).unwrap();

        // Warm up
        world.run(10);

        group.bench_with_input(BenchmarkId::new("grid", grid), grid, |b, _| {
            b.iter(|| {
                world.step();
            });
        });
    }

    group.finish();
}

fn benchmark_agents(c: &mut Criterion) {
    let mut group = c.benchmark_group("agent_update");

    for population in [1024usize, 4096, 16384].iter() {
        let mut config = Config::default();
        config.grid.width = 128;
        config.grid.height = 128;
        config.prey.initial_count = *population;
        config.prey.capacity = *population * 2;

        let mut world = World::new_with_seed(config, 42).unwrap();
        world.run(10);

        group.bench_with_input(
            BenchmarkId::new("prey", population),
            population,
            |b, _| {
                b.iter(|| {
                    world.step();
                });
            },
        );
    }

    group.finish();
}

fn benchmark_reductant_kernel(c: &mut Criterion) {
    let mut config = Config::default();
    config.grid.width = 256;
    config.grid.height = 256;

    let cur = ScalarField::new(256, 256, 0.2);
    let terrain = ScalarField::new(256, 256, 0.0);
    let mut next = ScalarField::new(256, 256, 0.0);

    c.bench_function("reductant_256", |b| {
        b.iter(|| {
            kernels::reductant::update(
                black_box(&cur),
                black_box(&terrain),
                &mut next,
                &config,
                1.0,
            );
        });
    });
}

fn benchmark_stats(c: &mut Criterion) {
    let mut config = Config::default();
    config.grid.width = 256;
    config.grid.height = 256;
    let mut world = World::new_with_seed(config, 42).unwrap();
    world.run(10);

    c.bench_function("stats_measure", |b| {
        b.iter(|| Stats::measure(black_box(&world)));
    });
}

criterion_group!(
    benches,
    benchmark_world_step,
    benchmark_agents,
    benchmark_reductant_kernel,
    benchmark_stats
);
criterion_main!(benches);
