//! Benchmarks for the step pipeline.
//!
//! Run with: cargo bench -p boxsim-core

#![allow(missing_docs, clippy::wildcard_imports)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nalgebra::{Point3, Vector3};

use boxsim_core::Scene;
use boxsim_types::{BodyDef, BodyType, BoxDef, Pose, SceneConfig};

/// A static floor plus a grid of dynamic cubes hovering above it.
fn build_scene(cubes_per_side: usize) -> Scene {
    let mut scene = Scene::new(SceneConfig::default()).expect("valid config");

    let floor = scene
        .create_body(&BodyDef::default())
        .expect("create floor");
    scene
        .set_box(
            floor,
            &BoxDef::new(Pose::identity(), Vector3::new(100.0, 2.0, 100.0)),
        )
        .expect("floor box");

    for ix in 0..cubes_per_side {
        for iz in 0..cubes_per_side {
            #[allow(clippy::cast_precision_loss)]
            let (x, z) = (ix as f64 * 1.5 - 5.0, iz as f64 * 1.5 - 5.0);
            let id = scene
                .create_body(
                    &BodyDef::new(BodyType::Dynamic).with_position(Point3::new(x, 2.0, z)),
                )
                .expect("create cube");
            scene
                .set_box(id, &BoxDef::new(Pose::identity(), Vector3::new(1.0, 1.0, 1.0)))
                .expect("cube box");
        }
    }

    scene
}

/// A stack of cubes that settles into persistent resting contacts.
fn build_stack(height: usize) -> Scene {
    let mut scene = Scene::new(SceneConfig::default()).expect("valid config");

    let floor = scene
        .create_body(&BodyDef::default())
        .expect("create floor");
    scene
        .set_box(
            floor,
            &BoxDef::new(Pose::identity(), Vector3::new(100.0, 2.0, 100.0)),
        )
        .expect("floor box");

    for i in 0..height {
        #[allow(clippy::cast_precision_loss)]
        let y = 2.0 + i as f64;
        let id = scene
            .create_body(
                &BodyDef::new(BodyType::Dynamic).with_position(Point3::new(0.0, y, 0.0)),
            )
            .expect("create cube");
        scene
            .set_box(id, &BoxDef::new(Pose::identity(), Vector3::new(1.0, 1.0, 1.0)))
            .expect("cube box");
    }

    scene
}

fn bench_falling_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("falling_grid");
    for side in [4_usize, 8] {
        let bodies = side * side + 1;
        group.throughput(Throughput::Elements(bodies as u64));
        group.bench_with_input(BenchmarkId::from_parameter(bodies), &side, |b, &side| {
            b.iter_batched(
                || build_scene(side),
                |mut scene| {
                    for _ in 0..10 {
                        scene.step();
                    }
                    scene
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_settled_stack(c: &mut Criterion) {
    let mut group = c.benchmark_group("settled_stack");
    for height in [5_usize, 10] {
        group.bench_with_input(
            BenchmarkId::from_parameter(height),
            &height,
            |b, &height| {
                // Settle outside the measurement, then time warm steps
                let mut scene = build_stack(height);
                for _ in 0..180 {
                    scene.step();
                }
                b.iter(|| scene.step());
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_falling_grid, bench_settled_stack);
criterion_main!(benches);
