//! Engine tick benchmarks.
//!
//! Measures one full `Engine::update` over scenes with animated and
//! constrained nodes, plus a deep chain for world-transform propagation.
//!
//! Run with: `cargo bench --bench update_bench`

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use glam::Vec3;

use kinema::{ConstraintSource, Engine, ObjectId, PropertyIndex, PropertyInputs};

/// A root-level fan of `width` chains, each `depth` nodes deep.
fn build_forest(engine: &mut Engine, width: usize, depth: usize) -> Vec<ObjectId> {
    let mut nodes = Vec::with_capacity(width * depth);
    for w in 0..width {
        let mut parent = engine.root();
        for d in 0..depth {
            let node = engine.create_object(format!("node_{w}_{d}"));
            engine.add_child(parent, node).expect("fresh objects form a tree");
            engine
                .set_property(node, PropertyIndex::POSITION, Vec3::new(1.0, 0.0, 0.0))
                .expect("position is writable");
            nodes.push(node);
            parent = node;
        }
    }
    nodes
}

/// Loops a position animation on every other node and constrains the rest
/// to follow their parent's alpha.
fn populate(engine: &mut Engine, nodes: &[ObjectId]) {
    let animation = engine.create_animation(2.0);
    engine.set_looping(animation, true).expect("animation exists");

    for (i, &node) in nodes.iter().enumerate() {
        if i % 2 == 0 {
            engine
                .animate_by(animation, node, PropertyIndex::POSITION_Y, 5.0_f32)
                .expect("position y is animatable");
        } else {
            let id = engine
                .create_constraint(node, PropertyIndex::COLOR_ALPHA, |alpha: &mut f32, inputs: &PropertyInputs<'_>| {
                    *alpha = inputs.float(0) * 0.9;
                })
                .expect("color alpha is constrainable");
            engine
                .add_constraint_source(id, ConstraintSource::parent(PropertyIndex::COLOR_ALPHA))
                .expect("color alpha is an input");
            engine.apply_constraint(id).expect("constraint exists");
        }
    }
    engine.play(animation).expect("animation exists");
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_update");

    for &(width, depth) in &[(10, 10), (100, 10), (10, 100)] {
        let mut engine = Engine::default();
        let nodes = build_forest(&mut engine, width, depth);
        populate(&mut engine, &nodes);
        // Drain setup messages outside the measurement.
        engine.update(0.0);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{depth}")),
            &(width, depth),
            |b, _| {
                b.iter(|| black_box(engine.update(black_box(1.0 / 60.0))));
            },
        );
    }

    group.finish();
}

fn bench_idle(c: &mut Criterion) {
    let mut engine = Engine::default();
    build_forest(&mut engine, 100, 10);
    engine.update(0.0);

    c.bench_function("engine_update_idle_1000", |b| {
        b.iter(|| black_box(engine.update(black_box(1.0 / 60.0))));
    });
}

criterion_group!(benches, bench_update, bench_idle);
criterion_main!(benches);
