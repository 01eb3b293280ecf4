//! Tick-loop benchmarks for turret_core.
//!
//! Run with: `cargo bench -p turret_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use turret_core::math::Vec3Fixed;
use turret_core::registry::TurretRegistry;
use turret_core::targeting::{Candidate, TargetCategory};
use turret_core::unit::TurretUnitParams;

fn build_registry(units: usize) -> TurretRegistry {
    let mut registry = TurretRegistry::new();
    for i in 0..units {
        let mut params =
            TurretUnitParams::at(Vec3Fixed::from_blocks(i as i32 * 40, 0, 0), 1);
        params.initial_energy = 500;
        params.initial_ammo = 1_000;
        registry.register(params).expect("valid params");
    }
    registry
}

fn candidate_field(origin: Vec3Fixed) -> Vec<Candidate> {
    (0..16)
        .map(|i| {
            Candidate::new(
                1_000 + i,
                origin + Vec3Fixed::from_blocks(3 + (i as i32 % 12), 0, i as i32 % 5),
                TargetCategory::Hostile,
            )
        })
        .collect()
}

/// Runs registry tick benchmarks for the turret_core crate.
pub fn tick_benchmark(c: &mut Criterion) {
    c.bench_function("tick_64_units_16_candidates", |b| {
        let mut registry = build_registry(64);
        b.iter(|| {
            let events = registry.tick(|_, origin, _| candidate_field(origin));
            black_box(events)
        })
    });

    c.bench_function("tick_64_units_no_candidates", |b| {
        let mut registry = build_registry(64);
        b.iter(|| {
            let events = registry.tick(|_, _, _| Vec::new());
            black_box(events)
        })
    });
}

criterion_group!(benches, tick_benchmark);
criterion_main!(benches);
