// Copyright 2025 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `bramble_atom`.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use bramble_atom::AtomRegistry;

fn bench_intern(c: &mut Criterion) {
    let mut group = c.benchmark_group("atom/intern");
    let names: Vec<String> = (0..1024).map(|i| format!("property-{i}")).collect();

    group.bench_function("cold_1024", |b| {
        b.iter_batched(
            AtomRegistry::new,
            |mut registry| {
                for name in &names {
                    black_box(registry.intern(name));
                }
                black_box(registry);
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("warm_hit", |b| {
        let mut registry = AtomRegistry::new();
        for name in &names {
            registry.intern(name);
        }
        b.iter(|| black_box(registry.intern(black_box("property-512"))))
    });

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("atom/lookup");
    let mut registry = AtomRegistry::new();
    let atoms: Vec<_> = (0..1024)
        .map(|i| registry.intern(&format!("property-{i}")))
        .collect();

    group.bench_function("hit", |b| {
        b.iter(|| black_box(registry.lookup(black_box("property-512"))))
    });

    group.bench_function("miss", |b| {
        b.iter(|| black_box(registry.lookup(black_box("no-such-property"))))
    });

    group.bench_function("name", |b| {
        let atom = atoms[512];
        b.iter(|| black_box(registry.name(black_box(atom))))
    });

    group.finish();
}

criterion_group!(benches, bench_intern, bench_lookup);
criterion_main!(benches);
