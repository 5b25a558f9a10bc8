// Copyright 2025 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `bramble_cascade`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::cell::Cell;
use std::rc::Rc;

use bramble_cascade::{Atom, NodeId, StyleGraph};

/// A single inheritance chain of `len` nodes with the atom defined at the
/// root. Returns the graph, the root, the leaf, and the atom.
fn chain(len: u32) -> (StyleGraph, NodeId, NodeId, Atom) {
    let mut graph = StyleGraph::new();
    let width = graph.atom("width");
    let root = graph.create_node();
    graph.create_int(root, width, 1).unwrap();
    let mut leaf = root;
    for _ in 1..len {
        let next = graph.create_node();
        graph.add_parent(next, leaf).unwrap();
        leaf = next;
    }
    (graph, root, leaf, width)
}

/// A root with `fanout` children, each holding one integer listener that
/// bumps the shared counter.
fn star(fanout: u32) -> (StyleGraph, NodeId, Atom, Rc<Cell<u64>>) {
    let mut graph = StyleGraph::new();
    let width = graph.atom("width");
    let root = graph.create_node();
    graph.create_int(root, width, 0).unwrap();
    let hits = Rc::new(Cell::new(0_u64));
    for _ in 0..fanout {
        let child = graph.create_node();
        graph.add_parent(child, root).unwrap();
        let tick = Rc::clone(&hits);
        graph
            .bind_int(child, width, move |_| tick.set(tick.get() + 1))
            .unwrap();
    }
    (graph, root, width, hits)
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade/resolve");

    group.bench_function("local", |b| {
        let (graph, _, leaf, width) = chain(1);
        b.iter(|| black_box(graph.get_int(leaf, width).unwrap()))
    });

    for len in [4_u32, 16, 64] {
        group.bench_function(BenchmarkId::new("inherited", len), |b| {
            let (graph, _, leaf, width) = chain(len);
            b.iter(|| black_box(graph.get_int(leaf, width).unwrap()))
        });
    }

    group.bench_function("diamond", |b| {
        let mut graph = StyleGraph::new();
        let width = graph.atom("width");
        let top = graph.create_node();
        let left = graph.create_node();
        let right = graph.create_node();
        let bottom = graph.create_node();
        graph.add_parent(left, top).unwrap();
        graph.add_parent(right, top).unwrap();
        graph.add_parent(bottom, left).unwrap();
        graph.add_parent(bottom, right).unwrap();
        graph.create_int(top, width, 7).unwrap();
        b.iter(|| black_box(graph.get_int(bottom, width).unwrap()))
    });

    group.finish();
}

fn bench_mutate(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade/mutate");

    group.bench_function("set_existing", |b| {
        let (mut graph, root, _, width) = chain(1);
        let mut value = 0_i64;
        b.iter(|| {
            value += 1;
            graph.set_int(root, width, value).unwrap();
        })
    });

    group.bench_function("set_materializing", |b| {
        b.iter_batched(
            || {
                let mut graph = StyleGraph::new();
                let width = graph.atom("width");
                let node = graph.create_node();
                (graph, node, width)
            },
            |(mut graph, node, width)| {
                graph.set_int(node, width, 42).unwrap();
                black_box(graph);
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_notify(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade/notify");

    for fanout in [8_u32, 64, 512] {
        group.bench_function(BenchmarkId::new("fanout", fanout), |b| {
            let (mut graph, root, width, hits) = star(fanout);
            let mut value = 0_i64;
            b.iter(|| {
                value += 1;
                graph.set_int(root, width, value).unwrap();
                black_box(hits.get());
            })
        });
    }

    for len in [16_u32, 64] {
        group.bench_function(BenchmarkId::new("chain", len), |b| {
            let (mut graph, root, leaf, width) = chain(len);
            let hits = Rc::new(Cell::new(0_u64));
            let tick = Rc::clone(&hits);
            graph
                .bind_int(leaf, width, move |_| tick.set(tick.get() + 1))
                .unwrap();
            let mut value = 0_i64;
            b.iter(|| {
                value += 1;
                graph.set_int(root, width, value).unwrap();
                black_box(hits.get());
            })
        });
    }

    group.finish();
}

fn bench_transactions(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade/transaction");

    let setup = |atoms_n: usize| {
        let mut graph = StyleGraph::new();
        let node = graph.create_node();
        let atoms: Vec<Atom> = (0..atoms_n)
            .map(|i| graph.atom(&format!("prop-{i}")))
            .collect();
        let hits = Rc::new(Cell::new(0_u64));
        for &atom in &atoms {
            graph.create_int(node, atom, 0).unwrap();
            let tick = Rc::clone(&hits);
            graph
                .bind_int(node, atom, move |_| tick.set(tick.get() + 1))
                .unwrap();
        }
        (graph, node, atoms, hits)
    };

    group.bench_function("coalesced_writes/8", |b| {
        let (mut graph, node, atoms, hits) = setup(8);
        let mut value = 0_i64;
        b.iter(|| {
            value += 1;
            graph.begin(node).unwrap();
            for &atom in &atoms {
                graph.set_int(node, atom, value).unwrap();
            }
            graph.end(node).unwrap();
            black_box(hits.get());
        })
    });

    group.bench_function("unbatched_writes/8", |b| {
        let (mut graph, node, atoms, hits) = setup(8);
        let mut value = 0_i64;
        b.iter(|| {
            value += 1;
            for &atom in &atoms {
                graph.set_int(node, atom, value).unwrap();
            }
            black_box(hits.get());
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_resolve,
    bench_mutate,
    bench_notify,
    bench_transactions
);
criterion_main!(benches);
