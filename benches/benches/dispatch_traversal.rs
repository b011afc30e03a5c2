// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use trellis_dispatch::engine::{Engine, Step, handler};
use trellis_dispatch::host::{HostAdapter, RawEvent};
use trellis_dispatch::types::Signal;

/// Host over a single parent chain: node `n`'s parent is `n - 1`, node 1 is
/// the root.
struct ChainHost {
    len: u32,
}

impl HostAdapter for ChainHost {
    type Node = u32;
    type Subscription = ();

    fn contains(&self, node: u32) -> bool {
        (1..=self.len).contains(&node)
    }

    fn parent_of(&self, node: u32) -> Option<u32> {
        (node > 1).then(|| node - 1)
    }

    fn subscribe(&mut self, _node: u32, _raw_type: &str) -> Self::Subscription {}
}

fn engine_with_handlers(depth: u32, event_type: &str) -> (Engine<ChainHost>, Rc<Cell<u64>>) {
    let mut engine = Engine::new(ChainHost { len: depth });
    let hits = Rc::new(Cell::new(0_u64));
    for node in 1..=depth {
        let hits = Rc::clone(&hits);
        let h = handler(move |_: &mut Engine<ChainHost>, _: &Step<u32>| {
            hits.set(hits.get() + 1);
            Signal::Continue
        });
        engine.register(node, event_type, &h, false).unwrap();
    }
    (engine, hits)
}

fn bench_full_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_traversal");
    for depth in [4_u32, 16, 64] {
        let (mut engine, hits) = engine_with_handlers(depth, "press");
        group.throughput(Throughput::Elements(u64::from(depth)));
        group.bench_function(format!("depth_{depth}"), |b| {
            b.iter(|| {
                let outcome = engine
                    .dispatch(black_box(RawEvent::new("press", depth)))
                    .unwrap();
                black_box(outcome)
            });
        });
        black_box(hits.get());
    }
    group.finish();
}

fn bench_enter_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("enter_derivation");
    for depth in [4_u32, 16, 64] {
        let (mut engine, hits) = engine_with_handlers(depth, "enter");
        group.throughput(Throughput::Elements(u64::from(depth)));
        group.bench_function(format!("depth_{depth}"), |b| {
            b.iter(|| {
                // Entering from outside derives one event per boundary.
                let raw = RawEvent::new("pointerOver", depth).non_bubbling();
                let outcome = engine.dispatch(black_box(raw)).unwrap();
                black_box(outcome)
            });
        });
        black_box(hits.get());
    }
    group.finish();
}

fn bench_register_and_teardown(c: &mut Criterion) {
    let mut group = c.benchmark_group("register_teardown");
    for count in [16_u32, 256] {
        group.throughput(Throughput::Elements(u64::from(count)));
        group.bench_function(format!("handlers_{count}"), |b| {
            b.iter_batched(
                || Engine::new(ChainHost { len: count }),
                |mut engine| {
                    for node in 1..=count {
                        let h = handler(|_: &mut Engine<ChainHost>, _: &Step<u32>| {
                            Signal::Continue
                        });
                        engine.register(node, "press", &h, false).unwrap();
                    }
                    engine.teardown(1);
                    black_box(engine)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_full_traversal,
    bench_enter_derivation,
    bench_register_and_teardown
);
criterion_main!(benches);
