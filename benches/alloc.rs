// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Microbenchmarks for the two pieces of bookkeeping every variant leans on:
// ring index arithmetic (advance/used/free) and the process-wide buffer
// manager's append/shrink accounting. Both run on every send/receive, so
// their cost sets a floor under every variant's throughput.
//
// Run with:
//   cargo bench --bench alloc

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

#[path = "../src/ring.rs"]
mod ring;
#[path = "../src/buffer_manager.rs"]
mod buffer_manager;

use buffer_manager::BufferManager;
use ring::RingIndices;

const CAPACITIES: &[i32] = &[1, 4, 16, 64];

fn bench_ring_advance_write_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_advance");

    for &cap in CAPACITIES {
        group.bench_with_input(BenchmarkId::from_parameter(cap), &cap, |b, &cap| {
            let mut ring = RingIndices::new(cap);
            b.iter(|| {
                ring.advance_write();
                ring.advance_read();
                black_box(ring.used())
            });
        });
    }

    group.finish();
}

fn bench_ring_is_full_is_empty(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_predicates");

    for &cap in CAPACITIES {
        group.bench_with_input(BenchmarkId::from_parameter(cap), &cap, |b, &cap| {
            let ring = RingIndices::new(cap);
            b.iter(|| black_box(ring.is_full()) || black_box(ring.is_empty()));
        });
    }

    group.finish();
}

fn bench_buffer_manager_append_shrink(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_manager");

    group.bench_function("append_then_shrink", |b| {
        let mgr = BufferManager::new();
        b.iter(|| {
            black_box(mgr.append(256));
            black_box(mgr.shrink(256));
        });
    });

    group.bench_function("current_size_read", |b| {
        let mgr = BufferManager::new();
        mgr.append(4096);
        b.iter(|| black_box(mgr.current_size()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_ring_advance_write_read,
    bench_ring_is_full_is_empty,
    bench_buffer_manager_append_shrink,
);
criterion_main!(benches);
