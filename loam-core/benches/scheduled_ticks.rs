#![allow(missing_docs)]
//! Benchmarks for the scheduled tick queue.

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use loam_core::ticks::ScheduledTickQueue;
use loam_utils::BlockPos;

/// Fills a queue with `count` ticks spread over the next 20 ticks.
fn filled_queue(count: i32) -> ScheduledTickQueue {
    let mut queue = ScheduledTickQueue::new();
    for i in 0..count {
        let pos = BlockPos::new(i % 64, 64, i / 64);
        queue.schedule(pos, 1, 0, u64::from((i % 20) as u32) + 1);
    }
    queue
}

fn bench_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule");

    for count in [1_000, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("ticks", count), &count, |b, &count| {
            b.iter(|| black_box(filled_queue(black_box(count))));
        });
    }

    // Every request supersedes the previous one for the same key
    group.bench_function("reschedule_same_key", |b| {
        let pos = BlockPos::new(0, 64, 0);
        b.iter(|| {
            let mut queue = ScheduledTickQueue::new();
            for delay in 1..=1_000 {
                queue.schedule(pos, 1, 0, black_box(delay));
            }
            black_box(queue);
        });
    });

    group.finish();
}

fn bench_drain_due(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain_due");

    for count in [1_000, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("ticks", count), &count, |b, &count| {
            b.iter_batched(
                || filled_queue(count),
                |mut queue| {
                    for tick in 1..=20 {
                        black_box(queue.drain_due(tick));
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_schedule, bench_drain_due);
criterion_main!(benches);
