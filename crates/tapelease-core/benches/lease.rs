//! Criterion benchmarks for lease throughput.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rayon::prelude::*;

use tapelease_core::{ResourcePool, ScopedLease};

fn bench_uncontended(c: &mut Criterion) {
    let pool = ResourcePool::from_clone(&0u64, 1).unwrap();
    c.bench_function("lease_acquire_release", |b| {
        b.iter(|| {
            let mut lease = ScopedLease::acquire(&pool).unwrap();
            *lease += 1;
        });
    });
}

fn bench_contended(c: &mut Criterion) {
    let sizes: Vec<usize> = vec![1, 2, 4, 8];

    let mut group = c.benchmark_group("ParallelLeases");
    for &size in &sizes {
        let pool = ResourcePool::from_clone(&0u64, size).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                (0..1_000u64).into_par_iter().for_each(|i| {
                    let mut lease = ScopedLease::acquire(&pool).unwrap();
                    *lease = lease.wrapping_add(i);
                });
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_uncontended, bench_contended);
criterion_main!(benches);
