//! Criterion benches for batched commits.
//!
//! The mutated index sets are deterministic across runs (LCG-based) so
//! results are comparable over time. Throughput is reported in **writes**.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use criterion::{
    criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use ssztree_schema::BasicList;
use ssztree_view::{BasicListView, TreeView, ViewStore};

const LIST_LEN: usize = 8192;

/// Deterministic "random" index set of size `k`, seeded by `seed`.
fn det_indices(k: usize, seed: u64) -> Vec<usize> {
    const A: u64 = 6_364_136_223_846_793_005;
    const C: u64 = 1_442_695_040_888_963_407;
    let mut state = seed | 1;
    (0..k)
        .map(|_| {
            state = state.wrapping_mul(A).wrapping_add(C);
            (state >> 16) as usize % LIST_LEN
        })
        .collect()
}

fn bench_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit");
    for &k in &[16usize, 256, 2048] {
        group.throughput(Throughput::Elements(k as u64));
        group.bench_with_input(BenchmarkId::new("dirty_writes", k), &k, |b, &k| {
            let values: Vec<u64> = (0..LIST_LEN as u64).collect();
            let list = BasicList::<u64, 16384>::from_elements(values).unwrap();
            let indices = det_indices(k, 0xda7a);
            b.iter_batched(
                || {
                    let store = ViewStore::with_new_pool();
                    BasicListView::<u64, 16384>::from_value(&store, &list).unwrap()
                },
                |mut view| {
                    for (n, &i) in indices.iter().enumerate() {
                        view.set(i, n as u64).unwrap();
                    }
                    view.commit().unwrap();
                    view
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_commit);
criterion_main!(benches);
