use bufferpool_core::{BufferPool, MemoryBlockStorage, PageId, PoolConfig, ReplacementPolicyKind};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn sequential_scan(policy: ReplacementPolicyKind, capacity: usize, num_pages: u64) {
    let mut pool =
        BufferPool::init(MemoryBlockStorage::new(), PoolConfig::new(capacity, policy)).unwrap();
    for i in 0..num_pages {
        let handle = pool.pin(PageId::new(i)).unwrap();
        pool.unpin(&handle).unwrap();
    }
}

fn bench_sequential_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_scan");
    for policy in [
        ReplacementPolicyKind::Fifo,
        ReplacementPolicyKind::Lru,
        ReplacementPolicyKind::Clock,
    ] {
        group.bench_with_input(
            BenchmarkId::new("policy", format!("{policy:?}")),
            &policy,
            |b, &policy| b.iter(|| sequential_scan(policy, 64, 1000)),
        );
    }
    group.finish();
}

fn bench_eviction_under_pressure(c: &mut Criterion) {
    let mut group = c.benchmark_group("eviction_under_pressure");
    for policy in [
        ReplacementPolicyKind::Fifo,
        ReplacementPolicyKind::Lru,
        ReplacementPolicyKind::Clock,
    ] {
        // Working set (4x capacity) forces an eviction on almost every pin.
        group.bench_with_input(
            BenchmarkId::new("policy", format!("{policy:?}")),
            &policy,
            |b, &policy| {
                b.iter(|| {
                    let mut pool = BufferPool::init(
                        MemoryBlockStorage::new(),
                        PoolConfig::new(16, policy),
                    )
                    .unwrap();
                    for i in 0..(16 * 4) {
                        let handle = pool.pin(PageId::new(i)).unwrap();
                        pool.unpin(&handle).unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

fn bench_repeated_hits(c: &mut Criterion) {
    let mut group = c.benchmark_group("repeated_hits");
    for policy in [
        ReplacementPolicyKind::Fifo,
        ReplacementPolicyKind::Lru,
        ReplacementPolicyKind::Clock,
    ] {
        group.bench_with_input(
            BenchmarkId::new("policy", format!("{policy:?}")),
            &policy,
            |b, &policy| {
                let mut pool = BufferPool::init(
                    MemoryBlockStorage::new(),
                    PoolConfig::new(32, policy),
                )
                .unwrap();
                for i in 0..32 {
                    let handle = pool.pin(PageId::new(i)).unwrap();
                    pool.unpin(&handle).unwrap();
                }
                b.iter(|| {
                    for i in 0..32 {
                        let handle = pool.pin(PageId::new(i)).unwrap();
                        pool.unpin(&handle).unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_sequential_scan,
    bench_eviction_under_pressure,
    bench_repeated_hits
);
criterion_main!(benches);
