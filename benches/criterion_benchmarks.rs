use criterion::{black_box, criterion_group, criterion_main, Criterion};
use peercache_rs::{BloomFilter, ByteView, HashRing, LruStore, SingleFlight};

fn make_store(max_bytes: usize) -> LruStore<ByteView> {
    LruStore::new(max_bytes, None)
}

fn make_ring(nodes: usize) -> HashRing {
    let mut ring = HashRing::default();
    ring.add((0..nodes).map(|i| format!("http://10.0.0.{i}:7001")));
    ring
}

pub fn criterion_benchmark(c: &mut Criterion) {
    const STORE_BUDGET: usize = 1 << 20;

    {
        let mut group = c.benchmark_group("LRU Store");

        group.bench_function("add", |b| {
            let mut store = make_store(STORE_BUDGET);
            let mut i = 0u64;
            b.iter(|| {
                store.add(format!("key-{}", i % 10_000), ByteView::from("payload-bytes"));
                i += 1;
            });
        });

        group.bench_function("get hit", |b| {
            let mut store = make_store(STORE_BUDGET);
            for i in 0..1_000 {
                store.add(format!("key-{i}"), ByteView::from("payload-bytes"));
            }
            let mut i = 0u64;
            b.iter(|| {
                black_box(store.get(&format!("key-{}", i % 1_000)));
                i += 1;
            });
        });

        group.finish();
    }

    {
        let mut group = c.benchmark_group("Hash Ring");
        let ring = make_ring(8);

        group.bench_function("get", |b| {
            let mut i = 0u64;
            b.iter(|| {
                black_box(ring.get(&format!("key-{i}")));
                i += 1;
            });
        });

        group.finish();
    }

    {
        let mut group = c.benchmark_group("Bloom Filter");

        group.bench_function("put", |b| {
            let mut filter = BloomFilter::new(16 << 20, 5);
            let mut i = 0u64;
            b.iter(|| {
                filter.put(format!("r{i}"));
                i += 1;
            });
        });

        group.bench_function("has", |b| {
            let mut filter = BloomFilter::new(16 << 20, 5);
            for i in 0..10_000 {
                filter.put(format!("r{i}"));
            }
            let mut i = 0u64;
            b.iter(|| {
                black_box(filter.has(format!("r{}", i % 20_000)));
                i += 1;
            });
        });

        group.finish();
    }

    {
        let mut group = c.benchmark_group("Single Flight");
        let flight: SingleFlight<ByteView> = SingleFlight::new();

        group.bench_function("uncontended run", |b| {
            b.iter(|| {
                black_box(flight.run("key", || Ok(ByteView::from("value")))).ok();
            });
        });

        group.finish();
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
