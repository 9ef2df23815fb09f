//! Benchmarks for the reactive store's hot paths.
//!
//! Benchmarks:
//! - `get` on a materialized key (cell lookup)
//! - `set` fanning out to N subscribers
//! - Deduplicated `set` (serialization + compare, no fan-out)
//!
//! Run with:
//! ```bash
//! cargo bench --bench store_bench
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use livekv::LiveStore;
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn store_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");

    group.bench_function("get_cached", |b| {
        let store = LiveStore::memory();
        let _stream = store.get::<String>("language");
        b.iter(|| black_box(store.get::<String>(black_box("language"))));
    });

    for subscribers in [1usize, 16, 256] {
        group.throughput(Throughput::Elements(subscribers as u64));
        group.bench_with_input(
            BenchmarkId::new("set_fan_out", subscribers),
            &subscribers,
            |b, &subscribers| {
                let store = LiveStore::memory();
                let stream = store.get::<u64>("counter");
                let hits = Arc::new(AtomicUsize::new(0));
                let _subs: Vec<_> = (0..subscribers)
                    .map(|_| {
                        let hits = Arc::clone(&hits);
                        stream.subscribe(move |_| {
                            hits.fetch_add(1, Ordering::Relaxed);
                        })
                    })
                    .collect();

                let mut n = 0u64;
                b.iter(|| {
                    n += 1;
                    store.set("counter", black_box(&n)).unwrap();
                });
            },
        );
    }

    group.bench_function("set_deduplicated", |b| {
        let store = LiveStore::memory();
        let _stream = store.get::<Vec<u32>>("list");
        let value: Vec<u32> = (0..64).collect();
        store.set("list", &value).unwrap();

        b.iter(|| store.set("list", black_box(&value)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, store_benchmarks);
criterion_main!(benches);
