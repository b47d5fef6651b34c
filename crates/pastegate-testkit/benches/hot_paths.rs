//! Benchmarks for the per-request hot paths: ephemeral store reads and
//! render-cache hits.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pastegate_core::{Paste, PasteId, SystemClock};
use pastegate_render::{LanguageRegistry, RenderCache, RenderCacheConfig};
use pastegate_store::EphemeralStore;
use pastegate_testkit::CountingFormatter;

fn ephemeral_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("ephemeral_store");
    for size in [100usize, 10_000] {
        let store = EphemeralStore::new(Arc::new(SystemClock));
        for i in 0..size {
            store.put(format!("key-{i}"), i, Duration::from_secs(300));
        }
        let hit_key = format!("key-{}", size / 2);

        group.bench_with_input(BenchmarkId::new("get_hit", size), &hit_key, |b, key| {
            b.iter(|| black_box(store.get(key)))
        });
        group.bench_with_input(BenchmarkId::new("put", size), &size, |b, &size| {
            let mut i = 0usize;
            b.iter(|| {
                store.put(format!("key-{}", i % size), i, Duration::from_secs(300));
                i += 1;
            })
        });
    }
    group.finish();
}

fn render_cache_hit(c: &mut Criterion) {
    let rt = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(rt) => rt,
        Err(e) => panic!("tokio runtime: {e}"),
    };
    let cache = match RenderCache::new(
        RenderCacheConfig::default(),
        Arc::new(CountingFormatter::new()),
        Arc::new(LanguageRegistry::builtin()),
        Arc::new(SystemClock),
    ) {
        Ok(cache) => cache,
        Err(e) => panic!("render cache: {e}"),
    };
    let paste = Paste {
        id: PasteId::new("bench").unwrap_or_else(|e| panic!("{e}")),
        title: None,
        language: "rust".into(),
        body: Bytes::from_static(b"fn main() { println!(\"hi\"); }"),
        encrypted: false,
        expiration: None,
        created_at: 0,
        modified_at: 0,
    };
    rt.block_on(cache.render(&paste));

    c.bench_function("render_cache_hit", |b| {
        b.iter(|| black_box(rt.block_on(cache.render(&paste))))
    });
}

criterion_group!(benches, ephemeral_store, render_cache_hit);
criterion_main!(benches);
