//! Throughput Benchmark for shardkv
//!
//! Measures the storage engine under point-write, point-read, and
//! hash-field workloads, plus the effect of LRU tracking on the hot path.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use shardkv::storage::{Database, DatabaseOptions, KeyHasher};
use std::sync::Arc;

fn plain_db() -> Arc<Database> {
    Arc::new(Database::new("bench", DatabaseOptions::default()))
}

fn lru_db() -> Arc<Database> {
    Arc::new(Database::new(
        "bench",
        DatabaseOptions {
            shard_count: 256,
            hasher: KeyHasher::Sum,
            max_memory: Some(1024 * 1024 * 1024),
            track_lru: true,
        },
    ))
}

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let db = plain_db();

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i));
            db.set(key, Bytes::from("small_value"), None);
            i += 1;
        });
    });

    group.bench_function("set_medium", |b| {
        let mut i = 0u64;
        let value = Bytes::from("x".repeat(1024)); // 1KB value
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i));
            db.set(key, value.clone(), None);
            i += 1;
        });
    });

    group.bench_function("set_lru_tracked", |b| {
        let db = lru_db();
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i));
            db.set(key, Bytes::from("small_value"), None);
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let db = plain_db();

    // Pre-populate with data
    for i in 0..100_000 {
        db.set(
            Bytes::from(format!("key:{}", i)),
            Bytes::from(format!("value:{}", i)),
            None,
        );
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i % 100_000));
            black_box(db.get(&key).unwrap());
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("missing:{}", i));
            black_box(db.get(&key).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark hash-field operations
fn bench_hash(c: &mut Criterion) {
    let db = plain_db();

    for i in 0..10_000 {
        db.hset(
            Bytes::from(format!("user:{}", i)),
            vec![
                (Bytes::from("name"), Bytes::from("ann")),
                (Bytes::from("city"), Bytes::from("oslo")),
            ],
        )
        .unwrap();
    }

    let mut group = c.benchmark_group("hash");
    group.throughput(Throughput::Elements(1));

    group.bench_function("hset_two_fields", |b| {
        let mut i = 0u64;
        b.iter(|| {
            db.hset(
                Bytes::from(format!("bench:{}", i)),
                vec![
                    (Bytes::from("name"), Bytes::from("ann")),
                    (Bytes::from("city"), Bytes::from("oslo")),
                ],
            )
            .unwrap();
            i += 1;
        });
    });

    group.bench_function("hget_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("user:{}", i % 10_000));
            black_box(db.hget(&key, &Bytes::from("name")).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark concurrent mixed workload
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("mixed_8_threads", |b| {
        b.iter(|| {
            let db = plain_db();
            let mut handles = Vec::new();
            for t in 0..8 {
                let db = Arc::clone(&db);
                handles.push(std::thread::spawn(move || {
                    for i in 0..125 {
                        let key = Bytes::from(format!("key:{}:{}", t, i));
                        db.set(key.clone(), Bytes::from("value"), None);
                        black_box(db.get(&key).unwrap());
                    }
                }));
            }
            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_set, bench_get, bench_hash, bench_concurrent);
criterion_main!(benches);
