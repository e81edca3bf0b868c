use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hotel_booking_core::cache::{CacheConfig, ReferenceCache};
use hotel_booking_core::pricing::reservation_total;
use rand::{thread_rng, Rng};
use serde_json::json;
use std::sync::Arc;
use std::thread;

// Benchmark the pricing calculator across selection sizes
pub fn pricing_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("reservation_pricing");

    let check_in = NaiveDate::from_ymd_opt(2025, 6, 1);
    let check_out = NaiveDate::from_ymd_opt(2025, 6, 8);

    for service_count in [0, 3, 10].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(service_count),
            service_count,
            |b, &service_count| {
                let mut rng = thread_rng();
                let prices = (0..service_count)
                    .map(|_| rng.gen_range(5.0..100.0))
                    .collect::<Vec<f64>>();

                b.iter(|| {
                    black_box(reservation_total(
                        black_box(150.0),
                        check_in,
                        check_out,
                        &prices,
                    ))
                });
            },
        );
    }

    group.finish();
}

// Benchmark the reference cache under a read-heavy mix
pub fn cache_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_cache");

    group.bench_function("read_heavy_mix", |b| {
        b.iter(|| {
            let cache = Arc::new(ReferenceCache::new(CacheConfig::default()));

            // Pre-populate the listing keys
            for i in 0..16 {
                cache.store(
                    &format!("rooms:page-{}", i),
                    json!([{"id": format!("room-{}", i)}]),
                    None,
                );
            }

            let mut handles = vec![];
            for _ in 0..4 {
                let cache = Arc::clone(&cache);

                let handle = thread::spawn(move || {
                    let mut rng = thread_rng();

                    for op in 0..250 {
                        let key = format!("rooms:page-{}", rng.gen_range(0..16));
                        if op % 10 < 8 {
                            let _ = cache.get(&key);
                        } else {
                            cache.store(&key, json!([{"id": "fresh"}]), None);
                        }
                    }
                });

                handles.push(handle);
            }

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(cache.stats())
        });
    });

    group.finish();
}

criterion_group!(benches, pricing_benchmark, cache_benchmark);
criterion_main!(benches);
