use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use std::time::Instant;

use dns_resolver::cache::Cache;
use dns_types::protocol::types::test_util::*;
use dns_types::protocol::types::*;

#[allow(non_snake_case)]
fn bench__insert__unique(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert/unique");
    for size in [1, 100, 1000] {
        let entries = make_entries(size, 300);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &entries, |b, entries| {
            b.iter(|| build_cache(entries));
        });
    }
    group.finish();
}

#[allow(non_snake_case)]
fn bench__insert__duplicate(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert/duplicate");
    for size in [1, 100, 1000] {
        let entry = (
            question("www.example.com.", RecordType::A),
            a_record("www.example.com.", [1, 1, 1, 1]),
        );
        let entries = vec![entry; size];

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &entries, |b, entries| {
            b.iter(|| build_cache(entries));
        });
    }
    group.finish();
}

#[allow(non_snake_case)]
fn bench__get__hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("get/hit");
    for size in [1, 100, 1000] {
        let entries = make_entries(size, 300);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &entries, |b, entries| {
            b.iter_batched(
                || build_cache(entries),
                |mut cache| {
                    let now = Instant::now();
                    for (question, _) in entries {
                        cache.get(question, now);
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

#[allow(non_snake_case)]
fn bench__get__expired(c: &mut Criterion) {
    let mut group = c.benchmark_group("get/expired");
    for size in [1, 100, 1000] {
        let entries = make_entries(size, 0);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &entries, |b, entries| {
            b.iter_batched(
                || build_cache(entries),
                |mut cache| {
                    let now = Instant::now();
                    for (question, _) in entries {
                        cache.get(question, now);
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

#[allow(non_snake_case)]
fn bench__get__miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("get/miss");
    for size in [1, 100, 1000] {
        let entries = make_entries(size, 300);
        let miss = question(
            "name.which.is.unlikely.to.coincidentally.be.generated.",
            RecordType::A,
        );
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &entries, |b, entries| {
            b.iter_batched(
                || build_cache(entries),
                |mut cache| {
                    let now = Instant::now();
                    for _ in entries {
                        cache.get(&miss, now);
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn build_cache(entries: &[(Question, ResourceRecord)]) -> Cache {
    let now = Instant::now();
    let mut cache = Cache::new();
    for (question, rr) in entries {
        cache.insert(question.clone(), rr.clone(), now);
    }
    cache
}

fn make_entries(size: usize, ttl: u32) -> Vec<(Question, ResourceRecord)> {
    let mut entries = Vec::with_capacity(size);

    for i in 0..size {
        let name = format!("www-{i:?}.example.com.");
        let mut rr = a_record(&name, [1, 1, 1, 1]);
        rr.ttl = ttl;
        entries.push((question(&name, RecordType::A), rr));
    }

    entries
}

criterion_group!(
    benches,
    bench__insert__unique,
    bench__insert__duplicate,
    bench__get__hit,
    bench__get__expired,
    bench__get__miss,
);
criterion_main!(benches);
