// Throughput benchmarks for predicate blocking and TF-IDF search
use blockx_core::{Blocker, Predicate, Record, RecordId, SimpleKind};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use std::collections::HashMap;

const GIVEN: [&str; 8] = [
    "Bob", "Charlie", "Meredith", "Sue", "Jimbo", "Willy", "Martha", "Kyle",
];
const FAMILY: [&str; 8] = [
    "Smith", "Jones", "Garcia", "Chen", "Miller", "Davis", "Lopez", "Wilson",
];

fn generate_records(count: usize) -> HashMap<RecordId, Record> {
    let mut rng = rand::rng();
    (0..count)
        .map(|i| {
            let name = format!(
                "{} {}",
                GIVEN[rng.random_range(0..GIVEN.len())],
                FAMILY[rng.random_range(0..FAMILY.len())]
            );
            (
                RecordId::from(i as u64),
                Record::new()
                    .with_field("name", name)
                    .with_field("age", format!("{}", rng.random_range(18..90))),
            )
        })
        .collect()
}

fn simple_predicates() -> Vec<Predicate> {
    vec![
        Predicate::simple(SimpleKind::WholeField, "name"),
        Predicate::simple(SimpleKind::Token, "name"),
        Predicate::simple(SimpleKind::CommonFourGram, "name"),
        Predicate::simple(SimpleKind::SameThreeCharStart, "name"),
    ]
}

fn benchmark_blocking(c: &mut Criterion) {
    let mut group = c.benchmark_group("block");

    for size in [100, 1000, 10000].iter() {
        let records = generate_records(*size);
        let blocker = Blocker::new(simple_predicates()).unwrap();

        group.bench_with_input(BenchmarkId::new("simple", size), size, |b, _| {
            b.iter(|| {
                let pairs = blocker.block(black_box(&records)).count();
                black_box(pairs)
            });
        });
    }

    group.finish();
}

fn benchmark_par_blocking(c: &mut Criterion) {
    let mut group = c.benchmark_group("par_block");

    let records = generate_records(10000);
    let blocker = Blocker::new(simple_predicates()).unwrap();

    group.bench_function("simple_10k", |b| {
        b.iter(|| black_box(blocker.par_block(black_box(&records))).len());
    });

    group.finish();
}

fn benchmark_tfidf(c: &mut Criterion) {
    let mut group = c.benchmark_group("tfidf");

    let records = generate_records(5000);
    let blocker = Blocker::new(vec![Predicate::tfidf_search(0.6, "name").unwrap()]).unwrap();
    blocker.index_all(&records);

    group.bench_function("search_5k", |b| {
        b.iter(|| {
            let pairs = blocker.block(black_box(&records)).count();
            black_box(pairs)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_blocking,
    benchmark_par_blocking,
    benchmark_tfidf
);
criterion_main!(benches);
