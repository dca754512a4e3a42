use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tessera::config::StoreConfig;
use tessera::core::{Id, Term};
use tessera::storage::layout::Layout;
use tessera::store::Store;

fn bench_select_index(c: &mut Criterion) {
    let quad_patterns: Vec<Vec<Option<Id>>> = (0u64..16)
        .map(|mask| (0..4).map(|slot| (mask & (1 << slot) != 0).then(|| Id::from_u64(slot + 1))).collect())
        .collect();

    c.bench_function("select_index_all_quad_shapes", |b| {
        b.iter(|| {
            for pattern in &quad_patterns {
                black_box(Layout::Quads.select_index(pattern).expect("covered shape"));
            }
        })
    });

    c.bench_function("encode_key_all_quad_indexes", |b| {
        let ids = [Id::from_u64(1), Id::from_u64(2), Id::from_u64(3), Id::from_u64(4)];
        b.iter(|| {
            for index in Layout::Quads.indexes() {
                black_box(index.encode_key(&ids).expect("quad arity"));
            }
        })
    });
}

fn bench_match_pattern(c: &mut Criterion) {
    let store = Store::open(StoreConfig::default()).expect("in-memory store");
    let statements: Vec<Vec<Term>> = (0..5_000)
        .map(|i| {
            vec![
                Term::iri(format!("http://example.org/sensor/{}", i % 100)),
                Term::iri(format!("http://example.org/property/{}", i % 10)),
                Term::literal(i.to_string()),
            ]
        })
        .collect();
    store.add_statements("bench", &statements).expect("load");

    let subject = Some(Term::iri("http://example.org/sensor/7"));
    let predicate = Some(Term::iri("http://example.org/property/3"));
    c.bench_function("match_subject", |b| {
        b.iter(|| black_box(store.match_pattern(&[subject.clone(), None, None]).expect("match")))
    });
    c.bench_function("match_predicate", |b| {
        b.iter(|| black_box(store.match_pattern(&[None, predicate.clone(), None]).expect("match")))
    });
}

criterion_group!(benches, bench_select_index, bench_match_pattern);
criterion_main!(benches);
