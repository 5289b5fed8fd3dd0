use criterion::{criterion_group, criterion_main, Criterion};
use minichain_core::pow::{search, valid_proof, StopSignal};

fn bench_pow(c: &mut Criterion) {
    c.bench_function("search_difficulty_2", |b| {
        let stop = StopSignal::new();
        b.iter(|| search(0, 2, &stop).unwrap());
    });

    c.bench_function("valid_proof", |b| {
        b.iter(|| valid_proof(563, 564, 2));
    });
}

criterion_group!(benches, bench_pow);
criterion_main!(benches);
