//! Criterion benchmarks for `cts-core`.
//!
//! Measures per-symbol update cost as the context depth grows, plus sampling
//! throughput from a trained model.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cts_core::{Alphabet, PriorPolicy, SequentialPredictor, SwitchRate};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn corpus(len: usize) -> Vec<u8> {
    b"the quick brown fox jumps over the lazy dog; pack my box with five dozen liquor jugs. "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

fn predictor(depth: usize) -> SequentialPredictor<u8> {
    SequentialPredictor::new(
        Alphabet::bytes(),
        depth,
        PriorPolicy::Perks,
        SwitchRate::Decaying,
    )
    .expect("predictor")
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    let data = corpus(4096);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for depth in [0usize, 4, 8, 16] {
        group.bench_with_input(BenchmarkId::new("bytes", depth), &depth, |b, &depth| {
            b.iter(|| {
                let mut p = predictor(depth);
                for s in &data {
                    black_box(p.update(s).expect("byte symbol"));
                }
            });
        });
    }

    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict");
    let data = corpus(16_384);

    for depth in [4usize, 8] {
        let mut p = predictor(depth);
        p.update_batch(&data).expect("byte symbols");

        group.bench_with_input(BenchmarkId::new("log_prob", depth), &depth, |b, _| {
            b.iter(|| black_box(p.log_prob(black_box(&b'e')).expect("byte symbol")));
        });
        group.bench_with_input(BenchmarkId::new("distribution", depth), &depth, |b, _| {
            b.iter(|| black_box(p.predictive_distribution()));
        });
    }

    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    let mut p = predictor(8);
    p.update_batch(&corpus(16_384)).expect("byte symbols");
    group.throughput(Throughput::Elements(256));

    for rejection in [true, false] {
        group.bench_with_input(
            BenchmarkId::new("rejection", rejection),
            &rejection,
            |b, &rejection| {
                let mut rng = StdRng::seed_from_u64(7);
                b.iter(|| black_box(p.generate(256, rejection, &mut rng)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_update, bench_predict, bench_generate);
criterion_main!(benches);
