//! Benchmarks for fitness evaluation.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use model_search::{
    compute::{Corpus, SYMBOLS, evolution::FitnessEvaluator},
    schema::{ModelConfig, Precision},
};

fn corpus(len: usize) -> Corpus {
    let text = b"It was the best of times, it was the worst of times, it was the age of wisdom, ";
    Corpus::from(text.iter().copied().cycle().take(len).collect::<Vec<_>>())
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for len in [1 << 10, 1 << 14, 1 << 16] {
        let corpus = corpus(len);
        let genome = corpus.transition_genome(SYMBOLS, Precision::F32, (0.0, 1.0));
        let evaluator = FitnessEvaluator::new(corpus, &ModelConfig::default())
            .expect("corpus fits the default alphabet");

        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| evaluator.evaluate(black_box(&genome)));
        });
    }

    group.finish();
}

fn bench_verified(c: &mut Criterion) {
    let corpus = corpus(1 << 14);
    let genome = corpus.transition_genome(SYMBOLS, Precision::F32, (0.0, 1.0));
    let config = ModelConfig {
        verify: true,
        ..ModelConfig::default()
    };
    let evaluator = FitnessEvaluator::new(corpus, &config).expect("corpus fits the default alphabet");

    c.bench_function("evaluate_verified_16k", |b| {
        b.iter(|| evaluator.evaluate(black_box(&genome)));
    });
}

criterion_group!(benches, bench_evaluate, bench_verified);
criterion_main!(benches);
