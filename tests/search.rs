use std::io::Write;

use model_search::compute::evolution::{EvolutionEngine, SearchError};
use model_search::compute::{AdaptiveCoder, ContextModel, Corpus};
use model_search::schema::{
    Genome, InitializerKind, ModelConfig, PopulationConfig, Precision, SearchConfig,
    StopCriterion, StopReason,
};

/// Short repetitive text over a 16-symbol alphabet.
fn corpus() -> Corpus {
    let text = b"abcab dcba abcd efab cdef abac daba ";
    Corpus::from(
        text.iter()
            .cycle()
            .take(600)
            .map(|b| b % 16)
            .collect::<Vec<_>>(),
    )
}

/// Create a minimal search config for fast testing
fn test_config(generations: usize) -> SearchConfig {
    SearchConfig {
        population: PopulationConfig {
            size: 12,
            max_generations: Some(generations),
        },
        model: ModelConfig {
            symbols: 16,
            precision: Precision::F64,
            verify: true,
            ..ModelConfig::default()
        },
        stop: StopCriterion::CompressionRatio { ratio: 0.001 },
        random_seed: Some(7),
        ..SearchConfig::default()
    }
}

#[test]
fn test_search_improves_monotonically() {
    let mut engine = EvolutionEngine::new(test_config(5), corpus()).unwrap();
    let mut generations = Vec::new();
    let result = engine
        .run_with_callback(|progress| {
            println!(
                "Generation {}: best {} bits, avg {:.1} bits",
                progress.generation, progress.best_bits, progress.avg_bits
            );
            generations.push(progress.best_bits);
        })
        .unwrap();

    assert_eq!(result.stop_reason, StopReason::MaxGenerations);
    assert_eq!(result.generations, 5);
    assert_eq!(generations.len(), 6);
    assert!(generations.windows(2).all(|w| w[1] <= w[0]));
    assert_eq!(result.history.best_bits, generations);
    assert!(result.evaluations >= 12);
}

#[test]
fn test_statistics_seed_compresses() {
    let mut config = test_config(2);
    config.initializer = InitializerKind::Statistics;
    let mut engine = EvolutionEngine::new(config, corpus()).unwrap();
    let result = engine.run().unwrap();

    // Better than four bits per symbol, the cost of a flat 16-symbol model.
    assert!(result.best_bits < 600 * 4, "{} bits", result.best_bits);
}

#[test]
fn test_best_genome_decodes_the_corpus() {
    let corpus = corpus();
    let mut engine = EvolutionEngine::new(test_config(2), corpus.clone()).unwrap();
    let result = engine.run().unwrap();

    let model = ContextModel::from_genome(&result.best, 16, true).unwrap();
    let coder = AdaptiveCoder::new(16);
    let mut compressed = Vec::new();
    let bits = coder
        .encode(corpus.symbols(), &model, &mut compressed)
        .unwrap();
    assert_eq!(bits, result.best_bits);
    assert_eq!(compressed.len() as u64, bits.div_ceil(8));

    let mut decoded = Vec::new();
    coder
        .decode(&compressed, &model, |symbol| {
            decoded.push(symbol as u8);
            decoded.len() == corpus.len()
        })
        .unwrap();
    assert_eq!(decoded, corpus.as_bytes());
}

#[test]
fn test_reachable_target_stops_at_generation_zero() {
    let mut config = test_config(50);
    config.stop = StopCriterion::CompressionRatio { ratio: 10.0 };
    let mut engine = EvolutionEngine::new(config, corpus()).unwrap();
    let result = engine.run().unwrap();

    assert_eq!(result.stop_reason, StopReason::TargetReached);
    assert_eq!(result.generations, 0);
}

#[test]
fn test_corpus_file_and_saved_genome() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(corpus().as_bytes()).unwrap();
    let corpus = Corpus::from_file(file.path()).unwrap();

    let mut engine = EvolutionEngine::new(test_config(1), corpus).unwrap();
    let result = engine.run().unwrap();

    let json = serde_json::to_string(&result.best).unwrap();
    let restored: Genome = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, result.best);
    assert_eq!(restored.precision(), Precision::F64);
}

#[test]
fn test_corpus_outside_alphabet_is_rejected() {
    let corpus = Corpus::from(vec![1u8, 2, 255]);
    assert!(matches!(
        EvolutionEngine::new(test_config(1), corpus),
        Err(SearchError::Fitness(_))
    ));
}
