//! Model search CLI - Evolve a compression model for a corpus.

use std::fs;
use std::path::PathBuf;
use std::process;

use model_search::{
    compute::{Corpus, evolution::EvolutionEngine},
    schema::{SearchConfig, StopCriterion},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <corpus> [config.json] [best.json]", args[0]);
        eprintln!();
        eprintln!("Evolve an order-1 context model that compresses the corpus.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  corpus       File to compress");
        eprintln!("  config.json  Search configuration (default settings if omitted)");
        eprintln!("  best.json    Where to write the best genome found");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        process::exit(1);
    }

    let corpus_path = PathBuf::from(&args[1]);
    let corpus = Corpus::from_file(&corpus_path).unwrap_or_else(|e| {
        eprintln!("Error reading corpus {}: {}", corpus_path.display(), e);
        process::exit(1);
    });

    let config: SearchConfig = match args.get(2) {
        Some(path) => {
            let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config file: {}", e);
                process::exit(1);
            });
            serde_json::from_str(&config_str).unwrap_or_else(|e| {
                eprintln!("Error parsing config: {}", e);
                process::exit(1);
            })
        }
        None => SearchConfig::default(),
    };
    let output_path = args.get(3).map(PathBuf::from);

    println!("Model Search");
    println!("============");
    println!("Corpus: {} ({} bytes)", corpus_path.display(), corpus.len());
    println!(
        "Order-0 baseline: {:.0} bytes ({:.3} bits/byte)",
        corpus.baseline_bytes(),
        corpus.order0_entropy_bits() / corpus.len().max(1) as f64
    );
    println!(
        "Alphabet: {} symbols ({:?}), population {}",
        config.model.symbols, config.model.precision, config.population.size
    );
    match config.stop {
        StopCriterion::CompressionRatio { ratio } => {
            println!("Stop at {:.3} x corpus size", ratio)
        }
        StopCriterion::BaselineRatio { ratio } => {
            println!("Stop at {:.3} x order-0 baseline", ratio)
        }
    }
    println!();

    let mut engine = EvolutionEngine::new(config, corpus).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(if e.is_integrity() { 2 } else { 1 });
    });
    println!(
        "Target: {:.0} bytes",
        engine.stop_condition().target_bytes()
    );

    let result = engine
        .run_with_callback(|progress| {
            let baseline = progress
                .baseline_ratio
                .map(|r| format!(", {:.3} x baseline", r))
                .unwrap_or_default();
            println!(
                "  Generation {}: best {:.0} bytes ({:.4} bits/byte{}), avg {:.0} bytes",
                progress.generation,
                progress.best_bytes,
                progress.bits_per_byte,
                baseline,
                progress.avg_bits / 8.0
            );
        })
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(if e.is_integrity() { 2 } else { 1 });
        });

    println!();
    println!("Result:");
    println!("  Stop reason: {:?}", result.stop_reason);
    println!("  Generations: {}", result.generations);
    println!(
        "  Best: {} bits ({:.0} bytes)",
        result.best_bits,
        result.best_bits as f64 / 8.0
    );
    println!(
        "  Evaluations: {} in {:.2}s",
        result.evaluations, result.elapsed_seconds
    );

    if let Some(path) = output_path {
        let json = serde_json::to_string_pretty(&result.best).unwrap_or_else(|e| {
            eprintln!("Error serializing genome: {}", e);
            process::exit(1);
        });
        if let Err(e) = fs::write(&path, json) {
            eprintln!("Error writing {}: {}", path.display(), e);
            process::exit(1);
        }
        println!("  Best genome written to {}", path.display());
    }
}

fn print_example_config() {
    match serde_json::to_string_pretty(&SearchConfig::default()) {
        Ok(json) => {
            println!("Example configuration (config.json):");
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            process::exit(1);
        }
    }
}
