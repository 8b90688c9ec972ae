//! Evolutionary search for compression models.
//!
//! # Overview
//!
//! - **Initializers** (`init`): identity and corpus-statistics seeded populations
//! - **Fitness** (`fitness`): bits emitted by the adaptive coder for the corpus
//! - **Mutation** (`mutate`): bounded Gaussian, shift, switch and a composite
//! - **Selection and breeding** (`operators`): tournament and two-point crossover
//! - **Search** (`search`): the generation loop and its stop condition
//!
//! # Example
//!
//! ```rust,no_run
//! use model_search::compute::Corpus;
//! use model_search::compute::evolution::EvolutionEngine;
//! use model_search::schema::SearchConfig;
//!
//! let corpus = Corpus::from_file("corpus.txt").unwrap();
//! let mut engine = EvolutionEngine::new(SearchConfig::default(), corpus).unwrap();
//! let result = engine
//!     .run_with_callback(|progress| {
//!         println!("Generation {}: {:.0} bytes", progress.generation, progress.best_bytes);
//!     })
//!     .unwrap();
//! println!("Best: {} bits", result.best_bits);
//! ```

mod fitness;
mod genome;
mod init;
mod mutate;
mod operators;
mod search;

pub use fitness::{FitnessError, FitnessEvaluator};
pub use genome::GenomeRng;
pub use init::{IdentityInitializer, InitError, Initializer, SEED_NOISE, StatisticsInitializer};
pub use mutate::{
    BoundedGaussianMutator, MultiMutator, MutationError, Mutator, ShiftMutator, SwitchMutator,
};
pub use operators::{BreedError, TournamentSelector, TwoPointBreeder};
pub use search::{EvolutionEngine, SearchError, StopCondition};
