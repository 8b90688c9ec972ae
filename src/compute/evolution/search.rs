//! The genetic search over model genomes.

use std::time::Instant;

use rayon::prelude::*;

use crate::compute::{Corpus, IntegrityError};
use crate::schema::{
    ConfigError, Genome, InitializerKind, SearchConfig, SearchHistory, SearchProgress,
    SearchResult, StopCriterion, StopReason,
};

use super::fitness::{FitnessError, FitnessEvaluator};
use super::genome::GenomeRng;
use super::init::{IdentityInitializer, InitError, Initializer, StatisticsInitializer};
use super::mutate::{
    BoundedGaussianMutator, MultiMutator, MutationError, Mutator, ShiftMutator, SwitchMutator,
};
use super::operators::{BreedError, TournamentSelector, TwoPointBreeder};

/// Relative slack on the stop target so that exact boundaries survive
/// floating-point rounding.
const STOP_TOLERANCE: f64 = 1e-9;

/// Search errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("initialization failed: {0}")]
    Init(#[from] InitError),
    #[error("mutation failed: {0}")]
    Mutation(#[from] MutationError),
    #[error("breeding failed: {0}")]
    Breed(#[from] BreedError),
    #[error("fitness evaluation failed: {0}")]
    Fitness(FitnessError),
    #[error("integrity violation: {0}")]
    Integrity(IntegrityError),
    #[error("corpus is empty")]
    EmptyCorpus,
    #[error("population is empty; call initialize first")]
    EmptyPopulation,
}

impl SearchError {
    /// Integrity violations are fatal: the model or coder is broken.
    pub fn is_integrity(&self) -> bool {
        matches!(self, SearchError::Integrity(_))
    }
}

impl From<FitnessError> for SearchError {
    fn from(error: FitnessError) -> Self {
        match error {
            FitnessError::Integrity(e) => SearchError::Integrity(e),
            other => SearchError::Fitness(other),
        }
    }
}

/// Stop predicate bound to a corpus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopCondition {
    criterion: StopCriterion,
    corpus_len: usize,
    baseline_bytes: f64,
}

impl StopCondition {
    pub fn new(criterion: StopCriterion, corpus: &Corpus) -> Self {
        Self {
            criterion,
            corpus_len: corpus.len(),
            baseline_bytes: corpus.baseline_bytes(),
        }
    }

    /// Encoded size in bytes at or below which the search stops.
    pub fn target_bytes(&self) -> f64 {
        match self.criterion {
            StopCriterion::CompressionRatio { ratio } => ratio * self.corpus_len as f64,
            StopCriterion::BaselineRatio { ratio } => ratio * self.baseline_bytes,
        }
    }

    /// Whether an encoding of `bits` bits meets the target (inclusive).
    pub fn is_met(&self, bits: u64) -> bool {
        let bytes = bits as f64 / 8.0;
        bytes <= self.target_bytes() * (1.0 + STOP_TOLERANCE)
    }

    /// Whether `genome` has been scored and meets the target.
    pub fn is_met_by(&self, genome: &Genome) -> bool {
        genome.score().is_some_and(|bits| self.is_met(bits as u64))
    }
}

/// Evolution engine that runs the search.
///
/// One generation: every member of the scored population may breed (two
/// tournament-selected parents, two children) and may add a mutated copy of
/// itself; the new genomes are evaluated, everything is sorted by size and
/// the population is cut back to its configured size.
pub struct EvolutionEngine {
    config: SearchConfig,
    rng: GenomeRng,
    evaluator: FitnessEvaluator,
    initializer: Box<dyn Initializer>,
    mutator: Box<dyn Mutator>,
    selector: TournamentSelector,
    breeder: TwoPointBreeder,
    stop: StopCondition,
    population: Vec<Genome>,
    generation: usize,
    evaluations: u64,
    history: SearchHistory,
}

impl EvolutionEngine {
    /// Create a new evolution engine over `corpus`.
    pub fn new(config: SearchConfig, corpus: Corpus) -> Result<Self, SearchError> {
        config.validate()?;
        if corpus.is_empty() {
            return Err(SearchError::EmptyCorpus);
        }

        let symbols = config.model.symbols;
        let initializer: Box<dyn Initializer> = match config.initializer {
            InitializerKind::Identity => Box::new(IdentityInitializer::new(symbols)),
            InitializerKind::Statistics => Box::new(StatisticsInitializer::new(symbols)),
        };
        let mutator = Box::new(build_mutator(&config)?);
        let selector = TournamentSelector::new(
            config.selection.elite_probability,
            config.selection.contestants,
        );
        let stop = StopCondition::new(config.stop, &corpus);
        let evaluator = FitnessEvaluator::new(corpus, &config.model)?;

        let seed = config.random_seed.unwrap_or_else(rand::random);
        log::info!(
            "model search: {} bytes, {} symbols, population {}, seed {}",
            evaluator.corpus().len(),
            symbols,
            config.population.size,
            seed
        );

        Ok(Self {
            rng: GenomeRng::new(seed),
            evaluator,
            initializer,
            mutator,
            selector,
            breeder: TwoPointBreeder,
            stop,
            population: Vec::new(),
            generation: 0,
            evaluations: 0,
            history: SearchHistory::default(),
            config,
        })
    }

    /// Replace the population initializer.
    pub fn with_initializer(mut self, initializer: Box<dyn Initializer>) -> Self {
        self.initializer = initializer;
        self
    }

    /// Replace the mutator.
    pub fn with_mutator(mut self, mutator: Box<dyn Mutator>) -> Self {
        self.mutator = mutator;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn stop_condition(&self) -> &StopCondition {
        &self.stop
    }

    pub fn population(&self) -> &[Genome] {
        &self.population
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    /// The genome handed to the initializer.
    ///
    /// The statistics initializer starts from the corpus's transition
    /// frequencies; the identity initializer only needs the shape and bounds.
    pub fn template(&self) -> Genome {
        let model = &self.config.model;
        match self.config.initializer {
            InitializerKind::Statistics => self.evaluator.corpus().transition_genome(
                model.symbols,
                model.precision,
                model.gene_bounds,
            ),
            InitializerKind::Identity => {
                Genome::filled(model.precision, model.genome_len(), 0.0, model.gene_bounds)
            }
        }
    }

    /// Build and evaluate the initial population from `template`.
    pub fn initialize(&mut self, template: &Genome) -> Result<(), SearchError> {
        self.population = self.initializer.init_population(
            template,
            self.config.population.size,
            &mut self.rng,
        )?;
        self.generation = 0;
        self.evaluations = 0;
        self.history = SearchHistory::default();
        log::debug!(
            "{} built {} genomes",
            self.initializer.name(),
            self.population.len()
        );

        self.evaluate_population()?;
        self.record();
        Ok(())
    }

    /// Score every unscored genome and sort the population, best first.
    fn evaluate_population(&mut self) -> Result<(), SearchError> {
        let evaluator = &self.evaluator;
        let score = |genome: &mut Genome| -> Result<(), FitnessError> {
            if genome.score().is_none() {
                let bits = evaluator.evaluate(genome)?;
                genome.set_score(bits as f64);
            }
            Ok(())
        };

        let pending = self.population.iter().filter(|g| g.score().is_none()).count();
        if self.config.parallel {
            self.population.par_iter_mut().try_for_each(score)?;
        } else {
            self.population.iter_mut().try_for_each(score)?;
        }
        self.evaluations += pending as u64;

        self.population
            .sort_by(|a, b| a.rank_score().total_cmp(&b.rank_score()));
        Ok(())
    }

    /// Run a single generation step.
    pub fn step_generation(&mut self) -> Result<(), SearchError> {
        if self.population.is_empty() {
            return Err(SearchError::EmptyPopulation);
        }
        let size = self.config.population.size;
        let scored = self.population.len().min(size);

        let mut offspring = Vec::new();
        for i in 0..scored {
            if self.rng.chance(self.config.breeding.probability) {
                let parents = &self.population[..scored];
                let a = self.selector.select_index(parents, &mut self.rng);
                let b = self.selector.select_index(parents, &mut self.rng);
                let (c, d) = self.breeder.breed(&parents[a], &parents[b], &mut self.rng)?;
                offspring.push(c);
                offspring.push(d);
            }
            if self.rng.chance(self.config.mutation.probability) {
                offspring.push(self.mutator.mutate(&self.population[i], &mut self.rng)?);
            }
        }

        log::debug!(
            "generation {}: {} offspring",
            self.generation + 1,
            offspring.len()
        );
        self.population.extend(offspring);
        self.evaluate_population()?;
        self.population.truncate(size);
        self.generation += 1;
        self.record();
        Ok(())
    }

    fn record(&mut self) {
        if let Some(progress) = self.progress() {
            self.history.push(&progress);
        }
    }

    /// The best genome of the current population.
    pub fn best(&self) -> Option<&Genome> {
        self.population.first()
    }

    /// Get current progress, once the population has been evaluated.
    pub fn progress(&self) -> Option<SearchProgress> {
        let best_bits = self.best()?.score()? as u64;
        let best_bytes = best_bits as f64 / 8.0;
        let corpus = self.evaluator.corpus();
        let baseline = corpus.baseline_bytes();
        let scores: Vec<f64> = self.population.iter().filter_map(Genome::score).collect();
        let avg_bits = scores.iter().sum::<f64>() / scores.len().max(1) as f64;

        Some(SearchProgress {
            generation: self.generation,
            best_bits,
            best_bytes,
            bits_per_byte: best_bits as f64 / corpus.len().max(1) as f64,
            baseline_ratio: (baseline > 0.0).then(|| best_bytes / baseline),
            avg_bits,
            population: self.population.len(),
            evaluations: self.evaluations,
        })
    }

    /// Run generations until `done` holds for the best genome or the
    /// generation cap is reached. `done` is checked before every generation.
    pub fn optimize_until<P, F>(&mut self, mut done: P, mut callback: F) -> Result<StopReason, SearchError>
    where
        P: FnMut(&Genome) -> bool,
        F: FnMut(&SearchProgress),
    {
        loop {
            let best = self.best().ok_or(SearchError::EmptyPopulation)?;
            if done(best) {
                return Ok(StopReason::TargetReached);
            }
            if let Some(max) = self.config.population.max_generations
                && self.generation >= max
            {
                return Ok(StopReason::MaxGenerations);
            }

            self.step_generation()?;

            if let Some(progress) = self.progress() {
                log::info!(
                    "generation {}: best {:.0} bytes ({:.4} bits/byte), average {:.0} bytes",
                    progress.generation,
                    progress.best_bytes,
                    progress.bits_per_byte,
                    progress.avg_bits / 8.0
                );
                callback(&progress);
            }
        }
    }

    /// Initialize, then search until the configured stop criterion holds.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> Result<SearchResult, SearchError>
    where
        F: FnMut(&SearchProgress),
    {
        let start_time = Instant::now();

        let template = self.template();
        self.initialize(&template)?;
        if let Some(progress) = self.progress() {
            callback(&progress);
        }

        let stop = self.stop;
        let stop_reason = self.optimize_until(|best| stop.is_met_by(best), &mut callback)?;

        let best = self.best().ok_or(SearchError::EmptyPopulation)?.clone();
        let best_bits = best.rank_score() as u64;
        let elapsed_seconds = start_time.elapsed().as_secs_f64();
        log::info!(
            "search finished after {} generations ({:?}): {} bits in {:.1}s",
            self.generation,
            stop_reason,
            best_bits,
            elapsed_seconds
        );

        Ok(SearchResult {
            best,
            best_bits,
            generations: self.generation,
            evaluations: self.evaluations,
            elapsed_seconds,
            stop_reason,
            history: self.history.clone(),
        })
    }

    /// Run the search (blocking).
    pub fn run(&mut self) -> Result<SearchResult, SearchError> {
        self.run_with_callback(|_| {})
    }
}

/// Gaussian mutator plus the enabled structural mutators, one picked per call.
fn build_mutator(config: &SearchConfig) -> Result<MultiMutator, MutationError> {
    let mutation = &config.mutation;
    let mut mutator = MultiMutator::new(vec![Box::new(BoundedGaussianMutator::new(
        mutation.std_dev,
        mutation.mean,
    )?)])?;
    if mutation.shift {
        mutator.push(Box::new(ShiftMutator));
    }
    if mutation.switch {
        mutator.push(Box::new(SwitchMutator));
    }
    Ok(mutator)
}
