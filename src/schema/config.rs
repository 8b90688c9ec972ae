//! Search configuration.
//!
//! Every section has serde defaults, so a config file only needs the fields
//! it changes (an empty JSON object is a valid configuration).

use serde::{Deserialize, Serialize};

use super::Precision;
use crate::compute::{MAX_ALPHABET, SYMBOLS};

/// Top-level configuration for a model search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// How the initial population is seeded.
    #[serde(default)]
    pub initializer: InitializerKind,
    /// Tournament selection.
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Crossover settings.
    #[serde(default)]
    pub breeding: BreedingConfig,
    /// Mutation settings.
    #[serde(default)]
    pub mutation: MutationConfig,
    /// Model and genome shape.
    #[serde(default)]
    pub model: ModelConfig,
    /// When to stop.
    #[serde(default)]
    pub stop: StopCriterion,
    /// Evaluate the population in parallel.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population: PopulationConfig::default(),
            initializer: InitializerKind::default(),
            selection: SelectionConfig::default(),
            breeding: BreedingConfig::default(),
            mutation: MutationConfig::default(),
            model: ModelConfig::default(),
            stop: StopCriterion::default(),
            parallel: default_parallel(),
            random_seed: None,
        }
    }
}

fn default_parallel() -> bool {
    true
}

/// Population and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of genomes kept after every generation.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Optional cap on generations; `None` runs until the stop criterion.
    #[serde(default)]
    pub max_generations: Option<usize>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: None,
        }
    }
}

fn default_population_size() -> usize {
    200
}

/// Initial population strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum InitializerKind {
    /// Uniform noise with the diagonal set to one.
    #[default]
    Identity,
    /// Perturbed clones of the corpus's order-1 statistics.
    Statistics,
}

/// Tournament selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Probability of returning the tournament winner.
    #[serde(default = "default_elite_probability")]
    pub elite_probability: f64,
    /// Genomes drawn per tournament.
    #[serde(default = "default_contestants")]
    pub contestants: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            elite_probability: default_elite_probability(),
            contestants: default_contestants(),
        }
    }
}

fn default_elite_probability() -> f64 {
    0.2
}
fn default_contestants() -> usize {
    5
}

/// Crossover settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreedingConfig {
    /// Per-member probability of breeding a pair of children.
    #[serde(default = "default_breed_probability")]
    pub probability: f64,
}

impl Default for BreedingConfig {
    fn default() -> Self {
        Self {
            probability: default_breed_probability(),
        }
    }
}

fn default_breed_probability() -> f64 {
    0.2
}

/// Mutation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Per-member probability of adding a mutated copy.
    #[serde(default = "default_mutate_probability")]
    pub probability: f64,
    /// Standard deviation of the Gaussian mutator.
    #[serde(default = "default_std_dev")]
    pub std_dev: f64,
    /// Mean of the Gaussian mutator.
    #[serde(default)]
    pub mean: f64,
    /// Include the shift mutator.
    #[serde(default = "default_true")]
    pub shift: bool,
    /// Include the switch mutator.
    #[serde(default = "default_true")]
    pub switch: bool,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            probability: default_mutate_probability(),
            std_dev: default_std_dev(),
            mean: 0.0,
            shift: true,
            switch: true,
        }
    }
}

fn default_mutate_probability() -> f64 {
    0.5
}
fn default_std_dev() -> f64 {
    0.3
}
fn default_true() -> bool {
    true
}

/// Model and genome shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Alphabet size; the genome holds `symbols²` genes.
    #[serde(default = "default_symbols")]
    pub symbols: usize,
    /// Gene precision.
    #[serde(default)]
    pub precision: Precision,
    /// Gene bounds `[min, max]`.
    #[serde(default = "default_gene_bounds")]
    pub gene_bounds: (f64, f64),
    /// Check CDF monotonicity and decode every evaluation.
    #[serde(default)]
    pub verify: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            precision: Precision::default(),
            gene_bounds: default_gene_bounds(),
            verify: false,
        }
    }
}

impl ModelConfig {
    /// Genes per genome.
    pub fn genome_len(&self) -> usize {
        self.symbols * self.symbols
    }
}

fn default_symbols() -> usize {
    SYMBOLS
}
fn default_gene_bounds() -> (f64, f64) {
    (0.0, 1.0)
}

/// Stopping criterion evaluated on the best genome of each generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum StopCriterion {
    /// Stop once the best encoding is at most `ratio` of the raw corpus size.
    CompressionRatio { ratio: f64 },
    /// Stop once the best encoding is at most `ratio` of the corpus's
    /// order-0 entropy size.
    BaselineRatio { ratio: f64 },
}

impl Default for StopCriterion {
    fn default() -> Self {
        Self::CompressionRatio { ratio: 0.3 }
    }
}

impl StopCriterion {
    pub fn ratio(&self) -> f64 {
        match *self {
            Self::CompressionRatio { ratio } | Self::BaselineRatio { ratio } => ratio,
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Search configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be at least 2")]
    PopulationTooSmall,
    #[error("Tournament needs at least 2 contestants, got {0}")]
    TooFewContestants(usize),
    #[error("Probability {name} must lie in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("Mutation standard deviation must be positive and finite, got {0}")]
    InvalidStdDev(f64),
    #[error("Mutation mean must be finite, got {0}")]
    InvalidMean(f64),
    #[error("Alphabet size {0} outside 2..={max}", max = MAX_ALPHABET)]
    InvalidAlphabet(usize),
    #[error("Invalid gene bounds: min ({0}) > max ({1}) or not finite")]
    InvalidBounds(f64, f64),
    #[error("Stop ratio must be positive and finite, got {0}")]
    InvalidRatio(f64),
}

impl SearchConfig {
    /// Validate search configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population.size < 2 {
            return Err(ConfigError::PopulationTooSmall);
        }

        if self.selection.contestants < 2 {
            return Err(ConfigError::TooFewContestants(self.selection.contestants));
        }

        let check_probability = |value: f64, name: &'static str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::InvalidProbability { name, value })
            }
        };
        check_probability(self.selection.elite_probability, "elite_probability")?;
        check_probability(self.breeding.probability, "breeding.probability")?;
        check_probability(self.mutation.probability, "mutation.probability")?;

        let std_dev = self.mutation.std_dev;
        if !(std_dev > 0.0 && std_dev.is_finite()) {
            return Err(ConfigError::InvalidStdDev(std_dev));
        }
        if !self.mutation.mean.is_finite() {
            return Err(ConfigError::InvalidMean(self.mutation.mean));
        }

        if !(2..=MAX_ALPHABET).contains(&self.model.symbols) {
            return Err(ConfigError::InvalidAlphabet(self.model.symbols));
        }

        let (min, max) = self.model.gene_bounds;
        if !(min.is_finite() && max.is_finite() && min <= max) {
            return Err(ConfigError::InvalidBounds(min, max));
        }

        let ratio = self.stop.ratio();
        if !(ratio > 0.0 && ratio.is_finite()) {
            return Err(ConfigError::InvalidRatio(ratio));
        }

        Ok(())
    }
}
