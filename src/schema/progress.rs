//! Search progress and result types.

use serde::{Deserialize, Serialize};

use super::Genome;

/// Snapshot of the search after a generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchProgress {
    /// Generations completed (0 after the initial population is evaluated).
    pub generation: usize,
    /// Encoded size of the corpus under the best genome.
    pub best_bits: u64,
    /// `best_bits / 8`.
    pub best_bytes: f64,
    /// Best size per corpus byte.
    pub bits_per_byte: f64,
    /// Best size relative to the corpus's order-0 entropy, when that is non-zero.
    pub baseline_ratio: Option<f64>,
    /// Mean size over the population.
    pub avg_bits: f64,
    /// Population size.
    pub population: usize,
    /// Fitness evaluations so far.
    pub evaluations: u64,
}

/// Per-generation statistics for plotting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHistory {
    /// Best size per generation.
    pub best_bits: Vec<u64>,
    /// Average size per generation.
    pub avg_bits: Vec<f64>,
}

impl SearchHistory {
    pub fn push(&mut self, progress: &SearchProgress) {
        self.best_bits.push(progress.best_bits);
        self.avg_bits.push(progress.avg_bits);
    }

    pub fn len(&self) -> usize {
        self.best_bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best_bits.is_empty()
    }
}

/// Reason the search stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// The stop criterion held for the best genome.
    TargetReached,
    /// Reached the configured generation cap.
    MaxGenerations,
}

/// Final result of a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Best genome found, with its score.
    pub best: Genome,
    /// Encoded size under `best`.
    pub best_bits: u64,
    /// Generations run.
    pub generations: usize,
    /// Total fitness evaluations.
    pub evaluations: u64,
    /// Wall-clock time in seconds.
    pub elapsed_seconds: f64,
    pub stop_reason: StopReason,
    /// Full history for analysis.
    pub history: SearchHistory,
}
