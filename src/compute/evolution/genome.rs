//! Random number source for genome operations.
//!
//! Every operator draws from one `GenomeRng` owned by the engine, so a fixed
//! seed reproduces a whole run.

use rand::prelude::*;
use rand_distr::{Distribution, Normal};

use crate::schema::Gene;

/// Random number generator wrapper for genome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform gene in `[low, high)`.
    pub fn uniform<T: Gene>(&mut self, low: T, high: T) -> T {
        self.rng.gen_range(low..high)
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// `true` with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Sample a Gaussian.
    pub fn normal(&mut self, distribution: &Normal<f64>) -> f64 {
        distribution.sample(&mut self.rng)
    }

    /// Two ordered cut points in `0..=len`.
    pub fn cut_points(&mut self, len: usize) -> (usize, usize) {
        let a = self.rng.gen_range(0..=len);
        let b = self.rng.gen_range(0..=len);
        (a.min(b), a.max(b))
    }

    /// Two ordered indices in `0..len`. `len` must be non-zero.
    pub fn index_pair(&mut self, len: usize) -> (usize, usize) {
        let a = self.index(len);
        let b = self.index(len);
        (a.min(b), a.max(b))
    }
}
