//! Selection and breeding.

use crate::schema::{FloatGenome, Gene, Genome};

use super::genome::GenomeRng;

/// Breeding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BreedError {
    #[error("parents differ in precision")]
    VariantMismatch,
    #[error("parents differ in length ({0} vs {1})")]
    LengthMismatch(usize, usize),
}

/// Tournament selection over scored genomes (lower score wins).
///
/// Draws `contestants` genomes with replacement and ranks them; the best is
/// returned with probability `elite_probability`, otherwise one of the
/// others chosen uniformly.
#[derive(Debug, Clone, Copy)]
pub struct TournamentSelector {
    elite_probability: f64,
    contestants: usize,
}

impl TournamentSelector {
    pub fn new(elite_probability: f64, contestants: usize) -> Self {
        Self {
            elite_probability: elite_probability.clamp(0.0, 1.0),
            contestants: contestants.max(2),
        }
    }

    /// Index of the selected genome. `population` must not be empty.
    pub fn select_index(&self, population: &[Genome], rng: &mut GenomeRng) -> usize {
        let mut drawn: Vec<usize> = (0..self.contestants)
            .map(|_| rng.index(population.len()))
            .collect();
        drawn.sort_by(|&a, &b| {
            population[a]
                .rank_score()
                .total_cmp(&population[b].rank_score())
        });

        if rng.chance(self.elite_probability) {
            drawn[0]
        } else {
            drawn[1 + rng.index(drawn.len() - 1)]
        }
    }

    pub fn select<'a>(&self, population: &'a [Genome], rng: &mut GenomeRng) -> &'a Genome {
        &population[self.select_index(population, rng)]
    }
}

/// Two-point crossover over the flattened genome.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoPointBreeder;

impl TwoPointBreeder {
    /// Two unscored children: the middle span `[p1, p2)` swapped between parents.
    pub fn breed(
        &self,
        a: &Genome,
        b: &Genome,
        rng: &mut GenomeRng,
    ) -> Result<(Genome, Genome), BreedError> {
        if a.len() != b.len() {
            return Err(BreedError::LengthMismatch(a.len(), b.len()));
        }
        let cut = rng.cut_points(a.len());
        match (a, b) {
            (Genome::Float32(x), Genome::Float32(y)) => {
                let (c, d) = cross(x, y, cut);
                Ok((Genome::Float32(c), Genome::Float32(d)))
            }
            (Genome::Float64(x), Genome::Float64(y)) => {
                let (c, d) = cross(x, y, cut);
                Ok((Genome::Float64(c), Genome::Float64(d)))
            }
            _ => Err(BreedError::VariantMismatch),
        }
    }
}

fn cross<T: Gene>(
    a: &FloatGenome<T>,
    b: &FloatGenome<T>,
    (p1, p2): (usize, usize),
) -> (FloatGenome<T>, FloatGenome<T>) {
    let mut c = a.offspring();
    let mut d = b.offspring();
    c.genes[p1..p2].copy_from_slice(&b.genes[p1..p2]);
    d.genes[p1..p2].copy_from_slice(&a.genes[p1..p2]);
    (c, d)
}
