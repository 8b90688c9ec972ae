//! Population initializers.

use crate::schema::{FloatGenome, Gene, Genome};

use super::genome::GenomeRng;

/// Upper bound of the uniform noise used by both initializers.
pub const SEED_NOISE: f64 = 0.1;

/// Initializer errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    #[error("genome has {actual} genes, initializer needs {expected} (alphabet squared)")]
    GenomeShape { expected: usize, actual: usize },
    #[error("population size must be at least 1")]
    EmptyPopulation,
}

/// Builds the initial population from a template genome.
pub trait Initializer: Send + Sync {
    fn name(&self) -> &'static str;

    fn init_population(
        &self,
        first: &Genome,
        size: usize,
        rng: &mut GenomeRng,
    ) -> Result<Vec<Genome>, InitError>;
}

fn check_shape(first: &Genome, alphabet: usize, size: usize) -> Result<(), InitError> {
    if size == 0 {
        return Err(InitError::EmptyPopulation);
    }
    let expected = alphabet * alphabet;
    if first.len() != expected {
        return Err(InitError::GenomeShape {
            expected,
            actual: first.len(),
        });
    }
    Ok(())
}

/// Uniform noise everywhere with the diagonal forced to one: every context
/// starts out predicting a repeat of itself.
#[derive(Debug, Clone, Copy)]
pub struct IdentityInitializer {
    alphabet: usize,
}

impl IdentityInitializer {
    pub fn new(alphabet: usize) -> Self {
        Self { alphabet }
    }

    fn fill<T: Gene>(&self, template: &FloatGenome<T>, rng: &mut GenomeRng) -> FloatGenome<T> {
        let mut genome = template.offspring();
        let high = T::from_f64(SEED_NOISE);
        for (i, gene) in genome.genes.iter_mut().enumerate() {
            let (context, symbol) = (i / self.alphabet, i % self.alphabet);
            *gene = if context == symbol {
                T::from_f64(1.0)
            } else {
                rng.uniform(T::default(), high)
            };
        }
        let (min, max) = (genome.min, genome.max);
        FloatGenome::new(genome.genes, min, max)
    }
}

impl Initializer for IdentityInitializer {
    fn name(&self) -> &'static str {
        "IdentityInitializer"
    }

    fn init_population(
        &self,
        first: &Genome,
        size: usize,
        rng: &mut GenomeRng,
    ) -> Result<Vec<Genome>, InitError> {
        check_shape(first, self.alphabet, size)?;
        Ok((0..size)
            .map(|_| match first {
                Genome::Float32(g) => Genome::Float32(self.fill(g, rng)),
                Genome::Float64(g) => Genome::Float64(self.fill(g, rng)),
            })
            .collect())
    }
}

/// Clones a corpus-seeded genome; every clone but the first gets
/// non-negative uniform noise on each gene, capped at one.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsInitializer {
    alphabet: usize,
}

impl StatisticsInitializer {
    pub fn new(alphabet: usize) -> Self {
        Self { alphabet }
    }

    fn perturb<T: Gene>(template: &FloatGenome<T>, rng: &mut GenomeRng) -> FloatGenome<T> {
        let mut genome = template.offspring();
        let high = T::from_f64(SEED_NOISE);
        let cap = if genome.max < T::from_f64(1.0) {
            genome.max
        } else {
            T::from_f64(1.0)
        };
        for gene in genome.genes.iter_mut() {
            let noise = rng.uniform(T::default(), high);
            let value = T::from_f64(gene.to_f64() + noise.to_f64());
            *gene = if value > cap { cap } else { value };
        }
        genome
    }
}

impl Initializer for StatisticsInitializer {
    fn name(&self) -> &'static str {
        "StatisticsInitializer"
    }

    fn init_population(
        &self,
        first: &Genome,
        size: usize,
        rng: &mut GenomeRng,
    ) -> Result<Vec<Genome>, InitError> {
        check_shape(first, self.alphabet, size)?;
        let mut population = Vec::with_capacity(size);
        population.push(first.offspring());
        for _ in 1..size {
            population.push(match first {
                Genome::Float32(g) => Genome::Float32(Self::perturb(g, rng)),
                Genome::Float64(g) => Genome::Float64(Self::perturb(g, rng)),
            });
        }
        Ok(population)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Precision;

    const ALPHABET: usize = 16;

    fn template(precision: Precision) -> Genome {
        Genome::filled(precision, ALPHABET * ALPHABET, 0.0, (0.0, 1.0))
    }

    #[test]
    fn test_identity_diagonal_and_noise() {
        let mut rng = GenomeRng::new(42);
        for precision in [Precision::F32, Precision::F64] {
            let population = IdentityInitializer::new(ALPHABET)
                .init_population(&template(precision), 5, &mut rng)
                .unwrap();
            assert_eq!(population.len(), 5);
            for genome in &population {
                assert_eq!(genome.precision(), precision);
                assert_eq!(genome.score(), None);
                for c in 0..ALPHABET {
                    for s in 0..ALPHABET {
                        let w = genome.weight(c * ALPHABET + s).unwrap();
                        if c == s {
                            assert_eq!(w, 1.0);
                        } else {
                            assert!((0.0..SEED_NOISE).contains(&w), "w = {w}");
                        }
                    }
                }
            }
            assert_ne!(population[0], population[1]);
        }
    }

    #[test]
    fn test_statistics_first_clone_exact() {
        let weights: Vec<f64> = (0..ALPHABET * ALPHABET)
            .map(|i| (i % 11) as f64 / 10.0)
            .collect();
        let first = Genome::from_weights(Precision::F32, &weights, (0.0, 1.0));
        let mut rng = GenomeRng::new(9);
        let population = StatisticsInitializer::new(ALPHABET)
            .init_population(&first, 4, &mut rng)
            .unwrap();

        assert_eq!(population[0], first);
        for clone in &population[1..] {
            for i in 0..first.len() {
                let before = first.weight(i).unwrap();
                let after = clone.weight(i).unwrap();
                let delta = after - before;
                if after < 1.0 {
                    assert!((0.0..=SEED_NOISE + 1e-6).contains(&delta), "delta = {delta}");
                } else {
                    assert_eq!(after, 1.0);
                }
            }
        }
    }

    #[test]
    fn test_statistics_respects_lower_max() {
        let first = Genome::filled(Precision::F64, ALPHABET * ALPHABET, 0.5, (0.0, 0.55));
        let mut rng = GenomeRng::new(5);
        let population = StatisticsInitializer::new(ALPHABET)
            .init_population(&first, 3, &mut rng)
            .unwrap();
        for genome in &population {
            assert!((0..genome.len()).all(|i| genome.weight(i).unwrap() <= 0.55));
        }
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let mut rng = GenomeRng::new(1);
        let bad = Genome::filled(Precision::F32, 10, 0.0, (0.0, 1.0));
        assert_eq!(
            IdentityInitializer::new(ALPHABET).init_population(&bad, 3, &mut rng),
            Err(InitError::GenomeShape {
                expected: 256,
                actual: 10
            })
        );
        assert_eq!(
            StatisticsInitializer::new(ALPHABET).init_population(&template(Precision::F32), 0, &mut rng),
            Err(InitError::EmptyPopulation)
        );
    }
}
