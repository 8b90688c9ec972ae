//! Mutation operators.
//!
//! Every operator works on an unscored copy; the parent is left untouched
//! so it can keep breeding.

use rand_distr::Normal;

use crate::schema::{FloatGenome, Gene, Genome};

use super::genome::GenomeRng;

/// Mutation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MutationError {
    #[error("standard deviation must be positive and finite, got {0}")]
    InvalidStdDev(f64),
    #[error("mean must be finite, got {0}")]
    InvalidMean(f64),
    #[error("composite mutator has no members")]
    EmptyComposite,
    #[error("cannot mutate an empty genome")]
    EmptyGenome,
}

/// Produces a mutated copy of a genome.
pub trait Mutator: Send + Sync {
    fn name(&self) -> &'static str;

    fn mutate(&self, genome: &Genome, rng: &mut GenomeRng) -> Result<Genome, MutationError>;
}

/// Adds Gaussian noise to one gene and clamps it back into bounds.
#[derive(Debug, Clone, Copy)]
pub struct BoundedGaussianMutator {
    distribution: Normal<f64>,
}

impl BoundedGaussianMutator {
    /// A zero standard deviation would never move a gene and is rejected.
    pub fn new(std_dev: f64, mean: f64) -> Result<Self, MutationError> {
        if !(std_dev > 0.0 && std_dev.is_finite()) {
            return Err(MutationError::InvalidStdDev(std_dev));
        }
        if !mean.is_finite() {
            return Err(MutationError::InvalidMean(mean));
        }
        let distribution =
            Normal::new(mean, std_dev).map_err(|_| MutationError::InvalidStdDev(std_dev))?;
        Ok(Self { distribution })
    }

    pub fn std_dev(&self) -> f64 {
        self.distribution.std_dev()
    }

    pub fn mean(&self) -> f64 {
        self.distribution.mean()
    }

    fn mutate_genes<T: Gene>(
        &self,
        genome: &FloatGenome<T>,
        rng: &mut GenomeRng,
    ) -> Result<FloatGenome<T>, MutationError> {
        if genome.genes.is_empty() {
            return Err(MutationError::EmptyGenome);
        }
        let mut child = genome.offspring();
        let index = rng.index(child.genes.len());
        let moved = child.genes[index].to_f64() + rng.normal(&self.distribution);
        child.genes[index] = child.clamp(T::from_f64(moved));
        Ok(child)
    }
}

impl Mutator for BoundedGaussianMutator {
    fn name(&self) -> &'static str {
        "BoundedGaussianMutator"
    }

    fn mutate(&self, genome: &Genome, rng: &mut GenomeRng) -> Result<Genome, MutationError> {
        match genome {
            Genome::Float32(g) => self.mutate_genes(g, rng).map(Genome::Float32),
            Genome::Float64(g) => self.mutate_genes(g, rng).map(Genome::Float64),
        }
    }
}

/// Applies a structural rearrangement to an unscored copy of the genes.
fn rearrange<F>(genome: &Genome, rng: &mut GenomeRng, op: F) -> Result<Genome, MutationError>
where
    F: Fn(usize, &mut GenomeRng) -> Rearrangement,
{
    if genome.is_empty() {
        return Err(MutationError::EmptyGenome);
    }
    let plan = op(genome.len(), rng);
    let mut child = genome.offspring();
    match &mut child {
        Genome::Float32(g) => plan.apply(&mut g.genes),
        Genome::Float64(g) => plan.apply(&mut g.genes),
    }
    Ok(child)
}

enum Rearrangement {
    /// Move the gene at `from` to `to`, shifting the genes between.
    Shift { from: usize, to: usize },
    Swap(usize, usize),
}

impl Rearrangement {
    fn apply<T>(&self, genes: &mut [T]) {
        match *self {
            Rearrangement::Shift { from, to } => genes[from..=to].rotate_left(1),
            Rearrangement::Swap(a, b) => genes.swap(a, b),
        }
    }
}

/// Moves one gene to another position, shifting the genes in between.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftMutator;

impl Mutator for ShiftMutator {
    fn name(&self) -> &'static str {
        "ShiftMutator"
    }

    fn mutate(&self, genome: &Genome, rng: &mut GenomeRng) -> Result<Genome, MutationError> {
        rearrange(genome, rng, |len, rng| {
            let (from, to) = rng.index_pair(len);
            Rearrangement::Shift { from, to }
        })
    }
}

/// Swaps two genes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchMutator;

impl Mutator for SwitchMutator {
    fn name(&self) -> &'static str {
        "SwitchMutator"
    }

    fn mutate(&self, genome: &Genome, rng: &mut GenomeRng) -> Result<Genome, MutationError> {
        rearrange(genome, rng, |len, rng| {
            Rearrangement::Swap(rng.index(len), rng.index(len))
        })
    }
}

/// Delegates each mutation to one member chosen uniformly at random.
pub struct MultiMutator {
    members: Vec<Box<dyn Mutator>>,
}

impl MultiMutator {
    pub fn new(members: Vec<Box<dyn Mutator>>) -> Result<Self, MutationError> {
        if members.is_empty() {
            return Err(MutationError::EmptyComposite);
        }
        Ok(Self { members })
    }

    pub fn push(&mut self, mutator: Box<dyn Mutator>) {
        self.members.push(mutator);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.members.iter().map(|m| m.name()).collect()
    }
}

impl Mutator for MultiMutator {
    fn name(&self) -> &'static str {
        "MultiMutator"
    }

    fn mutate(&self, genome: &Genome, rng: &mut GenomeRng) -> Result<Genome, MutationError> {
        let member = &self.members[rng.index(self.members.len())];
        member.mutate(genome, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Precision;
    use proptest::prelude::*;

    fn ramp(precision: Precision, len: usize) -> Genome {
        let weights: Vec<f64> = (0..len).map(|i| i as f64 / len as f64).collect();
        Genome::from_weights(precision, &weights, (0.0, 1.0))
    }

    fn sorted(genome: &Genome) -> Vec<f64> {
        let mut v: Vec<f64> = (0..genome.len()).map(|i| genome.weight(i).unwrap()).collect();
        v.sort_by(f64::total_cmp);
        v
    }

    #[test]
    fn test_zero_std_dev_rejected() {
        assert_eq!(
            BoundedGaussianMutator::new(0.0, 0.0).unwrap_err(),
            MutationError::InvalidStdDev(0.0)
        );
        assert!(BoundedGaussianMutator::new(-1.0, 0.0).is_err());
        assert!(BoundedGaussianMutator::new(f64::NAN, 0.0).is_err());
        assert!(BoundedGaussianMutator::new(0.3, f64::INFINITY).is_err());
        let m = BoundedGaussianMutator::new(0.3, 0.1).unwrap();
        assert_eq!(m.std_dev(), 0.3);
        assert_eq!(m.mean(), 0.1);
    }

    #[test]
    fn test_gaussian_changes_at_most_one_gene() {
        let mutator = BoundedGaussianMutator::new(0.3, 0.0).unwrap();
        let mut rng = GenomeRng::new(42);
        for precision in [Precision::F32, Precision::F64] {
            let mut parent = ramp(precision, 64);
            parent.set_score(10.0);
            let snapshot = parent.clone();
            let child = mutator.mutate(&parent, &mut rng).unwrap();

            assert_eq!(parent, snapshot);
            assert_eq!(child.precision(), precision);
            assert_eq!(child.score(), None);
            let changed = (0..64)
                .filter(|&i| child.weight(i) != parent.weight(i))
                .count();
            assert!(changed <= 1);
        }
    }

    #[test]
    fn test_empty_genome() {
        let empty = Genome::filled(Precision::F32, 0, 0.0, (0.0, 1.0));
        let mut rng = GenomeRng::new(1);
        let gaussian = BoundedGaussianMutator::new(1.0, 0.0).unwrap();
        assert_eq!(gaussian.mutate(&empty, &mut rng), Err(MutationError::EmptyGenome));
        assert_eq!(ShiftMutator.mutate(&empty, &mut rng), Err(MutationError::EmptyGenome));
        assert_eq!(SwitchMutator.mutate(&empty, &mut rng), Err(MutationError::EmptyGenome));
    }

    #[test]
    fn test_structural_mutators_permute() {
        let mut rng = GenomeRng::new(7);
        let parent = ramp(Precision::F64, 32);
        for _ in 0..50 {
            let shifted = ShiftMutator.mutate(&parent, &mut rng).unwrap();
            let switched = SwitchMutator.mutate(&parent, &mut rng).unwrap();
            assert_eq!(sorted(&shifted), sorted(&parent));
            assert_eq!(sorted(&switched), sorted(&parent));
        }
    }

    #[test]
    fn test_shift_rotates_span() {
        let mut genes = vec![0, 1, 2, 3, 4];
        Rearrangement::Shift { from: 1, to: 3 }.apply(&mut genes);
        assert_eq!(genes, vec![0, 2, 3, 1, 4]);
    }

    #[test]
    fn test_multi_mutator() {
        assert!(matches!(
            MultiMutator::new(Vec::new()),
            Err(MutationError::EmptyComposite)
        ));

        let mut multi = MultiMutator::new(vec![Box::new(ShiftMutator)]).unwrap();
        multi.push(Box::new(SwitchMutator));
        multi.push(Box::new(BoundedGaussianMutator::new(0.3, 0.0).unwrap()));
        assert_eq!(multi.len(), 3);
        assert_eq!(
            multi.names(),
            vec!["ShiftMutator", "SwitchMutator", "BoundedGaussianMutator"]
        );

        let mut rng = GenomeRng::new(11);
        let parent = ramp(Precision::F32, 16);
        for _ in 0..20 {
            let child = multi.mutate(&parent, &mut rng).unwrap();
            assert_eq!(child.len(), parent.len());
        }
    }

    proptest! {
        #[test]
        fn gaussian_stays_in_bounds(
            mean in -5.0f64..5.0,
            std_dev in 0.001f64..10.0,
            seed in any::<u64>(),
            min in -1.0f64..0.5,
            width in 0.0f64..2.0,
        ) {
            let max = min + width;
            let mutator = BoundedGaussianMutator::new(std_dev, mean).unwrap();
            let mut rng = GenomeRng::new(seed);
            for precision in [Precision::F32, Precision::F64] {
                let mut genome = Genome::filled(precision, 8, min, (min, max));
                for _ in 0..20 {
                    genome = mutator.mutate(&genome, &mut rng).unwrap();
                    let (lo, hi) = genome.bounds();
                    for i in 0..genome.len() {
                        let w = genome.weight(i).unwrap();
                        prop_assert!(w >= lo && w <= hi);
                    }
                }
            }
        }
    }
}
