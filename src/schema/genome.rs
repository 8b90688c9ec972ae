//! Genome types: a flat vector of bounded weights viewed as an S×S matrix.
//!
//! Row `c` holds the weights of every next symbol after context `c`.

use std::fmt;

use rand::distributions::uniform::SampleUniform;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Numeric precision of a genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Precision {
    #[default]
    F32,
    F64,
}

/// A bounded floating-point gene.
pub trait Gene:
    Copy
    + PartialOrd
    + Default
    + fmt::Debug
    + Send
    + Sync
    + SampleUniform
    + Serialize
    + DeserializeOwned
    + 'static
{
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

impl Gene for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Gene for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}

/// Genes of one precision with their closed bounds and cached fitness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatGenome<T> {
    /// Flattened weight matrix, row-major by context.
    pub genes: Vec<T>,
    /// Lower bound of every gene.
    pub min: T,
    /// Upper bound of every gene.
    pub max: T,
    /// Encoded size of the corpus in bits, once evaluated.
    #[serde(default)]
    pub score: Option<f64>,
}

impl<T: Gene> FloatGenome<T> {
    /// Create from genes, clamping each into `[min, max]`.
    pub fn new(genes: Vec<T>, min: T, max: T) -> Self {
        let mut genome = Self {
            genes: Vec::new(),
            min,
            max,
            score: None,
        };
        genome.genes = genes.into_iter().map(|g| genome.clamp(g)).collect();
        genome
    }

    /// Clamp a value into the genome's bounds.
    #[inline]
    pub fn clamp(&self, value: T) -> T {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Unscored copy: what every operator starts from.
    pub fn offspring(&self) -> Self {
        Self {
            genes: self.genes.clone(),
            min: self.min,
            max: self.max,
            score: None,
        }
    }
}

/// A genome in one of the supported precisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "precision", content = "genome")]
pub enum Genome {
    Float32(FloatGenome<f32>),
    Float64(FloatGenome<f64>),
}

impl Genome {
    /// All-`value` genome of `len` genes with bounds `[min, max]`.
    pub fn filled(precision: Precision, len: usize, value: f64, bounds: (f64, f64)) -> Self {
        match precision {
            Precision::F32 => Genome::Float32(FloatGenome::new(
                vec![value as f32; len],
                bounds.0 as f32,
                bounds.1 as f32,
            )),
            Precision::F64 => {
                Genome::Float64(FloatGenome::new(vec![value; len], bounds.0, bounds.1))
            }
        }
    }

    /// Genome from `f64` weights, converted to `precision`.
    pub fn from_weights(precision: Precision, weights: &[f64], bounds: (f64, f64)) -> Self {
        match precision {
            Precision::F32 => Genome::Float32(FloatGenome::new(
                weights.iter().map(|&w| w as f32).collect(),
                bounds.0 as f32,
                bounds.1 as f32,
            )),
            Precision::F64 => {
                Genome::Float64(FloatGenome::new(weights.to_vec(), bounds.0, bounds.1))
            }
        }
    }

    pub fn precision(&self) -> Precision {
        match self {
            Genome::Float32(_) => Precision::F32,
            Genome::Float64(_) => Precision::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Genome::Float32(g) => g.genes.len(),
            Genome::Float64(g) => g.genes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gene at `index` widened to `f64`.
    pub fn weight(&self, index: usize) -> Option<f64> {
        match self {
            Genome::Float32(g) => g.genes.get(index).map(|&v| f64::from(v)),
            Genome::Float64(g) => g.genes.get(index).copied(),
        }
    }

    /// Bounds widened to `f64`.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Genome::Float32(g) => (f64::from(g.min), f64::from(g.max)),
            Genome::Float64(g) => (g.min, g.max),
        }
    }

    /// Cached fitness (bits), if evaluated.
    pub fn score(&self) -> Option<f64> {
        match self {
            Genome::Float32(g) => g.score,
            Genome::Float64(g) => g.score,
        }
    }

    pub fn set_score(&mut self, score: f64) {
        match self {
            Genome::Float32(g) => g.score = Some(score),
            Genome::Float64(g) => g.score = Some(score),
        }
    }

    /// Score used for ordering: unevaluated genomes rank last.
    pub fn rank_score(&self) -> f64 {
        self.score().unwrap_or(f64::INFINITY)
    }

    /// Unscored copy.
    pub fn offspring(&self) -> Self {
        match self {
            Genome::Float32(g) => Genome::Float32(g.offspring()),
            Genome::Float64(g) => Genome::Float64(g.offspring()),
        }
    }
}
