//! The corpus under compression: loaded once, shared read-only.

use std::path::Path;
use std::sync::Arc;
use std::{fs, io};

use crate::schema::{Genome, Precision};

/// Immutable byte sequence shared by every fitness evaluation.
///
/// Cloning is cheap and never copies the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    data: Arc<[u8]>,
}

impl Corpus {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    /// Read the whole file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(fs::read(path)?))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The corpus as a coder symbol stream.
    pub fn symbols(&self) -> impl Iterator<Item = u16> + '_ {
        self.data.iter().map(|&b| u16::from(b))
    }

    /// Largest byte value present.
    pub fn max_symbol(&self) -> Option<u8> {
        self.data.iter().copied().max()
    }

    /// Order-1 transition counts, row-major `[previous * alphabet + next]`.
    ///
    /// Bytes at or above `alphabet` are skipped.
    pub fn transition_counts(&self, alphabet: usize) -> Vec<u64> {
        let mut counts = vec![0u64; alphabet * alphabet];
        for pair in self.data.windows(2) {
            let (prev, next) = (usize::from(pair[0]), usize::from(pair[1]));
            if prev < alphabet && next < alphabet {
                counts[prev * alphabet + next] += 1;
            }
        }
        counts
    }

    /// Genome seeded from the corpus's order-1 statistics.
    ///
    /// Each row is the transition counts scaled by the row maximum, so the
    /// most frequent successor gets weight 1. Unseen contexts stay zero.
    pub fn transition_genome(
        &self,
        alphabet: usize,
        precision: Precision,
        bounds: (f64, f64),
    ) -> Genome {
        let counts = self.transition_counts(alphabet);
        let mut weights = vec![0.0f64; counts.len()];
        if alphabet > 0 {
            for (row, out) in counts
                .chunks_exact(alphabet)
                .zip(weights.chunks_exact_mut(alphabet))
            {
                let peak = row.iter().copied().max().unwrap_or(0);
                if peak == 0 {
                    continue;
                }
                for (&count, weight) in row.iter().zip(out.iter_mut()) {
                    *weight = count as f64 / peak as f64;
                }
            }
        }
        Genome::from_weights(precision, &weights, bounds)
    }

    /// Order-0 entropy of the corpus in bits: the size a static,
    /// non-adaptive model of the byte frequencies would reach.
    pub fn order0_entropy_bits(&self) -> f64 {
        let mut counts = [0u64; 256];
        for &b in self.data.iter() {
            counts[usize::from(b)] += 1;
        }
        let n = self.data.len() as f64;
        counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let c = c as f64;
                -c * (c / n).log2()
            })
            .sum()
    }

    /// Baseline size in bytes used to normalize progress.
    pub fn baseline_bytes(&self) -> f64 {
        self.order0_entropy_bits() / 8.0
    }
}

impl From<Vec<u8>> for Corpus {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for Corpus {
    fn from(data: &[u8]) -> Self {
        Self::new(data)
    }
}
