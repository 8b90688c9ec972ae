//! Model builder: genome weights to per-context mixin CDFs.
//!
//! Row `c` of the genome is turned into a CDF in which every symbol keeps a
//! bucket of width at least one, and the remaining `CDF_SCALE - S` units are
//! spread proportionally to the row's weights. The coder filters toward
//! `mixin[c]` after coding symbol `c`.

use crate::schema::{FloatGenome, Gene, Genome};

use super::cdf::{
    CDF_SCALE, CdfFactory, CdfTables, IntegrityError, MAX_ALPHABET, first_non_increasing,
    uniform_cdf,
};

/// Errors building a model from a genome.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("alphabet size {0} outside 2..={max}", max = MAX_ALPHABET)]
    InvalidAlphabet(usize),
    #[error("genome has {actual} genes, expected {expected} (alphabet squared)")]
    GenomeShape { expected: usize, actual: usize },
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

/// Order-1 context model built from a genome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextModel {
    alphabet: usize,
    base: Vec<u16>,
    mixin: Vec<Vec<u16>>,
    verify: bool,
}

impl ContextModel {
    /// Build the base and mixin tables for `genome`.
    pub fn from_genome(genome: &Genome, alphabet: usize, verify: bool) -> Result<Self, ModelError> {
        match genome {
            Genome::Float32(g) => Self::from_float_genome(g, alphabet, verify),
            Genome::Float64(g) => Self::from_float_genome(g, alphabet, verify),
        }
    }

    fn from_float_genome<T: Gene>(
        genome: &FloatGenome<T>,
        alphabet: usize,
        verify: bool,
    ) -> Result<Self, ModelError> {
        if !(2..=MAX_ALPHABET).contains(&alphabet) {
            return Err(ModelError::InvalidAlphabet(alphabet));
        }
        let expected = alphabet * alphabet;
        if genome.genes.len() != expected {
            return Err(ModelError::GenomeShape {
                expected,
                actual: genome.genes.len(),
            });
        }

        let mixin = genome
            .genes
            .chunks_exact(alphabet)
            .enumerate()
            .map(|(context, row)| mixin_cdf(row, context, verify))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            alphabet,
            base: uniform_cdf(alphabet),
            mixin,
            verify,
        })
    }

    pub fn alphabet(&self) -> usize {
        self.alphabet
    }

    /// Mixin table of `context`.
    pub fn mixin(&self, context: usize) -> Option<&[u16]> {
        self.mixin.get(context).map(Vec::as_slice)
    }
}

impl CdfFactory for ContextModel {
    fn build(&self, alphabet: usize) -> Result<CdfTables, IntegrityError> {
        if alphabet != self.alphabet {
            return Err(IntegrityError::AlphabetMismatch {
                expected: self.alphabet,
                requested: alphabet,
            });
        }
        Ok(CdfTables {
            cdf: self.base.clone(),
            mixin: self.mixin.clone(),
            verify: self.verify,
        })
    }
}

/// Mixin CDF of one context row.
///
/// `m[j + 1] = m[j] + floor(1 + w[j] * (CDF_SCALE - S) / Σw)`, with the last
/// entry pinned to `CDF_SCALE`. Negative and NaN weights count as zero. A row
/// with no usable mass falls back to the uniform table.
pub fn mixin_cdf<T: Gene>(row: &[T], context: usize, verify: bool) -> Result<Vec<u16>, IntegrityError> {
    let symbols = row.len();
    let weight = |g: &T| g.to_f64().max(0.0);
    let total: f64 = row.iter().map(weight).sum();
    if !(total > 0.0 && total.is_finite()) {
        log::debug!("context {context} has no mass; using uniform mixin");
        return Ok(uniform_cdf(symbols));
    }

    let scale = CDF_SCALE as usize;
    let spread = (scale - symbols) as f64;
    let mut table = Vec::with_capacity(symbols + 1);
    let mut sum = 0usize;
    for (j, gene) in row.iter().enumerate() {
        table.push(sum as u16);
        let width = 1 + (weight(gene) * spread / total) as usize;
        // Leave one unit for every symbol still to come.
        sum = (sum + width).min(scale - (symbols - 1 - j));
    }
    table.push(CDF_SCALE as u16);

    if verify && let Some(index) = first_non_increasing(&table) {
        return Err(IntegrityError::MixinNotIncreasing { context, index });
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::SYMBOLS;
    use crate::schema::Precision;
    use proptest::prelude::*;

    #[test]
    fn test_equal_row_is_near_uniform() {
        let table = mixin_cdf(&[1.0f32; 4], 0, true).unwrap();
        // Each bucket: 1 + floor(8188 / 4) = 2048.
        assert_eq!(table, vec![0, 2048, 4096, 6144, 8192]);
    }

    #[test]
    fn test_single_weight_takes_the_spread() {
        let mut row = vec![0.0f64; SYMBOLS];
        row[7] = 1.0;
        let table = mixin_cdf(&row, 7, true).unwrap();
        assert_eq!(table[7], 7);
        assert_eq!(table[8], 7 + 1 + (CDF_SCALE as u16 - SYMBOLS as u16));
        assert_eq!(u32::from(table[SYMBOLS]), CDF_SCALE);
        assert!(first_non_increasing(&table).is_none());
    }

    #[test]
    fn test_last_symbol_keeps_width() {
        let mut row = vec![0.0f32; 8];
        row[0] = 1.0;
        let table = mixin_cdf(&row, 0, true).unwrap();
        assert_eq!(table[8] - table[7], 1);
    }

    #[test]
    fn test_degenerate_row_falls_back_to_uniform() {
        let table = mixin_cdf(&[0.0f32; 8], 3, true).unwrap();
        assert_eq!(table, uniform_cdf(8));

        let table = mixin_cdf(&[f64::INFINITY, 1.0, 0.0, 0.0], 0, true).unwrap();
        assert_eq!(table, uniform_cdf(4));
    }

    #[test]
    fn test_negative_and_nan_weights_ignored() {
        let table = mixin_cdf(&[f64::NAN, -3.0, 1.0, 1.0], 0, true).unwrap();
        assert_eq!(table[1] - table[0], 1);
        assert_eq!(table[2] - table[1], 1);
        assert!(first_non_increasing(&table).is_none());
    }

    #[test]
    fn test_model_shape_checks() {
        let genome = Genome::filled(Precision::F32, 15, 1.0, (0.0, 1.0));
        assert_eq!(
            ContextModel::from_genome(&genome, 4, false),
            Err(ModelError::GenomeShape {
                expected: 16,
                actual: 15
            })
        );

        let genome = Genome::filled(Precision::F32, 1, 1.0, (0.0, 1.0));
        assert_eq!(
            ContextModel::from_genome(&genome, 1, false),
            Err(ModelError::InvalidAlphabet(1))
        );
    }

    #[test]
    fn test_factory_tables() {
        let genome = Genome::filled(Precision::F64, 16, 0.5, (0.0, 1.0));
        let model = ContextModel::from_genome(&genome, 4, true).unwrap();
        let tables = model.build(4).unwrap();
        assert!(tables.validate(4).is_ok());
        assert!(tables.verify);
        assert_eq!(tables.cdf, uniform_cdf(4));
        assert_eq!(model.mixin(2), Some(&tables.mixin[2][..]));

        assert!(matches!(
            model.build(8),
            Err(IntegrityError::AlphabetMismatch {
                expected: 4,
                requested: 8
            })
        ));
    }

    #[test]
    fn test_build_is_idempotent() {
        let weights: Vec<f64> = (0..SYMBOLS * SYMBOLS)
            .map(|i| ((i * 7919) % 1000) as f64 / 1000.0)
            .collect();
        let genome = Genome::from_weights(Precision::F32, &weights, (0.0, 1.0));
        let a = ContextModel::from_genome(&genome, SYMBOLS, true).unwrap();
        let b = ContextModel::from_genome(&genome, SYMBOLS, true).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn mixin_tables_are_valid(row in prop::collection::vec(-1.0f64..2.0, 2..64)) {
            let table = mixin_cdf(&row, 0, true).unwrap();
            prop_assert_eq!(table.len(), row.len() + 1);
            prop_assert_eq!(table[0], 0);
            prop_assert_eq!(u32::from(table[row.len()]), CDF_SCALE);
            prop_assert!(first_non_increasing(&table).is_none());
        }
    }
}
