//! Fitness: the size of the corpus encoded under a genome's model.

use std::io;

use crate::compute::{AdaptiveCoder, CoderError, ContextModel, Corpus, IntegrityError, ModelError};
use crate::schema::{Genome, ModelConfig};

/// Fitness evaluation errors.
#[derive(Debug, thiserror::Error)]
pub enum FitnessError {
    #[error("genome has {actual} genes, expected {expected} (alphabet squared)")]
    GenomeShape { expected: usize, actual: usize },
    #[error("invalid alphabet size {0}")]
    InvalidAlphabet(usize),
    #[error("corpus byte {byte} does not fit an alphabet of {alphabet} symbols")]
    SymbolOutOfAlphabet { byte: u8, alphabet: usize },
    #[error("coder I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

impl FitnessError {
    /// Whether the error means the model or coder broke an invariant.
    pub fn is_integrity(&self) -> bool {
        matches!(self, FitnessError::Integrity(_))
    }
}

impl From<ModelError> for FitnessError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::InvalidAlphabet(alphabet) => FitnessError::InvalidAlphabet(alphabet),
            ModelError::GenomeShape { expected, actual } => {
                FitnessError::GenomeShape { expected, actual }
            }
            ModelError::Integrity(e) => FitnessError::Integrity(e),
        }
    }
}

impl From<CoderError> for FitnessError {
    fn from(error: CoderError) -> Self {
        match error {
            CoderError::Io(e) => FitnessError::Io(e),
            CoderError::Integrity(e) => FitnessError::Integrity(e),
        }
    }
}

/// Scores genomes by the number of bits the adaptive coder emits for the
/// corpus. Lower is fitter.
///
/// Holds only shared, read-only state, so one evaluator serves every rayon
/// worker.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    corpus: Corpus,
    coder: AdaptiveCoder,
    verify: bool,
}

impl FitnessEvaluator {
    /// Create an evaluator for `corpus` under the model settings in `config`.
    pub fn new(corpus: Corpus, config: &ModelConfig) -> Result<Self, FitnessError> {
        if let Some(byte) = corpus.max_symbol()
            && usize::from(byte) >= config.symbols
        {
            return Err(FitnessError::SymbolOutOfAlphabet {
                byte,
                alphabet: config.symbols,
            });
        }
        Ok(Self {
            corpus,
            coder: AdaptiveCoder::new(config.symbols),
            verify: config.verify,
        })
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn alphabet(&self) -> usize {
        self.coder.alphabet()
    }

    pub fn verify(&self) -> bool {
        self.verify
    }

    /// Encode the corpus under `genome`'s model and return the bit count.
    ///
    /// In verify mode the output is decoded again and compared with the
    /// corpus; any difference is an integrity error.
    pub fn evaluate(&self, genome: &Genome) -> Result<u64, FitnessError> {
        let model = ContextModel::from_genome(genome, self.alphabet(), self.verify)?;

        if !self.verify {
            return Ok(self.coder.encode(self.corpus.symbols(), &model, io::sink())?);
        }

        let mut encoded = Vec::with_capacity(self.corpus.len());
        let bits = self
            .coder
            .encode(self.corpus.symbols(), &model, &mut encoded)?;
        self.check_round_trip(&encoded, &model)?;
        Ok(bits)
    }

    fn check_round_trip(&self, encoded: &[u8], model: &ContextModel) -> Result<(), FitnessError> {
        let expected = self.corpus.as_bytes();
        if expected.is_empty() {
            return Ok(());
        }

        let mut position = 0;
        let mut mismatch = None;
        self.coder.decode(encoded, model, |symbol| {
            if mismatch.is_none() && expected.get(position).map(|&b| u16::from(b)) != Some(symbol) {
                mismatch = Some(position);
            }
            position += 1;
            position >= expected.len()
        })?;

        if let Some(position) = mismatch {
            return Err(IntegrityError::RoundTripMismatch { position }.into());
        }
        if position != expected.len() {
            return Err(IntegrityError::RoundTripLength {
                decoded: position,
                expected: expected.len(),
            }
            .into());
        }
        log::trace!("round trip verified over {} symbols", expected.len());
        Ok(())
    }
}
