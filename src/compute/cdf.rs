//! Cumulative distribution tables consumed by the adaptive coder.
//!
//! A table of `S + 1` entries describes an `S`-symbol alphabet: symbol `s`
//! owns the half-open range `[cdf[s], cdf[s + 1])` out of `CDF_SCALE`.
//! The coder starts from a base table and, after each coded symbol, filters
//! the working table toward the mixin table of that symbol, so the next
//! prediction is conditioned on the previous symbol.

/// Fixed-point precision of a CDF table.
pub const CDF_FIXED: u32 = 13;

/// Total probability mass of every CDF table.
pub const CDF_SCALE: u32 = 1 << CDF_FIXED;

/// Adaptation rate: each update moves an entry `1 / 2^CDF_RATE` of the way
/// toward the mixin entry.
pub const CDF_RATE: u32 = 5;

/// Production alphabet size (one byte of context, one byte per symbol).
pub const SYMBOLS: usize = 256;

/// Largest alphabet for which every symbol can keep a bucket of width >= 1
/// next to the genome-weighted spread.
pub const MAX_ALPHABET: usize = (CDF_SCALE / 2) as usize;

/// Integrity failures: the model and coder disagree about an invariant.
///
/// These signal a bug, never a recoverable runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    #[error("mixin CDF for context {context} is not strictly increasing at entry {index}")]
    MixinNotIncreasing { context: usize, index: usize },
    #[error("adaptive CDF is not strictly increasing at entry {index}")]
    AdaptiveNotIncreasing { index: usize },
    #[error("CDF factory built for {expected} symbols, asked for {requested}")]
    AlphabetMismatch { expected: usize, requested: usize },
    #[error("malformed CDF tables: {0}")]
    MalformedTables(String),
    #[error("symbol {symbol} outside alphabet of {alphabet}")]
    SymbolOutOfRange { symbol: u16, alphabet: usize },
    #[error("symbol {symbol} has zero probability and cannot be coded")]
    ZeroWidthSymbol { symbol: u16 },
    #[error("round trip mismatch at byte {position}")]
    RoundTripMismatch { position: usize },
    #[error("round trip decoded {decoded} symbols, expected {expected}")]
    RoundTripLength { decoded: usize, expected: usize },
}

/// Source of the tables an adaptive coder runs on.
///
/// `build` is called once per encode or decode pass, so every pass starts
/// from the same state and owns its working buffers.
pub trait CdfFactory {
    fn build(&self, alphabet: usize) -> Result<CdfTables, IntegrityError>;
}

/// Base table, per-context mixin tables and the verify flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdfTables {
    /// Working table, initialised to the base CDF and adapted in place.
    pub cdf: Vec<u16>,
    /// One table per context (previous symbol).
    pub mixin: Vec<Vec<u16>>,
    /// Check strict monotonicity after every update.
    pub verify: bool,
}

impl CdfTables {
    /// Number of symbols described by the tables.
    #[inline]
    pub fn alphabet(&self) -> usize {
        self.cdf.len().saturating_sub(1)
    }

    /// Total mass (the last entry).
    #[inline]
    pub fn total(&self) -> u32 {
        self.cdf.last().copied().map_or(0, u32::from)
    }

    /// Check shape and endpoints of every table against `alphabet`.
    pub fn validate(&self, alphabet: usize) -> Result<(), IntegrityError> {
        if self.alphabet() != alphabet {
            return Err(IntegrityError::AlphabetMismatch {
                expected: self.alphabet(),
                requested: alphabet,
            });
        }
        if self.mixin.len() != alphabet {
            return Err(IntegrityError::MalformedTables(format!(
                "{} mixin tables for {} symbols",
                self.mixin.len(),
                alphabet
            )));
        }
        let endpoints_ok = |table: &[u16]| {
            table.len() == alphabet + 1
                && table[0] == 0
                && u32::from(table[alphabet]) == CDF_SCALE
        };
        if !endpoints_ok(&self.cdf) {
            return Err(IntegrityError::MalformedTables(
                "base CDF must run from 0 to CDF_SCALE".to_string(),
            ));
        }
        if let Some(context) = self.mixin.iter().position(|m| !endpoints_ok(m)) {
            return Err(IntegrityError::MalformedTables(format!(
                "mixin CDF {context} must run from 0 to CDF_SCALE"
            )));
        }
        Ok(())
    }

    /// Coding range `[low, high)` of `symbol` under the current table.
    #[inline]
    pub fn range(&self, symbol: u16) -> Result<(u32, u32), IntegrityError> {
        let s = usize::from(symbol);
        if s >= self.alphabet() {
            return Err(IntegrityError::SymbolOutOfRange {
                symbol,
                alphabet: self.alphabet(),
            });
        }
        let (low, high) = (u32::from(self.cdf[s]), u32::from(self.cdf[s + 1]));
        if high <= low {
            return Err(IntegrityError::ZeroWidthSymbol { symbol });
        }
        Ok((low, high))
    }

    /// Symbol whose range contains `target`.
    #[inline]
    pub fn find(&self, target: u32) -> u16 {
        let upper = self.cdf.partition_point(|&c| u32::from(c) <= target);
        let last = self.alphabet().saturating_sub(1);
        upper.saturating_sub(1).min(last) as u16
    }

    /// Filter the working table toward the mixin table of `symbol`.
    pub fn update(&mut self, symbol: u16) -> Result<(), IntegrityError> {
        let size = self.alphabet();
        let mixin = self
            .mixin
            .get(usize::from(symbol))
            .ok_or(IntegrityError::SymbolOutOfRange {
                symbol,
                alphabet: size,
            })?;

        for (entry, &target) in self.cdf[1..size].iter_mut().zip(&mixin[1..size]) {
            let a = i32::from(*entry);
            let b = i32::from(target);
            *entry = (a + ((b - a) >> CDF_RATE)) as u16;
        }

        if self.verify
            && let Some(index) = first_non_increasing(&self.cdf)
        {
            return Err(IntegrityError::AdaptiveNotIncreasing { index });
        }
        Ok(())
    }
}

/// Uniform table: entry `j` is `j * CDF_SCALE / alphabet`.
pub fn uniform_cdf(alphabet: usize) -> Vec<u16> {
    let scale = CDF_SCALE as usize;
    (0..=alphabet)
        .map(|j| (j * scale / alphabet.max(1)) as u16)
        .collect()
}

/// Index of the first entry that does not exceed its predecessor.
pub fn first_non_increasing(table: &[u16]) -> Option<usize> {
    table
        .windows(2)
        .position(|pair| pair[1] <= pair[0])
        .map(|i| i + 1)
}
