//! Adaptive arithmetic coder driven by a [`CdfFactory`].
//!
//! A 32-bit integer arithmetic coder with pending-bit (carry-free)
//! renormalization. The encoder reports the exact number of bits it emits,
//! which is the fitness signal of the model search.

use std::io::{self, Write};

use super::cdf::{CdfFactory, CdfTables, IntegrityError};

const CODE_BITS: u32 = 32;
const TOP: u64 = (1 << CODE_BITS) - 1;
const HALF: u64 = 1 << (CODE_BITS - 1);
const FIRST_QUARTER: u64 = HALF >> 1;
const THIRD_QUARTER: u64 = HALF + FIRST_QUARTER;

/// Coder errors.
#[derive(Debug, thiserror::Error)]
pub enum CoderError {
    #[error("failed to write compressed output: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

/// Adaptive coder over a fixed alphabet.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveCoder {
    alphabet: usize,
}

impl AdaptiveCoder {
    pub fn new(alphabet: usize) -> Self {
        Self { alphabet }
    }

    pub fn alphabet(&self) -> usize {
        self.alphabet
    }

    fn tables<F: CdfFactory + ?Sized>(&self, factory: &F) -> Result<CdfTables, IntegrityError> {
        let tables = factory.build(self.alphabet)?;
        tables.validate(self.alphabet)?;
        Ok(tables)
    }

    /// Encode `symbols` into `sink` and return the number of bits emitted.
    ///
    /// The sink receives the bits packed MSB first, zero padded to a byte.
    pub fn encode<I, F, W>(&self, symbols: I, factory: &F, sink: W) -> Result<u64, CoderError>
    where
        I: IntoIterator<Item = u16>,
        F: CdfFactory + ?Sized,
        W: Write,
    {
        let mut tables = self.tables(factory)?;
        let mut encoder = Encoder::new(sink);
        for symbol in symbols {
            let (low, high) = tables.range(symbol)?;
            encoder.encode(low, high, tables.total())?;
            tables.update(symbol)?;
        }
        Ok(encoder.finish()?)
    }

    /// Decode `bytes`, handing every symbol to `output` until it returns `true`.
    ///
    /// Returns the number of symbols decoded. The stream carries no length,
    /// so `output` must stop the decoder once its symbol budget is reached.
    pub fn decode<F, O>(&self, bytes: &[u8], factory: &F, mut output: O) -> Result<usize, CoderError>
    where
        F: CdfFactory + ?Sized,
        O: FnMut(u16) -> bool,
    {
        let mut tables = self.tables(factory)?;
        let mut decoder = Decoder::new(bytes);
        let mut count = 0;
        loop {
            let total = tables.total();
            let symbol = tables.find(decoder.target(total));
            let (low, high) = tables.range(symbol)?;
            decoder.consume(low, high, total);
            tables.update(symbol)?;
            count += 1;
            if output(symbol) {
                return Ok(count);
            }
        }
    }
}

/// MSB-first bit packer that counts what it writes.
struct BitWriter<W> {
    sink: W,
    byte: u8,
    filled: u8,
    bits: u64,
}

impl<W: Write> BitWriter<W> {
    fn new(sink: W) -> Self {
        Self {
            sink,
            byte: 0,
            filled: 0,
            bits: 0,
        }
    }

    fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.byte = (self.byte << 1) | u8::from(bit);
        self.filled += 1;
        self.bits += 1;
        if self.filled == 8 {
            self.sink.write_all(&[self.byte])?;
            self.byte = 0;
            self.filled = 0;
        }
        Ok(())
    }

    fn finish(mut self) -> io::Result<u64> {
        if self.filled > 0 {
            let last = self.byte << (8 - self.filled);
            self.sink.write_all(&[last])?;
        }
        self.sink.flush()?;
        Ok(self.bits)
    }
}

struct BitReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Next bit; reads past the end yield zeros.
    fn read_bit(&mut self) -> u64 {
        let bit = self
            .bytes
            .get(self.position / 8)
            .map_or(0, |byte| (byte >> (7 - self.position % 8)) & 1);
        self.position += 1;
        u64::from(bit)
    }
}

struct Encoder<W> {
    low: u64,
    high: u64,
    pending: u64,
    writer: BitWriter<W>,
}

impl<W: Write> Encoder<W> {
    fn new(sink: W) -> Self {
        Self {
            low: 0,
            high: TOP,
            pending: 0,
            writer: BitWriter::new(sink),
        }
    }

    fn emit(&mut self, bit: bool) -> io::Result<()> {
        self.writer.write_bit(bit)?;
        while self.pending > 0 {
            self.writer.write_bit(!bit)?;
            self.pending -= 1;
        }
        Ok(())
    }

    fn encode(&mut self, low: u32, high: u32, total: u32) -> io::Result<()> {
        let range = self.high - self.low + 1;
        let total = u64::from(total);
        self.high = self.low + range * u64::from(high) / total - 1;
        self.low += range * u64::from(low) / total;

        loop {
            if self.high < HALF {
                self.emit(false)?;
            } else if self.low >= HALF {
                self.emit(true)?;
                self.low -= HALF;
                self.high -= HALF;
            } else if self.low >= FIRST_QUARTER && self.high < THIRD_QUARTER {
                self.pending += 1;
                self.low -= FIRST_QUARTER;
                self.high -= FIRST_QUARTER;
            } else {
                break;
            }
            self.low <<= 1;
            self.high = (self.high << 1) | 1;
        }
        Ok(())
    }

    fn finish(mut self) -> io::Result<u64> {
        self.pending += 1;
        let bit = self.low >= FIRST_QUARTER;
        self.emit(bit)?;
        self.writer.finish()
    }
}

struct Decoder<'a> {
    low: u64,
    high: u64,
    value: u64,
    reader: BitReader<'a>,
}

impl<'a> Decoder<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        let mut reader = BitReader::new(bytes);
        let value = (0..CODE_BITS).fold(0, |value, _| (value << 1) | reader.read_bit());
        Self {
            low: 0,
            high: TOP,
            value,
            reader,
        }
    }

    fn target(&self, total: u32) -> u32 {
        let range = self.high - self.low + 1;
        (((self.value - self.low + 1) * u64::from(total) - 1) / range) as u32
    }

    fn consume(&mut self, low: u32, high: u32, total: u32) {
        let range = self.high - self.low + 1;
        let total = u64::from(total);
        self.high = self.low + range * u64::from(high) / total - 1;
        self.low += range * u64::from(low) / total;

        loop {
            if self.high < HALF {
                // Leading bit is 0 everywhere in the interval.
            } else if self.low >= HALF {
                self.low -= HALF;
                self.high -= HALF;
                self.value -= HALF;
            } else if self.low >= FIRST_QUARTER && self.high < THIRD_QUARTER {
                self.low -= FIRST_QUARTER;
                self.high -= FIRST_QUARTER;
                self.value -= FIRST_QUARTER;
            } else {
                break;
            }
            self.low <<= 1;
            self.high = (self.high << 1) | 1;
            self.value = (self.value << 1) | self.reader.read_bit();
        }
    }
}
