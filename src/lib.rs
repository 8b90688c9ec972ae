//! Model search - evolving order-1 context models for adaptive compression.
//!
//! A genome is an `S×S` matrix of bounded weights. Row `c` becomes the CDF an
//! adaptive arithmetic coder filters toward after coding symbol `c`; the
//! genome's fitness is the number of bits that coder needs for the corpus.
//! A genetic algorithm searches for the genome with the smallest encoding.
//!
//! # Architecture
//!
//! - `schema`: Configuration, genome and result types
//! - `compute`: CDF tables, coder, model builder, corpus and the evolutionary search
//!
//! # Example
//!
//! ```rust,no_run
//! use model_search::{
//!     compute::{AdaptiveCoder, ContextModel, Corpus},
//!     schema::{Genome, Precision},
//! };
//!
//! let corpus = Corpus::from(b"abracadabra".as_slice());
//! let genome = corpus.transition_genome(256, Precision::F32, (0.0, 1.0));
//! let model = ContextModel::from_genome(&genome, 256, false).unwrap();
//!
//! let mut compressed = Vec::new();
//! let bits = AdaptiveCoder::new(256)
//!     .encode(corpus.symbols(), &model, &mut compressed)
//!     .unwrap();
//! println!("{} bytes -> {} bits", corpus.len(), bits);
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{EvolutionEngine, SearchError};
pub use compute::{AdaptiveCoder, ContextModel, Corpus};
pub use schema::{Genome, SearchConfig, SearchResult};
