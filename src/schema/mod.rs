//! Schema module - Configuration, genome and result types for the model search.

mod config;
mod genome;
mod progress;

pub use config::*;
pub use genome::*;
pub use progress::*;
