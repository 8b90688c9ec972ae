//! Compute module - Context model, adaptive coder and the search over models.

mod cdf;
mod coder;
mod corpus;
mod model;

pub mod evolution;

pub use cdf::*;
pub use coder::*;
pub use corpus::*;
pub use model::*;
