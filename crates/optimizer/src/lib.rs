//! castor-optimizer: shares identical sub-trees across many schemas and
//! renders the result as Rust source.
//!
//! Parsing a type string means running the consumer chain and expanding
//! every host object it names. [`Optimizer::compile`] does that work once,
//! at build time, for a whole batch of named schemas; the emitted module
//! rebuilds the same graph at startup with plain constructor calls.

mod dedup;
mod emit;
pub mod error;

pub use dedup::{content_key, Compiled, Optimizer};
pub use error::OptimizeError;
