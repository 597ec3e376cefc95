//! castor-schema: runs parsed types against data.
//!
//! [`Executor::parse`] turns plain wire data (`serde_json::Value`) into a
//! typed [`castor_core::Value`]; [`Executor::serialize`] goes the other
//! way. Problems with the data never panic or raise: they are collected
//! as path-addressed [`Issue`]s and returned together as a [`Failure`].

mod coerce;
mod datetime;
pub mod error;
pub mod executor;
pub mod issue;
pub mod options;

pub use error::SchemaError;
pub use executor::{Executor, Outcome};
pub use issue::{Context, Failure, Issue, ROOT_PATH};
pub use options::ParseOptions;
