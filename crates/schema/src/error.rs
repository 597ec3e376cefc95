use castor_core::RegistryError;

use crate::issue::Failure;

/// Result of a `parse` or `serialize` call that did not produce a value.
///
/// `Invalid` is the data-shaped outcome. The other variants are defects in
/// the schema setup: a reference the node registry cannot satisfy or a
/// cast to a type nobody registered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid data: {0}")]
    Invalid(Failure),
    #[error("unresolved reference: {0}")]
    UnresolvedRef(#[from] RegistryError),
    #[error("no type registered for '{0}'")]
    UnknownTarget(String),
}

impl SchemaError {
    /// The collected issues when this is a data failure.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            SchemaError::Invalid(f) => Some(f),
            _ => None,
        }
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            SchemaError::Invalid(f) => serde_json::json!({ "issues": f.to_json_value() }),
            other => serde_json::json!({ "error": other.to_string() }),
        }
    }
}
