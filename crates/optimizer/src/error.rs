/// Why a batch of schemas could not be compiled.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptimizeError {
    /// The optimizer only takes parser output; references it did not
    /// create have no table entry to point at.
    #[error("schema '{schema}' already contains a reference to '{key}'")]
    UnresolvedRef { schema: String, key: String },
}
