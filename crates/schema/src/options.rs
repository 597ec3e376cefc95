use serde::{Deserialize, Serialize};

/// Default nesting limit for a single walk.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Executor options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Accept string, number and bool wire values for one another on
    /// `parse`. `serialize` never coerces.
    pub coerce_primitives: bool,
    /// Values nested deeper than this fail with `depth_exceeded`.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            coerce_primitives: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn coercing() -> Self {
        ParseOptions {
            coerce_primitives: true,
            ..Default::default()
        }
    }
}
