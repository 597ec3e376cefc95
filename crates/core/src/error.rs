use serde::{Deserialize, Serialize};

/// A compile-time error raised while tokenizing or parsing a type string,
/// or while constructing a node whose invariants do not hold.
///
/// Carries a pointer to the offending token so callers can underline it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, thiserror::Error)]
#[error("{message} at offset {offset} in '{input}'")]
pub struct InvalidSyntax {
    pub message: String,
    /// Char offset of the offending token in `input`.
    pub offset: usize,
    /// Text of the offending token, empty for end of input.
    pub token: String,
    /// The type string being parsed. Empty when raised by a node constructor.
    pub input: String,
}

impl InvalidSyntax {
    pub fn new(
        message: impl Into<String>,
        input: &str,
        offset: usize,
        token: impl Into<String>,
    ) -> Self {
        InvalidSyntax {
            message: message.into(),
            offset,
            token: token.into(),
            input: input.to_owned(),
        }
    }

    /// An invariant violation detected while building a node outside of
    /// any particular type string.
    pub fn invariant(message: impl Into<String>) -> Self {
        InvalidSyntax {
            message: message.into(),
            offset: 0,
            token: String::new(),
            input: String::new(),
        }
    }

    /// Attach the type string and token position to an invariant error
    /// raised by a node constructor while parsing.
    pub fn at(mut self, input: &str, offset: usize, token: &str) -> Self {
        if self.input.is_empty() {
            self.input = input.to_owned();
            self.offset = offset;
            self.token = token.to_owned();
        }
        self
    }

    /// Render a caret pointer under the offending position.
    pub fn pointer(&self) -> String {
        let width = self.token.chars().count().max(1);
        format!(
            "{}\n{}{}",
            self.input,
            " ".repeat(self.offset),
            "^".repeat(width)
        )
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "input":   self.input,
            "message": self.message,
            "offset":  self.offset,
            "token":   self.token,
        })
    }
}
