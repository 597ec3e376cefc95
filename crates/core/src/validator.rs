//! Runtime predicates attached to nodes through `Node::Constraint`.
//!
//! Each validator is a pure check over a typed value with a stable
//! message key. Values of a kind the validator does not apply to pass.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::InvalidSyntax;
use crate::value::Value;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s.]+$";
const URL_PATTERN: &str = r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/?#]+[^\s]*$";
const UUID_PATTERN: &str =
    r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

fn builtin_regex(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    // SAFETY: the builtin patterns are constants covered by the tests below
    cell.get_or_init(|| Regex::new(pattern).unwrap())
}

/// A compiled user pattern. Compares and renders by its source text.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, InvalidSyntax> {
        let regex = Regex::new(source)
            .map_err(|e| InvalidSyntax::invariant(format!("invalid pattern '{}': {}", source, e)))?;
        Ok(Pattern {
            source: source.to_owned(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "validator", rename_all = "snake_case")]
pub enum Validator {
    /// Length greater than zero.
    NonEmpty,
    /// Not empty and not `"0"`.
    NonFalsy,
    MinLength { min: usize },
    MaxLength { max: usize },
    /// Inclusive bounds.
    IntRange { min: i64, max: i64 },
    FloatRange { min: f64, max: f64 },
    Email,
    Url,
    Uuid,
    Pattern { pattern: Pattern },
}

impl Validator {
    /// Stable message key reported when the predicate fails.
    pub fn key(&self) -> &'static str {
        match self {
            Validator::NonEmpty => "validator.non_empty",
            Validator::NonFalsy => "validator.non_falsy",
            Validator::MinLength { .. } => "validator.min_length",
            Validator::MaxLength { .. } => "validator.max_length",
            Validator::IntRange { .. } => "validator.int_range",
            Validator::FloatRange { .. } => "validator.float_range",
            Validator::Email => "validator.email",
            Validator::Url => "validator.url",
            Validator::Uuid => "validator.uuid",
            Validator::Pattern { .. } => "validator.pattern",
        }
    }

    pub fn check(&self, value: &Value) -> bool {
        static EMAIL: OnceLock<Regex> = OnceLock::new();
        static URL: OnceLock<Regex> = OnceLock::new();
        static UUID: OnceLock<Regex> = OnceLock::new();

        match self {
            Validator::NonEmpty => value.length().map_or(true, |n| n > 0),
            Validator::NonFalsy => match value {
                Value::String(s) => !s.is_empty() && s != "0",
                other => other.length().map_or(true, |n| n > 0),
            },
            Validator::MinLength { min } => value.length().map_or(true, |n| n >= *min),
            Validator::MaxLength { max } => value.length().map_or(true, |n| n <= *max),
            Validator::IntRange { min, max } => match value {
                Value::Int(i) => i >= min && i <= max,
                _ => true,
            },
            Validator::FloatRange { min, max } => match value {
                Value::Float(x) => x >= min && x <= max,
                Value::Int(i) => (*i as f64) >= *min && (*i as f64) <= *max,
                _ => true,
            },
            Validator::Email => value
                .as_str()
                .map_or(true, |s| builtin_regex(&EMAIL, EMAIL_PATTERN).is_match(s)),
            Validator::Url => value
                .as_str()
                .map_or(true, |s| builtin_regex(&URL, URL_PATTERN).is_match(s)),
            Validator::Uuid => value
                .as_str()
                .map_or(true, |s| builtin_regex(&UUID, UUID_PATTERN).is_match(s)),
            Validator::Pattern { pattern } => {
                value.as_str().map_or(true, |s| pattern.regex.is_match(s))
            }
        }
    }

    /// Debug payload attached to the issue: the validator's parameters.
    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn bound(n: i64) -> String {
    match n {
        i64::MIN => "min".to_owned(),
        i64::MAX => "max".to_owned(),
        n => n.to_string(),
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::NonEmpty => f.write_str("non_empty"),
            Validator::NonFalsy => f.write_str("non_falsy"),
            Validator::MinLength { min } => write!(f, "min_length({})", min),
            Validator::MaxLength { max } => write!(f, "max_length({})", max),
            Validator::IntRange { min, max } => write!(f, "int_range({}, {})", bound(*min), bound(*max)),
            Validator::FloatRange { min, max } => write!(f, "float_range({:?}, {:?})", min, max),
            Validator::Email => f.write_str("email"),
            Validator::Url => f.write_str("url"),
            Validator::Uuid => f.write_str("uuid"),
            Validator::Pattern { pattern } => write!(f, "pattern({:?})", pattern.source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::String(v.to_owned())
    }

    #[test]
    fn length_validators_count_chars() {
        assert!(Validator::MinLength { min: 3 }.check(&s("héé")));
        assert!(!Validator::MaxLength { max: 2 }.check(&s("héé")));
        assert!(!Validator::NonEmpty.check(&Value::List(vec![])));
    }

    #[test]
    fn non_falsy_rejects_zero_string() {
        assert!(!Validator::NonFalsy.check(&s("0")));
        assert!(!Validator::NonFalsy.check(&s("")));
        assert!(Validator::NonFalsy.check(&s("00")));
    }

    #[test]
    fn int_range_is_inclusive() {
        let v = Validator::IntRange { min: 1, max: 3 };
        assert!(v.check(&Value::Int(1)));
        assert!(v.check(&Value::Int(3)));
        assert!(!v.check(&Value::Int(0)));
        assert_eq!(v.to_string(), "int_range(1, 3)");
        let open = Validator::IntRange { min: 0, max: i64::MAX };
        assert_eq!(open.to_string(), "int_range(0, max)");
    }

    #[test]
    fn builtin_patterns() {
        assert!(Validator::Email.check(&s("ada@example.org")));
        assert!(!Validator::Email.check(&s("ada@example")));
        assert!(Validator::Url.check(&s("https://example.org/a?b=c")));
        assert!(!Validator::Url.check(&s("example.org")));
        assert!(Validator::Uuid.check(&s("123e4567-e89b-12d3-a456-426614174000")));
        assert!(!Validator::Uuid.check(&s("123e4567")));
    }

    #[test]
    fn inapplicable_values_pass() {
        assert!(Validator::Email.check(&Value::Int(4)));
        assert!(Validator::IntRange { min: 1, max: 2 }.check(&s("x")));
    }

    #[test]
    fn user_pattern_compiles_or_fails() {
        let p = Pattern::new("^[a-z]+$").unwrap();
        let v = Validator::Pattern { pattern: p };
        assert!(v.check(&s("abc")));
        assert!(!v.check(&s("ab1")));
        assert!(Pattern::new("(").is_err());
    }
}
