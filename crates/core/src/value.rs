//! Typed domain values produced by `parse` and consumed by `serialize`.
//!
//! The wire side is plain `serde_json::Value`; this is the host side,
//! where enums, date/times and target-typed instances are first class.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// An instance of a host type registered through a `TypeSource`.
///
/// Equality is identity: two instances are equal only if they share
/// the same allocation.
#[derive(Clone)]
pub struct HostInstance {
    class: String,
    inner: Arc<dyn Any + Send + Sync>,
}

impl HostInstance {
    pub fn new<T: Any + Send + Sync>(class: impl Into<String>, value: T) -> Self {
        HostInstance {
            class: class.into(),
            inner: Arc::new(value),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for HostInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostInstance({})", self.class)
    }
}

impl PartialEq for HostInstance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Lists and tuples.
    List(Vec<Value>),
    /// Array-shaped structs and string-keyed records.
    Map(BTreeMap<String, Value>),
    /// Object-shaped structs without a target type.
    Object(BTreeMap<String, Value>),
    Enum {
        name: String,
        case: String,
    },
    DateTime {
        class: String,
        value: OffsetDateTime,
    },
    Instance(HostInstance),
}

impl Value {
    /// Returns a human-readable type name for issue payloads.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Enum { .. } => "enum",
            Value::DateTime { .. } => "datetime",
            Value::Instance(_) => "instance",
        }
    }

    /// Convert a plain wire value. Integral numbers become `Int`.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back to a wire value. Enums render as their case name and
    /// date/times as RFC 3339. Returns `None` for host instances and
    /// non-finite floats, which have no wire form.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        Some(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(x) => serde_json::Value::Number(serde_json::Number::from_f64(*x)?),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Value::Map(map) | Value::Object(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map {
                    out.insert(k.clone(), v.to_json()?);
                }
                serde_json::Value::Object(out)
            }
            Value::Enum { case, .. } => serde_json::Value::String(case.clone()),
            Value::DateTime { value, .. } => serde_json::Value::String(value.format(&Rfc3339).ok()?),
            Value::Instance(_) => return None,
        })
    }

    /// Number of elements for length-style validators: chars for strings,
    /// entries for lists and maps.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::List(items) => Some(items.len()),
            Value::Map(map) | Value::Object(map) => Some(map.len()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Property map of a struct-shaped value.
    pub fn as_properties(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) | Value::Object(map) => Some(map),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_conversion_keeps_integers_integral() {
        let v = Value::from_json(&json!({"a": 1, "b": 1.5, "c": [true, null]}));
        let map = v.as_properties().unwrap();
        assert_eq!(map["a"], Value::Int(1));
        assert_eq!(map["b"], Value::Float(1.5));
        assert_eq!(map["c"], Value::List(vec![Value::Bool(true), Value::Null]));
        assert_eq!(v.to_json(), Some(json!({"a": 1, "b": 1.5, "c": [true, null]})));
    }

    #[test]
    fn instances_compare_by_identity() {
        let a = HostInstance::new("Point", (1, 2));
        let b = HostInstance::new("Point", (1, 2));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.downcast_ref::<(i32, i32)>(), Some(&(1, 2)));
        assert!(Value::Instance(a).to_json().is_none());
    }

    #[test]
    fn enums_render_as_case_name() {
        let v = Value::Enum {
            name: "Status".into(),
            case: "Active".into(),
        };
        assert_eq!(v.to_json(), Some(json!("Active")));
    }

    #[test]
    fn nan_has_no_wire_form() {
        assert!(Value::Float(f64::NAN).to_json().is_none());
    }
}
