//! Primitive coercion between wire strings, numbers and booleans.
//!
//! Only consulted on `parse` with `coerce_primitives` set. Each function
//! returns `None` when the wire value has no unambiguous reading.

use serde_json::Value as Json;

pub(crate) fn to_int(wire: &Json) -> Option<i64> {
    match wire {
        Json::Number(n) => n.as_i64().or_else(|| {
            let x = n.as_f64()?;
            (x.fract() == 0.0 && x >= i64::MIN as f64 && x <= i64::MAX as f64).then_some(x as i64)
        }),
        Json::String(s) => s.trim().parse().ok(),
        Json::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

pub(crate) fn to_float(wire: &Json) -> Option<f64> {
    match wire {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        Json::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

pub(crate) fn to_bool(wire: &Json) -> Option<bool> {
    match wire {
        Json::Bool(b) => Some(*b),
        Json::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Json::String(s) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn to_string(wire: &Json) -> Option<String> {
    match wire {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
