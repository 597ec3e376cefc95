//! Typed value to wire output. Never coerces.

use castor_core::ast::{CastingNode, IntersectionNode, StructNode, TupleNode, UnionNode};
use castor_core::{BuiltIn, CastingStrategy, LiteralValue, Node, StructKind, Value};
use serde_json::{json, Map, Value as Json};

use super::parse::struct_value;
use super::{Outcome, Walk, Walker};
use crate::datetime;
use crate::issue::{Issue, Segment};

impl Walker<'_> {
    pub(super) fn serialize(&mut self, node: &Node, value: &Value) -> Walk<Json> {
        self.nested(|w| w.serialize_node(node, value))
    }

    fn serialize_node(&mut self, node: &Node, value: &Value) -> Walk<Json> {
        match node {
            Node::BuiltIn { kind } => self.serialize_builtin(node, *kind, value),
            Node::Literal { value: literal } => self.serialize_literal(node, literal, value),
            Node::Enum { name } => self.serialize_enum(node, name, value),
            Node::DateTime { format, .. } => match value {
                Value::DateTime { value: dt, .. } => match datetime::format(dt, format) {
                    Ok(text) => Ok(Outcome::Present(Json::String(text))),
                    Err(message) => {
                        self.ctx.report(Issue::new("invalid_datetime").with_debug(json!({
                            "format": format.to_string(),
                            "message": message,
                        })));
                        Ok(Outcome::Invalid)
                    }
                },
                other => self.invalid_type(node, other.type_name()),
            },
            Node::List { of } => match value {
                Value::List(items) => self.serialize_items(of, items),
                other => self.invalid_type(node, other.type_name()),
            },
            Node::Record { of } => match value {
                Value::Map(map) | Value::Object(map) => {
                    let mut out = Map::new();
                    for (key, item) in map {
                        match self.at(Segment::Key(key.clone()), |w| w.serialize(of, item))? {
                            Outcome::Present(v) => {
                                out.insert(key.clone(), v);
                            }
                            _ => return Ok(Outcome::Invalid),
                        }
                    }
                    Ok(Outcome::Present(Json::Object(out)))
                }
                other => self.invalid_type(node, other.type_name()),
            },
            Node::Tuple(t) => self.serialize_tuple(node, t, value),
            Node::Struct(s) => self.serialize_struct(node, s, value),
            Node::Union(u) => self.serialize_union(node, u, value),
            Node::Intersection(i) => self.serialize_intersection(node, i, value),
            Node::Constraint { of, validators } => {
                let outcome = self.serialize(of, value)?;
                if let Outcome::Present(_) = outcome {
                    if !self.validate(value, validators) {
                        return Ok(Outcome::Invalid);
                    }
                }
                Ok(outcome)
            }
            Node::CustomCasting(c) => self.serialize_cast(c, value),
            Node::Branded(b) => self.serialize(b.node(), value),
            Node::Named { of, .. } => self.serialize(of, value),
            Node::LazyRef { key } => {
                let target = self.lazy(key)?;
                self.serialize_node(target, value)
            }
        }
    }

    fn serialize_builtin(&mut self, node: &Node, kind: BuiltIn, value: &Value) -> Walk<Json> {
        let out = match (kind, value) {
            (BuiltIn::Mixed, other) => other.to_json(),
            (BuiltIn::Null, Value::Null) => Some(Json::Null),
            (BuiltIn::String, Value::String(s)) => Some(Json::String(s.clone())),
            (BuiltIn::Bool, Value::Bool(b)) => Some(Json::Bool(*b)),
            (BuiltIn::Int, Value::Int(n)) => Some(Json::from(*n)),
            (BuiltIn::Float, Value::Float(x)) => serde_json::Number::from_f64(*x).map(Json::Number),
            (BuiltIn::Float, Value::Int(n)) => Some(Json::from(*n)),
            _ => None,
        };
        match out {
            Some(json) => Ok(Outcome::Present(json)),
            None => self.invalid_type(node, value.type_name()),
        }
    }

    fn serialize_literal(&mut self, node: &Node, literal: &LiteralValue, value: &Value) -> Walk<Json> {
        let matched = match (literal, value) {
            (LiteralValue::Bool(a), Value::Bool(b)) => a == b,
            (LiteralValue::Int(a), Value::Int(b)) => a == b,
            (LiteralValue::Float(a), Value::Float(b)) => a == b,
            (LiteralValue::String(a), Value::String(b)) => a == b,
            (LiteralValue::EnumCase { name, case }, Value::Enum { name: n, case: c }) => name == n && case == c,
            _ => false,
        };
        if !matched {
            let expected = self.describe(node);
            self.ctx.report(Issue::new("invalid_literal").with_debug(json!({
                "expected": expected,
                "actual": value.type_name(),
            })));
            return Ok(Outcome::Invalid);
        }
        let wire = match literal {
            LiteralValue::Bool(b) => Json::Bool(*b),
            LiteralValue::Int(n) => Json::from(*n),
            LiteralValue::Float(x) => serde_json::Number::from_f64(*x).map_or(Json::Null, Json::Number),
            LiteralValue::String(s) | LiteralValue::EnumCase { case: s, .. } => Json::String(s.clone()),
        };
        Ok(Outcome::Present(wire))
    }

    fn serialize_enum(&mut self, node: &Node, name: &str, value: &Value) -> Walk<Json> {
        let case = match value {
            Value::Enum { name: n, case } if n == name => case,
            other => return self.invalid_type(node, other.type_name()),
        };
        let def = self
            .types()
            .enumeration(name)
            .ok_or_else(|| crate::SchemaError::UnknownTarget(name.to_owned()))?;
        if !def.has_case(case) {
            self.ctx.report(Issue::new("invalid_enum_case").with_debug(json!({
                "enum": name,
                "value": case,
                "cases": def.cases,
            })));
            return Ok(Outcome::Invalid);
        }
        Ok(Outcome::Present(Json::String(case.clone())))
    }

    fn serialize_items(&mut self, of: &Node, items: &[Value]) -> Walk<Json> {
        let mut out = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            match self.at(Segment::Index(idx), |w| w.serialize(of, item))? {
                Outcome::Present(v) => out.push(v),
                _ => return Ok(Outcome::Invalid),
            }
        }
        Ok(Outcome::Present(Json::Array(out)))
    }

    fn serialize_tuple(&mut self, node: &Node, tuple: &TupleNode, value: &Value) -> Walk<Json> {
        let Value::List(items) = value else {
            return self.invalid_type(node, value.type_name());
        };
        if items.len() != tuple.elements().len() {
            self.ctx.report(Issue::new("invalid_tuple_length").with_debug(json!({
                "expected": tuple.elements().len(),
                "actual": items.len(),
            })));
            return Ok(Outcome::Invalid);
        }
        let mut out = Vec::with_capacity(items.len());
        for (idx, (element, item)) in tuple.elements().iter().zip(items).enumerate() {
            match self.at(Segment::Index(idx), |w| w.serialize(element, item))? {
                Outcome::Present(v) => out.push(v),
                _ => return Ok(Outcome::Invalid),
            }
        }
        Ok(Outcome::Present(Json::Array(out)))
    }

    /// Output-direction properties only, walked in name order
    /// (the order of the canonical form). Stops at the first failing
    /// property.
    fn serialize_struct(&mut self, node: &Node, shape: &StructNode, value: &Value) -> Walk<Json> {
        let Some(map) = value.as_properties() else {
            return self.invalid_type(node, value.type_name());
        };
        let mut out = Map::new();
        for prop in shape.sorted_properties().into_iter().filter(|p| p.direction.is_output()) {
            let outcome = self.at(Segment::Key(prop.name.clone()), |w| match map.get(&prop.name) {
                Some(item) => w.serialize(&prop.node, item),
                None => Ok(Outcome::Absent),
            })?;
            match outcome {
                Outcome::Present(v) => {
                    out.insert(prop.name.clone(), v);
                }
                Outcome::Absent if prop.optional => {}
                Outcome::Absent => {
                    self.at(Segment::Key(prop.name.clone()), |w| {
                        w.ctx.report(Issue::new("missing_property"));
                        Ok(Outcome::<()>::Invalid)
                    })?;
                    return Ok(Outcome::Invalid);
                }
                Outcome::Invalid => return Ok(Outcome::Invalid),
            }
        }
        Ok(Outcome::Present(Json::Object(out)))
    }

    fn serialize_union(&mut self, node: &Node, union: &UnionNode, value: &Value) -> Walk<Json> {
        if let Some(d) = union.discriminator() {
            let arm = value
                .as_properties()
                .and_then(|map| map.get(&d.field))
                .and_then(Value::to_json)
                .and_then(|tag| d.arm_for(&tag));
            if let Some(arm) = arm {
                tracing::trace!(field = %d.field, arm, "discriminated dispatch");
                return self.serialize(&union.members()[arm], value);
            }
        }

        for member in union.members() {
            let checkpoint = self.ctx.checkpoint();
            match self.serialize(member, value)? {
                Outcome::Present(v) => {
                    self.ctx.commit(checkpoint);
                    return Ok(Outcome::Present(v));
                }
                _ => self.ctx.rollback(checkpoint),
            }
        }
        let expected = self.describe(node);
        self.ctx.report(Issue::new("union_no_match").with_debug(json!({
            "expected": expected,
            "actual": value.type_name(),
        })));
        Ok(Outcome::Invalid)
    }

    fn serialize_intersection(&mut self, node: &Node, inter: &IntersectionNode, value: &Value) -> Walk<Json> {
        let Some(props) = self.properties_of(value)? else {
            return self.invalid_type(node, value.type_name());
        };
        let flat = struct_value(inter.kind(), props);
        let mut merged = Map::new();
        for member in inter.members() {
            match self.serialize(member, &flat)? {
                Outcome::Present(Json::Object(map)) => merged.extend(map),
                Outcome::Present(other) => return self.invalid_type(member, json_type(&other)),
                _ => return Ok(Outcome::Invalid),
            }
        }
        Ok(Outcome::Present(Json::Object(merged)))
    }

    /// Flatten a target-typed instance back into its struct or list.
    /// Values that are already plain are serialized as they are.
    fn serialize_cast(&mut self, cast: &CastingNode, value: &Value) -> Walk<Json> {
        let Value::Instance(instance) = value else {
            return self.serialize(cast.node(), value);
        };
        if instance.class() != cast.target() {
            return self.invalid_type(cast.node(), instance.class());
        }
        let Some(mut fields) = self.destructure(instance)? else {
            return Ok(Outcome::Invalid);
        };
        let flat = match cast.strategy() {
            CastingStrategy::Collection => match fields.remove("items") {
                Some(items @ Value::List(_)) => items,
                _ => return self.casting_failed(cast.target(), "collection did not yield an 'items' list"),
            },
            _ => struct_value(
                cast.node().struct_kind().unwrap_or(StructKind::Object),
                fields,
            ),
        };
        self.serialize(cast.node(), &flat)
    }
}

fn json_type(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "list",
        Json::Object(_) => "map",
    }
}
