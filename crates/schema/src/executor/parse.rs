//! Wire input to typed value.

use std::collections::BTreeMap;

use castor_core::ast::{CastingNode, IntersectionNode, StructNode, TupleNode, UnionNode};
use castor_core::{BuiltIn, CastingStrategy, LiteralValue, Node, StructKind, Validator, Value};
use serde_json::{json, Value as Json};

use super::{Outcome, Walk, Walker};
use crate::coerce;
use crate::datetime;
use crate::issue::{Issue, Segment};

fn wire_type(wire: &Json) -> &'static str {
    match wire {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(n) if n.is_i64() || n.is_u64() => "int",
        Json::Number(_) => "float",
        Json::String(_) => "string",
        Json::Array(_) => "list",
        Json::Object(_) => "map",
    }
}

/// Struct-shaped typed value for `kind`.
pub(super) fn struct_value(kind: StructKind, map: BTreeMap<String, Value>) -> Value {
    match kind {
        StructKind::Array => Value::Map(map),
        StructKind::Object => Value::Object(map),
    }
}

impl Walker<'_> {
    pub(super) fn parse(&mut self, node: &Node, wire: &Json) -> Walk<Value> {
        self.nested(|w| w.parse_node(node, wire))
    }

    fn parse_node(&mut self, node: &Node, wire: &Json) -> Walk<Value> {
        match node {
            Node::BuiltIn { kind } => self.parse_builtin(node, *kind, wire),
            Node::Literal { value } => self.parse_literal(node, value, wire),
            Node::Enum { name } => self.parse_enum(node, name, wire),
            Node::DateTime { class, format } => match wire {
                Json::String(text) => match datetime::parse(text, format) {
                    Ok(value) => Ok(Outcome::Present(Value::DateTime {
                        class: class.clone(),
                        value,
                    })),
                    Err(message) => {
                        self.ctx.report(Issue::new("invalid_datetime").with_debug(json!({
                            "value": text,
                            "format": format.to_string(),
                            "message": message,
                        })));
                        Ok(Outcome::Invalid)
                    }
                },
                other => self.invalid_type(node, wire_type(other)),
            },
            Node::List { of } => match wire {
                Json::Array(items) => self.parse_items(of, items),
                other => self.invalid_type(node, wire_type(other)),
            },
            Node::Record { of } => match wire {
                Json::Object(map) => {
                    let mut out = BTreeMap::new();
                    for (key, item) in map {
                        match self.at(Segment::Key(key.clone()), |w| w.parse(of, item))? {
                            Outcome::Present(v) => {
                                out.insert(key.clone(), v);
                            }
                            _ => return Ok(Outcome::Invalid),
                        }
                    }
                    Ok(Outcome::Present(Value::Map(out)))
                }
                other => self.invalid_type(node, wire_type(other)),
            },
            Node::Tuple(t) => self.parse_tuple(node, t, wire),
            Node::Struct(s) => self.parse_struct(node, s, wire),
            Node::Union(u) => self.parse_union(node, u, wire),
            Node::Intersection(i) => self.parse_intersection(node, i, wire),
            Node::Constraint { of, validators } => {
                let outcome = self.parse(of, wire)?;
                self.check(outcome, validators)
            }
            Node::CustomCasting(c) => self.parse_cast(c, wire),
            Node::Branded(b) => self.parse(b.node(), wire),
            Node::Named { of, .. } => self.parse(of, wire),
            Node::LazyRef { key } => {
                let target = self.lazy(key)?;
                self.parse_node(target, wire)
            }
        }
    }

    fn parse_builtin(&mut self, node: &Node, kind: BuiltIn, wire: &Json) -> Walk<Value> {
        let coerce = self.exec.options.coerce_primitives;
        let value = match (kind, wire) {
            (BuiltIn::Mixed, other) => Some(Value::from_json(other)),
            (BuiltIn::Null, Json::Null) => Some(Value::Null),
            (BuiltIn::String, Json::String(s)) => Some(Value::String(s.clone())),
            (BuiltIn::Bool, Json::Bool(b)) => Some(Value::Bool(*b)),
            (BuiltIn::Int, Json::Number(n)) if n.is_i64() => n.as_i64().map(Value::Int),
            (BuiltIn::Float, Json::Number(n)) => n.as_f64().map(Value::Float),
            (BuiltIn::String, other) if coerce => coerce::to_string(other).map(Value::String),
            (BuiltIn::Bool, other) if coerce => coerce::to_bool(other).map(Value::Bool),
            (BuiltIn::Int, other) if coerce => coerce::to_int(other).map(Value::Int),
            (BuiltIn::Float, other) if coerce => coerce::to_float(other).map(Value::Float),
            _ => None,
        };
        match value {
            Some(v) => Ok(Outcome::Present(v)),
            None => self.invalid_type(node, wire_type(wire)),
        }
    }

    fn parse_literal(&mut self, node: &Node, literal: &LiteralValue, wire: &Json) -> Walk<Value> {
        let coerce = self.exec.options.coerce_primitives;
        let matched = match literal {
            LiteralValue::Bool(b) => match wire {
                Json::Bool(x) => x == b,
                other => coerce && coerce::to_bool(other) == Some(*b),
            },
            LiteralValue::Int(n) => match wire {
                Json::Number(x) => x.as_i64() == Some(*n),
                other => coerce && coerce::to_int(other) == Some(*n),
            },
            LiteralValue::Float(f) => match wire {
                Json::Number(x) => x.as_f64() == Some(*f),
                other => coerce && coerce::to_float(other) == Some(*f),
            },
            LiteralValue::String(s) => match wire {
                Json::String(x) => x == s,
                other => coerce && coerce::to_string(other).as_ref() == Some(s),
            },
            LiteralValue::EnumCase { case, .. } => wire.as_str() == Some(case.as_str()),
        };
        if !matched {
            let expected = self.describe(node);
            self.ctx.report(Issue::new("invalid_literal").with_debug(json!({ "expected": expected, "actual": wire })));
            return Ok(Outcome::Invalid);
        }
        Ok(Outcome::Present(match literal {
            LiteralValue::Bool(b) => Value::Bool(*b),
            LiteralValue::Int(n) => Value::Int(*n),
            LiteralValue::Float(f) => Value::Float(*f),
            LiteralValue::String(s) => Value::String(s.clone()),
            LiteralValue::EnumCase { name, case } => Value::Enum {
                name: name.clone(),
                case: case.clone(),
            },
        }))
    }

    fn parse_enum(&mut self, node: &Node, name: &str, wire: &Json) -> Walk<Value> {
        let Json::String(case) = wire else {
            return self.invalid_type(node, wire_type(wire));
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
        Ok(Outcome::Present(Value::Enum {
            name: name.to_owned(),
            case: case.clone(),
        }))
    }

    fn parse_items(&mut self, of: &Node, items: &[Json]) -> Walk<Value> {
        let mut out = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            match self.at(Segment::Index(idx), |w| w.parse(of, item))? {
                Outcome::Present(v) => out.push(v),
                _ => return Ok(Outcome::Invalid),
            }
        }
        Ok(Outcome::Present(Value::List(out)))
    }

    fn parse_tuple(&mut self, node: &Node, tuple: &TupleNode, wire: &Json) -> Walk<Value> {
        let Json::Array(items) = wire else {
            return self.invalid_type(node, wire_type(wire));
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
            match self.at(Segment::Index(idx), |w| w.parse(element, item))? {
                Outcome::Present(v) => out.push(v),
                _ => return Ok(Outcome::Invalid),
            }
        }
        Ok(Outcome::Present(Value::List(out)))
    }

    /// Input-direction properties only, walked in name order
    /// (the order of the canonical form). Stops at the first failing
    /// property.
    fn parse_struct(&mut self, node: &Node, shape: &StructNode, wire: &Json) -> Walk<Value> {
        let Json::Object(map) = wire else {
            return self.invalid_type(node, wire_type(wire));
        };
        let mut out = BTreeMap::new();
        for prop in shape.sorted_properties().into_iter().filter(|p| p.direction.is_input()) {
            let outcome = self.at(Segment::Key(prop.name.clone()), |w| match map.get(&prop.name) {
                Some(item) => w.parse(&prop.node, item),
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
        Ok(Outcome::Present(struct_value(shape.kind(), out)))
    }

    fn parse_union(&mut self, node: &Node, union: &UnionNode, wire: &Json) -> Walk<Value> {
        if let Some(d) = union.discriminator() {
            let Json::Object(map) = wire else {
                return self.invalid_type(node, wire_type(wire));
            };
            let Some(tag) = map.get(&d.field) else {
                self.at(Segment::Key(d.field.clone()), |w| {
                    w.ctx.report(Issue::new("missing_discriminator"));
                    Ok(Outcome::<()>::Invalid)
                })?;
                return Ok(Outcome::Invalid);
            };
            let Some(arm) = d.arm_for(tag) else {
                self.at(Segment::Key(d.field.clone()), |w| {
                    w.ctx.report(Issue::new("unknown_discriminator").with_debug(json!({
                        "value": tag,
                        "expected": d.arms.keys().collect::<Vec<_>>(),
                    })));
                    Ok(Outcome::<()>::Invalid)
                })?;
                return Ok(Outcome::Invalid);
            };
            tracing::trace!(field = %d.field, value = %tag, arm, "discriminated dispatch");
            return self.parse(&union.members()[arm], wire);
        }

        for (idx, member) in union.members().iter().enumerate() {
            let checkpoint = self.ctx.checkpoint();
            match self.parse(member, wire)? {
                Outcome::Present(v) => {
                    self.ctx.commit(checkpoint);
                    tracing::trace!(arm = idx, "union arm matched");
                    return Ok(Outcome::Present(v));
                }
                _ => self.ctx.rollback(checkpoint),
            }
        }
        let expected = self.describe(node);
        self.ctx.report(Issue::new("union_no_match").with_debug(json!({
            "expected": expected,
            "actual": wire_type(wire),
        })));
        Ok(Outcome::Invalid)
    }

    /// Every member parses the same input; property maps are merged, later
    /// members winning on shared keys.
    fn parse_intersection(&mut self, node: &Node, inter: &IntersectionNode, wire: &Json) -> Walk<Value> {
        if !wire.is_object() {
            return self.invalid_type(node, wire_type(wire));
        }
        let mut merged = BTreeMap::new();
        for member in inter.members() {
            let value = match self.parse(member, wire)? {
                Outcome::Present(v) => v,
                _ => return Ok(Outcome::Invalid),
            };
            match self.properties_of(&value)? {
                Some(map) => merged.extend(map),
                None => return self.invalid_type(member, value.type_name()),
            }
        }
        Ok(Outcome::Present(struct_value(inter.kind(), merged)))
    }

    fn check(&mut self, outcome: Outcome<Value>, validators: &[Validator]) -> Walk<Value> {
        match outcome {
            Outcome::Present(value) if self.validate(&value, validators) => Ok(Outcome::Present(value)),
            Outcome::Present(_) => Ok(Outcome::Invalid),
            other => Ok(other),
        }
    }

    fn parse_cast(&mut self, cast: &CastingNode, wire: &Json) -> Walk<Value> {
        let value = match self.parse(cast.node(), wire)? {
            Outcome::Present(v) => v,
            other => return Ok(other),
        };
        let source = self.source(cast.target())?;
        let built = match (cast.strategy(), value) {
            (CastingStrategy::Collection, Value::List(items)) => source.collect(items),
            (CastingStrategy::Constructor, Value::Map(args) | Value::Object(args)) => source.construct(&args),
            (CastingStrategy::AssignProperties, Value::Map(fields) | Value::Object(fields)) => {
                source.assign(&fields)
            }
            (_, other) => return self.invalid_type(cast.node(), other.type_name()),
        };
        match built {
            Ok(instance) => Ok(Outcome::Present(Value::Instance(instance))),
            Err(e) => self.casting_failed(cast.target(), &e.0),
        }
    }
}
