//! Rust source rendering of a compiled table.
//!
//! The output is a self-contained module exposing `registry()`, `schema(name)`
//! and `names()`. Every node is rebuilt through the checking constructors on
//! `Node`, so a hand-edited artifact that breaks an invariant fails at load
//! time with `InvalidSyntax` instead of producing a malformed tree.

use std::fmt::Write;

use castor_core::{DateTimeFormat, LiteralValue, Node, Validator};

use crate::dedup::Compiled;

const HEADER: &str = "\
// @generated by castor-optimizer. Do not edit.

#[allow(unused_imports)]
use castor_core::{
    BuiltIn, CastingStrategy, DateTimeFormat, Direction, Discriminator, InvalidSyntax, LiteralValue,
    Node, NodeRegistry, Pattern, Property, StructKind, Validator,
};
";

pub(crate) fn render(compiled: &Compiled) -> String {
    let mut out = String::from(HEADER);

    out.push_str("\n/// Shared nodes by content key, built on first access.\n");
    out.push_str("pub fn registry() -> NodeRegistry {\n");
    out.push_str("    let mut registry = NodeRegistry::new();\n");
    for (key, node) in compiled.table() {
        let _ = writeln!(out, "    registry.insert({}, || Ok({}));", quote(key), expr(node));
    }
    out.push_str("    registry\n}\n");

    out.push_str("\n/// Root node of the schema called `name`, referring into [`registry`].\n");
    out.push_str("pub fn schema(name: &str) -> Option<Result<Node, InvalidSyntax>> {\n");
    out.push_str("    let build: fn() -> Result<Node, InvalidSyntax> = match name {\n");
    for (name, root) in compiled.roots() {
        let _ = writeln!(out, "        {} => || Ok({}),", quote(name), expr(root));
    }
    out.push_str("        _ => return None,\n    };\n    Some(build())\n}\n");

    out.push_str("\npub fn names() -> &'static [&'static str] {\n    &[");
    let names: Vec<String> = compiled.roots().keys().map(|n| quote(n)).collect();
    out.push_str(&names.join(", "));
    out.push_str("]\n}\n");
    out
}

/// A Rust string literal.
fn quote(s: &str) -> String {
    format!("{:?}", s)
}

fn int(n: i64) -> String {
    match n {
        i64::MIN => "i64::MIN".to_owned(),
        i64::MAX => "i64::MAX".to_owned(),
        n => n.to_string(),
    }
}

fn float(x: f64) -> String {
    if x.is_nan() {
        "f64::NAN".to_owned()
    } else if x == f64::INFINITY {
        "f64::INFINITY".to_owned()
    } else if x == f64::NEG_INFINITY {
        "f64::NEG_INFINITY".to_owned()
    } else {
        format!("{:?}", x)
    }
}

fn list(nodes: &[Node]) -> String {
    let items: Vec<String> = nodes.iter().map(expr).collect();
    format!("vec![{}]", items.join(", "))
}

fn literal(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Bool(b) => format!("LiteralValue::Bool({})", b),
        LiteralValue::Int(n) => format!("LiteralValue::Int({})", int(*n)),
        LiteralValue::Float(x) => format!("LiteralValue::Float({})", float(*x)),
        LiteralValue::String(s) => format!("LiteralValue::String({}.to_owned())", quote(s)),
        LiteralValue::EnumCase { name, case } => format!(
            "LiteralValue::EnumCase {{ name: {}.to_owned(), case: {}.to_owned() }}",
            quote(name),
            quote(case)
        ),
    }
}

fn validator(v: &Validator) -> String {
    match v {
        Validator::NonEmpty => "Validator::NonEmpty".to_owned(),
        Validator::NonFalsy => "Validator::NonFalsy".to_owned(),
        Validator::MinLength { min } => format!("Validator::MinLength {{ min: {} }}", min),
        Validator::MaxLength { max } => format!("Validator::MaxLength {{ max: {} }}", max),
        Validator::IntRange { min, max } => {
            format!("Validator::IntRange {{ min: {}, max: {} }}", int(*min), int(*max))
        }
        Validator::FloatRange { min, max } => {
            format!("Validator::FloatRange {{ min: {}, max: {} }}", float(*min), float(*max))
        }
        Validator::Email => "Validator::Email".to_owned(),
        Validator::Url => "Validator::Url".to_owned(),
        Validator::Uuid => "Validator::Uuid".to_owned(),
        Validator::Pattern { pattern } => {
            format!("Validator::Pattern {{ pattern: Pattern::new({})? }}", quote(pattern.source()))
        }
    }
}

/// An expression of type `Node`, using `?` on the fallible constructors.
fn expr(node: &Node) -> String {
    match node {
        Node::BuiltIn { kind } => format!("Node::builtin(BuiltIn::{:?})", kind),
        Node::Literal { value } => format!("Node::literal({})", literal(value)),
        Node::Enum { name } => format!("Node::enumeration({})", quote(name)),
        Node::DateTime { class, format } => {
            let format = match format {
                DateTimeFormat::Rfc3339 => "DateTimeFormat::Rfc3339".to_owned(),
                DateTimeFormat::Custom(s) => format!("DateTimeFormat::Custom({}.to_owned())", quote(s)),
            };
            format!("Node::datetime({}, {})", quote(class), format)
        }
        Node::List { of } => format!("Node::list({})", expr(of)),
        Node::Record { of } => format!("Node::record({})", expr(of)),
        Node::Tuple(t) => format!("Node::tuple({})?", list(t.elements())),
        Node::Struct(s) => {
            let props: Vec<String> = s
                .properties()
                .iter()
                .map(|p| {
                    let mut prop = format!("Property::new({}, {})", quote(&p.name), expr(&p.node));
                    if p.optional {
                        prop.push_str(".optional(true)");
                    }
                    if p.direction != castor_core::Direction::Both {
                        let _ = write!(prop, ".direction(Direction::{:?})", p.direction);
                    }
                    prop
                })
                .collect();
            format!("Node::structure(StructKind::{:?}, vec![{}])?", s.kind(), props.join(", "))
        }
        Node::Union(u) => match u.discriminator() {
            None => format!("Node::union({})?", list(u.members())),
            Some(d) => {
                let arms: Vec<String> = d
                    .arms
                    .iter()
                    .map(|(value, idx)| format!("({}.to_owned(), {})", quote(value), idx))
                    .collect();
                format!(
                    "Node::discriminated_union({}, Discriminator {{ field: {}.to_owned(), arms: [{}].into_iter().collect() }})?",
                    list(u.members()),
                    quote(&d.field),
                    arms.join(", ")
                )
            }
        },
        Node::Intersection(i) => {
            format!("Node::intersection_of(StructKind::{:?}, {})?", i.kind(), list(i.members()))
        }
        Node::Constraint { of, validators } => {
            let vs: Vec<String> = validators.iter().map(validator).collect();
            format!("Node::constraint({}, vec![{}])", expr(of), vs.join(", "))
        }
        Node::CustomCasting(c) => format!(
            "Node::custom_casting({}, {}, CastingStrategy::{:?})?",
            expr(c.node()),
            quote(c.target()),
            c.strategy()
        ),
        Node::Branded(b) => format!("Node::branded({}, {})?", expr(b.node()), quote(b.tag())),
        Node::Named { of, name } => format!("Node::named({}, {})", expr(of), quote(name)),
        Node::LazyRef { key } => format!("Node::lazy_ref({})", quote(key)),
    }
}
