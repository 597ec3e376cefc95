//! The type AST.
//!
//! Nodes are immutable once built. Variants whose shape carries an
//! invariant (tuples, structs, unions, intersections, brands) hold a
//! dedicated struct with private fields so they can only be created
//! through the checking constructors on [`Node`].
//!
//! `Display` renders the canonical string form used for hashing,
//! deduplication and diagnostics. Struct properties are rendered in
//! name order so structurally identical structs render identically.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::InvalidSyntax;
use crate::validator::Validator;

// ──────────────────────────────────────────────
// Leaves
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltIn {
    String,
    Int,
    Bool,
    Null,
    Float,
    Mixed,
}

impl BuiltIn {
    pub fn keyword(self) -> &'static str {
        match self {
            BuiltIn::String => "string",
            BuiltIn::Int => "int",
            BuiltIn::Bool => "bool",
            BuiltIn::Null => "null",
            BuiltIn::Float => "float",
            BuiltIn::Mixed => "mixed",
        }
    }
}

/// A pinned scalar or enum-case value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LiteralValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    EnumCase { name: String, case: String },
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Bool(b) => write!(f, "{}", b),
            LiteralValue::Int(n) => write!(f, "{}", n),
            LiteralValue::Float(x) => write!(f, "{:?}", x),
            LiteralValue::String(s) => write_quoted(f, s),
            LiteralValue::EnumCase { name, case } => write!(f, "{}::{}", name, case),
        }
    }
}

impl LiteralValue {
    /// The JSON text of this literal as it appears on the wire. Enum cases
    /// travel as their case name. Used to key discriminated unions.
    pub fn wire_key(&self) -> String {
        match self {
            LiteralValue::Bool(b) => b.to_string(),
            LiteralValue::Int(n) => n.to_string(),
            LiteralValue::Float(x) => serde_json::Number::from_f64(*x)
                .map(|n| n.to_string())
                .unwrap_or_else(|| "null".to_owned()),
            LiteralValue::String(s) | LiteralValue::EnumCase { case: s, .. } => {
                serde_json::Value::String(s.clone()).to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format", content = "pattern", rename_all = "snake_case")]
pub enum DateTimeFormat {
    Rfc3339,
    /// A `time` format description, e.g. `[year]-[month]-[day]`.
    Custom(String),
}

impl DateTimeFormat {
    /// `"rfc3339"` (any case) or a format description.
    pub fn from_config(s: &str) -> DateTimeFormat {
        if s.eq_ignore_ascii_case("rfc3339") || s.eq_ignore_ascii_case("atom") {
            DateTimeFormat::Rfc3339
        } else {
            DateTimeFormat::Custom(s.to_owned())
        }
    }
}

impl fmt::Display for DateTimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateTimeFormat::Rfc3339 => f.write_str("rfc3339"),
            DateTimeFormat::Custom(s) => write_quoted(f, s),
        }
    }
}

// ──────────────────────────────────────────────
// Structs and properties
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StructKind {
    Array,
    Object,
}

impl StructKind {
    pub fn keyword(self) -> &'static str {
        match self {
            StructKind::Array => "array",
            StructKind::Object => "object",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
    Both,
}

impl Direction {
    pub fn is_input(self) -> bool {
        matches!(self, Direction::Input | Direction::Both)
    }

    pub fn is_output(self) -> bool {
        matches!(self, Direction::Output | Direction::Both)
    }

    /// Whether a property with this direction takes part in `side`.
    pub fn includes(self, side: Direction) -> bool {
        match side {
            Direction::Input => self.is_input(),
            Direction::Output => self.is_output(),
            Direction::Both => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    pub node: Node,
    pub optional: bool,
    pub direction: Direction,
}

impl Property {
    pub fn new(name: impl Into<String>, node: Node) -> Self {
        Property {
            name: name.into(),
            node,
            optional: false,
            direction: Direction::Both,
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

/// A struct with at least one property and unique property names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructNode {
    kind: StructKind,
    properties: Vec<Property>,
}

impl StructNode {
    pub fn kind(&self) -> StructKind {
        self.kind
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Properties in name order, the order used by the canonical form.
    pub fn sorted_properties(&self) -> Vec<&Property> {
        let mut props: Vec<&Property> = self.properties.iter().collect();
        props.sort_by(|a, b| a.name.cmp(&b.name));
        props
    }
}

// ──────────────────────────────────────────────
// Composites
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TupleNode {
    elements: Vec<Node>,
}

impl TupleNode {
    pub fn elements(&self) -> &[Node] {
        &self.elements
    }
}

/// Field whose literal value selects exactly one union arm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discriminator {
    pub field: String,
    /// Wire form of the field value (see [`LiteralValue::wire_key`]) to
    /// arm index.
    pub arms: BTreeMap<String, usize>,
}

impl Discriminator {
    /// Arm selected by the field's wire value. An integer also selects an
    /// arm pinned to the float literal of equal value, as literal matching
    /// does.
    pub fn arm_for(&self, tag: &serde_json::Value) -> Option<usize> {
        if let Some(&arm) = self.arms.get(&tag.to_string()) {
            return Some(arm);
        }
        let n = tag
            .as_i64()
            .map(|n| n as f64)
            .or_else(|| tag.as_u64().map(|n| n as f64))?;
        self.arms.get(&LiteralValue::Float(n).wire_key()).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionNode {
    members: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    discriminator: Option<Discriminator>,
}

impl UnionNode {
    pub fn members(&self) -> &[Node] {
        &self.members
    }

    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntersectionNode {
    members: Vec<Node>,
    kind: StructKind,
}

impl IntersectionNode {
    pub fn members(&self) -> &[Node] {
        &self.members
    }

    /// The struct kind shared by every member.
    pub fn kind(&self) -> StructKind {
        self.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CastingStrategy {
    /// Invoke the target's constructor with the struct values.
    Constructor,
    /// Allocate a default instance, then assign public fields.
    AssignProperties,
    /// Build the target from the items of a list.
    Collection,
}

impl CastingStrategy {
    pub fn keyword(self) -> &'static str {
        match self {
            CastingStrategy::Constructor => "constructor",
            CastingStrategy::AssignProperties => "assign_properties",
            CastingStrategy::Collection => "collection",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CastingNode {
    node: Box<Node>,
    target: String,
    strategy: CastingStrategy,
}

impl CastingNode {
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn strategy(&self) -> CastingStrategy {
        self.strategy
    }
}

/// A nominal tag over an `int` or `string` built-in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandedNode {
    node: Box<Node>,
    tag: String,
}

impl BrandedNode {
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

// ──────────────────────────────────────────────
// Node
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    BuiltIn {
        kind: BuiltIn,
    },
    Literal {
        value: LiteralValue,
    },
    Enum {
        name: String,
    },
    DateTime {
        class: String,
        format: DateTimeFormat,
    },
    List {
        of: Box<Node>,
    },
    /// String-keyed map.
    Record {
        of: Box<Node>,
    },
    Tuple(TupleNode),
    Struct(StructNode),
    Union(UnionNode),
    Intersection(IntersectionNode),
    Constraint {
        of: Box<Node>,
        validators: Vec<Validator>,
    },
    CustomCasting(CastingNode),
    Branded(BrandedNode),
    /// A label with no runtime meaning.
    Named {
        of: Box<Node>,
        name: String,
    },
    /// Indirection into a shared [`NodeRegistry`](crate::registry::NodeRegistry).
    LazyRef {
        key: String,
    },
}

impl Node {
    pub fn builtin(kind: BuiltIn) -> Node {
        Node::BuiltIn { kind }
    }

    pub fn literal(value: LiteralValue) -> Node {
        Node::Literal { value }
    }

    pub fn enumeration(name: impl Into<String>) -> Node {
        Node::Enum { name: name.into() }
    }

    pub fn datetime(class: impl Into<String>, format: DateTimeFormat) -> Node {
        Node::DateTime {
            class: class.into(),
            format,
        }
    }

    pub fn list(of: Node) -> Node {
        Node::List { of: Box::new(of) }
    }

    pub fn record(of: Node) -> Node {
        Node::Record { of: Box::new(of) }
    }

    pub fn named(of: Node, name: impl Into<String>) -> Node {
        Node::Named {
            of: Box::new(of),
            name: name.into(),
        }
    }

    pub fn lazy_ref(key: impl Into<String>) -> Node {
        Node::LazyRef { key: key.into() }
    }

    pub fn constraint(of: Node, validators: Vec<Validator>) -> Node {
        Node::Constraint {
            of: Box::new(of),
            validators,
        }
    }

    pub fn tuple(elements: Vec<Node>) -> Result<Node, InvalidSyntax> {
        if elements.is_empty() {
            return Err(InvalidSyntax::invariant("tuple must have at least one element"));
        }
        Ok(Node::Tuple(TupleNode { elements }))
    }

    pub fn structure(kind: StructKind, properties: Vec<Property>) -> Result<Node, InvalidSyntax> {
        if properties.is_empty() {
            return Err(InvalidSyntax::invariant(format!(
                "{} struct must have at least one property",
                kind.keyword()
            )));
        }
        for (i, p) in properties.iter().enumerate() {
            if properties[..i].iter().any(|q| q.name == p.name) {
                return Err(InvalidSyntax::invariant(format!(
                    "duplicate property '{}'",
                    p.name
                )));
            }
        }
        Ok(Node::Struct(StructNode { kind, properties }))
    }

    pub fn union(members: Vec<Node>) -> Result<Node, InvalidSyntax> {
        if members.len() < 2 {
            return Err(InvalidSyntax::invariant("union must have at least two members"));
        }
        Ok(Node::Union(UnionNode {
            members,
            discriminator: None,
        }))
    }

    /// A union dispatched by `discriminator`. Every mapped index must
    /// name a member.
    pub fn discriminated_union(
        members: Vec<Node>,
        discriminator: Discriminator,
    ) -> Result<Node, InvalidSyntax> {
        if members.len() < 2 {
            return Err(InvalidSyntax::invariant("union must have at least two members"));
        }
        if let Some((value, idx)) = discriminator
            .arms
            .iter()
            .find(|(_, idx)| **idx >= members.len())
        {
            return Err(InvalidSyntax::invariant(format!(
                "discriminator value {} maps to missing arm {}",
                value, idx
            )));
        }
        Ok(Node::Union(UnionNode {
            members,
            discriminator: Some(discriminator),
        }))
    }

    /// Members must all be structs (through wrappers) of the same kind.
    /// Members whose kind cannot be known yet (lazy references) are
    /// accepted as long as one member fixes the kind.
    pub fn intersection(members: Vec<Node>) -> Result<Node, InvalidSyntax> {
        if members.len() < 2 {
            return Err(InvalidSyntax::invariant(
                "intersection must have at least two members",
            ));
        }
        let mut kind: Option<StructKind> = None;
        for m in &members {
            match m.struct_kind() {
                Some(k) => match kind {
                    Some(existing) if existing != k => {
                        return Err(InvalidSyntax::invariant(
                            "intersection mixes array and object shapes",
                        ));
                    }
                    _ => kind = Some(k),
                },
                None if matches!(m.unwrap_wrappers(), Node::LazyRef { .. }) => {}
                None => {
                    return Err(InvalidSyntax::invariant(format!(
                        "intersection member '{}' is not a struct",
                        m
                    )));
                }
            }
        }
        let kind = kind.ok_or_else(|| {
            InvalidSyntax::invariant("intersection has no member with a known shape")
        })?;
        Ok(Node::Intersection(IntersectionNode { members, kind }))
    }

    /// An intersection whose shape is given up front, for members that are
    /// all lazy references. Members with a known kind must still agree.
    pub fn intersection_of(kind: StructKind, members: Vec<Node>) -> Result<Node, InvalidSyntax> {
        if members.len() < 2 {
            return Err(InvalidSyntax::invariant(
                "intersection must have at least two members",
            ));
        }
        if members.iter().any(|m| m.struct_kind().is_some_and(|k| k != kind)) {
            return Err(InvalidSyntax::invariant(
                "intersection mixes array and object shapes",
            ));
        }
        Ok(Node::Intersection(IntersectionNode { members, kind }))
    }

    /// Struct-backed nodes (constructor / assign strategies) or list nodes
    /// (collection strategy) only.
    pub fn custom_casting(
        node: Node,
        target: impl Into<String>,
        strategy: CastingStrategy,
    ) -> Result<Node, InvalidSyntax> {
        let target = target.into();
        let ok = match (strategy, node.unwrap_wrappers()) {
            (_, Node::LazyRef { .. }) => true,
            (CastingStrategy::Collection, Node::List { .. }) => true,
            (CastingStrategy::Collection, _) => false,
            (_, Node::Struct(_)) => true,
            _ => false,
        };
        if !ok {
            return Err(InvalidSyntax::invariant(format!(
                "cannot cast '{}' into {} with the {} strategy",
                node,
                target,
                strategy.keyword()
            )));
        }
        Ok(Node::CustomCasting(CastingNode {
            node: Box::new(node),
            target,
            strategy,
        }))
    }

    pub fn branded(node: Node, tag: impl Into<String>) -> Result<Node, InvalidSyntax> {
        match node {
            Node::BuiltIn {
                kind: BuiltIn::Int | BuiltIn::String,
            } => Ok(Node::Branded(BrandedNode {
                node: Box::new(node),
                tag: tag.into(),
            })),
            other => Err(InvalidSyntax::invariant(format!(
                "only int and string can be branded, got '{}'",
                other
            ))),
        }
    }

    // -- Inspection ---------------------------------------------

    /// Strip `Constraint` and `Named` wrappers.
    pub fn unwrap_wrappers(&self) -> &Node {
        match self {
            Node::Constraint { of, .. } | Node::Named { of, .. } => of.unwrap_wrappers(),
            other => other,
        }
    }

    /// Struct kind at the root, looking through wrappers, casting and
    /// intersections.
    pub fn struct_kind(&self) -> Option<StructKind> {
        match self.unwrap_wrappers() {
            Node::Struct(s) => Some(s.kind),
            Node::Intersection(i) => Some(i.kind),
            Node::CustomCasting(c) => c.node.struct_kind(),
            _ => None,
        }
    }

    /// The struct at the root, looking through wrappers.
    pub fn as_struct(&self) -> Option<&StructNode> {
        match self.unwrap_wrappers() {
            Node::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Node::BuiltIn { .. } | Node::Literal { .. } | Node::Enum { .. } | Node::DateTime { .. }
        )
    }

    /// Short variant name for logs and issue payloads.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Node::BuiltIn { .. } => "built_in",
            Node::Literal { .. } => "literal",
            Node::Enum { .. } => "enum",
            Node::DateTime { .. } => "date_time",
            Node::List { .. } => "list",
            Node::Record { .. } => "record",
            Node::Tuple(_) => "tuple",
            Node::Struct(_) => "struct",
            Node::Union(_) => "union",
            Node::Intersection(_) => "intersection",
            Node::Constraint { .. } => "constraint",
            Node::CustomCasting(_) => "custom_casting",
            Node::Branded(_) => "branded",
            Node::Named { .. } => "named",
            Node::LazyRef { .. } => "lazy_ref",
        }
    }

    // -- Rewriting ----------------------------------------------

    /// Rebuild this node with every direct child replaced by `f(child)`.
    /// Invariants hold because arity and shapes are preserved.
    pub fn map_children<E>(&self, f: &mut impl FnMut(&Node) -> Result<Node, E>) -> Result<Node, E> {
        Ok(match self {
            Node::BuiltIn { .. }
            | Node::Literal { .. }
            | Node::Enum { .. }
            | Node::DateTime { .. }
            | Node::LazyRef { .. } => self.clone(),
            Node::List { of } => Node::List { of: Box::new(f(of)?) },
            Node::Record { of } => Node::Record { of: Box::new(f(of)?) },
            Node::Tuple(t) => Node::Tuple(TupleNode {
                elements: t.elements.iter().map(&mut *f).collect::<Result<_, _>>()?,
            }),
            Node::Struct(s) => Node::Struct(StructNode {
                kind: s.kind,
                properties: s
                    .properties
                    .iter()
                    .map(|p| {
                        Ok(Property {
                            node: f(&p.node)?,
                            ..p.clone()
                        })
                    })
                    .collect::<Result<_, E>>()?,
            }),
            Node::Union(u) => Node::Union(UnionNode {
                members: u.members.iter().map(&mut *f).collect::<Result<_, _>>()?,
                discriminator: u.discriminator.clone(),
            }),
            Node::Intersection(i) => Node::Intersection(IntersectionNode {
                members: i.members.iter().map(&mut *f).collect::<Result<_, _>>()?,
                kind: i.kind,
            }),
            Node::Constraint { of, validators } => Node::Constraint {
                of: Box::new(f(of)?),
                validators: validators.clone(),
            },
            Node::CustomCasting(c) => Node::CustomCasting(CastingNode {
                node: Box::new(f(&c.node)?),
                target: c.target.clone(),
                strategy: c.strategy,
            }),
            Node::Branded(b) => Node::Branded(BrandedNode {
                node: Box::new(f(&b.node)?),
                tag: b.tag.clone(),
            }),
            Node::Named { of, name } => Node::Named {
                of: Box::new(f(of)?),
                name: name.clone(),
            },
        })
    }

    /// The input or output rendering of this node: struct properties not
    /// taking part in `side` are dropped. A struct left without
    /// properties is kept empty; projections are for rendering only.
    pub fn project(&self, side: Direction) -> Node {
        let projected = match self.map_children(&mut |c| Ok::<_, std::convert::Infallible>(c.project(side))) {
            Ok(node) => node,
            Err(never) => match never {},
        };
        match projected {
            Node::Struct(s) => Node::Struct(StructNode {
                kind: s.kind,
                properties: s
                    .properties
                    .into_iter()
                    .filter(|p| p.direction.includes(side))
                    .collect(),
            }),
            other => other,
        }
    }

    /// Pick or omit struct properties by name. Works through wrappers and
    /// custom casting; fails when the result would have no properties.
    pub fn select_properties(&self, keys: &[String], keep: bool) -> Result<Node, InvalidSyntax> {
        match self {
            Node::Named { of, name } => Ok(Node::named(of.select_properties(keys, keep)?, name.clone())),
            Node::CustomCasting(c) => Ok(Node::CustomCasting(CastingNode {
                node: Box::new(c.node.select_properties(keys, keep)?),
                target: c.target.clone(),
                strategy: c.strategy,
            })),
            Node::Struct(s) => {
                let props: Vec<Property> = s
                    .properties
                    .iter()
                    .filter(|p| keys.contains(&p.name) == keep)
                    .cloned()
                    .collect();
                Node::structure(s.kind, props)
            }
            other => Err(InvalidSyntax::invariant(format!(
                "cannot select properties of '{}'",
                other
            ))),
        }
    }
}

// ──────────────────────────────────────────────
// Canonical form
// ──────────────────────────────────────────────

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in s.chars() {
        if c == '\'' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{}", c)?;
    }
    f.write_str("'")
}

fn is_plain_key(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

fn write_joined(f: &mut fmt::Formatter<'_>, nodes: &[Node], sep: &str) -> fmt::Result {
    for (i, n) in nodes.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", n)?;
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::BuiltIn { kind } => f.write_str(kind.keyword()),
            Node::Literal { value } => write!(f, "{}", value),
            Node::Enum { name } => write!(f, "enum<{}>", name),
            Node::DateTime { class, format } => write!(f, "datetime<{}, {}>", class, format),
            Node::List { of } => write!(f, "list<{}>", of),
            Node::Record { of } => write!(f, "array<string, {}>", of),
            Node::Tuple(t) => {
                f.write_str("array{")?;
                write_joined(f, &t.elements, ", ")?;
                f.write_str("}")
            }
            Node::Struct(s) => {
                write!(f, "{}{{", s.kind.keyword())?;
                for (i, p) in s.sorted_properties().into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match p.direction {
                        Direction::Input => f.write_str("in ")?,
                        Direction::Output => f.write_str("out ")?,
                        Direction::Both => {}
                    }
                    if is_plain_key(&p.name) {
                        f.write_str(&p.name)?;
                    } else {
                        write_quoted(f, &p.name)?;
                    }
                    if p.optional {
                        f.write_str("?")?;
                    }
                    write!(f, ": {}", p.node)?;
                }
                f.write_str("}")
            }
            Node::Union(u) => write_joined(f, &u.members, "|"),
            Node::Intersection(i) => {
                for (idx, m) in i.members.iter().enumerate() {
                    if idx > 0 {
                        f.write_str("&")?;
                    }
                    if matches!(m, Node::Union(_)) {
                        write!(f, "({})", m)?;
                    } else {
                        write!(f, "{}", m)?;
                    }
                }
                Ok(())
            }
            Node::Constraint { of, validators } => {
                write!(f, "constrained<{}", of)?;
                for v in validators {
                    write!(f, ", {}", v)?;
                }
                f.write_str(">")
            }
            Node::CustomCasting(c) => write!(
                f,
                "cast<{}, {}, {}>",
                c.target,
                c.strategy.keyword(),
                c.node
            ),
            Node::Branded(b) => {
                write!(f, "branded<{}, ", b.node)?;
                write_quoted(f, &b.tag)?;
                f.write_str(">")
            }
            Node::Named { of, name } => {
                f.write_str("named<")?;
                write_quoted(f, name)?;
                write!(f, ", {}>", of)
            }
            Node::LazyRef { key } => write!(f, "ref<{}>", key),
        }
    }
}
