//! Walks a [`Node`] against wire input (`parse`) or a typed value
//! (`serialize`).
//!
//! Both directions share one traversal shape: a `match` over the node
//! variant that pushes a path segment before each child and pops it after.
//! Data problems are recorded in the [`Context`] and surface as
//! [`Outcome::Invalid`]; only setup defects become `Err`.

use std::collections::BTreeMap;
use std::sync::Arc;

use castor_core::{
    HostInstance, Node, NodeRegistry, RegistryError, TypeRegistry, TypeSource, Validator, Value,
};
use serde_json::json;

use crate::error::SchemaError;
use crate::issue::{Context, Issue, Segment};
use crate::options::ParseOptions;

mod parse;
mod serialize;

/// Three-state result of walking one value.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Present(T),
    /// The value was not there; only meaningful for struct properties.
    Absent,
    Invalid,
}

impl<T> Outcome<T> {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Outcome::Invalid)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Present(v) => Outcome::Present(f(v)),
            Outcome::Absent => Outcome::Absent,
            Outcome::Invalid => Outcome::Invalid,
        }
    }
}

type Walk<T> = Result<Outcome<T>, SchemaError>;

/// Runs `parse` and `serialize` against nodes.
///
/// Holds only shared read-only state, so one executor can serve many
/// concurrent calls; each call owns a fresh [`Context`].
#[derive(Debug, Clone)]
pub struct Executor {
    types: Arc<TypeRegistry>,
    nodes: Option<Arc<NodeRegistry>>,
    options: ParseOptions,
}

impl Executor {
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        Executor {
            types,
            nodes: None,
            options: ParseOptions::default(),
        }
    }

    /// Resolve `LazyRef` nodes through `nodes`.
    pub fn with_nodes(mut self, nodes: Arc<NodeRegistry>) -> Self {
        self.nodes = Some(nodes);
        self
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Wire input to typed value.
    pub fn parse(&self, node: &Node, input: &serde_json::Value) -> Result<Value, SchemaError> {
        let mut walker = Walker::new(self);
        let outcome = walker.parse(node, input)?;
        walker.finish(outcome)
    }

    /// Typed value to wire output.
    pub fn serialize(&self, node: &Node, value: &Value) -> Result<serde_json::Value, SchemaError> {
        let mut walker = Walker::new(self);
        let outcome = walker.serialize(node, value)?;
        walker.finish(outcome)
    }
}

/// State of one call.
pub(crate) struct Walker<'e> {
    exec: &'e Executor,
    ctx: Context,
    depth: usize,
}

impl<'e> Walker<'e> {
    fn new(exec: &'e Executor) -> Self {
        Walker {
            exec,
            ctx: Context::new(),
            depth: 0,
        }
    }

    fn finish<T>(self, outcome: Outcome<T>) -> Result<T, SchemaError> {
        match outcome {
            Outcome::Present(v) if !self.ctx.has_issues() => Ok(v),
            Outcome::Present(_) | Outcome::Invalid => Err(SchemaError::Invalid(self.ctx.into_failure())),
            Outcome::Absent => {
                let mut ctx = self.ctx;
                ctx.report(Issue::new("missing_value"));
                Err(SchemaError::Invalid(ctx.into_failure()))
            }
        }
    }

    /// Run `f` one level deeper, failing with `depth_exceeded` past the
    /// configured limit.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Walk<T>) -> Walk<T> {
        if self.depth >= self.exec.options.max_depth {
            self.ctx.report(
                Issue::new("depth_exceeded").with_debug(json!({ "max_depth": self.exec.options.max_depth })),
            );
            return Ok(Outcome::Invalid);
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Run `f` with `segment` pushed onto the path.
    fn at<T>(&mut self, segment: Segment, f: impl FnOnce(&mut Self) -> Walk<T>) -> Walk<T> {
        self.ctx.push(segment);
        let result = f(self);
        self.ctx.pop();
        result
    }

    /// The node behind `key`, following chained references. A reference
    /// does not count as a nesting level.
    fn lazy(&self, key: &str) -> Result<&'e Node, SchemaError> {
        let nodes = self
            .exec
            .nodes
            .as_deref()
            .ok_or_else(|| RegistryError::UnknownKey(key.to_owned()))?;
        Ok(nodes.follow(nodes.get(key)?)?)
    }

    fn source(&self, target: &str) -> Result<&'e Arc<dyn TypeSource>, SchemaError> {
        self.exec
            .types
            .object(target)
            .ok_or_else(|| SchemaError::UnknownTarget(target.to_owned()))
    }

    fn types(&self) -> &'e TypeRegistry {
        &self.exec.types
    }

    /// Canonical form of `node` for issue payloads, with references
    /// replaced so optimized and plain schemas report alike.
    fn describe(&self, node: &Node) -> String {
        match self.exec.nodes.as_deref() {
            Some(nodes) => node
                .resolve(nodes)
                .map_or_else(|_| node.to_string(), |resolved| resolved.to_string()),
            None => node.to_string(),
        }
    }

    fn invalid_type<T>(&mut self, node: &Node, actual: &str) -> Walk<T> {
        let expected = self.describe(node);
        self.ctx.report(
            Issue::new("invalid_type").with_debug(json!({ "expected": expected, "actual": actual })),
        );
        Ok(Outcome::Invalid)
    }

    fn casting_failed<T>(&mut self, target: &str, message: &str) -> Walk<T> {
        tracing::debug!(target, message, "casting failed");
        self.ctx.report(
            Issue::new("casting_failed").with_debug(json!({ "target": target, "message": message })),
        );
        Ok(Outcome::Invalid)
    }

    /// Apply every validator, reporting each one that fails.
    fn validate(&mut self, value: &Value, validators: &[Validator]) -> bool {
        let mut ok = true;
        for v in validators {
            if !v.check(value) {
                self.ctx.report(Issue::new(v.key()).with_debug(v.payload()));
                ok = false;
            }
        }
        ok
    }

    /// Property map of a struct-shaped value, flattening host instances
    /// through their type source.
    fn properties_of(&mut self, value: &Value) -> Result<Option<BTreeMap<String, Value>>, SchemaError> {
        match value {
            Value::Map(map) | Value::Object(map) => Ok(Some(map.clone())),
            Value::Instance(instance) => self.destructure(instance),
            _ => Ok(None),
        }
    }

    fn destructure(&mut self, instance: &HostInstance) -> Result<Option<BTreeMap<String, Value>>, SchemaError> {
        let source = self.source(instance.class())?;
        match source.destructure(instance) {
            Ok(map) => Ok(Some(map)),
            Err(e) => {
                self.casting_failed::<()>(instance.class(), &e.0)?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests;
