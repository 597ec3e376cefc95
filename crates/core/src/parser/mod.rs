//! Recursive-descent parser from type strings to [`Node`] trees.
//!
//! The top level handles unions, intersections, grouping and the `[]`
//! modifier. Every primary type is produced by the first consumer in a
//! fixed-priority chain that accepts the current token; the order is part
//! of the contract.

use std::sync::Arc;

use crate::ast::{BuiltIn, Node};
use crate::error::InvalidSyntax;
use crate::host::TypeRegistry;
use crate::lexer::Token;

mod collections;
mod discriminator;
mod objects;
mod references;
mod scalars;
mod state;

pub use discriminator::infer_discriminator;
pub use state::{ImportedAlias, ParserState, ParsingContext};

/// Default limit on type nesting, alias and object expansion depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// One syntactic construct of the type language.
pub trait Consumer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    fn can_consume(&self, state: &ParserState<'_>, parser: &Parser) -> bool;

    fn consume(&self, state: &mut ParserState<'_>, parser: &Parser) -> Result<Node, InvalidSyntax>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

pub struct Parser {
    registry: Arc<TypeRegistry>,
    consumers: Vec<Box<dyn Consumer>>,
    config: ParserConfig,
}

impl Parser {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Parser {
            registry,
            consumers: default_consumers(),
            config: ParserConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a caller-supplied consumer. Extensions are tried after every
    /// built-in consumer, in registration order.
    pub fn with_extension(mut self, consumer: impl Consumer + 'static) -> Self {
        self.consumers.push(Box::new(consumer));
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn shared_registry(&self) -> Arc<TypeRegistry> {
        self.registry.clone()
    }

    /// Parse a type string with an empty context.
    pub fn parse(&self, input: &str) -> Result<Node, InvalidSyntax> {
        self.parse_in(input, &ParsingContext::default())
    }

    pub fn parse_in(&self, input: &str, context: &ParsingContext) -> Result<Node, InvalidSyntax> {
        let mut state = ParserState::new(input, context)?;
        let node = self.parse_type(&mut state)?;
        if !state.at_end() {
            return Err(state.err(format!("unexpected '{}' after type", state.peek())));
        }
        Ok(node)
    }

    /// Parse another type string (alias body, field type) on behalf of
    /// `parent`, tracking `key` on the expansion stack.
    pub(crate) fn parse_nested(
        &self,
        parent: &ParserState<'_>,
        input: &str,
        context: &ParsingContext,
        key: Option<String>,
    ) -> Result<Node, InvalidSyntax> {
        let mut state = parent.nested(input, context, key)?;
        let node = self.parse_type(&mut state)?;
        if !state.at_end() {
            return Err(state.err(format!("unexpected '{}' after type", state.peek())));
        }
        Ok(node)
    }

    /// `Type := '?'? Intersection ('|' Intersection)*`
    pub fn parse_type(&self, state: &mut ParserState<'_>) -> Result<Node, InvalidSyntax> {
        let first = state.cur().clone();
        let mut members = Vec::new();
        if state.eat(&Token::Question)? {
            members.push(Node::builtin(BuiltIn::Null));
        }
        members.push(self.parse_intersection(state)?);
        while state.eat(&Token::Pipe)? {
            members.push(self.parse_intersection(state)?);
        }
        if members.len() == 1 {
            return Ok(members.remove(0));
        }

        let members: Vec<Node> = members
            .into_iter()
            .flat_map(|m| match m {
                Node::Union(u) if u.discriminator().is_none() => u.members().to_vec(),
                other => vec![other],
            })
            .collect();

        let node = match infer_discriminator(&members) {
            Some(discriminator) => {
                tracing::debug!(
                    field = %discriminator.field,
                    arms = members.len(),
                    "inferred union discriminator"
                );
                Node::discriminated_union(members, discriminator)
            }
            None => Node::union(members),
        };
        node.map_err(|e| state.locate(&first, e))
    }

    /// `Intersection := Postfix ('&' Postfix)*`
    fn parse_intersection(&self, state: &mut ParserState<'_>) -> Result<Node, InvalidSyntax> {
        let first = state.cur().clone();
        let node = self.parse_postfix(state)?;
        if state.peek() != &Token::Amp {
            return Ok(node);
        }
        let mut members = vec![node];
        while state.eat(&Token::Amp)? {
            members.push(self.parse_postfix(state)?);
        }
        Node::intersection(members).map_err(|e| state.locate(&first, e))
    }

    /// `Postfix := Primary ('[]')*`
    fn parse_postfix(&self, state: &mut ParserState<'_>) -> Result<Node, InvalidSyntax> {
        let mut node = self.parse_primary(state)?;
        while state.eat(&Token::ClosedBrackets)? {
            node = Node::list(node);
        }
        Ok(node)
    }

    fn parse_primary(&self, state: &mut ParserState<'_>) -> Result<Node, InvalidSyntax> {
        if state.depth >= self.config.max_depth {
            return Err(state.err(format!(
                "type nested deeper than {} levels",
                self.config.max_depth
            )));
        }
        state.depth += 1;
        let result = self.parse_primary_inner(state);
        state.depth -= 1;
        result
    }

    fn parse_primary_inner(&self, state: &mut ParserState<'_>) -> Result<Node, InvalidSyntax> {
        if state.eat(&Token::LParen)? {
            let node = self.parse_type(state)?;
            state.expect(Token::RParen)?;
            return Ok(node);
        }
        for consumer in &self.consumers {
            if consumer.can_consume(state, self) {
                tracing::trace!(consumer = consumer.name(), token = %state.peek(), "consuming");
                return consumer.consume(state, self);
            }
        }
        match state.peek() {
            Token::Ident(w) => Err(state.err(format!("unknown type '{}'", w))),
            Token::Eof => Err(state.err("expected a type, got end of input")),
            other => Err(state.err(format!("expected a type, got '{}'", other))),
        }
    }
}

/// The built-in chain, in priority order.
fn default_consumers() -> Vec<Box<dyn Consumer>> {
    vec![
        Box::new(collections::ArrayLikeConsumer),
        Box::new(collections::StructConsumer),
        Box::new(scalars::BuiltInConsumer),
        Box::new(scalars::IntConsumer),
        Box::new(scalars::LiteralConsumer),
        Box::new(references::ClassConstConsumer),
        Box::new(references::EnumConsumer),
        Box::new(references::DateTimeConsumer),
        Box::new(references::AliasConsumer),
        Box::new(objects::PickOmitConsumer),
        Box::new(objects::UserObjectConsumer),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LiteralValue;

    fn parser() -> Parser {
        Parser::new(Arc::new(TypeRegistry::new()))
    }

    fn canonical(src: &str) -> String {
        parser()
            .parse(src)
            .unwrap_or_else(|e| panic!("failed to parse '{}': {}", src, e))
            .to_string()
    }

    #[test]
    fn bare_arm_is_not_a_union() {
        assert_eq!(canonical("int"), "int");
        assert_eq!(canonical("(string)"), "string");
    }

    #[test]
    fn leading_question_mark_adds_null_arm() {
        assert_eq!(canonical("?int"), "null|int");
        assert_eq!(canonical("?int|string"), "null|int|string");
    }

    #[test]
    fn closed_brackets_wrap_in_lists() {
        assert_eq!(canonical("int[][]"), "list<list<int>>");
        assert_eq!(canonical("(int|string)[]"), "list<int|string>");
    }

    #[test]
    fn nested_unions_are_flattened() {
        assert_eq!(canonical("int|(string|bool)"), "int|string|bool");
    }

    #[test]
    fn intersections_bind_tighter_than_unions() {
        let node = parser()
            .parse("array{a: int}&array{b: int}|null")
            .unwrap();
        match node {
            Node::Union(u) => {
                assert!(matches!(u.members()[0], Node::Intersection(_)));
                assert_eq!(u.members()[1], Node::builtin(BuiltIn::Null));
            }
            other => panic!("expected union, got {:?}", other),
        }
    }

    #[test]
    fn intersection_of_mixed_shapes_is_rejected() {
        let err = parser()
            .parse("array{a: int}&object{b: int}")
            .unwrap_err();
        assert_eq!(err.message, "intersection mixes array and object shapes");
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let err = parser().parse("int string").unwrap_err();
        assert_eq!(err.message, "unexpected 'string' after type");
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn unknown_identifier_is_fatal() {
        let err = parser().parse("array<Nope>").unwrap_err();
        assert_eq!(err.message, "unknown type 'Nope'");
        assert_eq!(err.token, "Nope");
    }

    #[test]
    fn missing_type_reports_end_of_input() {
        let err = parser().parse("int|").unwrap_err();
        assert_eq!(err.message, "expected a type, got end of input");
    }

    #[test]
    fn depth_is_bounded() {
        let deep = format!("{}int{}", "list<".repeat(10), ">".repeat(10));
        let p = parser().with_config(ParserConfig { max_depth: 5 });
        let err = p.parse(&deep).unwrap_err();
        assert!(err.message.contains("nested deeper than 5"), "{}", err.message);
        assert!(parser().parse(&deep).is_ok());
    }

    struct Money;

    impl Consumer for Money {
        fn name(&self) -> &'static str {
            "money"
        }

        fn can_consume(&self, state: &ParserState<'_>, _: &Parser) -> bool {
            state.is_ident("money")
        }

        fn consume(&self, state: &mut ParserState<'_>, _: &Parser) -> Result<Node, InvalidSyntax> {
            state.advance()?;
            Ok(Node::named(Node::builtin(BuiltIn::String), "money"))
        }
    }

    #[test]
    fn extensions_run_after_the_chain() {
        let p = parser().with_extension(Money);
        assert_eq!(p.parse("money[]").unwrap().to_string(), "list<named<'money', string>>");
        // built-ins still win over extensions
        assert_eq!(p.parse("'money'").unwrap(), Node::literal(LiteralValue::String("money".into())));
    }
}
