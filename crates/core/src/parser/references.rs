//! Names resolved against the host registry or the parsing context:
//! `Class::CONST`, enums, date/time types and aliases.

use super::{Consumer, Parser, ParserState, ParsingContext};
use crate::ast::{LiteralValue, Node};
use crate::error::InvalidSyntax;
use crate::lexer::{Spanned, Token};

/// Context a registry entry named `qualified` is declared in.
pub(super) fn declaring_context(qualified: &str) -> ParsingContext {
    match qualified.rsplit_once('.') {
        Some((ns, _)) => ParsingContext::in_namespace(ns),
        None => ParsingContext::default(),
    }
}

/// Add the expansion site to an error raised inside an alias or field.
pub(super) fn within(err: InvalidSyntax, what: &str, name: &str) -> InvalidSyntax {
    InvalidSyntax {
        message: format!("{} (in {} '{}')", err.message, what, name),
        ..err
    }
}

/// `Class::CONST`, `Enum::Case`, and `Class::PREFIX_*` which expands to
/// the union of every matching constant.
pub(super) struct ClassConstConsumer;

impl ClassConstConsumer {
    fn enum_case(
        state: &ParserState<'_>,
        parser: &Parser,
        at: &Spanned,
        value: &LiteralValue,
    ) -> Result<(), InvalidSyntax> {
        if let LiteralValue::EnumCase { name, case } = value {
            let known = parser
                .registry()
                .enumeration(name)
                .is_some_and(|e| e.has_case(case));
            if !known {
                return Err(state.err_at(at, format!("constant refers to unknown enum case {}::{}", name, case)));
            }
        }
        Ok(())
    }

    fn one_of(
        state: &ParserState<'_>,
        at: &Spanned,
        pattern: &str,
        values: Vec<LiteralValue>,
    ) -> Result<Node, InvalidSyntax> {
        let mut nodes: Vec<Node> = values.into_iter().map(Node::literal).collect();
        match nodes.len() {
            0 => Err(state.err_at(at, format!("no constant matches '{}'", pattern))),
            1 => Ok(nodes.remove(0)),
            _ => Node::union(nodes).map_err(|e| state.locate(at, e)),
        }
    }
}

impl Consumer for ClassConstConsumer {
    fn name(&self) -> &'static str {
        "class_const"
    }

    fn can_consume(&self, state: &ParserState<'_>, _: &Parser) -> bool {
        state.ident().is_some() && state.peek_at(1) == &Token::DoubleColon
    }

    fn consume(&self, state: &mut ParserState<'_>, parser: &Parser) -> Result<Node, InvalidSyntax> {
        let class_token = state.cur().clone();
        let class = state.take_ident()?;
        state.expect(Token::DoubleColon)?;
        let const_token = state.cur().clone();
        let constant = state.take_ident()?;
        let prefix = constant.strip_suffix('*');
        let pattern = format!("{}::{}", class, constant);
        let registry = parser.registry();

        for candidate in state.context().candidates(&class) {
            let def = registry.enumeration(&candidate);

            if let Some(p) = prefix {
                let mut values: Vec<LiteralValue> = def
                    .map(|d| {
                        d.cases
                            .iter()
                            .filter(|c| c.starts_with(p))
                            .map(|c| LiteralValue::EnumCase {
                                name: d.name.clone(),
                                case: c.clone(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                for (_, value) in registry.constants_with_prefix(&candidate, p) {
                    Self::enum_case(state, parser, &const_token, value)?;
                    if !values.contains(value) {
                        values.push(value.clone());
                    }
                }
                if values.is_empty() && def.is_none() {
                    continue;
                }
                return Self::one_of(state, &const_token, &pattern, values);
            }

            // Enum cases shadow constants of the same name.
            if let Some(d) = def.filter(|d| d.has_case(&constant)) {
                return Ok(Node::literal(LiteralValue::EnumCase {
                    name: d.name.clone(),
                    case: constant,
                }));
            }
            if let Some(value) = registry.constant(&candidate, &constant) {
                Self::enum_case(state, parser, &const_token, value)?;
                return Ok(Node::literal(value.clone()));
            }
            if let Some(d) = def {
                return Err(state.err_at(
                    &const_token,
                    format!("enum {} has no case or constant '{}'", d.name, constant),
                ));
            }
        }
        Err(state.err_at(&class_token, format!("undefined constant {}", pattern)))
    }
}

pub(super) struct EnumConsumer;

impl Consumer for EnumConsumer {
    fn name(&self) -> &'static str {
        "enum"
    }

    fn can_consume(&self, state: &ParserState<'_>, parser: &Parser) -> bool {
        match state.ident() {
            Some(w) => state
                .context()
                .candidates(w)
                .iter()
                .any(|c| parser.registry().enumeration(c).is_some()),
            None => false,
        }
    }

    fn consume(&self, state: &mut ParserState<'_>, parser: &Parser) -> Result<Node, InvalidSyntax> {
        let token = state.cur().clone();
        let name = state.take_ident()?;
        state
            .context()
            .candidates(&name)
            .into_iter()
            .find_map(|c| parser.registry().enumeration(&c))
            .map(|def| Node::enumeration(def.name.clone()))
            .ok_or_else(|| state.err_at(&token, format!("unknown enum '{}'", name)))
    }
}

pub(super) struct DateTimeConsumer;

impl Consumer for DateTimeConsumer {
    fn name(&self) -> &'static str {
        "date_time"
    }

    fn can_consume(&self, state: &ParserState<'_>, parser: &Parser) -> bool {
        match state.ident() {
            Some(w) => state
                .context()
                .candidates(w)
                .iter()
                .any(|c| parser.registry().datetime(c).is_some()),
            None => false,
        }
    }

    fn consume(&self, state: &mut ParserState<'_>, parser: &Parser) -> Result<Node, InvalidSyntax> {
        let token = state.cur().clone();
        let name = state.take_ident()?;
        for candidate in state.context().candidates(&name) {
            if let Some(format) = parser.registry().datetime(&candidate) {
                return Ok(Node::datetime(candidate, format.clone()));
            }
        }
        Err(state.err_at(&token, format!("unknown date/time type '{}'", name)))
    }
}

/// Generic parameters, then local, imported and global aliases. Alias
/// bodies are re-parsed on every use in the context that declared them.
pub(super) struct AliasConsumer;

impl AliasConsumer {
    fn expand(
        state: &ParserState<'_>,
        parser: &Parser,
        at: &Spanned,
        name: &str,
        body: &str,
        context: &ParsingContext,
    ) -> Result<Node, InvalidSyntax> {
        let key = format!("alias:{}", name);
        if state.is_expanding(&key) {
            return Err(state.err_at(at, format!("recursive alias '{}'", name)));
        }
        tracing::trace!(alias = name, body, "expanding alias");
        parser
            .parse_nested(state, body, context, Some(key))
            .map_err(|e| within(e, "alias", name))
    }
}

impl Consumer for AliasConsumer {
    fn name(&self) -> &'static str {
        "alias"
    }

    fn can_consume(&self, state: &ParserState<'_>, parser: &Parser) -> bool {
        let Some(w) = state.ident() else {
            return false;
        };
        let ctx = state.context();
        ctx.generics.contains_key(w)
            || ctx.local_aliases.contains_key(w)
            || ctx.imported_aliases.contains_key(w)
            || ctx
                .candidates(w)
                .iter()
                .any(|c| parser.registry().alias(c).is_some())
    }

    fn consume(&self, state: &mut ParserState<'_>, parser: &Parser) -> Result<Node, InvalidSyntax> {
        let token = state.cur().clone();
        let name = state.take_ident()?;
        let ctx = state.context();

        if let Some(node) = ctx.generics.get(&name) {
            return Ok(node.clone());
        }
        if let Some(body) = ctx.local_aliases.get(&name) {
            return Self::expand(state, parser, &token, &name, body, ctx);
        }
        if let Some(imported) = ctx.imported_aliases.get(&name) {
            return Self::expand(state, parser, &token, &name, &imported.type_str, &imported.context);
        }
        for candidate in ctx.candidates(&name) {
            if let Some(def) = parser.registry().alias(&candidate) {
                let declared = declaring_context(&candidate);
                return Self::expand(state, parser, &token, &candidate, &def.type_str, &declared);
            }
        }
        Err(state.err_at(&token, format!("unknown alias '{}'", name)))
    }
}
