//! Built-in leaves, bounded ints and pinned literals.

use super::{Consumer, Parser, ParserState};
use crate::ast::{BuiltIn, LiteralValue, Node};
use crate::error::InvalidSyntax;
use crate::lexer::Token;
use crate::validator::Validator;

const BUILTIN_KEYWORDS: &[&str] = &[
    "string",
    "bool",
    "null",
    "float",
    "mixed",
    "positive-int",
    "negative-int",
    "non-negative-int",
    "non-positive-int",
    "non-empty-string",
    "non-falsy-string",
    "truthy-string",
    "scalar",
    "numeric",
];

fn int_range(min: i64, max: i64) -> Node {
    Node::constraint(
        Node::builtin(BuiltIn::Int),
        vec![Validator::IntRange { min, max }],
    )
}

pub(super) struct BuiltInConsumer;

impl Consumer for BuiltInConsumer {
    fn name(&self) -> &'static str {
        "built_in"
    }

    fn can_consume(&self, state: &ParserState<'_>, _: &Parser) -> bool {
        matches!(state.ident(), Some(w) if BUILTIN_KEYWORDS.contains(&w))
    }

    fn consume(&self, state: &mut ParserState<'_>, _: &Parser) -> Result<Node, InvalidSyntax> {
        let token = state.cur().clone();
        let keyword = state.take_ident()?;
        let node = match keyword.as_str() {
            "string" => Node::builtin(BuiltIn::String),
            "bool" => Node::builtin(BuiltIn::Bool),
            "null" => Node::builtin(BuiltIn::Null),
            "float" => Node::builtin(BuiltIn::Float),
            "mixed" => Node::builtin(BuiltIn::Mixed),
            "positive-int" => int_range(1, i64::MAX),
            "negative-int" => int_range(i64::MIN, -1),
            "non-negative-int" => int_range(0, i64::MAX),
            "non-positive-int" => int_range(i64::MIN, 0),
            "non-empty-string" => Node::constraint(
                Node::builtin(BuiltIn::String),
                vec![Validator::NonEmpty],
            ),
            "non-falsy-string" | "truthy-string" => Node::constraint(
                Node::builtin(BuiltIn::String),
                vec![Validator::NonFalsy],
            ),
            "scalar" => Node::union(vec![
                Node::builtin(BuiltIn::Int),
                Node::builtin(BuiltIn::Float),
                Node::builtin(BuiltIn::Bool),
                Node::builtin(BuiltIn::String),
            ])
            .map_err(|e| state.locate(&token, e))?,
            "numeric" => Node::union(vec![Node::builtin(BuiltIn::Int), Node::builtin(BuiltIn::Float)])
                .map_err(|e| state.locate(&token, e))?,
            other => return Err(state.err_at(&token, format!("unknown built-in '{}'", other))),
        };
        Ok(node)
    }
}

/// `int` and `int<min, max>`; either bound may be the `min`/`max` keyword.
pub(super) struct IntConsumer;

impl IntConsumer {
    fn bound(state: &mut ParserState<'_>) -> Result<i64, InvalidSyntax> {
        match state.peek().clone() {
            Token::Int(n) => {
                state.advance()?;
                Ok(n)
            }
            Token::Ident(w) if w == "min" => {
                state.advance()?;
                Ok(i64::MIN)
            }
            Token::Ident(w) if w == "max" => {
                state.advance()?;
                Ok(i64::MAX)
            }
            other => Err(state.err(format!(
                "expected an integer bound, 'min' or 'max', got '{}'",
                other
            ))),
        }
    }
}

impl Consumer for IntConsumer {
    fn name(&self) -> &'static str {
        "int"
    }

    fn can_consume(&self, state: &ParserState<'_>, _: &Parser) -> bool {
        state.is_ident("int")
    }

    fn consume(&self, state: &mut ParserState<'_>, _: &Parser) -> Result<Node, InvalidSyntax> {
        state.take_ident()?;
        if !state.eat(&Token::Lt)? {
            return Ok(Node::builtin(BuiltIn::Int));
        }
        let min_token = state.cur().clone();
        let min = Self::bound(state)?;
        state.expect(Token::Comma)?;
        let max = Self::bound(state)?;
        state.expect(Token::Gt)?;
        if min > max {
            return Err(state.err_at(
                &min_token,
                format!("int lower bound {} exceeds upper bound {}", min, max),
            ));
        }
        Ok(int_range(min, max))
    }
}

/// Quoted strings, numbers and booleans become pinned literals.
pub(super) struct LiteralConsumer;

impl Consumer for LiteralConsumer {
    fn name(&self) -> &'static str {
        "literal"
    }

    fn can_consume(&self, state: &ParserState<'_>, _: &Parser) -> bool {
        matches!(
            state.peek(),
            Token::Str(_) | Token::Int(_) | Token::Float(_) | Token::Bool(_)
        )
    }

    fn consume(&self, state: &mut ParserState<'_>, _: &Parser) -> Result<Node, InvalidSyntax> {
        let value = match state.advance()?.token {
            Token::Str(s) => LiteralValue::String(s),
            Token::Int(n) => LiteralValue::Int(n),
            Token::Float(x) => LiteralValue::Float(x),
            Token::Bool(b) => LiteralValue::Bool(b),
            other => return Err(state.err(format!("expected a literal, got '{}'", other))),
        };
        Ok(Node::literal(value))
    }
}
