//! `array`, `list`, tuples and struct shapes.

use super::{Consumer, Parser, ParserState};
use crate::ast::{BuiltIn, Node, Property, StructKind};
use crate::error::InvalidSyntax;
use crate::lexer::Token;
use crate::validator::Validator;

const LIST_KEYWORDS: &[&str] = &["array", "list", "non-empty-array", "non-empty-list"];

/// `array{` or `object{` followed by `key:` or `key?:`.
fn at_struct(state: &ParserState<'_>) -> bool {
    let keyword = match state.ident() {
        Some(w @ ("array" | "object")) => w,
        _ => return false,
    };
    if state.peek_at(1) != &Token::LBrace {
        return false;
    }
    if keyword == "object" {
        return true;
    }
    let key = matches!(state.peek_at(2), Token::Ident(_) | Token::Str(_));
    key && match state.peek_at(3) {
        Token::Colon => true,
        Token::Question => state.peek_at(4) == &Token::Colon,
        _ => false,
    }
}

/// `array<T>`, `array<K, V>`, `list<T>`, `T[]`-style lists, `array{T, U}`
/// and `array{0: T, 1: U}` tuples, and their `non-empty-` variants.
pub(super) struct ArrayLikeConsumer;

impl Consumer for ArrayLikeConsumer {
    fn name(&self) -> &'static str {
        "array_like"
    }

    fn can_consume(&self, state: &ParserState<'_>, _: &Parser) -> bool {
        matches!(state.ident(), Some(w) if LIST_KEYWORDS.contains(&w)) && !at_struct(state)
    }

    fn consume(&self, state: &mut ParserState<'_>, parser: &Parser) -> Result<Node, InvalidSyntax> {
        let keyword_token = state.cur().clone();
        let keyword = state.take_ident()?;
        let non_empty = keyword.starts_with("non-empty-");
        let is_list = keyword.ends_with("list");

        let node = match state.peek() {
            Token::Lt => {
                state.advance()?;
                let first_token = state.cur().clone();
                let first = parser.parse_type(state)?;
                if state.eat(&Token::Comma)? {
                    let value = parser.parse_type(state)?;
                    state.expect(Token::Gt)?;
                    match first {
                        Node::BuiltIn {
                            kind: BuiltIn::String,
                        } if !is_list => Node::record(value),
                        Node::BuiltIn { kind: BuiltIn::Int } => Node::list(value),
                        _ if is_list => {
                            return Err(state.err_at(&first_token, "list keys are always int"));
                        }
                        other => {
                            return Err(state.err_at(
                                &first_token,
                                format!("array key type must be string or int, got '{}'", other),
                            ));
                        }
                    }
                } else {
                    state.expect(Token::Gt)?;
                    Node::list(first)
                }
            }
            Token::LBrace if !is_list => parse_tuple(state, parser)?,
            _ => Node::list(Node::builtin(BuiltIn::Mixed)),
        };

        if non_empty {
            tracing::trace!(keyword = %keyword_token.text(), "non-empty constraint");
            Ok(Node::constraint(node, vec![Validator::NonEmpty]))
        } else {
            Ok(node)
        }
    }
}

/// `{T, U}` or `{0: T, 1: U}`; keys, when given, must count up from zero.
fn parse_tuple(state: &mut ParserState<'_>, parser: &Parser) -> Result<Node, InvalidSyntax> {
    let open = state.expect(Token::LBrace)?;
    let mut elements = Vec::new();
    while state.peek() != &Token::RBrace {
        if let (Token::Int(key), Token::Colon) = (state.peek().clone(), state.peek_at(1)) {
            if key != elements.len() as i64 {
                return Err(state.err(format!(
                    "tuple key {} out of order, expected {}",
                    key,
                    elements.len()
                )));
            }
            state.advance()?;
            state.advance()?;
        }
        elements.push(parser.parse_type(state)?);
        if !state.eat(&Token::Comma)? {
            break;
        }
    }
    state.expect(Token::RBrace)?;
    Node::tuple(elements).map_err(|e| state.locate(&open, e))
}

/// `object{...}` and `array{key: T, ...}`. A trailing comma is tolerated.
pub(super) struct StructConsumer;

impl Consumer for StructConsumer {
    fn name(&self) -> &'static str {
        "struct"
    }

    fn can_consume(&self, state: &ParserState<'_>, _: &Parser) -> bool {
        at_struct(state)
    }

    fn consume(&self, state: &mut ParserState<'_>, parser: &Parser) -> Result<Node, InvalidSyntax> {
        let keyword_token = state.cur().clone();
        let kind = match state.take_ident()?.as_str() {
            "object" => StructKind::Object,
            _ => StructKind::Array,
        };
        state.expect(Token::LBrace)?;
        let mut properties: Vec<Property> = Vec::new();
        while state.peek() != &Token::RBrace {
            let key_token = state.cur().clone();
            let name = match state.peek().clone() {
                Token::Ident(w) => w,
                Token::Str(s) => s,
                Token::Bool(b) => b.to_string(),
                other => return Err(state.err(format!("expected property name, got '{}'", other))),
            };
            state.advance()?;
            let optional = state.eat(&Token::Question)?;
            state.expect(Token::Colon)?;
            let node = parser.parse_type(state)?;
            if properties.iter().any(|p| p.name == name) {
                return Err(state.err_at(&key_token, format!("duplicate property '{}'", name)));
            }
            properties.push(Property::new(name, node).optional(optional));
            if !state.eat(&Token::Comma)? {
                break;
            }
        }
        state.expect(Token::RBrace)?;
        Node::structure(kind, properties).map_err(|e| state.locate(&keyword_token, e))
    }
}
