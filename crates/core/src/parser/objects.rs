//! `Pick`/`Omit` and host object types.

use super::references::{declaring_context, within};
use super::{Consumer, Parser, ParserState, ParsingContext};
use crate::ast::{CastingStrategy, Direction, LiteralValue, Node, Property, StructKind, StructNode};
use crate::error::InvalidSyntax;
use crate::host::{FieldDecl, TypeShape};
use crate::lexer::{Spanned, Token};

/// The struct a `Pick`/`Omit` target narrows, through labels and casts.
fn target_struct(node: &Node) -> Option<&StructNode> {
    match node {
        Node::Struct(s) => Some(s),
        Node::Named { of, .. } => target_struct(of),
        Node::CustomCasting(c) => target_struct(c.node()),
        _ => None,
    }
}

/// `'a'` or `'a'|'b'|...`.
fn literal_keys(node: &Node) -> Option<Vec<String>> {
    let key = |n: &Node| match n {
        Node::Literal {
            value: LiteralValue::String(s),
        } => Some(s.clone()),
        _ => None,
    };
    match node {
        Node::Union(u) => u.members().iter().map(key).collect(),
        other => key(other).map(|k| vec![k]),
    }
}

/// `Pick<T, 'a'|'b'>` keeps the named properties, `Omit<T, ...>` drops
/// them.
pub(super) struct PickOmitConsumer;

impl Consumer for PickOmitConsumer {
    fn name(&self) -> &'static str {
        "pick_omit"
    }

    fn can_consume(&self, state: &ParserState<'_>, _: &Parser) -> bool {
        matches!(state.ident(), Some("Pick" | "Omit")) && state.peek_at(1) == &Token::Lt
    }

    fn consume(&self, state: &mut ParserState<'_>, parser: &Parser) -> Result<Node, InvalidSyntax> {
        let utility_token = state.cur().clone();
        let utility = state.take_ident()?;
        let keep = utility == "Pick";
        state.expect(Token::Lt)?;
        let target_token = state.cur().clone();
        let target = parser.parse_type(state)?;
        state.expect(Token::Comma)?;
        let keys_token = state.cur().clone();
        let keys_node = parser.parse_type(state)?;
        state.expect(Token::Gt)?;

        let keys = literal_keys(&keys_node).ok_or_else(|| {
            state.err_at(
                &keys_token,
                format!(
                    "{} keys must be a string literal or a union of string literals, got '{}'",
                    utility, keys_node
                ),
            )
        })?;
        let Some(shape) = target_struct(&target) else {
            return Err(state.err_at(
                &target_token,
                format!("{} target must be a struct, got '{}'", utility, target),
            ));
        };
        if keep {
            if let Some(missing) = keys.iter().find(|k| shape.property(k).is_none()) {
                return Err(state.err_at(
                    &keys_token,
                    format!("Pick key '{}' is not a property of '{}'", missing, target),
                ));
            }
        }
        target
            .select_properties(&keys, keep)
            .map_err(|e| state.locate(&utility_token, e))
    }
}

/// Any identifier naming a registered host object type.
///
/// With a constructor, parameters become input properties and readable
/// fields become output properties; a field sharing a parameter's name is
/// merged into one bidirectional property. Without one, every field is
/// bidirectional and the instance is built by assignment.
pub(super) struct UserObjectConsumer;

struct Expansion<'s, 'p> {
    state: &'s ParserState<'s>,
    parser: &'p Parser,
    class: String,
    key: String,
    context: ParsingContext,
}

impl Expansion<'_, '_> {
    fn field(&self, decl: &FieldDecl) -> Result<Node, InvalidSyntax> {
        let node = self
            .parser
            .parse_nested(self.state, &decl.type_str, &self.context, Some(self.key.clone()))
            .map_err(|e| within(e, "field", &format!("{}.{}", self.class, decl.name)))?;
        if decl.validators.is_empty() {
            Ok(node)
        } else {
            Ok(Node::constraint(node, decl.validators.clone()))
        }
    }

    fn object(
        &self,
        at: &Spanned,
        constructor: Option<Vec<FieldDecl>>,
        fields: Vec<FieldDecl>,
    ) -> Result<Node, InvalidSyntax> {
        let strategy = match constructor {
            Some(_) => CastingStrategy::Constructor,
            None => CastingStrategy::AssignProperties,
        };
        let mut properties: Vec<Property> = Vec::new();
        for param in constructor.iter().flatten() {
            properties.push(
                Property::new(param.name.clone(), self.field(param)?)
                    .optional(param.optional)
                    .direction(Direction::Input),
            );
        }
        let fields_direction = match strategy {
            CastingStrategy::Constructor => Direction::Output,
            _ => Direction::Both,
        };
        for decl in &fields {
            match (properties.iter_mut().find(|p| p.name == decl.name), decl.promoted) {
                (Some(param), true) => {
                    param.direction = Direction::Both;
                    continue;
                }
                (Some(_), false) => {
                    return Err(self.state.err_at(
                        at,
                        format!(
                            "field '{}' of {} shares its name with a constructor parameter but is not promoted",
                            decl.name, self.class
                        ),
                    ));
                }
                (None, true) => {
                    return Err(self.state.err_at(
                        at,
                        format!("promoted field '{}' of {} has no constructor parameter", decl.name, self.class),
                    ));
                }
                (None, false) => {}
            }
            if decl.type_str.trim().is_empty() {
                return Err(self.state.err_at(
                    at,
                    format!("field '{}' of {} has no type", decl.name, self.class),
                ));
            }
            properties.push(
                Property::new(decl.name.clone(), self.field(decl)?)
                    .optional(decl.optional)
                    .direction(fields_direction),
            );
        }
        let shape = Node::structure(StructKind::Object, properties)
            .map_err(|e| within(self.state.locate(at, e), "object", &self.class))?;
        tracing::debug!(class = %self.class, strategy = strategy.keyword(), "expanded host object");
        Node::custom_casting(shape, self.class.clone(), strategy).map_err(|e| self.state.locate(at, e))
    }
}

impl Consumer for UserObjectConsumer {
    fn name(&self) -> &'static str {
        "user_object"
    }

    fn can_consume(&self, state: &ParserState<'_>, parser: &Parser) -> bool {
        match state.ident() {
            Some(w) => state
                .context()
                .candidates(w)
                .iter()
                .any(|c| parser.registry().object(c).is_some()),
            None => false,
        }
    }

    fn consume(&self, state: &mut ParserState<'_>, parser: &Parser) -> Result<Node, InvalidSyntax> {
        let token = state.cur().clone();
        let name = state.take_ident()?;
        let Some((class, source)) = state
            .context()
            .candidates(&name)
            .into_iter()
            .find_map(|c| parser.registry().object(&c).map(|s| (c, s.clone())))
        else {
            return Err(state.err_at(&token, format!("unknown object type '{}'", name)));
        };
        let key = format!("object:{}", class);
        if state.is_expanding(&key) {
            return Err(state.err_at(&token, format!("recursive object type '{}'", class)));
        }
        let expansion = Expansion {
            state: &*state,
            parser,
            context: declaring_context(&class),
            class,
            key,
        };
        match source.shape() {
            TypeShape::Object {
                constructor,
                fields,
            } => expansion.object(&token, constructor, fields),
            TypeShape::Collection { item } => {
                let item = expansion.field(&FieldDecl::new("item", item))?;
                Node::custom_casting(Node::list(item), expansion.class, CastingStrategy::Collection)
                    .map_err(|e| state.locate(&token, e))
            }
        }
    }
}
