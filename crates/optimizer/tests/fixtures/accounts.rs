// @generated by castor-optimizer. Do not edit.

#[allow(unused_imports)]
use castor_core::{
    BuiltIn, CastingStrategy, DateTimeFormat, Direction, Discriminator, InvalidSyntax, LiteralValue,
    Node, NodeRegistry, Pattern, Property, StructKind, Validator,
};

/// Shared nodes by content key, built on first access.
pub fn registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry.insert("473287f8298dba7163a897908958f7c0eae733e25d2e027992ea2edc9bed2fa8", || Ok(Node::builtin(BuiltIn::String)));
    registry.insert("6da88c34ba124c41f977db66a4fc5c1a951708d285c81bb0d47c3206f4c27ca8", || Ok(Node::builtin(BuiltIn::Int)));
    registry.insert("74234e98afe7498fb5daf1f36ac2d78acc339464f950703b8c019892f982b90b", || Ok(Node::builtin(BuiltIn::Null)));
    registry.insert("9afb3048d419d84b3f4f0227678ebeacf097a884d545f6beb923b378f8f9dd1a", || Ok(Node::structure(StructKind::Array, vec![Property::new("id", Node::constraint(Node::lazy_ref("6da88c34ba124c41f977db66a4fc5c1a951708d285c81bb0d47c3206f4c27ca8"), vec![Validator::IntRange { min: 1, max: i64::MAX }])), Property::new("name", Node::lazy_ref("473287f8298dba7163a897908958f7c0eae733e25d2e027992ea2edc9bed2fa8"))])?));
    registry.insert("c6294036f64548ea79166e1694ccf79bb0abcadc0a88a22d435678bb37e5101a", || Ok(Node::structure(StructKind::Array, vec![Property::new("accounts", Node::list(Node::lazy_ref("9afb3048d419d84b3f4f0227678ebeacf097a884d545f6beb923b378f8f9dd1a"))), Property::new("next", Node::union(vec![Node::lazy_ref("6da88c34ba124c41f977db66a4fc5c1a951708d285c81bb0d47c3206f4c27ca8"), Node::lazy_ref("74234e98afe7498fb5daf1f36ac2d78acc339464f950703b8c019892f982b90b")])?)])?));
    registry
}

/// Root node of the schema called `name`, referring into [`registry`].
pub fn schema(name: &str) -> Option<Result<Node, InvalidSyntax>> {
    let build: fn() -> Result<Node, InvalidSyntax> = match name {
        "query@accounts.get#output" => || Ok(Node::lazy_ref("9afb3048d419d84b3f4f0227678ebeacf097a884d545f6beb923b378f8f9dd1a")),
        "query@accounts.list#output" => || Ok(Node::lazy_ref("c6294036f64548ea79166e1694ccf79bb0abcadc0a88a22d435678bb37e5101a")),
        _ => return None,
    };
    Some(build())
}

pub fn names() -> &'static [&'static str] {
    &["query@accounts.get#output", "query@accounts.list#output"]
}
