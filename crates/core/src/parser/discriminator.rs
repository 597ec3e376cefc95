use std::collections::BTreeMap;

use crate::ast::{Discriminator, Node, StructNode};

fn literal_key(s: &StructNode, field: &str) -> Option<String> {
    let prop = s.property(field)?;
    if prop.optional {
        return None;
    }
    match prop.node.unwrap_wrappers() {
        Node::Literal { value } => Some(value.wire_key()),
        _ => None,
    }
}

/// Find a field that is a required literal in every arm, with a distinct
/// value per arm. Arms must all be structs of one kind. Candidates are
/// tried in the first arm's declaration order.
pub fn infer_discriminator(members: &[Node]) -> Option<Discriminator> {
    if members.len() < 2 {
        return None;
    }
    let structs: Vec<&StructNode> = members.iter().map(Node::as_struct).collect::<Option<_>>()?;
    let kind = structs[0].kind();
    if structs.iter().any(|s| s.kind() != kind) {
        return None;
    }

    'candidates: for prop in structs[0].properties() {
        let mut arms = BTreeMap::new();
        for (idx, s) in structs.iter().enumerate() {
            let Some(key) = literal_key(s, &prop.name) else {
                continue 'candidates;
            };
            if arms.insert(key, idx).is_some() {
                continue 'candidates;
            }
        }
        return Some(Discriminator {
            field: prop.name.clone(),
            arms,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BuiltIn, LiteralValue, Property, StructKind};

    fn arm(kind: StructKind, tag: LiteralValue, extra: &str) -> Node {
        Node::structure(
            kind,
            vec![
                Property::new("type", Node::literal(tag)),
                Property::new(extra, Node::builtin(BuiltIn::Int)),
            ],
        )
        .unwrap()
    }

    fn s(v: &str) -> LiteralValue {
        LiteralValue::String(v.into())
    }

    #[test]
    fn distinct_literals_form_a_discriminator() {
        let members = vec![
            arm(StructKind::Array, s("a"), "x"),
            arm(StructKind::Array, s("b"), "y"),
        ];
        let d = infer_discriminator(&members).unwrap();
        assert_eq!(d.field, "type");
        assert_eq!(d.arms.get("\"a\""), Some(&0));
        assert_eq!(d.arms.get("\"b\""), Some(&1));
    }

    #[test]
    fn repeated_values_disable_dispatch() {
        let members = vec![
            arm(StructKind::Array, s("a"), "x"),
            arm(StructKind::Array, s("a"), "y"),
        ];
        assert!(infer_discriminator(&members).is_none());
    }

    #[test]
    fn mixed_kinds_or_non_structs_disable_dispatch() {
        let members = vec![
            arm(StructKind::Array, s("a"), "x"),
            arm(StructKind::Object, s("b"), "y"),
        ];
        assert!(infer_discriminator(&members).is_none());
        let members = vec![arm(StructKind::Array, s("a"), "x"), Node::builtin(BuiltIn::Null)];
        assert!(infer_discriminator(&members).is_none());
    }

    #[test]
    fn optional_tag_is_not_a_discriminator() {
        let optional = Node::structure(
            StructKind::Array,
            vec![Property::new("type", Node::literal(s("b"))).optional(true)],
        )
        .unwrap();
        let members = vec![arm(StructKind::Array, s("a"), "x"), optional];
        assert!(infer_discriminator(&members).is_none());
    }

    #[test]
    fn int_and_bool_tags_use_json_text() {
        let members = vec![
            arm(StructKind::Object, LiteralValue::Int(1), "x"),
            arm(StructKind::Object, LiteralValue::Bool(true), "y"),
        ];
        let d = infer_discriminator(&members).unwrap();
        assert_eq!(d.arms.get("1"), Some(&0));
        assert_eq!(d.arms.get("true"), Some(&1));
    }

    #[test]
    fn integer_wire_values_select_float_arms() {
        let members = vec![
            arm(StructKind::Object, LiteralValue::Float(1.0), "x"),
            arm(StructKind::Object, LiteralValue::Int(2), "y"),
        ];
        let d = infer_discriminator(&members).unwrap();
        assert_eq!(d.arm_for(&serde_json::json!(1)), Some(0));
        assert_eq!(d.arm_for(&serde_json::json!(1.0)), Some(0));
        assert_eq!(d.arm_for(&serde_json::json!(2)), Some(1));
        assert_eq!(d.arm_for(&serde_json::json!(2.0)), None);
        assert_eq!(d.arm_for(&serde_json::json!("1")), None);
    }
}
