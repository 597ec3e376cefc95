//! End-to-end behavior of parse and serialize over parsed type strings.

use std::collections::BTreeMap;
use std::sync::Arc;

use castor_core::{
    BuiltIn, CastError, Direction, FieldDecl, HostInstance, Node, Parser, TypeRegistry, TypeShape,
    TypeSource, Value,
};
use castor_schema::{Executor, ParseOptions, SchemaError};
use serde_json::{json, Value as Json};

struct Account {
    id: i64,
    name: String,
}

/// Built from `name` and `password`; exposes `id` and `name`.
struct AccountSource;

impl TypeSource for AccountSource {
    fn name(&self) -> &str {
        "Account"
    }

    fn shape(&self) -> TypeShape {
        TypeShape::Object {
            constructor: Some(vec![
                FieldDecl::new("name", "non-empty-string"),
                FieldDecl::new("password", "string"),
            ]),
            fields: vec![FieldDecl::new("id", "positive-int"), FieldDecl::new("name", "").promoted()],
        }
    }

    fn construct(&self, args: &BTreeMap<String, Value>) -> Result<HostInstance, CastError> {
        let name = args
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CastError::new("name is required"))?;
        Ok(HostInstance::new(
            "Account",
            Account {
                id: 42,
                name: name.to_owned(),
            },
        ))
    }

    fn destructure(&self, instance: &HostInstance) -> Result<BTreeMap<String, Value>, CastError> {
        let account = instance
            .downcast_ref::<Account>()
            .ok_or_else(|| CastError::new("not an Account"))?;
        Ok(BTreeMap::from([
            ("id".to_owned(), Value::Int(account.id)),
            ("name".to_owned(), Value::String(account.name.clone())),
        ]))
    }
}

fn types() -> Arc<TypeRegistry> {
    let mut reg = TypeRegistry::new();
    reg.register_object(Arc::new(AccountSource));
    Arc::new(reg)
}

fn node(src: &str) -> Node {
    Parser::new(types())
        .parse(src)
        .unwrap_or_else(|e| panic!("failed to parse '{}': {}", src, e))
}

fn executor() -> Executor {
    Executor::new(types())
}

fn failure_keys(result: Result<Value, SchemaError>, path: &str) -> Vec<String> {
    match result {
        Err(SchemaError::Invalid(f)) => f.keys_at(path).into_iter().map(str::to_owned).collect(),
        other => panic!("expected a data failure, got {:?}", other),
    }
}

#[test]
fn plain_struct_round_trips() {
    let n = node("array{id: positive-int, tags: string[], note?: string|null}");
    let e = executor();
    for input in [
        json!({"id": 1, "tags": []}),
        json!({"id": 2, "tags": ["a", "b"], "note": null}),
        json!({"id": 3, "tags": ["x"], "note": "hi", "ignored": true}),
    ] {
        let value = e.parse(&n, &input).unwrap();
        let wire = e.serialize(&n, &value).unwrap();
        assert_eq!(Some(wire), value.to_json(), "round trip of {}", input);
    }
}

#[test]
fn host_object_round_trips_through_its_output_side() {
    let n = node("Account");
    let e = executor();
    let value = e.parse(&n, &json!({"name": "ada", "password": "secret"})).unwrap();
    let wire = e.serialize(&n, &value).unwrap();
    assert_eq!(wire, json!({"id": 42, "name": "ada"}));

    let Node::CustomCasting(cast) = n.project(Direction::Output) else {
        panic!("expected a cast");
    };
    let output = cast.node().as_struct().unwrap();
    let mut names: Vec<&str> = output.properties().iter().map(|p| p.name.as_str()).collect();
    names.sort_unstable();
    let wire_keys: Vec<&str> = wire.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(names, wire_keys);
}

#[test]
fn input_only_properties_are_required_on_parse() {
    let keys = failure_keys(executor().parse(&node("Account"), &json!({"name": "ada"})), "password");
    assert_eq!(keys, vec!["missing_property"]);
}

#[test]
fn discriminator_dispatches_to_one_arm() {
    let n = node("array{type: 'a', x: int}|array{type: 'b', y: string}");
    let e = executor();
    assert!(e.parse(&n, &json!({"type": "a", "x": 1})).is_ok());

    let Err(SchemaError::Invalid(f)) = e.parse(&n, &json!({"type": "a", "y": "s"})) else {
        panic!("expected a data failure");
    };
    assert_eq!(f.keys_at("x"), vec!["missing_property"]);
    assert!(f.at("y").is_empty());
    assert_eq!(f.len(), 1);

    let Err(SchemaError::Invalid(f)) = e.parse(&n, &json!({"type": "c"})) else {
        panic!("expected a data failure");
    };
    assert_eq!(f.keys_at("type"), vec!["unknown_discriminator"]);
    assert_eq!(f.len(), 1);
}

#[test]
fn issues_are_addressed_by_path() {
    let n = node("array{users: array<array{name: string}>}");
    let result = executor().parse(&n, &json!({"users": [{"name": "ok"}, {}]}));
    assert_eq!(failure_keys(result, "users.1.name"), vec!["missing_property"]);
}

#[test]
fn coercion_is_opt_in_on_parse() {
    let n = node("int|bool");
    let strict = executor();
    assert_eq!(failure_keys(strict.parse(&n, &json!("7")), "$"), vec!["union_no_match"]);

    let lenient = executor().with_options(ParseOptions::coercing());
    assert_eq!(lenient.parse(&n, &json!("7")).unwrap(), Value::Int(7));
    assert!(matches!(
        lenient.serialize(&n, &Value::String("7".into())),
        Err(SchemaError::Invalid(_))
    ));
}

#[test]
fn branded_int_behaves_like_int() {
    let e = executor();
    let bare = Node::builtin(BuiltIn::Int);
    let branded = Node::branded(Node::builtin(BuiltIn::Int), "UserId").unwrap();
    let inputs: [Json; 4] = [json!(5), json!(-1), json!("5"), json!(1.5)];
    for input in &inputs {
        assert_eq!(e.parse(&branded, input), e.parse(&bare, input), "parse {}", input);
    }
    assert_eq!(
        e.serialize(&branded, &Value::Int(9)).unwrap(),
        e.serialize(&bare, &Value::Int(9)).unwrap()
    );
}
