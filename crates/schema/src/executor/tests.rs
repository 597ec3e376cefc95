use std::collections::BTreeMap;
use std::sync::Arc;

use castor_core::{
    CastError, DateTimeFormat, FieldDecl, HostInstance, Node, NodeRegistry, Parser, TypeRegistry,
    TypeShape, TypeSource, Value,
};
use serde_json::json;

use super::Executor;
use crate::error::SchemaError;
use crate::options::ParseOptions;

#[derive(Debug, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

struct PointSource;

impl TypeSource for PointSource {
    fn name(&self) -> &str {
        "Point"
    }

    fn shape(&self) -> TypeShape {
        TypeShape::Object {
            constructor: Some(vec![FieldDecl::new("x", "float"), FieldDecl::new("y", "float")]),
            fields: vec![
                FieldDecl::new("x", "").promoted(),
                FieldDecl::new("y", "").promoted(),
            ],
        }
    }

    fn construct(&self, args: &BTreeMap<String, Value>) -> Result<HostInstance, CastError> {
        let coord = |k: &str| match args.get(k) {
            Some(Value::Float(v)) => Ok(*v),
            _ => Err(CastError::new(format!("missing {}", k))),
        };
        let (x, y) = (coord("x")?, coord("y")?);
        if x < 0.0 {
            return Err(CastError::new("x must not be negative"));
        }
        Ok(HostInstance::new("Point", Point { x, y }))
    }

    fn destructure(&self, instance: &HostInstance) -> Result<BTreeMap<String, Value>, CastError> {
        let p = instance
            .downcast_ref::<Point>()
            .ok_or_else(|| CastError::new("not a Point"))?;
        Ok(BTreeMap::from([
            ("x".to_owned(), Value::Float(p.x)),
            ("y".to_owned(), Value::Float(p.y)),
        ]))
    }
}

struct TagsSource;

impl TypeSource for TagsSource {
    fn name(&self) -> &str {
        "Tags"
    }

    fn shape(&self) -> TypeShape {
        TypeShape::Collection {
            item: "string".into(),
        }
    }

    fn collect(&self, items: Vec<Value>) -> Result<HostInstance, CastError> {
        let tags: Vec<String> = items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect();
        Ok(HostInstance::new("Tags", tags))
    }

    fn destructure(&self, instance: &HostInstance) -> Result<BTreeMap<String, Value>, CastError> {
        let tags = instance
            .downcast_ref::<Vec<String>>()
            .ok_or_else(|| CastError::new("not Tags"))?;
        Ok(BTreeMap::from([(
            "items".to_owned(),
            Value::List(tags.iter().cloned().map(Value::String).collect()),
        )]))
    }
}

#[derive(Debug, PartialEq)]
struct Money {
    amount: i64,
    currency: String,
    note: Option<String>,
}

/// Built field by field, no constructor.
struct MoneySource;

impl TypeSource for MoneySource {
    fn name(&self) -> &str {
        "Money"
    }

    fn shape(&self) -> TypeShape {
        TypeShape::Object {
            constructor: None,
            fields: vec![
                FieldDecl::new("amount", "non-negative-int"),
                FieldDecl::new("currency", "string"),
                FieldDecl::new("note", "string").optional(),
            ],
        }
    }

    fn assign(&self, fields: &BTreeMap<String, Value>) -> Result<HostInstance, CastError> {
        let mut money = Money {
            amount: 0,
            currency: "XXX".to_owned(),
            note: None,
        };
        for (name, value) in fields {
            match (name.as_str(), value) {
                ("amount", Value::Int(n)) => money.amount = *n,
                ("currency", Value::String(c)) if c.len() == 3 => money.currency = c.clone(),
                ("currency", _) => return Err(CastError::new("currency must be a 3-letter code")),
                ("note", Value::String(n)) => money.note = Some(n.clone()),
                (other, _) => return Err(CastError::new(format!("unexpected field {}", other))),
            }
        }
        Ok(HostInstance::new("Money", money))
    }

    fn destructure(&self, instance: &HostInstance) -> Result<BTreeMap<String, Value>, CastError> {
        let m = instance
            .downcast_ref::<Money>()
            .ok_or_else(|| CastError::new("not Money"))?;
        let mut fields = BTreeMap::from([
            ("amount".to_owned(), Value::Int(m.amount)),
            ("currency".to_owned(), Value::String(m.currency.clone())),
        ]);
        if let Some(note) = &m.note {
            fields.insert("note".to_owned(), Value::String(note.clone()));
        }
        Ok(fields)
    }
}

fn types() -> Arc<TypeRegistry> {
    let mut reg = TypeRegistry::new();
    reg.register_enum("Status", &["Active", "Suspended"])
        .register_datetime("Day", DateTimeFormat::Custom("[year]-[month]-[day]".into()))
        .register_object(Arc::new(PointSource))
        .register_object(Arc::new(TagsSource))
        .register_object(Arc::new(MoneySource));
    Arc::new(reg)
}

fn node(src: &str) -> Node {
    Parser::new(types())
        .parse(src)
        .unwrap_or_else(|e| panic!("failed to parse '{}': {}", src, e))
}

fn exec() -> Executor {
    Executor::new(types())
}

fn issues(err: SchemaError) -> crate::Failure {
    match err {
        SchemaError::Invalid(f) => f,
        other => panic!("expected data failure, got {}", other),
    }
}

// ──────────────────────────────────────────────
// Leaves
// ──────────────────────────────────────────────

#[test]
fn leaves_accept_their_native_kind() {
    let e = exec();
    assert_eq!(e.parse(&node("int"), &json!(3)).unwrap(), Value::Int(3));
    assert_eq!(e.parse(&node("float"), &json!(3)).unwrap(), Value::Float(3.0));
    assert_eq!(e.parse(&node("mixed"), &json!({"a": 1})).unwrap(), Value::from_json(&json!({"a": 1})));
    let f = issues(e.parse(&node("string"), &json!(3)).unwrap_err());
    assert_eq!(f.keys_at("$"), vec!["invalid_type"]);
}

#[test]
fn enums_check_case_names() {
    let e = exec();
    assert_eq!(
        e.parse(&node("Status"), &json!("Active")).unwrap(),
        Value::Enum {
            name: "Status".into(),
            case: "Active".into()
        }
    );
    let f = issues(e.parse(&node("Status"), &json!("Gone")).unwrap_err());
    assert_eq!(f.keys_at("$"), vec!["invalid_enum_case"]);
    assert_eq!(e.serialize(&node("Status"), &Value::Enum {
        name: "Status".into(),
        case: "Suspended".into()
    }).unwrap(), json!("Suspended"));
}

#[test]
fn datetimes_use_their_format() {
    let e = exec();
    let v = e.parse(&node("Day"), &json!("2024-02-29")).unwrap();
    assert!(matches!(v, Value::DateTime { ref class, .. } if class == "Day"));
    assert_eq!(e.serialize(&node("Day"), &v).unwrap(), json!("2024-02-29"));
    let f = issues(e.parse(&node("Day"), &json!("2024-02-30")).unwrap_err());
    assert_eq!(f.keys_at("$"), vec!["invalid_datetime"]);
}

#[test]
fn literals_match_exactly() {
    let e = exec();
    assert!(e.parse(&node("'a'|'b'"), &json!("b")).is_ok());
    let f = issues(e.parse(&node("'a'"), &json!("c")).unwrap_err());
    assert_eq!(f.keys_at("$"), vec!["invalid_literal"]);
    assert!(e.parse(&node("7"), &json!("7")).is_err());
    let coercing = exec().with_options(ParseOptions::coercing());
    assert_eq!(coercing.parse(&node("7"), &json!("7")).unwrap(), Value::Int(7));
}

// ──────────────────────────────────────────────
// Containers and structs
// ──────────────────────────────────────────────

#[test]
fn first_invalid_element_fails_the_list() {
    let f = issues(exec().parse(&node("int[]"), &json!([1, "x", "y"])).unwrap_err());
    assert_eq!(f.keys_at("1"), vec!["invalid_type"]);
    assert!(f.at("2").is_empty());
}

#[test]
fn records_and_tuples() {
    let e = exec();
    let v = e.parse(&node("array<string, int>"), &json!({"a": 1})).unwrap();
    assert_eq!(v, Value::Map(BTreeMap::from([("a".to_owned(), Value::Int(1))])));
    assert!(e.parse(&node("array{int, string}"), &json!([1, "x"])).is_ok());
    let f = issues(e.parse(&node("array{int, string}"), &json!([1])).unwrap_err());
    assert_eq!(f.keys_at("$"), vec!["invalid_tuple_length"]);
}

#[test]
fn struct_stops_at_first_failing_property_in_name_order() {
    let n = node("array{b: int, a: int}");
    let f = issues(exec().parse(&n, &json!({"a": "x", "b": "y"})).unwrap_err());
    assert_eq!(f.keys_at("a"), vec!["invalid_type"]);
    assert!(f.at("b").is_empty());
}

#[test]
fn optional_properties_may_be_absent() {
    let n = node("object{a: int, b?: string}");
    let v = exec().parse(&n, &json!({"a": 1})).unwrap();
    assert_eq!(v, Value::Object(BTreeMap::from([("a".to_owned(), Value::Int(1))])));
    let f = issues(exec().parse(&n, &json!({"b": "x"})).unwrap_err());
    assert_eq!(f.keys_at("a"), vec!["missing_property"]);
}

#[test]
fn constraint_reports_every_failing_validator() {
    let n = Node::constraint(
        node("string"),
        vec![
            castor_core::Validator::MinLength { min: 5 },
            castor_core::Validator::Email,
        ],
    );
    let f = issues(exec().parse(&n, &json!("ab")).unwrap_err());
    assert_eq!(f.keys_at("$"), vec!["validator.min_length", "validator.email"]);
    assert!(exec().parse(&n, &json!("a@b.io")).is_ok());
}

// ──────────────────────────────────────────────
// Unions and intersections
// ──────────────────────────────────────────────

#[test]
fn union_keeps_no_issues_from_failed_arms() {
    let e = exec();
    assert_eq!(e.parse(&node("int|string"), &json!("x")).unwrap(), Value::String("x".into()));
    let f = issues(e.parse(&node("int|string"), &json!(true)).unwrap_err());
    assert_eq!(f.keys_at("$"), vec!["union_no_match"]);
    assert_eq!(f.len(), 1);
}

#[test]
fn missing_discriminator_field() {
    let n = node("array{type: 'a', x: int}|array{type: 'b', y: string}");
    let f = issues(exec().parse(&n, &json!({"x": 1})).unwrap_err());
    assert_eq!(f.keys_at("type"), vec!["missing_discriminator"]);
}

#[test]
fn float_discriminators_accept_integer_wire_values() {
    let n = node("array{v: 1.0, x: int}|array{v: 2, y: string}");
    assert!(matches!(&n, Node::Union(u) if u.discriminator().is_some()));
    let expected = Value::Map(BTreeMap::from([
        ("v".to_owned(), Value::Float(1.0)),
        ("x".to_owned(), Value::Int(5)),
    ]));
    assert_eq!(exec().parse(&n, &json!({"v": 1, "x": 5})).unwrap(), expected);
    assert_eq!(exec().parse(&n, &json!({"v": 1.0, "x": 5})).unwrap(), expected);
    assert_eq!(exec().serialize(&n, &expected).unwrap(), json!({"v": 1.0, "x": 5}));
    let f = issues(exec().parse(&n, &json!({"v": 2.0, "y": "s"})).unwrap_err());
    assert_eq!(f.keys_at("v"), vec!["unknown_discriminator"]);
}

#[test]
fn intersection_merges_members() {
    let n = node("array{a: int}&array{b: string}");
    let v = exec().parse(&n, &json!({"a": 1, "b": "x", "c": 0})).unwrap();
    assert_eq!(
        v,
        Value::Map(BTreeMap::from([
            ("a".to_owned(), Value::Int(1)),
            ("b".to_owned(), Value::String("x".into())),
        ]))
    );
    assert_eq!(exec().serialize(&n, &v).unwrap(), json!({"a": 1, "b": "x"}));
}

// ──────────────────────────────────────────────
// Casting
// ──────────────────────────────────────────────

#[test]
fn constructor_cast_builds_and_flattens() {
    let n = node("Point");
    let v = exec().parse(&n, &json!({"x": 1.5, "y": 2})).unwrap();
    let Value::Instance(instance) = &v else {
        panic!("expected an instance, got {:?}", v);
    };
    assert_eq!(instance.downcast_ref::<Point>(), Some(&Point { x: 1.5, y: 2.0 }));
    assert_eq!(exec().serialize(&n, &v).unwrap(), json!({"x": 1.5, "y": 2.0}));
}

#[test]
fn construction_errors_become_issues() {
    let f = issues(exec().parse(&node("Point"), &json!({"x": -1.0, "y": 0.0})).unwrap_err());
    let issue = &f.at("$")[0];
    assert_eq!(issue.key, "casting_failed");
    assert_eq!(issue.debug.as_ref().unwrap()["message"], json!("x must not be negative"));
}

#[test]
fn collection_cast() {
    let n = node("Tags");
    let v = exec().parse(&n, &json!(["a", "b"])).unwrap();
    assert_eq!(exec().serialize(&n, &v).unwrap(), json!(["a", "b"]));
}

#[test]
fn assign_properties_cast_builds_and_flattens() {
    let n = node("Money");
    let v = exec()
        .parse(&n, &json!({"amount": 5, "currency": "EUR", "extra": true}))
        .unwrap();
    let Value::Instance(instance) = &v else {
        panic!("expected an instance, got {:?}", v);
    };
    assert_eq!(
        instance.downcast_ref::<Money>(),
        Some(&Money {
            amount: 5,
            currency: "EUR".into(),
            note: None,
        })
    );
    assert_eq!(exec().serialize(&n, &v).unwrap(), json!({"amount": 5, "currency": "EUR"}));

    let with_note = Value::Instance(HostInstance::new(
        "Money",
        Money {
            amount: 0,
            currency: "USD".into(),
            note: Some("refund".into()),
        },
    ));
    assert_eq!(
        exec().serialize(&n, &with_note).unwrap(),
        json!({"amount": 0, "currency": "USD", "note": "refund"})
    );
}

#[test]
fn assign_properties_failures() {
    let n = node("Money");
    let f = issues(exec().parse(&n, &json!({"amount": -1, "currency": "EUR"})).unwrap_err());
    assert_eq!(f.keys_at("amount"), vec!["validator.int_range"]);

    let f = issues(exec().parse(&n, &json!({"amount": 1, "currency": "euro"})).unwrap_err());
    let issue = &f.at("$")[0];
    assert_eq!(issue.key, "casting_failed");
    assert_eq!(issue.debug.as_ref().unwrap()["message"], json!("currency must be a 3-letter code"));

    let tags = Value::Instance(HostInstance::new("Tags", vec!["a".to_owned()]));
    let f = issues(exec().serialize(&n, &tags).unwrap_err());
    assert_eq!(f.keys_at("$"), vec!["invalid_type"]);
}

#[test]
fn collection_cast_serializes_host_instances() {
    let n = node("Tags");
    let tags = Value::Instance(HostInstance::new("Tags", vec!["x".to_owned(), "y".to_owned()]));
    assert_eq!(exec().serialize(&n, &tags).unwrap(), json!(["x", "y"]));
    let plain = Value::List(vec![Value::String("z".into()), Value::Int(1)]);
    let f = issues(exec().serialize(&n, &plain).unwrap_err());
    assert_eq!(f.keys_at("1"), vec!["invalid_type"]);
}

#[test]
fn unregistered_cast_target_is_a_defect() {
    let shape = node("object{a: int}");
    let n = Node::custom_casting(shape, "Ghost", castor_core::CastingStrategy::AssignProperties).unwrap();
    assert_eq!(
        exec().parse(&n, &json!({"a": 1})).unwrap_err(),
        SchemaError::UnknownTarget("Ghost".into())
    );
}

// ──────────────────────────────────────────────
// References and limits
// ──────────────────────────────────────────────

#[test]
fn lazy_refs_resolve_through_the_node_registry() {
    let mut nodes = NodeRegistry::new();
    nodes.insert_node("k", node("positive-int"));
    let n = Node::list(Node::lazy_ref("k"));
    let e = exec().with_nodes(Arc::new(nodes));
    assert!(e.parse(&n, &json!([1, 2])).is_ok());
    let f = issues(e.parse(&n, &json!([0])).unwrap_err());
    assert_eq!(f.keys_at("0"), vec!["validator.int_range"]);
    assert!(matches!(
        exec().parse(&n, &json!([1])),
        Err(SchemaError::UnresolvedRef(_))
    ));
}

#[test]
fn depth_limit_is_an_issue() {
    let e = exec().with_options(ParseOptions {
        max_depth: 3,
        ..Default::default()
    });
    let f = issues(e.parse(&node("int[][][]"), &json!([[[1]]])).unwrap_err());
    assert_eq!(f.keys_at("0.0.0"), vec!["depth_exceeded"]);
}

#[test]
fn serialize_never_coerces() {
    let e = exec().with_options(ParseOptions::coercing());
    let f = issues(e.serialize(&node("int"), &Value::String("7".into())).unwrap_err());
    assert_eq!(f.keys_at("$"), vec!["invalid_type"]);
}
