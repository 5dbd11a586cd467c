use serde_json::json;
use shape_idl::{
    construct, load, render_binding, validate, FieldSpec, Reason, Registry, SchemaError, ShapeType,
    Ty, Value,
};

fn point() -> ShapeType {
    ShapeType::builder()
        .field("x", Ty::INT)
        .field("y", FieldSpec::new(Ty::INT).optional().default(0))
        .build()
        .unwrap()
}

fn map(doc: serde_json::Value) -> Value {
    Value::from_json(doc)
}

#[test]
fn point_construct_applies_default() {
    let p = construct(&point(), [("x", 5)]).unwrap();
    assert_eq!(p.data(), &json!({"x": 5, "y": 0}));
    assert_eq!(p.to_string(), "shape(x=5, y=0)");
}

#[test]
fn point_rejects_unknown_field_by_name() {
    let err = validate(&point(), &map(json!({"x": 5, "z": 1}))).unwrap_err();
    assert_eq!(err.reason(), &Reason::UnknownField);
    assert!(err.to_string().contains('z'));
}

#[test]
fn point_reports_missing_required_field() {
    let err = validate(&point(), &map(json!({"y": 1}))).unwrap_err();
    assert_eq!(err.reason(), &Reason::MissingField);
    assert!(err.to_string().contains('x'));
}

#[test]
fn line_binding_declares_point_first() {
    let p = point();
    let line = ShapeType::new([("a", &p), ("b", &p)]).unwrap();
    let src = render_binding(&line, "Line").unwrap();
    let point_at = src.find(&format!("class {}(Shape):", p.identity())).unwrap();
    let line_at = src.find(&format!("class {}(Shape):", line.identity())).unwrap();
    assert!(point_at < line_at, "{src}");
}

#[test]
fn identical_declarations_are_the_same_type() {
    let a = point();
    let b = ShapeType::new([
        ("y", FieldSpec::new(Ty::INT).optional().default(0)),
        ("x", FieldSpec::from(Ty::INT)),
    ])
    .unwrap();
    assert_eq!(a.identity(), b.identity());
    assert_eq!(a, b);

    // defaults do not take part in identity
    let c = ShapeType::new([
        ("x", FieldSpec::from(Ty::INT)),
        ("y", FieldSpec::new(Ty::INT).optional().default(7)),
    ])
    .unwrap();
    assert_eq!(a.identity(), c.identity());

    let d = ShapeType::new([("x", Ty::INT), ("y", Ty::STR)]).unwrap();
    assert_ne!(a.identity(), d.identity());
}

#[test]
fn nested_instances_are_accepted_by_identity() {
    let line = ShapeType::new([("a", point()), ("b", point())]).unwrap();
    let independent = ShapeType::new([
        ("x", FieldSpec::from(Ty::INT)),
        ("y", FieldSpec::new(Ty::INT).optional().default(0)),
    ])
    .unwrap();
    let a = independent.construct([("x", 1)]).unwrap();
    let l = line
        .construct([("a", Value::from(a)), ("b", map(json!({"x": 2})))])
        .unwrap();
    assert_eq!(l.data(), &json!({"a": {"x": 1, "y": 0}, "b": {"x": 2, "y": 0}}));

    let other = ShapeType::new([("z", Ty::INT)]).unwrap().construct([("z", 1)]).unwrap();
    let err = line
        .construct([("a", Value::from(other)), ("b", map(json!({"x": 2})))])
        .unwrap_err();
    assert!(matches!(err.reason(), Reason::WrongShape { .. }), "{err}");
    assert_eq!(err.path().to_string(), "a");
}

#[test]
fn validation_stops_at_first_error_in_declaration_order() {
    let s = ShapeType::new([("first", Ty::INT), ("second", Ty::INT)]).unwrap();
    let err = validate(&s, &map(json!({"second": "x", "first": "y", "third": 0}))).unwrap_err();
    assert_eq!(err.path().to_string(), "first");
}

#[test]
fn full_document_round_trip_through_the_registry() {
    let registry: Registry = load::registry_from_str(
        r#"{
            "shapes": {
                "Stat": {
                    "mode": { "type": "int", "default": 420 },
                    "owner": { "type": "str", "default": "root" }
                },
                "Install": {
                    "dest": "str",
                    "kind": "enum[file, dir]",
                    "stat": { "type": "Stat", "default": {} },
                    "tags": { "type": "set[str]", "default": [] },
                    "sizes": { "type": "dict[int, float]", "optional": true },
                    "span": "tuple[int, int]"
                }
            }
        }"#,
    )
    .unwrap();
    let install = registry.get("Install").unwrap();

    let inst = install
        .from_json(json!({
            "dest": "/etc/motd",
            "kind": "file",
            "tags": ["b", "a"],
            "sizes": {"1": 2, "-3": 0.5},
            "span": [0, 10]
        }))
        .unwrap();
    let text = inst.to_json_string();
    assert_eq!(
        text,
        concat!(
            r#"{"dest":"/etc/motd","kind":"file","stat":{"mode":420,"owner":"root"},"#,
            r#""tags":["b","a"],"sizes":{"1":2.0,"-3":0.5},"span":[0,10]}"#,
        )
    );
    let back = install.from_json_str(&text).unwrap();
    assert_eq!(back, inst);
}

#[test]
fn schema_errors_surface_at_definition_time() {
    assert_eq!(
        Ty::dict(Ty::list(Ty::INT), Ty::INT).unwrap_err(),
        SchemaError::NonPrimitiveDictKey("List[int]".into())
    );
    assert_eq!(
        ShapeType::new([("types", Ty::INT)]).unwrap_err(),
        SchemaError::ReservedFieldName("types".into())
    );
    assert!(matches!(
        ShapeType::new([("n", FieldSpec::new(Ty::INT).default("one"))]),
        Err(SchemaError::InvalidDefault { .. })
    ));
}
