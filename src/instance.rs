//! Validated shape instances and their plain-data projection.
//!
//! The only way to get a [`ShapeInstance`] is through construction, which
//! runs the validator first: there is no partially built or invalid instance.
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::shape::ShapeType;
use crate::validate::{self, ValidationError};
use crate::value::Value;

#[derive(Clone)]
pub struct ShapeInstance {
    inner: Arc<InstanceInner>,
}

struct InstanceInner {
    shape: ShapeType,
    fields: IndexMap<String, Value>,
    /// Plain-data projection: nested instances flattened, type metadata gone.
    data: serde_json::Value,
}

impl ShapeType {
    /// Apply defaults, validate, and build an instance.
    pub fn construct<I, K, V>(&self, fields: I) -> Result<ShapeInstance, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let candidate: IndexMap<String, Value> =
            fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.construct_value(&Value::Map(candidate))
    }

    /// Like [`construct`](Self::construct) for a candidate that is already a
    /// [`Value`] (a mapping or a record-like instance).
    pub fn construct_value(&self, candidate: &Value) -> Result<ShapeInstance, ValidationError> {
        let fields = validate::conform_fields(self, candidate)?;
        Ok(ShapeInstance::assemble(self.clone(), fields))
    }

    /// Reverse of [`ShapeInstance::to_json`].
    pub fn from_json(&self, json: serde_json::Value) -> Result<ShapeInstance, ValidationError> {
        self.construct_value(&Value::from_json(json))
    }
}

pub fn construct<I, K, V>(shape: &ShapeType, fields: I) -> Result<ShapeInstance, ValidationError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    shape.construct(fields)
}

impl ShapeInstance {
    // `fields` must already be conformed to `shape`.
    fn assemble(shape: ShapeType, fields: IndexMap<String, Value>) -> Self {
        let data = serde_json::Value::Object(
            fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
        );
        Self { inner: Arc::new(InstanceInner { shape, fields, data }) }
    }

    pub fn shape(&self) -> &ShapeType {
        &self.inner.shape
    }

    /// Typed field value; nested shapes come back as [`Value::Instance`].
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.inner.fields.get(name)
    }

    /// All fields, declaration order, defaults applied.
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.inner.fields
    }

    /// Plain-data projection.
    pub fn data(&self) -> &serde_json::Value {
        &self.inner.data
    }

    /// Field of the plain-data projection.
    pub fn data_field(&self, name: &str) -> Option<&serde_json::Value> {
        self.inner.data.get(name)
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.inner.data.clone()
    }

    /// Canonical JSON: declared field order, absent optionals as `null`.
    pub fn to_json_string(&self) -> String {
        self.inner.data.to_string()
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.inner.data).unwrap_or_else(|_| self.to_json_string())
    }
}

impl PartialEq for ShapeInstance {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.fields() == other.fields()
    }
}

impl fmt::Display for ShapeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("shape(")?;
        for (i, (name, value)) in self.fields().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for ShapeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShapeInstance({} {self})", self.shape().identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FieldSpec, Ty};
    use proptest::prelude::*;
    use serde_json::json;

    fn point() -> ShapeType {
        ShapeType::builder()
            .field("x", Ty::INT)
            .field("y", FieldSpec::new(Ty::INT).optional().default(0))
            .build()
            .unwrap()
    }

    fn line(p: &ShapeType) -> ShapeType {
        ShapeType::new([("a", p), ("b", p)]).unwrap()
    }

    #[test]
    fn defaults_are_applied() {
        let p = point().construct([("x", 5)]).unwrap();
        assert_eq!(p.get("x"), Some(&Value::Int(5)));
        assert_eq!(p.get("y"), Some(&Value::Int(0)));
        assert_eq!(p.data(), &json!({"x": 5, "y": 0}));
    }

    #[test]
    fn absent_optionals_project_to_null() {
        let s = ShapeType::new([("name", FieldSpec::new(Ty::STR).optional())]).unwrap();
        let inst = s.construct(Vec::<(String, Value)>::new()).unwrap();
        assert_eq!(inst.get("name"), Some(&Value::Null));
        assert_eq!(inst.to_json_string(), r#"{"name":null}"#);
    }

    #[test]
    fn invalid_input_yields_no_instance() {
        let err = point().construct([("y", 1)]).unwrap_err();
        assert_eq!(err.to_string(), "x: missing required field");
    }

    #[test]
    fn projection_flattens_nested_instances() {
        let p = point();
        let a = p.construct([("x", 1)]).unwrap();
        let l = line(&p)
            .construct([
                ("a", Value::from(a)),
                ("b", Value::from_json(json!({"x": 2, "y": 3}))),
            ])
            .unwrap();
        assert_eq!(l.data(), &json!({"a": {"x": 1, "y": 0}, "b": {"x": 2, "y": 3}}));
        let b = l.get("b").and_then(Value::as_instance).expect("b is an instance");
        assert_eq!(b.shape(), &p);
        assert_eq!(l.data_field("b"), Some(&json!({"x": 2, "y": 3})));
    }

    #[test]
    fn canonical_json_follows_declaration_order() {
        let s = ShapeType::new([("zeta", Ty::INT), ("alpha", Ty::INT)]).unwrap();
        let inst = s.from_json(json!({"alpha": 1, "zeta": 2})).unwrap();
        assert_eq!(inst.to_json_string(), r#"{"zeta":2,"alpha":1}"#);
    }

    #[test]
    fn display_is_a_readable_repr() {
        let p = point();
        let l = line(&p)
            .construct([("a", json!({"x": 1})), ("b", json!({"x": 2}))])
            .unwrap();
        assert_eq!(l.to_string(), "shape(a=shape(x=1, y=0), b=shape(x=2, y=0))");
    }

    #[test]
    fn json_round_trip_preserves_fields() {
        let tagged = ShapeType::new([
            ("id", FieldSpec::new(Ty::STR)),
            ("tags", FieldSpec::new(Ty::set(Ty::STR)).default(Value::List(vec![]))),
            ("size", FieldSpec::new(Ty::FLOAT).optional()),
            ("pair", FieldSpec::new(Ty::tuple([Ty::INT, Ty::BOOL]).unwrap())),
        ])
        .unwrap();
        let inst = tagged
            .from_json(json!({"id": "a", "tags": ["x", "y"], "pair": [1, true]}))
            .unwrap();
        let text = inst.to_json_string();
        let back = tagged.from_json(serde_json::from_str(&text).unwrap()).unwrap();
        assert_eq!(back, inst);
        assert_eq!(back.data(), inst.data());
    }

    proptest! {
        #[test]
        fn round_trip_for_arbitrary_points(
            x in any::<i64>(),
            y in proptest::option::of(any::<i64>()),
            label in ".{0,12}",
            weight in -1.0e9f64..1.0e9,
        ) {
            let p = point();
            let s = ShapeType::new([
                ("at", FieldSpec::new(&p)),
                ("label", FieldSpec::new(Ty::STR)),
                ("weight", FieldSpec::new(Ty::FLOAT)),
            ]).unwrap();
            let mut at = IndexMap::new();
            at.insert("x".to_string(), Value::Int(x));
            if let Some(y) = y {
                at.insert("y".to_string(), Value::Int(y));
            }
            let inst = s.construct([
                ("at", Value::Map(at)),
                ("label", Value::from(label)),
                ("weight", Value::Float(weight)),
            ]).unwrap();

            let decoded: serde_json::Value = serde_json::from_str(&inst.to_json_string()).unwrap();
            let back = s.from_json(decoded).unwrap();
            prop_assert_eq!(back.data(), inst.data());
            prop_assert_eq!(back, inst);
        }
    }
}
