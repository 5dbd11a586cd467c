//! Closed-world, fail-fast validation of values against shapes.
//!
//! Every check goes through [`conform`], a single `match` over [`Ty`]. It
//! returns the value in normalized form (nested mappings become instances,
//! ints in float positions are widened), so the validator and the instance
//! constructor share one code path.
//!
//! Order of checks for a shape:
//! 1. the candidate must be a mapping or an instance (record-like);
//! 2. each declared field, in declaration order, takes the supplied value,
//!    else its default, else fails as missing;
//! 3. the first field whose check fails stops validation;
//! 4. only then are undeclared keys rejected.
pub mod path;

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::ir::{Primitive, Ty};
use crate::shape::ShapeType;
use crate::value::Value;

pub use path::{FieldPath, Reason, Segment, ValidationError};

impl ShapeType {
    /// Check `candidate` against this shape. `Ok(())` means constructing an
    /// instance from it would succeed.
    pub fn validate(&self, candidate: &Value) -> Result<(), ValidationError> {
        conform_fields(self, candidate).map(|_| ())
    }
}

pub fn validate(shape: &ShapeType, candidate: &Value) -> Result<(), ValidationError> {
    shape.validate(candidate)
}

/// Effective, normalized field values of `candidate` as seen by `shape`.
pub(crate) fn conform_fields(
    shape: &ShapeType,
    candidate: &Value,
) -> Result<IndexMap<String, Value>, ValidationError> {
    let supplied = match candidate {
        Value::Map(m) => m,
        Value::Instance(inst) => inst.fields(),
        other => {
            return Err(ValidationError::new(Reason::NotAMapping {
                shape: shape.identity().to_string(),
                got: other.kind(),
            }));
        }
    };

    let mut out = IndexMap::with_capacity(shape.fields().len());
    for (name, spec) in shape.fields() {
        let Some(effective) = supplied.get(name).or(spec.default_value()) else {
            return Err(ValidationError::at(Segment::Field(name.clone()), Reason::MissingField));
        };
        let value = conform(spec.ty(), effective)
            .map_err(|e| e.within(Segment::Field(name.clone())))?;
        out.insert(name.clone(), value);
    }

    if let Some(unknown) = supplied.keys().find(|k| !shape.has_field(k)) {
        return Err(ValidationError::at(Segment::Field(unknown.clone()), Reason::UnknownField));
    }

    Ok(out)
}

/// Check `value` against `ty` and return its normalized form.
pub(crate) fn conform(ty: &Ty, value: &Value) -> Result<Value, ValidationError> {
    match ty {
        Ty::Primitive(p) => conform_primitive(*p, value),

        Ty::Shape(shape) => match value {
            Value::Instance(inst) if inst.shape().identity() == shape.identity() => {
                Ok(value.clone())
            }
            Value::Instance(inst) => Err(ValidationError::new(Reason::WrongShape {
                expected: shape.identity().to_string(),
                got: inst.shape().identity().to_string(),
            })),
            Value::Map(_) => shape.construct_value(value).map(Value::Instance),
            other => Err(mismatch(format!("shape {}", shape.identity()), other)),
        },

        Ty::List(item) => {
            let xs = expect_list(ty, value)?;
            conform_elements(item, xs).map(Value::List)
        }

        Ty::Set(item) => {
            let xs = expect_list(ty, value)?;
            let out = conform_elements(item, xs)?;
            for (i, x) in out.iter().enumerate() {
                if out[..i].contains(x) {
                    return Err(ValidationError::at(Segment::Index(i), Reason::DuplicateElement));
                }
            }
            Ok(Value::List(out))
        }

        Ty::Dict { key, value: value_ty } => {
            let Value::Map(m) = value else {
                return Err(mismatch(ty.label(), value));
            };
            let mut out = IndexMap::with_capacity(m.len());
            let mut seen: HashMap<String, &str> = HashMap::with_capacity(m.len());
            for (k, v) in m {
                let canonical = check_key(*key, k)?;
                if let Some(earlier) = seen.insert(canonical, k) {
                    return Err(ValidationError::at(
                        Segment::Key(k.clone()),
                        Reason::DuplicateKey { key: k.clone(), earlier: earlier.to_string() },
                    ));
                }
                let v = conform(value_ty, v).map_err(|e| e.within(Segment::Key(k.clone())))?;
                out.insert(k.clone(), v);
            }
            Ok(Value::Map(out))
        }

        Ty::Tuple(elems) => {
            let xs = expect_list(ty, value)?;
            if xs.len() != elems.len() {
                return Err(ValidationError::new(Reason::WrongLength {
                    expected: elems.len(),
                    got: xs.len(),
                }));
            }
            elems
                .iter()
                .zip(xs)
                .enumerate()
                .map(|(i, (elem_ty, x))| {
                    conform(elem_ty, x).map_err(|e| e.within(Segment::Index(i)))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }

        Ty::Optional(inner) => match value {
            Value::Null => Ok(Value::Null),
            other => conform(inner, other),
        },

        Ty::Enum(variants) => match value {
            Value::Str(s) if variants.contains(s) => Ok(value.clone()),
            Value::Str(s) => Err(ValidationError::new(Reason::NotAVariant {
                value: s.clone(),
                variants: variants.clone(),
            })),
            other => Err(mismatch(ty.label(), other)),
        },
    }
}

fn conform_primitive(p: Primitive, value: &Value) -> Result<Value, ValidationError> {
    match (p, value) {
        (Primitive::Bool, Value::Bool(_))
        | (Primitive::Int, Value::Int(_))
        | (Primitive::Str, Value::Str(_)) => Ok(value.clone()),
        (Primitive::Float, Value::Float(x)) if !x.is_finite() => {
            Err(ValidationError::new(Reason::NonFiniteFloat))
        }
        (Primitive::Float, Value::Float(_)) => Ok(value.clone()),
        (Primitive::Float, Value::Int(i)) => Ok(Value::Float(*i as f64)),
        (p, other) => Err(mismatch(p.label().to_string(), other)),
    }
}

fn conform_elements(item: &Ty, xs: &[Value]) -> Result<Vec<Value>, ValidationError> {
    xs.iter()
        .enumerate()
        .map(|(i, x)| conform(item, x).map_err(|e| e.within(Segment::Index(i))))
        .collect()
}

fn expect_list<'a>(ty: &Ty, value: &'a Value) -> Result<&'a [Value], ValidationError> {
    match value {
        Value::List(xs) => Ok(xs),
        other => Err(mismatch(ty.label(), other)),
    }
}

/// Dict keys are text on the wire; non-string key kinds must parse back to
/// exactly the same text. Returns the key as its value, so float keys that
/// spell the same number (`1`, `1.0`, `1e0`) compare equal.
fn check_key(kind: Primitive, key: &str) -> Result<String, ValidationError> {
    let canonical = match kind {
        Primitive::Str => Some(key.to_string()),
        Primitive::Bool => (key == "true" || key == "false").then(|| key.to_string()),
        Primitive::Int => {
            key.parse::<i64>().ok().filter(|i| i.to_string() == key).map(|_| key.to_string())
        }
        Primitive::Float => key
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            // -0.0 + 0.0 is 0.0, the two zeros are one key
            .map(|x| format!("{:?}", x + 0.0)),
    };
    canonical.ok_or_else(|| {
        ValidationError::at(
            Segment::Key(key.to_string()),
            Reason::InvalidKey { kind, key: key.to_string() },
        )
    })
}

fn mismatch(expected: String, got: &Value) -> ValidationError {
    ValidationError::new(Reason::TypeMismatch { expected, got: got.kind() })
}
