//! Shape types: named, ordered field maps with a content-addressed identity.
//!
//! A [`ShapeType`] is a cheap-to-clone handle. Once built it never changes,
//! which is also why recursive shapes cannot be expressed: a shape can only
//! refer to shapes that already exist.
//!
//! ```
//! use shape_idl::{FieldSpec, ShapeType, Ty, Value};
//!
//! let point = ShapeType::builder()
//!     .field("x", Ty::INT)
//!     .field("y", FieldSpec::new(Ty::INT).optional().default(0))
//!     .build()
//!     .unwrap();
//!
//! let p = point.construct([("x", 5)]).unwrap();
//! assert_eq!(p.get("y"), Some(&Value::Int(0)));
//! ```
pub mod identity;

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SchemaError;
use crate::ir::FieldSpec;
use crate::validate;

/// Field names must be identifiers in every binding target.
static FIELD_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Generated bindings expose a `types` namespace on every shape class.
pub const RESERVED_FIELD_NAMES: &[&str] = &["types"];

#[derive(Clone)]
pub struct ShapeType {
    inner: Arc<ShapeInner>,
}

struct ShapeInner {
    fields: IndexMap<String, FieldSpec>,
    identity: String,
}

#[derive(Debug, Default)]
pub struct ShapeBuilder {
    fields: Vec<(String, FieldSpec)>,
}

impl ShapeBuilder {
    /// Add a field. Accepts a bare type (required field) or a full
    /// [`FieldSpec`].
    pub fn field(mut self, name: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
        self.fields.push((name.into(), spec.into()));
        self
    }

    pub fn build(self) -> Result<ShapeType, SchemaError> {
        let mut fields: IndexMap<String, FieldSpec> = IndexMap::with_capacity(self.fields.len());
        for (name, spec) in self.fields {
            check_field_name(&name)?;
            if fields.contains_key(&name) {
                return Err(SchemaError::DuplicateField(name));
            }
            // defaults are checked now so a bad default is a declaration error,
            // and stored in normalized form (nested mappings become instances)
            let default = match spec.default_value() {
                None => None,
                Some(value) => match validate::conform(spec.ty(), value) {
                    Ok(normalized) => Some(normalized),
                    Err(source) => return Err(SchemaError::InvalidDefault { field: name, source }),
                },
            };
            fields.insert(name, spec.with_checked_default(default));
        }
        let identity = identity::compute(&fields);
        Ok(ShapeType { inner: Arc::new(ShapeInner { fields, identity }) })
    }
}

fn check_field_name(name: &str) -> Result<(), SchemaError> {
    if !FIELD_NAME.is_match(name) {
        return Err(SchemaError::InvalidFieldName(name.to_string()));
    }
    if RESERVED_FIELD_NAMES.contains(&name) {
        return Err(SchemaError::ReservedFieldName(name.to_string()));
    }
    Ok(())
}

pub(crate) fn is_identifier(name: &str) -> bool {
    FIELD_NAME.is_match(name)
}

impl ShapeType {
    pub fn builder() -> ShapeBuilder {
        ShapeBuilder::default()
    }

    /// Define a shape from `(name, type or field spec)` pairs.
    pub fn new<I, K, F>(fields: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (K, F)>,
        K: Into<String>,
        F: Into<FieldSpec>,
    {
        fields
            .into_iter()
            .fold(ShapeBuilder::default(), |b, (name, spec)| b.field(name, spec))
            .build()
    }

    /// Content-addressed identity, e.g. `_3f9c…`.
    pub fn identity(&self) -> &str {
        &self.inner.identity
    }

    /// Sorted `(name, label)` pairs the identity is computed from.
    pub fn signature(&self) -> Vec<(String, String)> {
        identity::signature(&self.inner.fields)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &IndexMap<String, FieldSpec> {
        &self.inner.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.inner.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.inner.fields.contains_key(name)
    }

    /// Every shape reachable through this shape's fields, leaves first, each
    /// identity once. The shape itself is not included.
    pub fn nested_shapes(&self) -> Vec<ShapeType> {
        fn walk(shape: &ShapeType, seen: &mut HashSet<String>, out: &mut Vec<ShapeType>) {
            for spec in shape.fields().values() {
                for nested in spec.ty().shapes() {
                    if seen.insert(nested.identity().to_string()) {
                        walk(nested, seen, out);
                        out.push(nested.clone());
                    }
                }
            }
        }
        let mut seen = HashSet::new();
        seen.insert(self.identity().to_string());
        let mut out = Vec::new();
        walk(self, &mut seen, &mut out);
        out
    }
}

// Shapes are equal when their identities are: structurally identical shapes
// declared independently are the same type.
impl PartialEq for ShapeType {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for ShapeType {}

impl Hash for ShapeType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("shape(")?;
        for (i, (name, spec)) in self.fields().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={}", spec.ty().label())?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShapeType({} {self})", self.identity())
    }
}
