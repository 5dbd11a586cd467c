// Field specifications: the tagged type model every shape field is built from.
// Validation, identity hashing, bindings and schema export all dispatch on `Ty`.

use std::collections::HashSet;

use crate::error::SchemaError;
use crate::shape::ShapeType;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Int,                     // i64
    Str,
    Float,                   // f64, ints are widened on validation
}

impl Primitive {
    pub fn label(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Int => "int",
            Primitive::Str => "str",
            Primitive::Float => "float",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "bool" => Some(Primitive::Bool),
            "int" => Some(Primitive::Int),
            "str" => Some(Primitive::Str),
            "float" => Some(Primitive::Float),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Primitive(Primitive),
    Shape(ShapeType),        // compared by identity
    List(Box<Ty>),
    Set(Box<Ty>),            // list on the wire, elements must be distinct
    Dict {
        key: Primitive,      // keys travel as text, see `validate::check_key`
        value: Box<Ty>,
    },
    Tuple(Vec<Ty>),          // exact arity, never empty
    Optional(Box<Ty>),       // accepts `Value::Null`
    Enum(Vec<String>),       // non-empty, distinct variants
}

impl Ty {
    pub const BOOL: Ty = Ty::Primitive(Primitive::Bool);
    pub const INT: Ty = Ty::Primitive(Primitive::Int);
    pub const STR: Ty = Ty::Primitive(Primitive::Str);
    pub const FLOAT: Ty = Ty::Primitive(Primitive::Float);

    pub fn list(item: impl Into<Ty>) -> Ty {
        Ty::List(Box::new(item.into()))
    }

    pub fn set(item: impl Into<Ty>) -> Ty {
        Ty::Set(Box::new(item.into()))
    }

    /// Optional types do not nest: wrapping an optional type returns it as is.
    pub fn optional(inner: impl Into<Ty>) -> Ty {
        match inner.into() {
            ty @ Ty::Optional(_) => ty,
            ty => Ty::Optional(Box::new(ty)),
        }
    }

    /// Dict keys must be primitive; anything else is rejected here, at
    /// definition time.
    pub fn dict(key: impl Into<Ty>, value: impl Into<Ty>) -> Result<Ty, SchemaError> {
        match key.into() {
            Ty::Primitive(key) => Ok(Ty::Dict { key, value: Box::new(value.into()) }),
            other => Err(SchemaError::NonPrimitiveDictKey(other.label())),
        }
    }

    pub fn tuple<I>(elems: I) -> Result<Ty, SchemaError>
    where
        I: IntoIterator,
        I::Item: Into<Ty>,
    {
        let elems: Vec<Ty> = elems.into_iter().map(Into::into).collect();
        if elems.is_empty() {
            return Err(SchemaError::EmptyTuple);
        }
        Ok(Ty::Tuple(elems))
    }

    pub fn enumeration<I>(variants: I) -> Result<Ty, SchemaError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let variants: Vec<String> = variants.into_iter().map(Into::into).collect();
        if variants.is_empty() {
            return Err(SchemaError::EmptyEnum);
        }
        let mut seen = HashSet::new();
        for v in &variants {
            if !seen.insert(v.as_str()) {
                return Err(SchemaError::DuplicateVariant(v.clone()));
            }
        }
        Ok(Ty::Enum(variants))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Ty::Optional(_))
    }

    /// Type label as it appears in generated bindings. Identity hashing is
    /// computed over these labels, so the format is part of the contract.
    pub fn label(&self) -> String {
        match self {
            Ty::Primitive(p) => p.label().to_string(),
            Ty::Shape(shape) => shape.identity().to_string(),
            Ty::List(item) => format!("List[{}]", item.label()),
            Ty::Set(item) => format!("Set[{}]", item.label()),
            Ty::Dict { key, value } => format!("Dict[{}, {}]", key.label(), value.label()),
            Ty::Tuple(elems) => {
                let elems = elems.iter().map(Ty::label).collect::<Vec<_>>();
                format!("Tuple[{}]", elems.join(", "))
            }
            Ty::Optional(inner) => format!("Optional[{}]", inner.label()),
            Ty::Enum(variants) => {
                let variants = variants
                    .iter()
                    .map(|v| crate::value::python_str(v))
                    .collect::<Vec<_>>();
                format!("Literal[{}]", variants.join(", "))
            }
        }
    }

    /// Shapes referenced directly by this type (not through other shapes).
    pub fn shapes(&self) -> Vec<&ShapeType> {
        let mut out = Vec::new();
        self.collect_shapes(&mut out);
        out
    }

    fn collect_shapes<'a>(&'a self, out: &mut Vec<&'a ShapeType>) {
        match self {
            Ty::Primitive(_) | Ty::Enum(_) => {}
            Ty::Shape(shape) => out.push(shape),
            Ty::List(item) | Ty::Set(item) | Ty::Optional(item) => item.collect_shapes(out),
            Ty::Dict { value, .. } => value.collect_shapes(out),
            Ty::Tuple(elems) => {
                for elem in elems {
                    elem.collect_shapes(out);
                }
            }
        }
    }
}

impl From<Primitive> for Ty {
    fn from(p: Primitive) -> Self {
        Ty::Primitive(p)
    }
}

impl From<ShapeType> for Ty {
    fn from(shape: ShapeType) -> Self {
        Ty::Shape(shape)
    }
}

impl From<&ShapeType> for Ty {
    fn from(shape: &ShapeType) -> Self {
        Ty::Shape(shape.clone())
    }
}

/// One declared field: its type and, when it has one, its default.
///
/// A field without a default is required. `optional()` wraps the type so the
/// absent value is accepted and, unless a default was given, makes that
/// absent value the default.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    ty: Ty,
    default: Option<Value>,
}

impl FieldSpec {
    pub fn new(ty: impl Into<Ty>) -> Self {
        Self { ty: ty.into(), default: None }
    }

    pub fn optional(mut self) -> Self {
        self.ty = Ty::optional(self.ty);
        if self.default.is_none() {
            self.default = Some(Value::Null);
        }
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn ty(&self) -> &Ty {
        &self.ty
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_optional(&self) -> bool {
        self.ty.is_optional()
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    pub(crate) fn with_checked_default(self, default: Option<Value>) -> Self {
        Self { ty: self.ty, default }
    }
}

impl From<Ty> for FieldSpec {
    fn from(ty: Ty) -> Self {
        FieldSpec::new(ty)
    }
}

impl From<Primitive> for FieldSpec {
    fn from(p: Primitive) -> Self {
        FieldSpec::new(p)
    }
}

impl From<ShapeType> for FieldSpec {
    fn from(shape: ShapeType) -> Self {
        FieldSpec::new(shape)
    }
}

impl From<&ShapeType> for FieldSpec {
    fn from(shape: &ShapeType) -> Self {
        FieldSpec::new(shape)
    }
}
