use std::fmt;

use crate::ir::Primitive;

/// One step from a shape down to the offending value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
    Key(String),
}

/// Rendered as `a.b[2]["k"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn prepend(&mut self, segment: Segment) {
        self.0.insert(0, segment);
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => write!(f, "{name}")?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(idx) => write!(f, "[{idx}]")?,
                Segment::Key(key) => write!(f, "[{key:?}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Reason {
    #[error("missing required field")]
    MissingField,

    #[error("unknown field")]
    UnknownField,

    #[error("expected a mapping for shape {shape}, got {got}")]
    NotAMapping { shape: String, got: &'static str },

    #[error("expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: &'static str },

    #[error("expected an instance of shape {expected}, got an instance of shape {got}")]
    WrongShape { expected: String, got: String },

    #[error("expected {expected} elements, got {got}")]
    WrongLength { expected: usize, got: usize },

    #[error("duplicate set element")]
    DuplicateElement,

    #[error("key {key:?} is not a valid {}", .kind.label())]
    InvalidKey { kind: Primitive, key: String },

    #[error("key {key:?} repeats key {earlier:?}")]
    DuplicateKey { key: String, earlier: String },

    #[error("{value:?} is not one of {}", .variants.join(", "))]
    NotAVariant { value: String, variants: Vec<String> },

    #[error("float values must be finite")]
    NonFiniteFloat,
}

/// First violation found while checking a value, with the path leading to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    path: FieldPath,
    reason: Reason,
}

impl ValidationError {
    pub(crate) fn new(reason: Reason) -> Self {
        Self { path: FieldPath::default(), reason }
    }

    pub(crate) fn at(segment: Segment, reason: Reason) -> Self {
        Self::new(reason).within(segment)
    }

    /// Re-root the error one level up.
    pub(crate) fn within(mut self, segment: Segment) -> Self {
        self.path.prepend(segment);
        self
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn reason(&self) -> &Reason {
        &self.reason
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

impl std::error::Error for ValidationError {}
