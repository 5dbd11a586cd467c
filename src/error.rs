//! Error types shared across the engine.
//!
//! - [`SchemaError`]: a shape or field declaration is malformed. Raised while
//!   types are being defined, before any instance exists.
//! - [`ValidationError`](crate::validate::ValidationError): a candidate value
//!   does not conform to its shape.
//! - [`LoadError`]: reading declarations or instances from text, files or the
//!   environment failed.
use std::path::PathBuf;

use crate::validate::ValidationError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("unrecognized type descriptor `{0}`")]
    UnknownType(String),

    #[error("malformed type descriptor `{descriptor}`: {reason}")]
    MalformedDescriptor { descriptor: String, reason: String },

    #[error("dict keys must be a primitive type (bool, int, str, float), got `{0}`")]
    NonPrimitiveDictKey(String),

    #[error("tuple types need at least one element")]
    EmptyTuple,

    #[error("enum types need at least one variant")]
    EmptyEnum,

    #[error("enum variant `{0}` is listed more than once")]
    DuplicateVariant(String),

    #[error("`{0}` is not a valid field name")]
    InvalidFieldName(String),

    #[error("`{0}` is reserved and cannot be used as a field name")]
    ReservedFieldName(String),

    #[error("field `{0}` is declared more than once")]
    DuplicateField(String),

    #[error("default for field `{field}` does not match its type: {source}")]
    InvalidDefault {
        field: String,
        source: ValidationError,
    },

    #[error("`{0}` is not a valid binding name")]
    InvalidExportName(String),

    #[error("shape {identity} is already emitted with different defaults")]
    ConflictingBinding { identity: String },

    #[error("recursive shapes are not supported: {}", .0.join(" -> "))]
    RecursiveShape(Vec<String>),

    #[error("{shape}.{field}: {source}")]
    InField {
        shape: String,
        field: String,
        source: Box<SchemaError>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("at JSON path {path} → {message}")]
    Json { path: String, message: String },

    #[error("environment variable `{0}` is not set or not unicode")]
    MissingEnv(String),

    #[error("no shape named `{0}` is declared")]
    UnknownShape(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
