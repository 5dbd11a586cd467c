//! Structural record types ("shapes") with content-addressed identity.
//!
//! A shape is an ordered set of typed fields. Its identity is a hash of the
//! field names and type labels, so structurally identical shapes declared in
//! different places are the same type. Values are checked against shapes by a
//! closed-world validator, turned into immutable [`ShapeInstance`]s with
//! defaults applied, and exported as canonical JSON, type-hinted bindings or
//! JSON Schema.
//!
//! ```
//! use shape_idl::{FieldSpec, ShapeType, Ty};
//!
//! let point = ShapeType::new([
//!     ("x", FieldSpec::from(Ty::INT)),
//!     ("y", FieldSpec::new(Ty::INT).optional().default(0)),
//! ])
//! .unwrap();
//! let line = ShapeType::new([("a", &point), ("b", &point)]).unwrap();
//!
//! let l = line
//!     .from_json(serde_json::json!({"a": {"x": 1}, "b": {"x": 2, "y": 3}}))
//!     .unwrap();
//! assert_eq!(l.to_json_string(), r#"{"a":{"x":1,"y":0},"b":{"x":2,"y":3}}"#);
//! ```
pub mod binding;
pub mod cli;
pub mod descriptor;
pub mod error;
pub mod instance;
pub mod ir;
pub mod load;
pub mod registry;
pub mod schema;
pub mod shape;
pub mod validate;
pub mod value;

pub use binding::{render_binding, Codegen};
pub use error::{LoadError, SchemaError};
pub use instance::{construct, ShapeInstance};
pub use ir::{FieldSpec, Primitive, Ty};
pub use registry::{Declarations, Registry};
pub use schema::shape_schema;
pub use shape::{ShapeBuilder, ShapeType};
pub use validate::{validate, Reason, ValidationError};
pub use value::Value;
