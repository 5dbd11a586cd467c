//! Binding generator: type-hinted class declarations for shapes.
//!
//! ```text
//! class _3f9c…(Shape):
//!     __GENERATED_SHAPE__ = True
//!     x: int
//!     y: Optional[int] = 0
//!
//! Point = _3f9c…
//! ```
//!
//! Nested shapes are declared before the shapes that use them and each
//! identity is declared once per generated module, so the output loads
//! without forward references. Output is a pure function of the inputs.
use std::collections::HashMap;
use std::fmt::Write;

use crate::error::SchemaError;
use crate::ir::{Primitive, Ty};
use crate::shape::{self, ShapeType};
use crate::value::{self, Value};

const DEFAULT_RUNTIME_MODULE: &str = "shape";

pub struct Codegen {
    out: String,
    /// Classes already written, by identity.
    emitted: HashMap<String, ShapeType>,
    runtime_module: String,
    wrote_prelude: bool,
}

impl Codegen {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            emitted: HashMap::new(),
            runtime_module: DEFAULT_RUNTIME_MODULE.to_string(),
            wrote_prelude: false,
        }
    }

    /// Module the generated classes import their `Shape` base class from.
    pub fn with_runtime_module(mut self, module: impl Into<String>) -> Self {
        self.runtime_module = module.into();
        self
    }

    /// Emit `shape` (and everything it nests) and export it as `name`.
    ///
    /// Classes are named by identity, so a shape that shares an identity with
    /// an already emitted one but declares other defaults is an error. Nothing
    /// is written when emitting fails.
    pub fn emit(&mut self, shape: &ShapeType, name: &str) -> Result<(), SchemaError> {
        if !shape::is_identifier(name) {
            return Err(SchemaError::InvalidExportName(name.to_string()));
        }
        let mut pending = HashMap::new();
        self.check_conflicts(shape, &mut pending)?;

        if !self.wrote_prelude {
            self.prelude();
        }
        for nested in shape.nested_shapes() {
            self.class(&nested);
        }
        self.class(shape);
        let _ = writeln!(self.out, "\n{name} = {}", shape.identity());
        Ok(())
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn prelude(&mut self) {
        self.wrote_prelude = true;
        let _ = writeln!(self.out, "# @generated by shape-idl, do not edit");
        let _ = writeln!(self.out, "from typing import Dict, List, Literal, Optional, Set, Tuple");
        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "from {} import Shape", self.runtime_module);
    }

    fn check_conflicts<'a>(
        &self,
        shape: &'a ShapeType,
        pending: &mut HashMap<&'a str, &'a ShapeType>,
    ) -> Result<(), SchemaError> {
        let seen = self
            .emitted
            .get(shape.identity())
            .or_else(|| pending.get(shape.identity()).copied());
        match seen {
            Some(seen) if seen.fields() == shape.fields() => return Ok(()),
            Some(_) => {
                return Err(SchemaError::ConflictingBinding {
                    identity: shape.identity().to_string(),
                });
            }
            None => {}
        }
        pending.insert(shape.identity(), shape);
        for spec in shape.fields().values() {
            for nested in spec.ty().shapes() {
                self.check_conflicts(nested, pending)?;
            }
        }
        Ok(())
    }

    fn class(&mut self, shape: &ShapeType) {
        if self.emitted.contains_key(shape.identity()) {
            return;
        }
        self.emitted.insert(shape.identity().to_string(), shape.clone());
        let _ = writeln!(self.out, "\n");
        let _ = writeln!(self.out, "class {}(Shape):", shape.identity());
        let _ = writeln!(self.out, "    __GENERATED_SHAPE__ = True");
        for (name, spec) in shape.fields() {
            let label = spec.ty().label();
            match spec.default_value() {
                None => {
                    let _ = writeln!(self.out, "    {name}: {label}");
                }
                Some(default) => {
                    let literal = python_literal(spec.ty(), default);
                    let _ = writeln!(self.out, "    {name}: {label} = {literal}");
                }
            }
        }
    }
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

/// Binding source for a single shape exported as `name`.
pub fn render_binding(shape: &ShapeType, name: &str) -> Result<String, SchemaError> {
    let mut cg = Codegen::new();
    cg.emit(shape, name)?;
    Ok(cg.into_string())
}

/// Python literal for `value` shaped by its declared type: tuples render as
/// tuples, sets as sets, dict keys in their key kind and nested instances as
/// dicts of their fields.
fn python_literal(ty: &Ty, value: &Value) -> String {
    match (ty, value) {
        (Ty::Optional(_), Value::Null) => "None".to_string(),
        (Ty::Optional(inner), _) => python_literal(inner, value),
        (Ty::List(item), Value::List(xs)) => {
            format!("[{}]", join(xs.iter().map(|x| python_literal(item, x))))
        }
        (Ty::Set(_), Value::List(xs)) if xs.is_empty() => "set()".to_string(),
        (Ty::Set(item), Value::List(xs)) => {
            format!("{{{}}}", join(xs.iter().map(|x| python_literal(item, x))))
        }
        (Ty::Tuple(elems), Value::List(xs)) => {
            let items: Vec<String> =
                elems.iter().zip(xs).map(|(t, x)| python_literal(t, x)).collect();
            match items.as_slice() {
                [single] => format!("({single},)"),
                _ => format!("({})", items.join(", ")),
            }
        }
        (Ty::Dict { key, value: value_ty }, Value::Map(m)) => {
            let entries = m
                .iter()
                .map(|(k, v)| format!("{}: {}", python_key(*key, k), python_literal(value_ty, v)));
            format!("{{{}}}", join(entries))
        }
        (Ty::Shape(shape), Value::Instance(inst)) => {
            let entries = inst.fields().iter().map(|(name, v)| {
                let literal = match shape.field(name) {
                    Some(spec) => python_literal(spec.ty(), v),
                    None => v.to_string(),
                };
                format!("{}: {literal}", value::python_str(name))
            });
            format!("{{{}}}", join(entries))
        }
        _ => value.to_string(),
    }
}

// Keys travel as text; render them in their declared kind.
fn python_key(kind: Primitive, key: &str) -> String {
    match kind {
        Primitive::Str => value::python_str(key),
        Primitive::Int => key.to_string(),
        Primitive::Bool if key == "true" => "True".to_string(),
        Primitive::Bool => "False".to_string(),
        Primitive::Float => match key.parse::<f64>() {
            Ok(x) => value::python_float(x),
            Err(_) => value::python_str(key),
        },
    }
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}
