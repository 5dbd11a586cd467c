//! Named shapes resolved from declaration documents.
//!
//! A declaration document maps shape names to field declarations:
//!
//! ```json
//! {
//!   "shapes": {
//!     "Point": { "x": "int", "y": { "type": "int", "optional": true, "default": 0 } },
//!     "Line":  { "a": "Point", "b": "Point" }
//!   }
//! }
//! ```
//!
//! Shapes may be declared in any order; they are defined leaves first.
//! Self-referencing and mutually referencing shapes are rejected. Shapes with
//! the same field signature share one handle.
use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::descriptor::Descriptor;
use crate::error::SchemaError;
use crate::ir::FieldSpec;
use crate::shape::ShapeType;
use crate::value::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declarations {
    pub shapes: IndexMap<String, IndexMap<String, FieldDecl>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldDecl {
    /// Just a type descriptor: a required field.
    Short(String),
    Full(FullFieldDecl),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FullFieldDecl {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

impl FieldDecl {
    fn descriptor(&self) -> &str {
        match self {
            FieldDecl::Short(ty) => ty,
            FieldDecl::Full(full) => &full.ty,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    shapes: IndexMap<String, ShapeType>,
    by_identity: HashMap<String, ShapeType>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `shape` under `name`. When an identical shape (same fields,
    /// defaults included) is already known, that handle is reused and
    /// returned. A shape that only shares the identity keeps its own defaults.
    pub fn define(&mut self, name: impl Into<String>, shape: ShapeType) -> ShapeType {
        let name = name.into();
        let shape = match self.by_identity.get(shape.identity()) {
            Some(existing) if existing.fields() == shape.fields() => {
                tracing::debug!(%name, identity = existing.identity(), "reusing identical shape");
                existing.clone()
            }
            Some(_) => {
                tracing::debug!(
                    %name,
                    identity = shape.identity(),
                    "defined shape with its own defaults"
                );
                shape
            }
            None => {
                tracing::debug!(%name, identity = shape.identity(), "defined shape");
                self.by_identity.insert(shape.identity().to_string(), shape.clone());
                shape
            }
        };
        self.shapes.insert(name, shape.clone());
        shape
    }

    pub fn get(&self, name: &str) -> Option<&ShapeType> {
        self.shapes.get(name)
    }

    pub fn by_identity(&self, identity: &str) -> Option<&ShapeType> {
        self.by_identity.get(identity)
    }

    /// Named shapes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ShapeType)> {
        self.shapes.iter().map(|(name, shape)| (name.as_str(), shape))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn from_declarations(decls: &Declarations) -> Result<Self, SchemaError> {
        // parse every descriptor up front so syntax errors surface before
        // ordering and references can be computed
        let mut parsed: IndexMap<&str, Vec<(&str, Descriptor, &FieldDecl)>> = IndexMap::new();
        for (shape_name, fields) in &decls.shapes {
            let mut out = Vec::with_capacity(fields.len());
            for (field_name, decl) in fields {
                let descriptor = Descriptor::parse(decl.descriptor())
                    .map_err(|e| in_field(shape_name, field_name, e))?;
                out.push((field_name.as_str(), descriptor, decl));
            }
            parsed.insert(shape_name.as_str(), out);
        }

        let order = definition_order(&parsed)?;

        let mut defined: HashMap<&str, ShapeType> = HashMap::new();
        let mut registry = Registry::new();
        for shape_name in order {
            let lookup = |name: &str| defined.get(name).cloned();
            let mut builder = ShapeType::builder();
            for (field_name, descriptor, decl) in &parsed[shape_name] {
                let ty = descriptor
                    .resolve(&lookup)
                    .map_err(|e| in_field(shape_name, field_name, e))?;
                let mut spec = FieldSpec::new(ty);
                if let FieldDecl::Full(full) = decl {
                    if let Some(default) = &full.default {
                        spec = spec.default(Value::from_json(default.clone()));
                    }
                    if full.optional {
                        spec = spec.optional();
                    }
                }
                builder = builder.field(*field_name, spec);
            }
            let shape = builder.build().map_err(|e| match field_of(&e) {
                Some(field) => in_field(shape_name, &field, e),
                None => e,
            })?;
            let shape = registry.define(shape_name, shape);
            defined.insert(shape_name, shape);
        }

        // back to declaration order for listing
        let mut shapes = IndexMap::with_capacity(registry.shapes.len());
        for shape_name in decls.shapes.keys() {
            if let Some(shape) = registry.shapes.get(shape_name) {
                shapes.insert(shape_name.clone(), shape.clone());
            }
        }
        registry.shapes = shapes;
        Ok(registry)
    }
}

fn in_field(shape: &str, field: &str, source: SchemaError) -> SchemaError {
    SchemaError::InField {
        shape: shape.to_string(),
        field: field.to_string(),
        source: Box::new(source),
    }
}

fn field_of(err: &SchemaError) -> Option<String> {
    match err {
        SchemaError::InvalidDefault { field, .. }
        | SchemaError::InvalidFieldName(field)
        | SchemaError::ReservedFieldName(field)
        | SchemaError::DuplicateField(field) => Some(field.clone()),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first post-order over shape references: every shape comes after the
/// shapes it uses. References to undeclared names are left for `resolve` to
/// report.
fn definition_order<'a>(
    parsed: &IndexMap<&'a str, Vec<(&'a str, Descriptor, &'a FieldDecl)>>,
) -> Result<Vec<&'a str>, SchemaError> {
    fn visit<'a>(
        name: &'a str,
        parsed: &IndexMap<&'a str, Vec<(&'a str, Descriptor, &'a FieldDecl)>>,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
        out: &mut Vec<&'a str>,
    ) -> Result<(), SchemaError> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(name.to_string());
                return Err(SchemaError::RecursiveShape(cycle));
            }
            None => {}
        }
        marks.insert(name, Mark::Visiting);
        stack.push(name);
        for (_, descriptor, _) in &parsed[name] {
            for reference in descriptor.references() {
                if let Some((&key, _)) = parsed.get_key_value(reference) {
                    visit(key, parsed, marks, stack, out)?;
                }
            }
        }
        stack.pop();
        marks.insert(name, Mark::Done);
        out.push(name);
        Ok(())
    }

    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    let mut out = Vec::with_capacity(parsed.len());
    for &name in parsed.keys() {
        visit(name, parsed, &mut marks, &mut stack, &mut out)?;
    }
    Ok(out)
}
