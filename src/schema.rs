// JSON Schema export for shapes.
//
// Nested shapes go to `$defs`, keyed by identity, and are referenced with
// `$ref`. Every object is closed (`additionalProperties: false`) to match the
// validator's closed-world rule.

use serde_json::{json, Map, Value};

use crate::ir::{Primitive, Ty};
use crate::shape::ShapeType;

const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Full schema document for `shape`.
pub fn shape_schema(shape: &ShapeType) -> Value {
    let mut root = Map::new();
    root.insert("$schema".into(), Value::from(DRAFT));
    root.insert("title".into(), Value::from(shape.identity()));
    if let Value::Object(body) = object_schema(shape) {
        root.extend(body);
    }

    let nested = shape.nested_shapes();
    if !nested.is_empty() {
        let defs: Map<String, Value> = nested
            .iter()
            .map(|n| (n.identity().to_string(), object_schema(n)))
            .collect();
        root.insert("$defs".into(), Value::Object(defs));
    }
    Value::Object(root)
}

fn object_schema(shape: &ShapeType) -> Value {
    let mut props = Map::new();
    let mut required = Vec::new();
    for (name, spec) in shape.fields() {
        let mut prop = ty_schema(spec.ty());
        match spec.default_value() {
            Some(default) => prop["default"] = default.to_json(),
            None => required.push(Value::from(name.clone())),
        }
        props.insert(name.clone(), prop);
    }

    let mut o = json!({
        "type": "object",
        "properties": props,
        "additionalProperties": false,
    });
    if !required.is_empty() {
        o["required"] = Value::Array(required);
    }
    o
}

fn ty_schema(ty: &Ty) -> Value {
    match ty {
        Ty::Primitive(p) => primitive_schema(*p),

        Ty::Shape(shape) => json!({ "$ref": format!("#/$defs/{}", shape.identity()) }),

        Ty::List(item) => json!({
            "type": "array",
            "items": ty_schema(item),
        }),

        Ty::Set(item) => json!({
            "type": "array",
            "items": ty_schema(item),
            "uniqueItems": true,
        }),

        Ty::Dict { key, value } => {
            let mut o = json!({
                "type": "object",
                "additionalProperties": ty_schema(value),
            });
            if let Some(pattern) = key_pattern(*key) {
                o["propertyNames"] = json!({ "pattern": pattern });
            }
            o
        }

        Ty::Tuple(elems) => json!({
            "type": "array",
            "prefixItems": elems.iter().map(ty_schema).collect::<Vec<_>>(),
            "items": false,
            "minItems": elems.len(),
            "maxItems": elems.len(),
        }),

        Ty::Optional(inner) => json!({ "oneOf": [ty_schema(inner), { "type": "null" }] }),

        Ty::Enum(variants) => json!({ "type": "string", "enum": variants }),
    }
}

fn primitive_schema(p: Primitive) -> Value {
    match p {
        Primitive::Bool => json!({ "type": "boolean" }),
        Primitive::Int => json!({ "type": "integer" }),
        Primitive::Str => json!({ "type": "string" }),
        Primitive::Float => json!({ "type": "number" }),
    }
}

// Dict keys are always strings in JSON; constrain the text for other kinds.
fn key_pattern(kind: Primitive) -> Option<&'static str> {
    match kind {
        Primitive::Str | Primitive::Float => None,
        Primitive::Int => Some("^(0|-?[1-9][0-9]*)$"),
        Primitive::Bool => Some("^(true|false)$"),
    }
}
