//! Projection of resolved schema trees into an output dialect.
//!
//! The tree is dialect-neutral; only leaf type information, nullability, and
//! the shape around references differ between the two encodings.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::context::Resolution;
use crate::schema::{NodeKind, SchemaNode};
use crate::types::{Dialect, NULL_TYPE, REF_PREFIX};

/// Leaf type information as carried by a dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSlot {
    /// One `type` string plus a separate `nullable` flag.
    Single { name: Option<String>, nullable: bool },
    /// A set of type names, `"null"` included when nullable.
    Multi(Vec<String>),
}

impl TypeSlot {
    /// Single-value view of the type, for callers that expect one name.
    ///
    /// For a multi-type set this is `types[0]`; the null marker is always
    /// placed last, so the first entry is the underlying kind.
    pub fn primary(&self) -> Option<&str> {
        match self {
            TypeSlot::Single { name, .. } => name.as_deref(),
            TypeSlot::Multi(types) => types.first().map(String::as_str),
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            TypeSlot::Single { nullable, .. } => *nullable,
            TypeSlot::Multi(types) => types.iter().any(|t| t == NULL_TYPE),
        }
    }
}

/// Compute the type slot of a node under `dialect`.
///
/// Explicit type names are authoritative; otherwise the node kind decides.
pub fn type_slot(node: &SchemaNode, dialect: Dialect) -> TypeSlot {
    let nullable = node.meta.nullable;

    match (&node.meta.explicit_types, dialect) {
        (Some(types), Dialect::MultiType) => {
            let has_null = types.iter().any(|t| t == NULL_TYPE);
            let mut types: Vec<String> =
                types.iter().filter(|t| *t != NULL_TYPE).cloned().collect();
            if nullable || has_null {
                types.push(NULL_TYPE.to_string());
            }
            TypeSlot::Multi(types)
        }
        (Some(types), Dialect::SingleType) => TypeSlot::Single {
            name: types.iter().find(|t| *t != NULL_TYPE).cloned(),
            nullable: nullable || types.iter().any(|t| t == NULL_TYPE),
        },
        (None, Dialect::MultiType) => match node.kind_name() {
            Some(kind) if nullable => {
                TypeSlot::Multi(vec![kind.to_string(), NULL_TYPE.to_string()])
            }
            Some(kind) => TypeSlot::Multi(vec![kind.to_string()]),
            None => TypeSlot::Multi(Vec::new()),
        },
        (None, Dialect::SingleType) => TypeSlot::Single {
            name: node.kind_name().map(String::from),
            nullable,
        },
    }
}

fn reference(name: &str) -> Value {
    json!({ "$ref": format!("{}{}", REF_PREFIX, name) })
}

fn encode_reference(name: &str, node: &SchemaNode, dialect: Dialect) -> Value {
    let description = node.meta.description.as_ref();
    match dialect {
        Dialect::SingleType if node.meta.nullable => {
            let mut out = Map::new();
            out.insert("allOf".into(), json!([reference(name)]));
            out.insert("nullable".into(), Value::Bool(true));
            if let Some(description) = description {
                out.insert("description".into(), json!(description));
            }
            Value::Object(out)
        }
        Dialect::SingleType => reference(name),
        Dialect::MultiType => {
            let mut out = Map::new();
            if node.meta.nullable {
                out.insert(
                    "anyOf".into(),
                    json!([reference(name), { "type": NULL_TYPE }]),
                );
            } else {
                out.insert("$ref".into(), json!(format!("{}{}", REF_PREFIX, name)));
            }
            if let Some(description) = description {
                out.insert("description".into(), json!(description));
            }
            Value::Object(out)
        }
    }
}

/// Encode one schema node.
pub fn encode_schema(node: &SchemaNode, dialect: Dialect) -> Value {
    if let NodeKind::Reference(name) = &node.kind {
        return encode_reference(name, node, dialect);
    }

    let meta = &node.meta;
    let mut out = Map::new();

    match type_slot(node, dialect) {
        TypeSlot::Single { name, nullable } => {
            if let Some(name) = name {
                out.insert("type".into(), Value::String(name));
            }
            if nullable {
                out.insert("nullable".into(), Value::Bool(true));
            }
        }
        TypeSlot::Multi(mut types) => match types.len() {
            0 => {}
            1 => {
                out.insert("type".into(), Value::String(types.remove(0)));
            }
            _ => {
                out.insert("type".into(), json!(types));
            }
        },
    }

    if let Some(format) = &meta.format {
        out.insert("format".into(), json!(format));
    }
    if let Some(description) = &meta.description {
        out.insert("description".into(), json!(description));
    }
    if !meta.enum_values.is_empty() {
        out.insert("enum".into(), json!(meta.enum_values));
    }

    match &node.kind {
        NodeKind::Object(object) => {
            if !object.properties.is_empty() {
                let properties: Map<String, Value> = object
                    .properties
                    .iter()
                    .map(|(name, schema)| (name.clone(), encode_schema(schema, dialect)))
                    .collect();
                out.insert("properties".into(), Value::Object(properties));
            }
            if !object.required.is_empty() {
                out.insert("required".into(), json!(object.required));
            }
            if let Some(discriminator) = &object.discriminator {
                let mut encoded = Map::new();
                encoded.insert("propertyName".into(), json!(discriminator.property_name));
                if !discriminator.mapping.is_empty() {
                    let mapping: Map<String, Value> = discriminator
                        .mapping
                        .iter()
                        .map(|(value, name)| {
                            (value.clone(), json!(format!("{}{}", REF_PREFIX, name)))
                        })
                        .collect();
                    encoded.insert("mapping".into(), Value::Object(mapping));
                }
                out.insert("discriminator".into(), Value::Object(encoded));
            }
        }
        NodeKind::Map(values) => {
            out.insert("additionalProperties".into(), encode_schema(values, dialect));
        }
        NodeKind::Array(array) => {
            out.insert("items".into(), encode_schema(&array.items, dialect));
        }
        NodeKind::Composed(composed) => {
            let all_of: Vec<Value> = composed
                .all_of
                .iter()
                .map(|part| encode_schema(part, dialect))
                .collect();
            out.insert("allOf".into(), Value::Array(all_of));
        }
        NodeKind::Primitive(_) | NodeKind::Reference(_) => {}
    }

    if let Some(min) = meta.min_length {
        out.insert("minLength".into(), json!(min));
    }
    if let Some(max) = meta.max_length {
        out.insert("maxLength".into(), json!(max));
    }
    if let Some(pattern) = &meta.pattern {
        out.insert("pattern".into(), json!(pattern));
    }
    if let Some(minimum) = meta.minimum {
        out.insert("minimum".into(), json!(minimum));
    }
    if let Some(maximum) = meta.maximum {
        out.insert("maximum".into(), json!(maximum));
    }
    if let Some(min) = meta.min_items {
        out.insert("minItems".into(), json!(min));
    }
    if let Some(max) = meta.max_items {
        out.insert("maxItems".into(), json!(max));
    }
    if meta.unique_items {
        out.insert("uniqueItems".into(), Value::Bool(true));
    }
    if let Some(example) = &meta.example {
        out.insert("example".into(), example.clone());
    }

    Value::Object(out)
}

/// Encode a model registry as a name-to-schema object.
pub fn encode_models(models: &IndexMap<String, SchemaNode>, dialect: Dialect) -> Value {
    let encoded: Map<String, Value> = models
        .iter()
        .map(|(name, schema)| (name.clone(), encode_schema(schema, dialect)))
        .collect();
    Value::Object(encoded)
}

/// Wrap a resolution's registry in a minimal document.
pub fn encode_document(resolution: &Resolution, dialect: Dialect) -> Value {
    json!({
        "openapi": dialect.openapi_version(),
        "components": {
            "schemas": encode_models(&resolution.defined_models, dialect)
        }
    })
}
