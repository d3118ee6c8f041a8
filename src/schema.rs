//! Resolved schema tree.
//!
//! [`SchemaNode`] is dialect-neutral: the same tree is projected into either
//! output dialect by the encoder.

use indexmap::IndexMap;
use serde_json::Value;

/// Leaf type of a primitive schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Integer,
    Number,
    String,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Number => "number",
            PrimitiveKind::String => "string",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "boolean" => Some(PrimitiveKind::Boolean),
            "integer" => Some(PrimitiveKind::Integer),
            "number" => Some(PrimitiveKind::Number),
            "string" => Some(PrimitiveKind::String),
            _ => None,
        }
    }
}

/// Discriminator carried by a polymorphic base schema.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiscriminatorInfo {
    pub property_name: String,
    /// (value, schema name) pairs in declaration order.
    pub mapping: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    pub properties: IndexMap<String, SchemaNode>,
    pub required: Vec<String>,
    pub discriminator: Option<DiscriminatorInfo>,
}

impl ObjectSchema {
    pub fn add_property(&mut self, name: &str, schema: SchemaNode, required: bool) {
        self.properties.insert(name.to_string(), schema);
        if required && !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub items: Box<SchemaNode>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComposedSchema {
    pub all_of: Vec<SchemaNode>,
}

/// Shape of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Primitive(PrimitiveKind),
    Object(ObjectSchema),
    /// Object with free-form keys and homogeneous values.
    Map(Box<SchemaNode>),
    Array(ArraySchema),
    Composed(ComposedSchema),
    /// Reference to a registered model by name.
    Reference(String),
}

/// Annotations and constraints that ride along any node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaMeta {
    pub description: Option<String>,
    pub format: Option<String>,
    pub example: Option<Value>,
    pub nullable: bool,
    /// Explicit type names, authoritative over the node kind when encoding.
    pub explicit_types: Option<Vec<String>>,
    pub enum_values: Vec<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub pattern: Option<String>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: NodeKind,
    pub meta: SchemaMeta,
}

impl SchemaNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            meta: SchemaMeta::default(),
        }
    }

    pub fn primitive(kind: PrimitiveKind, format: Option<&str>) -> Self {
        let mut node = Self::new(NodeKind::Primitive(kind));
        node.meta.format = format.map(String::from);
        node
    }

    pub fn object(object: ObjectSchema) -> Self {
        Self::new(NodeKind::Object(object))
    }

    /// Object with no known properties.
    pub fn opaque() -> Self {
        Self::object(ObjectSchema::default())
    }

    pub fn array(items: SchemaNode) -> Self {
        Self::new(NodeKind::Array(ArraySchema {
            items: Box::new(items),
        }))
    }

    pub fn map(values: SchemaNode) -> Self {
        Self::new(NodeKind::Map(Box::new(values)))
    }

    pub fn composed(all_of: Vec<SchemaNode>) -> Self {
        Self::new(NodeKind::Composed(ComposedSchema { all_of }))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Reference(name.into()))
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            NodeKind::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArraySchema> {
        match &self.kind {
            NodeKind::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_composed(&self) -> Option<&ComposedSchema> {
        match &self.kind {
            NodeKind::Composed(c) => Some(c),
            _ => None,
        }
    }

    pub fn reference_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Reference(name) => Some(name),
            _ => None,
        }
    }

    /// The leaf type name implied by the node kind, if it has one.
    pub fn kind_name(&self) -> Option<&'static str> {
        match &self.kind {
            NodeKind::Primitive(kind) => Some(kind.as_str()),
            NodeKind::Object(_) | NodeKind::Map(_) => Some("object"),
            NodeKind::Array(_) => Some("array"),
            NodeKind::Composed(_) | NodeKind::Reference(_) => None,
        }
    }

    /// Names of every model referenced anywhere in this tree.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_references(self, &mut out);
        out
    }
}

fn collect_references<'a>(node: &'a SchemaNode, out: &mut Vec<&'a str>) {
    match &node.kind {
        NodeKind::Reference(name) => out.push(name),
        NodeKind::Object(object) => {
            for child in object.properties.values() {
                collect_references(child, out);
            }
        }
        NodeKind::Map(values) => collect_references(values, out),
        NodeKind::Array(array) => collect_references(&array.items, out),
        NodeKind::Composed(composed) => {
            for child in &composed.all_of {
                collect_references(child, out);
            }
        }
        NodeKind::Primitive(_) => {}
    }
}
