//! Structural type descriptors.
//!
//! A [`TypeUniverse`] is the read-only graph the resolver walks: each
//! [`TypeDescriptor`] lists its fields and accessors, an optional supertype,
//! and the subtypes it declares. Field types are [`TypeRef`]s, written in a
//! compact text form (`List<Greeting>`, `Map<String, Long>`, `Boolean`).

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::directive::{DirectiveSet, RequiredMode};
use crate::error::ResolveError;
use crate::schema::PrimitiveKind;

/// Stable identity of a described type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(String);

impl TypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Simple declared name, used as the schema name.
    ///
    /// `com.example.Outer$Inner` yields `Inner`.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit(['.', '$']).next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Host scalar types with a direct schema mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Int32,
    Int64,
    Float,
    Double,
    Decimal,
    BigInteger,
    String,
    Date,
    DateTime,
    Uuid,
}

impl PrimitiveType {
    /// Schema kind and format for this type.
    pub fn schema_type(self) -> (PrimitiveKind, Option<&'static str>) {
        match self {
            PrimitiveType::Boolean => (PrimitiveKind::Boolean, None),
            PrimitiveType::Int32 => (PrimitiveKind::Integer, Some("int32")),
            PrimitiveType::Int64 => (PrimitiveKind::Integer, Some("int64")),
            PrimitiveType::Float => (PrimitiveKind::Number, Some("float")),
            PrimitiveType::Double => (PrimitiveKind::Number, Some("double")),
            PrimitiveType::Decimal => (PrimitiveKind::Number, None),
            PrimitiveType::BigInteger => (PrimitiveKind::Integer, None),
            PrimitiveType::String => (PrimitiveKind::String, None),
            PrimitiveType::Date => (PrimitiveKind::String, Some("date")),
            PrimitiveType::DateTime => (PrimitiveKind::String, Some("date-time")),
            PrimitiveType::Uuid => (PrimitiveKind::String, Some("uuid")),
        }
    }

    /// Canonical names: (native, boxed).
    fn names(self) -> (&'static str, &'static str) {
        match self {
            PrimitiveType::Boolean => ("boolean", "Boolean"),
            PrimitiveType::Int32 => ("int", "Integer"),
            PrimitiveType::Int64 => ("long", "Long"),
            PrimitiveType::Float => ("float", "Float"),
            PrimitiveType::Double => ("double", "Double"),
            PrimitiveType::Decimal => ("decimal", "BigDecimal"),
            PrimitiveType::BigInteger => ("bigint", "BigInteger"),
            PrimitiveType::String => ("string", "String"),
            PrimitiveType::Date => ("date", "LocalDate"),
            PrimitiveType::DateTime => ("date-time", "OffsetDateTime"),
            PrimitiveType::Uuid => ("uuid", "UUID"),
        }
    }

    /// Recognize a primitive or boxed-wrapper identity.
    fn lookup(name: &str) -> Option<(PrimitiveType, bool)> {
        let found = match name {
            "boolean" | "bool" => (PrimitiveType::Boolean, false),
            "Boolean" => (PrimitiveType::Boolean, true),
            "int" | "int32" | "i32" | "short" | "i16" | "byte" | "i8" | "u8" | "u16" => {
                (PrimitiveType::Int32, false)
            }
            "Integer" | "Short" | "Byte" => (PrimitiveType::Int32, true),
            "long" | "int64" | "i64" | "u32" | "u64" => (PrimitiveType::Int64, false),
            "Long" => (PrimitiveType::Int64, true),
            "float" | "f32" => (PrimitiveType::Float, false),
            "Float" => (PrimitiveType::Float, true),
            "double" | "f64" => (PrimitiveType::Double, false),
            "Double" => (PrimitiveType::Double, true),
            "decimal" => (PrimitiveType::Decimal, false),
            "BigDecimal" => (PrimitiveType::Decimal, true),
            "bigint" => (PrimitiveType::BigInteger, false),
            "BigInteger" => (PrimitiveType::BigInteger, true),
            "string" | "str" | "char" => (PrimitiveType::String, false),
            "String" | "Character" => (PrimitiveType::String, true),
            "date" => (PrimitiveType::Date, false),
            "LocalDate" => (PrimitiveType::Date, true),
            "date-time" => (PrimitiveType::DateTime, false),
            "OffsetDateTime" | "Instant" | "LocalDateTime" | "ZonedDateTime" | "Date" => {
                (PrimitiveType::DateTime, true)
            }
            "uuid" => (PrimitiveType::Uuid, false),
            "UUID" | "Uuid" => (PrimitiveType::Uuid, true),
            _ => return None,
        };
        Some(found)
    }
}

/// Homogeneous container flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    List,
    Set,
    /// Lazily produced sequence (stream, iterator).
    Stream,
}

impl ContainerKind {
    fn lookup(name: &str) -> Option<ContainerKind> {
        match name {
            "List" | "ArrayList" | "LinkedList" | "Vec" | "VecDeque" | "Collection"
            | "Iterable" => Some(ContainerKind::List),
            "Set" | "HashSet" | "TreeSet" | "LinkedHashSet" | "SortedSet" | "BTreeSet" => {
                Some(ContainerKind::Set)
            }
            "Stream" | "Iterator" | "Flux" | "Publisher" => Some(ContainerKind::Stream),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ContainerKind::List => "List",
            ContainerKind::Set => "Set",
            ContainerKind::Stream => "Stream",
        }
    }
}

/// Declared type of a field, accessor, or root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    Primitive { ty: PrimitiveType, boxed: bool },
    Container {
        kind: ContainerKind,
        element: Box<TypeRef>,
    },
    /// String-keyed map; only the value type is kept.
    Map { value: Box<TypeRef> },
    /// Wrapper signalling the value may be absent.
    Optional { inner: Box<TypeRef> },
    /// Untyped value.
    Any,
    Named(TypeId),
}

impl TypeRef {
    pub fn named(id: impl Into<String>) -> Self {
        TypeRef::Named(TypeId::new(id))
    }

    pub fn primitive(ty: PrimitiveType) -> Self {
        TypeRef::Primitive { ty, boxed: false }
    }

    pub fn boxed(ty: PrimitiveType) -> Self {
        TypeRef::Primitive { ty, boxed: true }
    }

    pub fn list(element: TypeRef) -> Self {
        TypeRef::Container {
            kind: ContainerKind::List,
            element: Box::new(element),
        }
    }

    pub fn stream(element: TypeRef) -> Self {
        TypeRef::Container {
            kind: ContainerKind::Stream,
            element: Box::new(element),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, TypeRef::Container { .. })
    }

    pub fn named_id(&self) -> Option<&TypeId> {
        match self {
            TypeRef::Named(id) => Some(id),
            _ => None,
        }
    }

    /// Strip `Optional` wrappers, reporting whether any were present.
    pub fn unwrap_optional(&self) -> (&TypeRef, bool) {
        let mut current = self;
        let mut wrapped = false;
        while let TypeRef::Optional { inner } = current {
            current = inner;
            wrapped = true;
        }
        (current, wrapped)
    }

    /// Replace the element type of a container; other types are returned as-is.
    pub fn with_element(&self, element: TypeRef) -> TypeRef {
        match self {
            TypeRef::Container { kind, .. } => TypeRef::Container {
                kind: *kind,
                element: Box::new(element),
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive { ty, boxed } => {
                let (native, wrapper) = ty.names();
                f.write_str(if *boxed { wrapper } else { native })
            }
            TypeRef::Container { kind, element } => write!(f, "{}<{}>", kind.name(), element),
            TypeRef::Map { value } => write!(f, "Map<String, {}>", value),
            TypeRef::Optional { inner } => write!(f, "Optional<{}>", inner),
            TypeRef::Any => f.write_str("Object"),
            TypeRef::Named(id) => f.write_str(id.as_str()),
        }
    }
}

impl FromStr for TypeRef {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeRefParser { input: s, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(ty)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = ResolveError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TypeRef> for String {
    fn from(ty: TypeRef) -> Self {
        ty.to_string()
    }
}

struct TypeRefParser<'a> {
    input: &'a str,
    pos: usize,
}

impl TypeRefParser<'_> {
    fn error(&self, message: &str) -> ResolveError {
        ResolveError::InvalidTypeRef {
            input: self.input.to_string(),
            message: format!("{} at offset {}", message, self.pos),
        }
    }

    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn parse_name(&mut self) -> Result<&str, ResolveError> {
        self.skip_ws();
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '.' | '$' | '_' | '-')))
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("expected type name"));
        }
        self.pos += len;
        Ok(&self.input[start..start + len])
    }

    fn parse_type(&mut self) -> Result<TypeRef, ResolveError> {
        let name = self.parse_name()?.to_string();

        let mut args = Vec::new();
        if self.eat("<") {
            loop {
                args.push(self.parse_type()?);
                if self.eat(",") {
                    continue;
                }
                if self.eat(">") {
                    break;
                }
                return Err(self.error("unbalanced '<'"));
            }
        }

        let mut ty = self.build(&name, args)?;
        while self.eat("[]") {
            ty = TypeRef::list(ty);
        }
        Ok(ty)
    }

    fn build(&self, name: &str, mut args: Vec<TypeRef>) -> Result<TypeRef, ResolveError> {
        // Qualified names only match builtins in the host's standard namespace.
        let builtin = if !name.contains('.') {
            Some(name)
        } else if name.starts_with("java.") {
            name.rsplit('.').next()
        } else {
            None
        };

        let Some(simple) = builtin else {
            return self.user_type(name, args);
        };

        let arity = |expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(self.error(&format!(
                    "{} expects {} type argument(s), got {}",
                    simple,
                    expected,
                    args.len()
                )))
            }
        };

        if let Some(kind) = ContainerKind::lookup(simple) {
            arity(1)?;
            return Ok(TypeRef::Container {
                kind,
                element: Box::new(args.remove(0)),
            });
        }

        match simple {
            "Map" | "HashMap" | "TreeMap" | "LinkedHashMap" | "BTreeMap" => {
                arity(2)?;
                Ok(TypeRef::Map {
                    value: Box::new(args.remove(1)),
                })
            }
            "Optional" | "Option" => {
                arity(1)?;
                Ok(TypeRef::Optional {
                    inner: Box::new(args.remove(0)),
                })
            }
            "Object" | "object" | "any" | "Value" | "JsonNode" => {
                arity(0)?;
                Ok(TypeRef::Any)
            }
            _ => match PrimitiveType::lookup(simple) {
                Some((ty, boxed)) => {
                    arity(0)?;
                    Ok(TypeRef::Primitive { ty, boxed })
                }
                None => self.user_type(name, args),
            },
        }
    }

    fn user_type(&self, name: &str, args: Vec<TypeRef>) -> Result<TypeRef, ResolveError> {
        if !args.is_empty() {
            return Err(self.error(&format!(
                "generic arguments are not supported on described type {}",
                name
            )));
        }
        Ok(TypeRef::named(name))
    }
}

/// A declared field of a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(flatten)]
    pub directives: DirectiveSet,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            directives: DirectiveSet::default(),
        }
    }

    pub fn with_directives(mut self, directives: DirectiveSet) -> Self {
        self.directives = directives;
        self
    }

    pub fn required(mut self, mode: RequiredMode) -> Self {
        self.directives.required = mode;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.directives.description = Some(description.into());
        self
    }
}

/// An accessor (getter) contributing to a logical property.
///
/// Accessors without a backing field define a property of their own and
/// must carry a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessorDescriptor {
    pub property: String,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeRef>,
    #[serde(flatten)]
    pub directives: DirectiveSet,
}

/// A subtype declared by a base type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtypeDecl {
    /// Discriminator value the subtype is known by.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub target: TypeId,
}

/// A logical property: a field with its accessors' directives merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub ty: TypeRef,
    pub directives: DirectiveSet,
}

impl Property {
    /// Name the property is published under.
    pub fn schema_name(&self) -> &str {
        self.directives.rename.as_deref().unwrap_or(&self.name)
    }
}

/// Immutable description of a structural type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub id: TypeId,
    #[serde(default)]
    pub directives: DirectiveSet,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub accessors: Vec<AccessorDescriptor>,
    #[serde(default, rename = "extends")]
    pub supertype: Option<TypeId>,
    #[serde(default)]
    pub subtypes: Vec<SubtypeDecl>,
    #[serde(default, rename = "enum")]
    pub enum_values: Vec<String>,
}

impl TypeDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: TypeId::new(id),
            directives: DirectiveSet::default(),
            fields: Vec::new(),
            accessors: Vec::new(),
            supertype: None,
            subtypes: Vec::new(),
            enum_values: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn accessor(mut self, accessor: AccessorDescriptor) -> Self {
        self.accessors.push(accessor);
        self
    }

    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertype = Some(TypeId::new(supertype));
        self
    }

    pub fn subtype(mut self, name: Option<&str>, target: impl Into<String>) -> Self {
        self.subtypes.push(SubtypeDecl {
            name: name.map(String::from),
            target: TypeId::new(target),
        });
        self
    }

    pub fn with_directives(mut self, directives: DirectiveSet) -> Self {
        self.directives = directives;
        self
    }

    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        self.id.simple_name()
    }

    pub fn is_enum(&self) -> bool {
        !self.enum_values.is_empty()
    }

    /// Logical properties in declaration order.
    ///
    /// Accessor directives are merged into the field of the same name (the
    /// field wins per key). Accessor-only properties are appended.
    pub fn properties(&self) -> Vec<Property> {
        let mut props: Vec<Property> = self
            .fields
            .iter()
            .map(|f| Property {
                name: f.name.clone(),
                ty: f.ty.clone(),
                directives: f.directives.clone(),
            })
            .collect();

        for accessor in &self.accessors {
            if let Some(existing) = props.iter_mut().find(|p| p.name == accessor.property) {
                existing.directives = existing.directives.merged_with(&accessor.directives);
            } else if let Some(ty) = &accessor.ty {
                props.push(Property {
                    name: accessor.property.clone(),
                    ty: ty.clone(),
                    directives: accessor.directives.clone(),
                });
            }
        }

        props
    }
}

/// The set of described types a resolution run can reach.
#[derive(Debug, Clone, Default)]
pub struct TypeUniverse {
    types: IndexMap<TypeId, TypeDescriptor>,
}

impl TypeUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a universe, rejecting duplicate ids.
    pub fn from_descriptors<I>(descriptors: I) -> Result<Self, ResolveError>
    where
        I: IntoIterator<Item = TypeDescriptor>,
    {
        let mut universe = Self::new();
        for descriptor in descriptors {
            universe.insert(descriptor)?;
        }
        Ok(universe)
    }

    pub fn insert(&mut self, descriptor: TypeDescriptor) -> Result<(), ResolveError> {
        if self.types.contains_key(&descriptor.id) {
            return Err(ResolveError::DuplicateType {
                id: descriptor.id.to_string(),
            });
        }
        self.types.insert(descriptor.id.clone(), descriptor);
        Ok(())
    }

    pub fn get(&self, id: &TypeId) -> Option<&TypeDescriptor> {
        self.types.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The type `id` inherits from.
    ///
    /// An explicit supertype wins; otherwise the first type listing `id` as a
    /// declared subtype or discriminator mapping target.
    pub fn parent_of(&self, id: &TypeId) -> Option<&TypeId> {
        if let Some(descriptor) = self.get(id) {
            if let Some(supertype) = &descriptor.supertype {
                return Some(supertype);
            }
        }

        self.types
            .values()
            .find(|t| {
                &t.id != id
                    && (t.subtypes.iter().any(|s| &s.target == id)
                        || t
                            .directives
                            .discriminator_mapping
                            .iter()
                            .any(|m| &m.target == id))
            })
            .map(|t| &t.id)
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: &TypeId) -> Result<Vec<&TypeId>, ResolveError> {
        let mut chain: Vec<&TypeId> = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            if parent == id || chain.contains(&parent) {
                let mut names: Vec<String> = std::iter::once(id)
                    .chain(chain.iter().copied())
                    .map(ToString::to_string)
                    .collect();
                names.push(parent.to_string());
                return Err(ResolveError::InheritanceCycle { chain: names });
            }
            chain.push(parent);
            if self.get(parent).is_none() {
                break;
            }
            current = parent;
        }
        Ok(chain)
    }

    /// Declared subtypes and discriminator mapping targets of `id`, deduplicated.
    pub fn subtypes_of(&self, id: &TypeId) -> Vec<TypeId> {
        let Some(descriptor) = self.get(id) else {
            return Vec::new();
        };

        let mut out: Vec<TypeId> = Vec::new();
        let declared = descriptor.subtypes.iter().map(|s| &s.target);
        let mapped = descriptor
            .directives
            .discriminator_mapping
            .iter()
            .map(|m| &m.target);
        for target in declared.chain(mapped) {
            if target != id && !out.contains(target) {
                out.push(target.clone());
            }
        }
        out
    }
}
