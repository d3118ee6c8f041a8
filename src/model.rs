//! The primary converter: described types, primitives, and containers.

use serde_json::Value;

use crate::context::ResolutionContext;
use crate::converter::{ModelConverter, Next};
use crate::descriptor::{ContainerKind, Property, TypeDescriptor, TypeRef};
use crate::directive::{Constraint, DirectiveSet};
use crate::error::ResolveError;
use crate::key::ResolutionKey;
use crate::polymorphism::PolymorphismResolver;
use crate::schema::{NodeKind, ObjectSchema, PrimitiveKind, SchemaNode};
use crate::types::{ItemDirectivePolicy, NULL_TYPE};

/// Resolves primitives, containers, and described types.
///
/// Described object types register a model under their simple name; in a
/// property context they resolve to a reference to that model. Types taking
/// part in inheritance are composed by [`PolymorphismResolver`].
#[derive(Debug, Default)]
pub struct ModelResolver {
    polymorphism: PolymorphismResolver,
}

impl ModelConverter for ModelResolver {
    fn resolve(
        &self,
        key: &ResolutionKey,
        context: &mut ResolutionContext<'_>,
        next: Next<'_>,
    ) -> Result<Option<SchemaNode>, ResolveError> {
        match &key.target {
            TypeRef::Primitive { ty, .. } => {
                let (kind, format) = ty.schema_type();
                Ok(Some(SchemaNode::primitive(kind, format)))
            }
            TypeRef::Any => Ok(Some(SchemaNode::opaque())),
            TypeRef::Optional { inner } => {
                let inner_key = ResolutionKey {
                    target: (**inner).clone(),
                    ..key.clone()
                };
                let mut schema = context.resolve(&inner_key)?;
                schema.meta.nullable = true;
                Ok(Some(schema))
            }
            TypeRef::Container { kind, element } => {
                let items = context.resolve(&element_key(key, element))?;
                let mut schema = SchemaNode::array(items);
                schema.meta.unique_items = *kind == ContainerKind::Set;
                Ok(Some(schema))
            }
            TypeRef::Map { value } => {
                let values = context.resolve(&element_key(key, value))?;
                Ok(Some(SchemaNode::map(values)))
            }
            TypeRef::Named(id) => match context.universe().get(id) {
                Some(descriptor) => self.resolve_described(key, descriptor, context).map(Some),
                None => next.resolve(key, context),
            },
        }
    }
}

/// Items and map values resolve in a property context so described types
/// become references.
fn element_key(container: &ResolutionKey, element: &TypeRef) -> ResolutionKey {
    ResolutionKey {
        target: element.clone(),
        property: true,
        property_name: container.property_name.clone(),
        subtype: false,
        skip_override: false,
    }
}

impl ModelResolver {
    fn resolve_described(
        &self,
        key: &ResolutionKey,
        descriptor: &TypeDescriptor,
        context: &mut ResolutionContext<'_>,
    ) -> Result<SchemaNode, ResolveError> {
        if !key.skip_override {
            if let Some(implementation) = &descriptor.directives.implementation {
                let redirected = ResolutionKey {
                    target: implementation.clone(),
                    skip_override: true,
                    ..key.clone()
                };
                return context.resolve(&redirected);
            }
        }

        if descriptor.is_enum() {
            let mut schema = SchemaNode::primitive(PrimitiveKind::String, None);
            schema.meta.enum_values = descriptor.enum_values.clone();
            schema.meta.description = descriptor.directives.description.clone();
            return Ok(schema);
        }

        if key.property {
            let model_key =
                ResolutionKey::bare(key.target.clone()).skip_override(key.skip_override);
            context.resolve(&model_key)?;
            return Ok(SchemaNode::reference(descriptor.name()));
        }

        context.enter_model(descriptor.name());
        let built = self.build_model(descriptor, context);
        context.exit_model();
        let mut schema = built?;
        schema.meta.description = descriptor.directives.description.clone();

        context.define_model(descriptor.name(), schema.clone());
        self.polymorphism.resolve_subtypes(descriptor, context)?;
        Ok(schema)
    }

    fn build_model(
        &self,
        descriptor: &TypeDescriptor,
        context: &mut ResolutionContext<'_>,
    ) -> Result<SchemaNode, ResolveError> {
        match self.polymorphism.parent(descriptor, context)? {
            Some(parent) => self.polymorphism.compose(self, descriptor, parent, context),
            None => {
                let mut object = self.build_object(&descriptor.properties(), context)?;
                self.polymorphism
                    .attach_discriminator(descriptor, &mut object, context);
                Ok(SchemaNode::object(object))
            }
        }
    }

    /// Resolve properties into an object schema.
    pub(crate) fn build_object(
        &self,
        properties: &[Property],
        context: &mut ResolutionContext<'_>,
    ) -> Result<ObjectSchema, ResolveError> {
        let mut object = ObjectSchema::default();
        for property in properties {
            if property.directives.hidden {
                continue;
            }
            let (schema, required) = self.resolve_property(property, context)?;
            object.add_property(property.schema_name(), schema, required);
        }
        Ok(object)
    }

    /// Resolve one property, returning its schema and requiredness.
    fn resolve_property(
        &self,
        property: &Property,
        context: &mut ResolutionContext<'_>,
    ) -> Result<(SchemaNode, bool), ResolveError> {
        let directives = &property.directives;
        let policy = context.options().item_policy;
        let array = directives.array.as_deref();

        let overridden = directives.implementation.is_some();
        let declared = directives.implementation.as_ref().unwrap_or(&property.ty);
        let (target, type_may_be_absent) = declared.unwrap_optional();

        let mut target = target.clone();
        if let Some(items_impl) = array.and_then(|a| a.items.implementation.as_ref()) {
            target = target.with_element(items_impl.clone());
        }
        let is_container = target.is_container();

        let key = ResolutionKey::property(target, property.schema_name()).skip_override(overridden);
        let mut schema = context.resolve(&key)?;

        // Container-level array directives extend the field's own.
        let mut effective = directives.clone();
        if is_container {
            if let Some(array) = array {
                effective = effective.merged_with(&array.schema);
                if policy == ItemDirectivePolicy::PromoteToContainer
                    && effective.nullable.is_none()
                    && effective.types.is_none()
                {
                    effective.nullable = array.items.nullable;
                }
            }
        }

        decorate(&mut schema, &effective);
        schema.meta.nullable = schema.meta.nullable || effective.is_nullable(type_may_be_absent);

        if let (NodeKind::Array(items), Some(array)) = (&mut schema.kind, array) {
            decorate(&mut items.items, &array.items);
            if array.items.is_nullable(false) {
                items.items.meta.nullable = true;
            }
        }
        if let (NodeKind::Array(_), Some(array)) = (&schema.kind, array) {
            schema.meta.min_items = array.min_items.or(schema.meta.min_items);
            schema.meta.max_items = array.max_items.or(schema.meta.max_items);
            schema.meta.unique_items |= array.unique_items;
        }

        let required = directives.is_required(is_container, policy);
        Ok((schema, required))
    }
}

/// Apply annotations and validation directives to a resolved node.
fn decorate(schema: &mut SchemaNode, directives: &DirectiveSet) {
    if let Some(description) = &directives.description {
        schema.meta.description = Some(description.clone());
    }

    if let Some(types) = &directives.types {
        let primary = types
            .iter()
            .find(|t| *t != NULL_TYPE)
            .and_then(|t| PrimitiveKind::parse(t));
        if let (NodeKind::Primitive(kind), Some(primary)) = (&mut schema.kind, primary) {
            if *kind != primary {
                *kind = primary;
                schema.meta.format = None;
            }
        }
        schema.meta.explicit_types = Some(types.clone());
    }

    if let Some(format) = &directives.format {
        schema.meta.format = Some(format.clone());
    }

    let is_array = matches!(schema.kind, NodeKind::Array(_));
    for constraint in &directives.constraints {
        match constraint {
            Constraint::NotNull => {}
            Constraint::NotBlank | Constraint::NotEmpty => {
                if is_array {
                    schema.meta.min_items = Some(schema.meta.min_items.unwrap_or(0).max(1));
                } else if schema.kind == NodeKind::Primitive(PrimitiveKind::String) {
                    schema.meta.min_length = Some(schema.meta.min_length.unwrap_or(0).max(1));
                }
            }
            Constraint::Size { min, max } => {
                if is_array {
                    schema.meta.min_items = min.or(schema.meta.min_items);
                    schema.meta.max_items = max.or(schema.meta.max_items);
                } else {
                    schema.meta.min_length = min.or(schema.meta.min_length);
                    schema.meta.max_length = max.or(schema.meta.max_length);
                }
            }
            Constraint::Pattern(pattern) => schema.meta.pattern = Some(pattern.clone()),
            Constraint::Min(min) => schema.meta.minimum = Some(*min),
            Constraint::Max(max) => schema.meta.maximum = Some(*max),
        }
    }

    if let Some(example) = &directives.example {
        schema.meta.example = Some(coerce_example(example, schema));
    }
}

/// Convert an example literal to a value of the schema's authoritative type.
///
/// Explicit type names decide before the node kind; a literal that does not
/// parse as the authoritative type is kept as a string.
pub fn coerce_example(literal: &str, schema: &SchemaNode) -> Value {
    let explicit = schema
        .meta
        .explicit_types
        .as_ref()
        .and_then(|types| types.iter().find(|t| *t != NULL_TYPE))
        .map(String::as_str);
    let text = || Value::String(literal.to_string());

    match explicit.or(schema.kind_name()) {
        Some("string") => text(),
        Some("integer") => literal
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| text()),
        Some("number") => {
            let trimmed = literal.trim();
            if let Ok(int) = trimmed.parse::<i64>() {
                Value::from(int)
            } else {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or_else(text)
            }
        }
        Some("boolean") => match literal.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => text(),
        },
        _ => serde_json::from_str(literal).unwrap_or_else(|_| text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, PrimitiveType, TypeUniverse};
    use crate::directive::{ArrayDirectives, RequiredMode};
    use crate::types::ResolveOptions;
    use serde_json::json;

    fn field(name: &str, ty: &str) -> FieldDescriptor {
        FieldDescriptor::new(name, ty.parse().unwrap())
    }

    fn resolve_model(universe: &TypeUniverse, id: &str, options: ResolveOptions) -> ObjectSchema {
        let mut ctx = ResolutionContext::new(universe, options);
        ctx.resolve_root(&TypeRef::named(id)).unwrap();
        let name = crate::descriptor::TypeId::new(id);
        let model = ctx.defined_models()[name.simple_name()].as_object().cloned();
        model.unwrap()
    }

    #[test]
    fn boxed_primitives_keep_their_kind() {
        let universe = TypeUniverse::new();
        let mut ctx = ResolutionContext::new(&universe, ResolveOptions::default());
        let root = ctx.resolve_root(&TypeRef::boxed(PrimitiveType::Boolean)).unwrap();
        assert_eq!(root.schema.kind, NodeKind::Primitive(PrimitiveKind::Boolean));

        let root = ctx.resolve_root(&TypeRef::boxed(PrimitiveType::Int32)).unwrap();
        assert_eq!(root.schema.kind, NodeKind::Primitive(PrimitiveKind::Integer));
        assert_eq!(root.schema.meta.format.as_deref(), Some("int32"));
        assert!(ctx.defined_models().is_empty());
    }

    #[test]
    fn stream_field_resolves_to_array() {
        let universe = TypeUniverse::from_descriptors([
            TypeDescriptor::new("StreamModel")
                .field(field("greetings", "java.util.stream.Stream<Greeting>")),
            TypeDescriptor::new("Greeting").field(field("message", "String")),
        ])
        .unwrap();

        let model = resolve_model(&universe, "StreamModel", ResolveOptions::default());
        let greetings = model.properties["greetings"].as_array().unwrap();
        assert_eq!(greetings.items.reference_name(), Some("Greeting"));
    }

    #[test]
    fn set_is_unique_items() {
        let universe = TypeUniverse::from_descriptors([TypeDescriptor::new("Tagged")
            .field(field("tags", "Set<string>"))])
        .unwrap();
        let model = resolve_model(&universe, "Tagged", ResolveOptions::default());
        assert!(model.properties["tags"].meta.unique_items);
    }

    #[test]
    fn constraints_shape_schema() {
        let universe = TypeUniverse::from_descriptors([TypeDescriptor::new("Form")
            .field(field("code", "string").with_directives(DirectiveSet {
                constraints: vec![
                    Constraint::NotBlank,
                    Constraint::Size {
                        min: None,
                        max: Some(8),
                    },
                    Constraint::Pattern("^[A-Z]+$".into()),
                ],
                ..Default::default()
            }))
            .field(field("items", "List<string>").with_directives(DirectiveSet {
                constraints: vec![Constraint::NotEmpty],
                ..Default::default()
            }))
            .field(field("age", "int").with_directives(DirectiveSet {
                constraints: vec![Constraint::Min(0), Constraint::Max(150)],
                ..Default::default()
            }))])
        .unwrap();

        let model = resolve_model(&universe, "Form", ResolveOptions::default());
        let code = &model.properties["code"].meta;
        assert_eq!(code.min_length, Some(1));
        assert_eq!(code.max_length, Some(8));
        assert_eq!(code.pattern.as_deref(), Some("^[A-Z]+$"));
        assert_eq!(model.properties["items"].meta.min_items, Some(1));
        assert_eq!(model.properties["age"].meta.minimum, Some(0));
        assert_eq!(model.properties["age"].meta.maximum, Some(150));
        assert_eq!(model.required, vec!["code".to_string(), "items".to_string()]);
    }

    #[test]
    fn hidden_and_renamed_properties() {
        let universe = TypeUniverse::from_descriptors([TypeDescriptor::new("User")
            .field(field("secret", "string").with_directives(DirectiveSet {
                hidden: true,
                ..Default::default()
            }))
            .field(field("userName", "string").with_directives(DirectiveSet {
                rename: Some("user_name".into()),
                ..Default::default()
            }))])
        .unwrap();

        let model = resolve_model(&universe, "User", ResolveOptions::default());
        assert!(!model.properties.contains_key("secret"));
        assert!(model.properties.contains_key("user_name"));
    }

    #[test]
    fn explicit_type_keeps_numeric_looking_example_as_string() {
        let universe = TypeUniverse::from_descriptors([TypeDescriptor::new("Dto")
            .field(field("name", "String").with_directives(DirectiveSet {
                example: Some("1234".into()),
                types: Some(vec!["string".into()]),
                ..Default::default()
            }))
            .field(field("age", "int").with_directives(DirectiveSet {
                example: Some("42".into()),
                ..Default::default()
            }))])
        .unwrap();

        let model = resolve_model(&universe, "Dto", ResolveOptions::default());
        assert_eq!(model.properties["name"].meta.example, Some(json!("1234")));
        assert_eq!(model.properties["age"].meta.example, Some(json!(42)));
    }

    #[test]
    fn explicit_type_overrides_primitive_kind() {
        let universe = TypeUniverse::from_descriptors([TypeDescriptor::new("Dto")
            .field(field("id", "long").with_directives(DirectiveSet {
                types: Some(vec!["string".into()]),
                example: Some("1234".into()),
                ..Default::default()
            }))])
        .unwrap();

        let model = resolve_model(&universe, "Dto", ResolveOptions::default());
        let id = &model.properties["id"];
        assert_eq!(id.kind, NodeKind::Primitive(PrimitiveKind::String));
        assert_eq!(id.meta.format, None);
        assert_eq!(id.meta.example, Some(json!("1234")));
    }

    #[test]
    fn coerce_example_fallbacks() {
        let int = SchemaNode::primitive(PrimitiveKind::Integer, None);
        assert_eq!(coerce_example("12", &int), json!(12));
        assert_eq!(coerce_example("twelve", &int), json!("twelve"));

        let number = SchemaNode::primitive(PrimitiveKind::Number, None);
        assert_eq!(coerce_example("1.5", &number), json!(1.5));

        let boolean = SchemaNode::primitive(PrimitiveKind::Boolean, None);
        assert_eq!(coerce_example("true", &boolean), json!(true));

        let object = SchemaNode::opaque();
        assert_eq!(coerce_example(r#"{"a":1}"#, &object), json!({"a": 1}));
        assert_eq!(coerce_example("not json", &object), json!("not json"));
    }

    #[test]
    fn items_implementation_registers_model() {
        let universe = TypeUniverse::from_descriptors([
            TypeDescriptor::new("User").field(
                field("assignments", "List<Object>").with_directives(DirectiveSet {
                    array: Some(Box::new(ArrayDirectives {
                        items: DirectiveSet {
                            implementation: Some(TypeRef::named("ThingAssignment")),
                            ..Default::default()
                        },
                        ..Default::default()
                    })),
                    ..Default::default()
                }),
            ),
            TypeDescriptor::new("ThingAssignment")
                .field(field("id", "string"))
                .field(field("status", "string")),
        ])
        .unwrap();

        let mut ctx = ResolutionContext::new(&universe, ResolveOptions::default());
        ctx.resolve_root(&TypeRef::named("User")).unwrap();
        assert!(ctx.defined_models().contains_key("ThingAssignment"));
        let user = ctx.defined_models()["User"].as_object().unwrap();
        let items = &user.properties["assignments"].as_array().unwrap().items;
        assert_eq!(items.reference_name(), Some("ThingAssignment"));
    }

    #[test]
    fn type_level_implementation_redirects_once() {
        let universe = TypeUniverse::from_descriptors([
            TypeDescriptor::new("Money").with_directives(DirectiveSet {
                implementation: Some(TypeRef::primitive(PrimitiveType::String)),
                ..Default::default()
            }),
            TypeDescriptor::new("Ping").with_directives(DirectiveSet {
                implementation: Some(TypeRef::named("Pong")),
                ..Default::default()
            }),
            TypeDescriptor::new("Pong").with_directives(DirectiveSet {
                implementation: Some(TypeRef::named("Ping")),
                ..Default::default()
            }),
        ])
        .unwrap();

        let mut ctx = ResolutionContext::new(&universe, ResolveOptions::default());
        let money = ctx.resolve_root(&TypeRef::named("Money")).unwrap();
        assert_eq!(money.schema.kind, NodeKind::Primitive(PrimitiveKind::String));

        // Ping -> Pong, and Pong's own override is skipped.
        ctx.resolve_root(&TypeRef::named("Ping")).unwrap();
        assert!(ctx.defined_models().contains_key("Pong"));
        assert!(!ctx.defined_models().contains_key("Ping"));
    }

    #[test]
    fn enum_types_inline() {
        let universe = TypeUniverse::from_descriptors([
            TypeDescriptor::new("Order").field(field("status", "Status")),
            TypeDescriptor::new("Status").enum_values(["OPEN", "CLOSED"]),
        ])
        .unwrap();

        let mut ctx = ResolutionContext::new(&universe, ResolveOptions::default());
        ctx.resolve_root(&TypeRef::named("Order")).unwrap();
        let order = ctx.defined_models()["Order"].as_object().unwrap();
        let status = &order.properties["status"];
        assert_eq!(status.kind, NodeKind::Primitive(PrimitiveKind::String));
        assert_eq!(status.meta.enum_values, vec!["OPEN", "CLOSED"]);
        assert!(!ctx.defined_models().contains_key("Status"));
    }

    #[test]
    fn array_required_mode_on_container() {
        let universe = TypeUniverse::from_descriptors([TypeDescriptor::new("Person")
            .field(field("addresses", "List<String>").with_directives(DirectiveSet {
                array: Some(Box::new(ArrayDirectives {
                    schema: DirectiveSet {
                        required: RequiredMode::Required,
                        ..Default::default()
                    },
                    ..Default::default()
                })),
                ..Default::default()
            }))
            .field(field("workaroundAddresses", "List<String>").with_directives(DirectiveSet {
                array: Some(Box::new(ArrayDirectives {
                    schema: DirectiveSet {
                        description: Some("The person".into()),
                        ..Default::default()
                    },
                    items: DirectiveSet {
                        required: RequiredMode::Required,
                        ..Default::default()
                    },
                    ..Default::default()
                })),
                ..Default::default()
            }))])
        .unwrap();

        let model = resolve_model(&universe, "Person", ResolveOptions::default());
        assert!(model.required.contains(&"addresses".to_string()));
        assert!(model.required.contains(&"workaroundAddresses".to_string()));
        assert_eq!(
            model.properties["workaroundAddresses"].meta.description.as_deref(),
            Some("The person")
        );

        let items_only = ResolveOptions::default().item_policy(ItemDirectivePolicy::ItemsOnly);
        let model = resolve_model(&universe, "Person", items_only);
        assert!(model.required.contains(&"addresses".to_string()));
        assert!(!model.required.contains(&"workaroundAddresses".to_string()));
    }
}
