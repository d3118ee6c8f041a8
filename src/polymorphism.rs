//! Inheritance: subtype composition and discriminators.
//!
//! A type with a parent is published as
//! `allOf: [$ref parent, { own properties }]`. Own properties are those whose
//! names no ancestor declares. A base carrying a discriminator exposes the
//! discriminator property (synthesized as a required string when the base
//! does not declare it) and the value-to-schema mapping.

use std::collections::HashSet;

use crate::context::ResolutionContext;
use crate::descriptor::{Property, TypeDescriptor, TypeRef, TypeUniverse};
use crate::diagnostic::Diagnostic;
use crate::error::ResolveError;
use crate::key::ResolutionKey;
use crate::model::ModelResolver;
use crate::schema::{DiscriminatorInfo, ObjectSchema, PrimitiveKind, SchemaNode};

#[derive(Debug, Default, Clone, Copy)]
pub struct PolymorphismResolver;

impl PolymorphismResolver {
    /// Described parent of `descriptor`, if any.
    ///
    /// An inheritance cycle is an error. A parent that is not described is
    /// reported and the type is treated as having none.
    pub fn parent<'u>(
        &self,
        descriptor: &TypeDescriptor,
        context: &mut ResolutionContext<'u>,
    ) -> Result<Option<&'u TypeDescriptor>, ResolveError> {
        let universe = context.universe();
        let ancestors = universe.ancestors(&descriptor.id)?;
        let Some(parent_id) = ancestors.first() else {
            return Ok(None);
        };

        match universe.get(parent_id) {
            Some(parent) => Ok(Some(parent)),
            None => {
                context.report(Diagnostic::warning(
                    "W104",
                    descriptor.id.to_string(),
                    format!("supertype {} is not described; resolving as a plain type", parent_id),
                ));
                Ok(None)
            }
        }
    }

    /// Property names declared by any ancestor, including synthesized
    /// discriminator properties.
    pub fn inherited_names(
        &self,
        universe: &TypeUniverse,
        descriptor: &TypeDescriptor,
    ) -> Result<HashSet<String>, ResolveError> {
        let mut names = HashSet::new();
        for id in universe.ancestors(&descriptor.id)? {
            let Some(ancestor) = universe.get(id) else {
                continue;
            };
            names.extend(ancestor.properties().iter().map(|p| p.schema_name().to_string()));
            if let Some(property) = &ancestor.directives.discriminator_property {
                names.insert(property.clone());
            }
        }
        Ok(names)
    }

    /// Properties of `descriptor` not inherited from an ancestor.
    pub fn own_properties(
        &self,
        universe: &TypeUniverse,
        descriptor: &TypeDescriptor,
    ) -> Result<Vec<Property>, ResolveError> {
        let inherited = self.inherited_names(universe, descriptor)?;
        Ok(descriptor
            .properties()
            .into_iter()
            .filter(|p| !inherited.contains(p.schema_name()))
            .collect())
    }

    /// Compose a subtype from a reference to its parent and its own fields.
    pub fn compose(
        &self,
        model: &ModelResolver,
        descriptor: &TypeDescriptor,
        parent: &TypeDescriptor,
        context: &mut ResolutionContext<'_>,
    ) -> Result<SchemaNode, ResolveError> {
        // Registers the parent, or yields a reference while it is in progress.
        context.resolve(&ResolutionKey::bare(TypeRef::Named(parent.id.clone())))?;

        let universe = context.universe();
        let inherited = self.inherited_names(universe, descriptor)?;
        let own = self.own_properties(universe, descriptor)?;

        let mut fragment = model.build_object(&own, context)?;
        if descriptor.directives.discriminator_property.is_some() {
            self.discriminate(descriptor, &mut fragment, &inherited, context);
        }

        Ok(SchemaNode::composed(vec![
            SchemaNode::reference(parent.name()),
            SchemaNode::object(fragment),
        ]))
    }

    /// Attach the discriminator of a root base type to its object schema.
    pub fn attach_discriminator(
        &self,
        descriptor: &TypeDescriptor,
        object: &mut ObjectSchema,
        context: &mut ResolutionContext<'_>,
    ) {
        self.discriminate(descriptor, object, &HashSet::new(), context);
    }

    fn discriminate(
        &self,
        descriptor: &TypeDescriptor,
        object: &mut ObjectSchema,
        inherited: &HashSet<String>,
        context: &mut ResolutionContext<'_>,
    ) {
        let Some(property) = &descriptor.directives.discriminator_property else {
            return;
        };

        if !object.properties.contains_key(property) && !inherited.contains(property) {
            object.add_property(
                property,
                SchemaNode::primitive(PrimitiveKind::String, None),
                true,
            );
        }

        let universe = context.universe();
        let declared = &descriptor.directives.discriminator_mapping;
        let mut mapping = Vec::with_capacity(declared.len());
        let mut mapped = Vec::with_capacity(declared.len());
        for entry in declared {
            match universe.get(&entry.target) {
                Some(target) => {
                    mapping.push((entry.value.clone(), target.name().to_string()));
                    mapped.push(&entry.target);
                }
                None => context.report(Diagnostic::warning(
                    "W103",
                    descriptor.id.to_string(),
                    format!(
                        "discriminator value '{}' maps to undescribed type {}; entry dropped",
                        entry.value, entry.target
                    ),
                )),
            }
        }

        if !declared.is_empty() {
            for subtype in &descriptor.subtypes {
                if !mapped.contains(&&subtype.target) {
                    context.report(Diagnostic::warning(
                        "W102",
                        descriptor.id.to_string(),
                        format!(
                            "declared subtype {} has no discriminator mapping entry",
                            subtype.target
                        ),
                    ));
                }
            }
        }

        object.discriminator = Some(DiscriminatorInfo {
            property_name: property.clone(),
            mapping,
        });
    }

    /// Resolve every subtype of a base so each is registered as a model.
    pub fn resolve_subtypes(
        &self,
        descriptor: &TypeDescriptor,
        context: &mut ResolutionContext<'_>,
    ) -> Result<(), ResolveError> {
        let universe = context.universe();
        for id in universe.subtypes_of(&descriptor.id) {
            if universe.get(&id).is_none() {
                if descriptor.subtypes.iter().any(|s| s.target == id) {
                    context.report(Diagnostic::warning(
                        "W105",
                        descriptor.id.to_string(),
                        format!("declared subtype {} is not described", id),
                    ));
                }
                continue;
            }
            context.resolve(&ResolutionKey::subtype(TypeRef::Named(id)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, TypeId};
    use crate::directive::{DirectiveSet, MappingEntry};
    use crate::types::ResolveOptions;

    fn string_field(name: &str) -> FieldDescriptor {
        FieldDescriptor::new(name, "string".parse().unwrap())
    }

    fn interface_universe() -> TypeUniverse {
        TypeUniverse::from_descriptors([
            TypeDescriptor::new("AttributeType")
                .with_directives(DirectiveSet {
                    discriminator_property: Some("type".into()),
                    ..Default::default()
                })
                .subtype(Some("date"), "DateAttributeTypeImpl"),
            TypeDescriptor::new("DateAttributeTypeImpl").field(string_field("format")),
        ])
        .unwrap()
    }

    #[test]
    fn synthesizes_discriminator_property() {
        let universe = interface_universe();
        let mut ctx = ResolutionContext::new(&universe, ResolveOptions::default());
        ctx.resolve_root(&TypeRef::named("DateAttributeTypeImpl")).unwrap();

        let base = ctx.defined_models()["AttributeType"].as_object().unwrap();
        assert!(base.properties.contains_key("type"));
        assert_eq!(base.required, vec!["type".to_string()]);
        let discriminator = base.discriminator.as_ref().unwrap();
        assert_eq!(discriminator.property_name, "type");
        assert!(discriminator.mapping.is_empty());

        let sub = ctx.defined_models()["DateAttributeTypeImpl"].as_composed().unwrap();
        assert_eq!(sub.all_of.len(), 2);
        assert_eq!(sub.all_of[0].reference_name(), Some("AttributeType"));
        let own = sub.all_of[1].as_object().unwrap();
        assert_eq!(own.properties.keys().collect::<Vec<_>>(), vec!["format"]);
    }

    #[test]
    fn inherited_properties_are_excluded() {
        let universe = TypeUniverse::from_descriptors([
            TypeDescriptor::new("Base").field(string_field("id")),
            TypeDescriptor::new("Middle").extends("Base").field(string_field("label")),
            TypeDescriptor::new("Leaf")
                .extends("Middle")
                .field(string_field("id"))
                .field(string_field("label"))
                .field(string_field("extra")),
        ])
        .unwrap();

        let leaf = universe.get(&TypeId::new("Leaf")).unwrap();
        let own = PolymorphismResolver.own_properties(&universe, leaf).unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].name, "extra");
    }

    #[test]
    fn mapping_diagnostics() {
        let universe = TypeUniverse::from_descriptors([
            TypeDescriptor::new("Pet")
                .with_directives(DirectiveSet {
                    discriminator_property: Some("kind".into()),
                    discriminator_mapping: vec![
                        MappingEntry {
                            value: "dog".into(),
                            target: TypeId::new("Dog"),
                        },
                        MappingEntry {
                            value: "bird".into(),
                            target: TypeId::new("Bird"),
                        },
                    ],
                    ..Default::default()
                })
                .field(string_field("kind"))
                .subtype(None, "Dog")
                .subtype(None, "Cat"),
            TypeDescriptor::new("Dog").field(string_field("bark")),
            TypeDescriptor::new("Cat").field(string_field("meow")),
        ])
        .unwrap();

        let mut ctx = ResolutionContext::new(&universe, ResolveOptions::default());
        ctx.resolve_root(&TypeRef::named("Pet")).unwrap();

        let pet = ctx.defined_models()["Pet"].as_object().unwrap();
        let discriminator = pet.discriminator.as_ref().unwrap();
        assert_eq!(discriminator.mapping, vec![("dog".to_string(), "Dog".to_string())]);

        let codes: Vec<&str> = ctx.diagnostics().iter().map(|d| d.code.as_str()).collect();
        assert!(codes.contains(&"W103"));
        assert!(codes.contains(&"W102"));
        assert!(ctx.defined_models().contains_key("Dog"));
        assert!(ctx.defined_models().contains_key("Cat"));
    }

    #[test]
    fn undescribed_supertype_is_plain() {
        let universe = TypeUniverse::from_descriptors([TypeDescriptor::new("Orphan")
            .extends("com.example.Missing")
            .field(string_field("id"))])
        .unwrap();

        let mut ctx = ResolutionContext::new(&universe, ResolveOptions::default());
        ctx.resolve_root(&TypeRef::named("Orphan")).unwrap();
        assert!(ctx.defined_models()["Orphan"].as_object().is_some());
        assert_eq!(ctx.diagnostics()[0].code, "W104");
    }

    #[test]
    fn inheritance_cycle_fails_resolution() {
        let universe = TypeUniverse::from_descriptors([
            TypeDescriptor::new("A").extends("B"),
            TypeDescriptor::new("B").extends("A"),
        ])
        .unwrap();

        let mut ctx = ResolutionContext::new(&universe, ResolveOptions::default());
        let err = ctx.resolve_root(&TypeRef::named("A")).unwrap_err();
        assert!(matches!(err, ResolveError::InheritanceCycle { .. }));
    }
}
