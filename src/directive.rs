//! Metadata directives attached to types, fields, and accessors.
//!
//! A [`DirectiveSet`] is the statically typed replacement for reflective
//! annotations: it is built once by whoever describes the type universe and
//! is only read by the resolver.

use serde::{Deserialize, Serialize};

use crate::descriptor::{TypeId, TypeRef};
use crate::types::{ItemDirectivePolicy, NULL_TYPE};

/// Explicit requiredness override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequiredMode {
    /// Defer to validation directives.
    #[default]
    Auto,
    Required,
    NotRequired,
}

impl RequiredMode {
    /// Returns the explicit decision, or `None` for `Auto`.
    pub fn decision(self) -> Option<bool> {
        match self {
            RequiredMode::Auto => None,
            RequiredMode::Required => Some(true),
            RequiredMode::NotRequired => Some(false),
        }
    }
}

/// Validation directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Constraint {
    NotNull,
    NotBlank,
    NotEmpty,
    Size {
        #[serde(default)]
        min: Option<u64>,
        #[serde(default)]
        max: Option<u64>,
    },
    Pattern(String),
    Min(i64),
    Max(i64),
}

impl Constraint {
    /// Whether this directive implies the property must be present.
    pub fn implies_presence(&self) -> bool {
        matches!(
            self,
            Constraint::NotNull | Constraint::NotBlank | Constraint::NotEmpty
        )
    }
}

/// One discriminator value mapped to a subtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappingEntry {
    pub value: String,
    #[serde(rename = "schema")]
    pub target: TypeId,
}

/// Array-specific directives: container level and item level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArrayDirectives {
    /// Directives describing the array itself.
    pub schema: DirectiveSet,
    /// Directives describing each item.
    pub items: DirectiveSet,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
}

impl ArrayDirectives {
    fn merged_with(&self, other: &ArrayDirectives) -> ArrayDirectives {
        ArrayDirectives {
            schema: self.schema.merged_with(&other.schema),
            items: self.items.merged_with(&other.items),
            min_items: self.min_items.or(other.min_items),
            max_items: self.max_items.or(other.max_items),
            unique_items: self.unique_items || other.unique_items,
        }
    }
}

/// Recognized metadata for a type, field, or accessor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DirectiveSet {
    pub required: RequiredMode,
    pub nullable: Option<bool>,
    /// Explicit type names, e.g. `["string", "null"]`.
    pub types: Option<Vec<String>>,
    /// Example in literal (textual) form.
    pub example: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
    /// Resolve as this type instead of the declared one.
    pub implementation: Option<TypeRef>,
    /// Property name override.
    pub rename: Option<String>,
    pub hidden: bool,
    /// Native "may be absent" marker on the declared type.
    pub may_be_absent: bool,
    pub constraints: Vec<Constraint>,
    pub discriminator_property: Option<String>,
    pub discriminator_mapping: Vec<MappingEntry>,
    pub array: Option<Box<ArrayDirectives>>,
}

impl DirectiveSet {
    /// Merge two directive sets; `self` wins for every key it sets.
    pub fn merged_with(&self, other: &DirectiveSet) -> DirectiveSet {
        let mut constraints = self.constraints.clone();
        for c in &other.constraints {
            if !constraints.contains(c) {
                constraints.push(c.clone());
            }
        }

        let array = match (&self.array, &other.array) {
            (Some(a), Some(b)) => Some(Box::new(a.merged_with(b))),
            (a, b) => a.clone().or_else(|| b.clone()),
        };

        DirectiveSet {
            required: match self.required {
                RequiredMode::Auto => other.required,
                mode => mode,
            },
            nullable: self.nullable.or(other.nullable),
            types: self.types.clone().or_else(|| other.types.clone()),
            example: self.example.clone().or_else(|| other.example.clone()),
            description: self
                .description
                .clone()
                .or_else(|| other.description.clone()),
            format: self.format.clone().or_else(|| other.format.clone()),
            implementation: self
                .implementation
                .clone()
                .or_else(|| other.implementation.clone()),
            rename: self.rename.clone().or_else(|| other.rename.clone()),
            hidden: self.hidden || other.hidden,
            may_be_absent: self.may_be_absent || other.may_be_absent,
            constraints,
            discriminator_property: self
                .discriminator_property
                .clone()
                .or_else(|| other.discriminator_property.clone()),
            discriminator_mapping: if self.discriminator_mapping.is_empty() {
                other.discriminator_mapping.clone()
            } else {
                self.discriminator_mapping.clone()
            },
            array,
        }
    }

    /// Whether any validation directive implies presence.
    pub fn implies_presence(&self) -> bool {
        self.constraints.iter().any(Constraint::implies_presence)
    }

    /// Whether explicit type names list the null marker.
    pub fn lists_null_type(&self) -> bool {
        self.types
            .as_ref()
            .is_some_and(|types| types.iter().any(|t| t == NULL_TYPE))
    }

    /// Requiredness with explicit overrides taking precedence over inference.
    ///
    /// For containers the container-level array directive is consulted after
    /// the field's own override, then the item-level one when `policy`
    /// promotes item directives.
    pub fn is_required(&self, is_container: bool, policy: ItemDirectivePolicy) -> bool {
        // Computed even when an override wins.
        let inferred = self.implies_presence()
            || self
                .array
                .as_ref()
                .is_some_and(|a| a.schema.implies_presence());

        let mut modes = vec![self.required];
        if is_container {
            if let Some(array) = &self.array {
                modes.push(array.schema.required);
                if policy == ItemDirectivePolicy::PromoteToContainer {
                    modes.push(array.items.required);
                }
            }
        }

        modes
            .into_iter()
            .find_map(RequiredMode::decision)
            .unwrap_or(inferred)
    }

    /// Nullability with explicit type names and flags taking precedence over
    /// the native "may be absent" marker.
    pub fn is_nullable(&self, type_may_be_absent: bool) -> bool {
        let native = self.may_be_absent || type_may_be_absent;

        if self.lists_null_type() {
            return true;
        }
        if let Some(flag) = self.nullable {
            return flag;
        }
        if self.types.is_some() {
            return false;
        }
        native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_constraints(required: RequiredMode, constraints: Vec<Constraint>) -> DirectiveSet {
        DirectiveSet {
            required,
            constraints,
            ..Default::default()
        }
    }

    #[test]
    fn not_required_override_beats_not_blank() {
        let d = with_constraints(RequiredMode::NotRequired, vec![Constraint::NotBlank]);
        assert!(d.implies_presence());
        assert!(!d.is_required(false, ItemDirectivePolicy::default()));
    }

    #[test]
    fn not_empty_infers_required() {
        let d = with_constraints(RequiredMode::Auto, vec![Constraint::NotEmpty]);
        assert!(d.is_required(true, ItemDirectivePolicy::default()));
    }

    #[test]
    fn size_does_not_infer_required() {
        let d = with_constraints(
            RequiredMode::Auto,
            vec![Constraint::Size {
                min: Some(1),
                max: None,
            }],
        );
        assert!(!d.is_required(false, ItemDirectivePolicy::default()));
    }

    #[test]
    fn container_level_required_applies() {
        let d = DirectiveSet {
            array: Some(Box::new(ArrayDirectives {
                schema: DirectiveSet {
                    required: RequiredMode::Required,
                    ..Default::default()
                },
                ..Default::default()
            })),
            ..Default::default()
        };
        assert!(d.is_required(true, ItemDirectivePolicy::ItemsOnly));
        // Array directives are ignored for non-containers.
        assert!(!d.is_required(false, ItemDirectivePolicy::ItemsOnly));
    }

    #[test]
    fn item_level_required_depends_on_policy() {
        let d = DirectiveSet {
            array: Some(Box::new(ArrayDirectives {
                items: DirectiveSet {
                    required: RequiredMode::Required,
                    ..Default::default()
                },
                ..Default::default()
            })),
            ..Default::default()
        };
        assert!(d.is_required(true, ItemDirectivePolicy::PromoteToContainer));
        assert!(!d.is_required(true, ItemDirectivePolicy::ItemsOnly));
    }

    #[test]
    fn nullable_precedence() {
        let native_only = DirectiveSet {
            may_be_absent: true,
            ..Default::default()
        };
        assert!(native_only.is_nullable(false));

        let explicit_false = DirectiveSet {
            may_be_absent: true,
            nullable: Some(false),
            ..Default::default()
        };
        assert!(!explicit_false.is_nullable(false));

        let types_with_null = DirectiveSet {
            nullable: Some(false),
            types: Some(vec!["string".into(), "null".into()]),
            ..Default::default()
        };
        assert!(types_with_null.is_nullable(false));

        let types_without_null = DirectiveSet {
            types: Some(vec!["string".into()]),
            ..Default::default()
        };
        assert!(!types_without_null.is_nullable(true));

        assert!(DirectiveSet::default().is_nullable(true));
        assert!(!DirectiveSet::default().is_nullable(false));
    }

    #[test]
    fn merge_prefers_self_and_fills_gaps() {
        let field = DirectiveSet {
            description: Some("from field".into()),
            ..Default::default()
        };
        let accessor = DirectiveSet {
            description: Some("from accessor".into()),
            required: RequiredMode::Required,
            array: Some(Box::default()),
            ..Default::default()
        };
        let merged = field.merged_with(&accessor);
        assert_eq!(merged.description.as_deref(), Some("from field"));
        assert_eq!(merged.required, RequiredMode::Required);
        assert!(merged.array.is_some());
    }

    #[test]
    fn deserializes_camel_case() {
        let d: DirectiveSet = serde_json::from_value(serde_json::json!({
            "required": "NOT_REQUIRED",
            "mayBeAbsent": true,
            "constraints": ["notBlank", { "size": { "max": 3 } }, { "min": 2 }],
            "discriminatorMapping": [{ "value": "A", "schema": "com.example.A" }]
        }))
        .unwrap();
        assert_eq!(d.required, RequiredMode::NotRequired);
        assert!(d.may_be_absent);
        assert_eq!(d.constraints.len(), 3);
        assert_eq!(d.discriminator_mapping[0].target.as_str(), "com.example.A");
    }
}
