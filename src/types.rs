//! Core options and constants for schema resolution.

use serde::{Deserialize, Serialize};

/// Null marker used in multi-type `type` arrays and explicit type names.
pub const NULL_TYPE: &str = "null";

/// Prefix for references to registered models.
pub const REF_PREFIX: &str = "#/components/schemas/";

/// Output dialect.
///
/// Determines how leaf type information is carried when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dialect {
    /// Single `type` string, nullability as a separate `nullable` flag (OpenAPI 3.0).
    #[default]
    #[serde(rename = "3.0")]
    SingleType,
    /// `type` set with `"null"` as a variant (OpenAPI 3.1).
    #[serde(rename = "3.1")]
    MultiType,
}

impl Dialect {
    /// Parse a dialect from its version string.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "3.0" | "3.0.1" | "single" => Some(Dialect::SingleType),
            "3.1" | "3.1.0" | "multi" => Some(Dialect::MultiType),
            _ => None,
        }
    }

    /// Version written to the `openapi` field of an assembled document.
    pub fn openapi_version(&self) -> &'static str {
        match self {
            Dialect::SingleType => "3.0.1",
            Dialect::MultiType => "3.1.0",
        }
    }
}

/// How item-level array directives interact with the container property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemDirectivePolicy {
    /// Item-level required/nullable overrides also decide the container
    /// property when the container level leaves them unset.
    #[default]
    PromoteToContainer,
    /// Item-level directives only shape `items`.
    ItemsOnly,
}

/// Options for a top-level resolution run.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Output dialect the run is destined for.
    pub dialect: Dialect,
    /// Resolve roots as if they were a property with this name.
    pub property_name: Option<String>,
    /// Forced requiredness of roots.
    pub required: Option<bool>,
    /// Forced nullability of roots.
    pub nullable: Option<bool>,
    pub item_policy: ItemDirectivePolicy,
}

impl ResolveOptions {
    /// Create new resolve options for a dialect with no root overrides.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    /// Resolve roots under a property context with the given name.
    pub fn property_name(mut self, name: impl Into<String>) -> Self {
        self.property_name = Some(name.into());
        self
    }

    /// Force requiredness of roots.
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Force nullability of roots.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Set how item-level array directives are applied.
    pub fn item_policy(mut self, policy: ItemDirectivePolicy) -> Self {
        self.item_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_parse_valid() {
        assert_eq!(Dialect::parse("3.0"), Some(Dialect::SingleType));
        assert_eq!(Dialect::parse("3.1"), Some(Dialect::MultiType));
        assert_eq!(Dialect::parse("3.1.0"), Some(Dialect::MultiType));
    }

    #[test]
    fn dialect_parse_invalid() {
        assert_eq!(Dialect::parse("2.0"), None);
        assert_eq!(Dialect::parse(""), None);
    }

    #[test]
    fn resolve_options_builder() {
        let opts = ResolveOptions::new(Dialect::MultiType)
            .property_name("body")
            .required(true)
            .item_policy(ItemDirectivePolicy::ItemsOnly);
        assert_eq!(opts.dialect, Dialect::MultiType);
        assert_eq!(opts.property_name.as_deref(), Some("body"));
        assert_eq!(opts.required, Some(true));
        assert_eq!(opts.nullable, None);
        assert_eq!(opts.item_policy, ItemDirectivePolicy::ItemsOnly);
    }
}
