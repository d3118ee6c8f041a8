//! Context-sensitive cache key for resolution requests.

use std::fmt;

use crate::descriptor::TypeRef;

/// A resolution request: the target type plus every contextual flag.
///
/// Keys are equal only when all fields match, so a type resolved as a
/// property and the same type resolved as a polymorphic subtype occupy
/// separate cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    pub target: TypeRef,
    pub property: bool,
    pub property_name: Option<String>,
    pub subtype: bool,
    /// The target was reached through an implementation override; do not
    /// apply the target's own override again.
    pub skip_override: bool,
}

impl ResolutionKey {
    /// Bare-type resolution (a root or an ensured model).
    pub fn bare(target: TypeRef) -> Self {
        Self {
            target,
            property: false,
            property_name: None,
            subtype: false,
            skip_override: false,
        }
    }

    /// Resolution of a property's type.
    pub fn property(target: TypeRef, name: impl Into<String>) -> Self {
        Self {
            property: true,
            property_name: Some(name.into()),
            ..Self::bare(target)
        }
    }

    /// Resolution of a declared subtype discovered from its base.
    pub fn subtype(target: TypeRef) -> Self {
        Self {
            subtype: true,
            ..Self::bare(target)
        }
    }

    pub fn skip_override(mut self, skip: bool) -> Self {
        self.skip_override = skip;
        self
    }

    /// Schema name the target registers under, for described types.
    pub fn model_name(&self) -> Option<&str> {
        self.target.named_id().map(|id| id.simple_name())
    }
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target)?;
        if let Some(name) = &self.property_name {
            write!(f, " as property '{}'", name)?;
        } else if self.property {
            f.write_str(" as property")?;
        }
        if self.subtype {
            f.write_str(" as subtype")?;
        }
        if self.skip_override {
            f.write_str(" (override applied)")?;
        }
        Ok(())
    }
}
