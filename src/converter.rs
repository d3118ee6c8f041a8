//! Pluggable converter chain.
//!
//! Each converter is offered a [`ResolutionKey`] and may produce a schema,
//! delegate to the rest of the chain through [`Next`], or decline with
//! `Ok(None)`.

use crate::context::ResolutionContext;
use crate::error::ResolveError;
use crate::key::ResolutionKey;
use crate::model::ModelResolver;
use crate::schema::SchemaNode;

/// A resolver participating in the chain.
pub trait ModelConverter {
    fn resolve(
        &self,
        key: &ResolutionKey,
        context: &mut ResolutionContext<'_>,
        next: Next<'_>,
    ) -> Result<Option<SchemaNode>, ResolveError>;
}

/// The converters after the current one.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    rest: &'a [Box<dyn ModelConverter>],
}

impl Next<'_> {
    /// Hand the request to the next converter, or decline at the end of the chain.
    pub fn resolve(
        self,
        key: &ResolutionKey,
        context: &mut ResolutionContext<'_>,
    ) -> Result<Option<SchemaNode>, ResolveError> {
        match self.rest.split_first() {
            Some((head, tail)) => head.resolve(key, context, Next { rest: tail }),
            None => Ok(None),
        }
    }
}

/// Ordered list of converters.
pub struct ConverterChain {
    converters: Vec<Box<dyn ModelConverter>>,
}

impl ConverterChain {
    /// A chain with no converters; every request is declined.
    pub fn empty() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    /// Append a converter at the end of the chain.
    pub fn with(mut self, converter: impl ModelConverter + 'static) -> Self {
        self.converters.push(Box::new(converter));
        self
    }

    /// Insert a converter ahead of all existing ones.
    pub fn prepend(mut self, converter: impl ModelConverter + 'static) -> Self {
        self.converters.insert(0, Box::new(converter));
        self
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    pub fn dispatch(
        &self,
        key: &ResolutionKey,
        context: &mut ResolutionContext<'_>,
    ) -> Result<Option<SchemaNode>, ResolveError> {
        Next {
            rest: &self.converters,
        }
        .resolve(key, context)
    }
}

impl Default for ConverterChain {
    fn default() -> Self {
        Self::empty().with(ModelResolver::default())
    }
}
