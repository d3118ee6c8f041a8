//! Resolution context: model registry, per-key cache, and cycle guard.
//!
//! One context is created per top-level resolution run and is only mutated
//! by the thread driving that run. Runs that must not observe each other
//! (for example one per output dialect) each get a fresh context.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::converter::ConverterChain;
use crate::descriptor::{TypeId, TypeRef, TypeUniverse};
use crate::diagnostic::Diagnostic;
use crate::error::ResolveError;
use crate::key::ResolutionKey;
use crate::schema::SchemaNode;
use crate::types::ResolveOptions;

/// A resolved root type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoot {
    pub schema: SchemaNode,
    pub required: bool,
}

/// Output of a top-level resolution run.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub roots: Vec<ResolvedRoot>,
    /// Named models, keyed by simple type name.
    pub defined_models: IndexMap<String, SchemaNode>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ResolutionContext<'u> {
    universe: &'u TypeUniverse,
    options: ResolveOptions,
    chain: Rc<ConverterChain>,
    defined_models: IndexMap<String, SchemaNode>,
    processed: HashMap<ResolutionKey, SchemaNode>,
    in_progress: HashSet<ResolutionKey>,
    /// Models whose properties are currently being built, innermost last.
    owners: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'u> ResolutionContext<'u> {
    /// Create a context using the default converter chain.
    pub fn new(universe: &'u TypeUniverse, options: ResolveOptions) -> Self {
        Self::with_chain(universe, options, ConverterChain::default())
    }

    pub fn with_chain(
        universe: &'u TypeUniverse,
        options: ResolveOptions,
        chain: ConverterChain,
    ) -> Self {
        Self {
            universe,
            options,
            chain: Rc::new(chain),
            defined_models: IndexMap::new(),
            processed: HashMap::new(),
            in_progress: HashSet::new(),
            owners: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn universe(&self) -> &'u TypeUniverse {
        self.universe
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn defined_models(&self) -> &IndexMap<String, SchemaNode> {
        &self.defined_models
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_in_progress(&self, key: &ResolutionKey) -> bool {
        self.in_progress.contains(key)
    }

    /// Register (or replace) a named model.
    pub fn define_model(&mut self, name: &str, schema: SchemaNode) {
        tracing::debug!(model = name, "registered model");
        self.defined_models.insert(name.to_string(), schema);
    }

    /// Record a recoverable problem.
    ///
    /// Diagnostics are returned with the resolution; rendering them is up
    /// to the caller.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(code = %diagnostic.code, path = %diagnostic.path, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn enter_model(&mut self, name: &str) {
        self.owners.push(name.to_string());
    }

    pub(crate) fn exit_model(&mut self) {
        self.owners.pop();
    }

    /// Location of a request, e.g. `Job/properties/timeout`.
    fn location(&self, key: &ResolutionKey) -> String {
        match (self.owners.last(), &key.property_name) {
            (Some(owner), Some(property)) => format!("{}/properties/{}", owner, property),
            (None, Some(property)) => format!("properties/{}", property),
            _ => key.target.to_string(),
        }
    }

    /// Resolve a request through the converter chain.
    ///
    /// Completed results are cached under the full key. A key that is
    /// already being resolved yields a reference to its model name instead
    /// of recursing.
    pub fn resolve(&mut self, key: &ResolutionKey) -> Result<SchemaNode, ResolveError> {
        if let Some(cached) = self.processed.get(key) {
            tracing::debug!(key = %key, "cache hit");
            return Ok(cached.clone());
        }

        // Only named types can recur through a finite type reference.
        if let Some(name) = key.model_name() {
            if self.in_progress.contains(key) {
                return Ok(SchemaNode::reference(name));
            }
        }

        self.in_progress.insert(key.clone());
        let chain = Rc::clone(&self.chain);
        let result = chain.dispatch(key, self);
        self.in_progress.remove(key);

        let schema = match result? {
            Some(schema) => schema,
            None => {
                let location = self.location(key);
                self.report(Diagnostic::warning(
                    "W101",
                    location,
                    format!("no converter resolved {}; using an opaque object", key),
                ));
                SchemaNode::opaque()
            }
        };

        self.processed.insert(key.clone(), schema.clone());
        Ok(schema)
    }

    /// Resolve a root type under the run's root directives.
    pub fn resolve_root(&mut self, ty: &TypeRef) -> Result<ResolvedRoot, ResolveError> {
        let (target, may_be_absent) = ty.unwrap_optional();
        let key = match &self.options.property_name {
            Some(name) => ResolutionKey::property(target.clone(), name.clone()),
            None => ResolutionKey::bare(target.clone()),
        };

        let mut schema = self.resolve(&key)?;
        if self.options.nullable.unwrap_or(may_be_absent) {
            schema.meta.nullable = true;
        }

        Ok(ResolvedRoot {
            schema,
            required: self.options.required.unwrap_or(false),
        })
    }

    /// Check that every reference names a registered model.
    pub fn check_references(&self, roots: &[ResolvedRoot]) -> Result<(), ResolveError> {
        let registered = self
            .defined_models
            .iter()
            .map(|(name, schema)| (name.as_str(), schema));
        let root_nodes = roots.iter().map(|root| ("<root>", &root.schema));

        for (from, schema) in registered.chain(root_nodes) {
            if let Some(missing) = schema
                .references()
                .into_iter()
                .find(|name| !self.defined_models.contains_key(*name))
            {
                return Err(ResolveError::DanglingReference {
                    from: from.to_string(),
                    name: missing.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Finish the run, verifying references.
    pub fn into_resolution(self, roots: Vec<ResolvedRoot>) -> Result<Resolution, ResolveError> {
        self.check_references(&roots)?;
        Ok(Resolution {
            roots,
            defined_models: self.defined_models,
            diagnostics: self.diagnostics,
        })
    }
}

/// Resolve root types in a fresh context.
///
/// # Errors
///
/// Returns `ResolveError` for malformed input (inheritance cycles, dangling
/// references). Unknown field types are reported as diagnostics instead.
pub fn resolve(
    universe: &TypeUniverse,
    roots: &[TypeRef],
    options: &ResolveOptions,
) -> Result<Resolution, ResolveError> {
    let mut context = ResolutionContext::new(universe, options.clone());
    let mut resolved = Vec::with_capacity(roots.len());
    for root in roots {
        resolved.push(context.resolve_root(root)?);
    }
    context.into_resolution(resolved)
}

/// Resolve one described type and return every model it pulls in.
pub fn read_all(
    universe: &TypeUniverse,
    id: &TypeId,
    options: &ResolveOptions,
) -> Result<IndexMap<String, SchemaNode>, ResolveError> {
    if universe.get(id).is_none() {
        return Err(ResolveError::UnknownType { id: id.to_string() });
    }
    Ok(resolve(universe, &[TypeRef::Named(id.clone())], options)?.defined_models)
}
