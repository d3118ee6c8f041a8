//! Type Schema Resolver
//!
//! Resolution of structural type descriptors into named schema models.
//!
//! A [`TypeUniverse`] describes records with typed fields, generic
//! containers, inheritance links, and metadata directives. Resolving a root
//! type walks that graph through a [`ConverterChain`] and registers every
//! named model it reaches; the [`encoder`](encode_document) then renders the
//! registry in either output dialect.
//!
//! # Example
//!
//! ```
//! use type_schema::{encode_document, load_universe_str, resolve, Dialect, ResolveOptions, TypeRef};
//!
//! let universe = load_universe_str(r#"{
//!     "types": [
//!         { "id": "com.example.Base",
//!           "directives": { "discriminatorProperty": "type" },
//!           "subtypes": [{ "type": "com.example.Concretion" }],
//!           "fields": [{ "name": "type", "type": "String" }] },
//!         { "id": "com.example.Concretion",
//!           "extends": "com.example.Base",
//!           "fields": [{ "name": "id", "type": "Long", "mayBeAbsent": true }] }
//!     ]
//! }"#).unwrap();
//!
//! let options = ResolveOptions::new(Dialect::MultiType);
//! let resolution = resolve(&universe, &[TypeRef::named("com.example.Concretion")], &options).unwrap();
//! let document = encode_document(&resolution, options.dialect);
//!
//! let concretion = &document["components"]["schemas"]["Concretion"];
//! assert_eq!(concretion["allOf"][0]["$ref"], "#/components/schemas/Base");
//! assert_eq!(
//!     concretion["allOf"][1]["properties"]["id"]["type"],
//!     serde_json::json!(["integer", "null"])
//! );
//! ```
//!
//! # Precedence
//!
//! | Concern | Highest wins |
//! |---------|--------------|
//! | required | explicit required mode, container-level array mode, item-level array mode (per policy), validation directives |
//! | nullable | explicit type names listing `"null"`, explicit nullable flag, explicit type names without `"null"`, native "may be absent" |
//!
//! # Universe Format
//!
//! ```json
//! { "types": [ { "id": "com.example.Pet", "fields": [ { "name": "tags", "type": "Set<String>" } ] } ] }
//! ```

mod context;
mod converter;
mod descriptor;
mod diagnostic;
mod directive;
mod encoder;
mod error;
mod key;
mod linter;
mod loader;
mod model;
mod polymorphism;
mod schema;
mod types;

pub use context::{read_all, resolve, Resolution, ResolutionContext, ResolvedRoot};
pub use converter::{ConverterChain, ModelConverter, Next};
pub use descriptor::{
    AccessorDescriptor, ContainerKind, FieldDescriptor, PrimitiveType, Property, SubtypeDecl,
    TypeDescriptor, TypeId, TypeRef, TypeUniverse,
};
pub use diagnostic::{Diagnostic, Severity};
pub use directive::{ArrayDirectives, Constraint, DirectiveSet, MappingEntry, RequiredMode};
pub use encoder::{encode_document, encode_models, encode_schema, type_slot, TypeSlot};
pub use error::ResolveError;
pub use key::ResolutionKey;
pub use linter::{lint, lint_file, lint_universe, FileResult, FileStatus, LintResult};
pub use loader::{load_universe, load_universe_str};
pub use model::{coerce_example, ModelResolver};
pub use polymorphism::PolymorphismResolver;
pub use schema::{
    ArraySchema, ComposedSchema, DiscriminatorInfo, NodeKind, ObjectSchema, PrimitiveKind,
    SchemaMeta, SchemaNode,
};
pub use types::{Dialect, ItemDirectivePolicy, ResolveOptions, NULL_TYPE, REF_PREFIX};
