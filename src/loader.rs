//! Type universe loading.
//!
//! A universe file is JSON of the form `{"types": [TypeDescriptor, ...]}`.

use std::path::Path;

use serde::Deserialize;

use crate::descriptor::{TypeDescriptor, TypeUniverse};
use crate::error::ResolveError;

#[derive(Debug, Deserialize)]
struct UniverseFile {
    #[serde(default)]
    types: Vec<TypeDescriptor>,
}

/// Load a type universe from a file path.
///
/// # Errors
///
/// Returns `ResolveError::FileNotFound` if the file doesn't exist,
/// `ResolveError::InvalidJson` if it isn't a valid universe document,
/// or `ResolveError::DuplicateType` if two descriptors share an id.
pub fn load_universe(path: &Path) -> Result<TypeUniverse, ResolveError> {
    if !path.exists() {
        return Err(ResolveError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ResolveError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "loading type universe");
    load_universe_str(&content)
}

/// Load a type universe from a JSON string.
///
/// # Errors
///
/// Returns `ResolveError::InvalidJson` if the string isn't a valid universe
/// document, or `ResolveError::DuplicateType` for repeated ids.
pub fn load_universe_str(content: &str) -> Result<TypeUniverse, ResolveError> {
    let file: UniverseFile =
        serde_json::from_str(content).map_err(|source| ResolveError::InvalidJson { source })?;
    TypeUniverse::from_descriptors(file.types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TypeId;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_from_str() {
        let universe = load_universe_str(
            r#"{
                "types": [
                    { "id": "com.example.Greeting", "fields": [{ "name": "message", "type": "String" }] }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(universe.len(), 1);
        let greeting = universe.get(&TypeId::new("com.example.Greeting")).unwrap();
        assert_eq!(greeting.fields[0].name, "message");
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"types": [{{"id": "A"}}, {{"id": "B", "extends": "A"}}]}}"#).unwrap();

        let universe = load_universe(file.path()).unwrap();
        assert_eq!(universe.len(), 2);
    }

    #[test]
    fn missing_file() {
        let err = load_universe(Path::new("/nonexistent/universe.json")).unwrap_err();
        assert!(matches!(err, ResolveError::FileNotFound { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn invalid_type_ref_is_invalid_json() {
        let err = load_universe_str(
            r#"{"types": [{"id": "A", "fields": [{"name": "x", "type": "List<"}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidJson { .. }));
    }

    #[test]
    fn duplicate_ids() {
        let err = load_universe_str(r#"{"types": [{"id": "A"}, {"id": "A"}]}"#).unwrap_err();
        assert!(matches!(err, ResolveError::DuplicateType { .. }));
    }

    #[test]
    fn empty_document() {
        assert!(load_universe_str("{}").unwrap().is_empty());
    }
}
