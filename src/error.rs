//! Error types for type descriptor loading and schema resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors during descriptor loading and schema resolution.
///
/// Recoverable problems (unknown field types, missing discriminator mapping
/// entries) are not errors; they are recorded as diagnostics on the
/// resolution context instead.
#[derive(Debug, Error)]
pub enum ResolveError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid type reference \"{input}\": {message}")]
    InvalidTypeRef { input: String, message: String },

    #[error("duplicate type descriptor: {id}")]
    DuplicateType { id: String },

    // Resolution errors (exit code 2)
    #[error("unknown type: {id}")]
    UnknownType { id: String },

    #[error("inheritance cycle: {}", chain.join(" -> "))]
    InheritanceCycle { chain: Vec<String> },

    #[error("schema {from} references unregistered model \"{name}\"")]
    DanglingReference { from: String, name: String },
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ResolveError::FileNotFound { .. } | ResolveError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_error_exit_codes() {
        let err = ResolveError::FileNotFound {
            path: PathBuf::from("universe.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = ResolveError::UnknownType {
            id: "com.example.Missing".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = ResolveError::InvalidTypeRef {
            input: "List<".into(),
            message: "unbalanced '<'".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn inheritance_cycle_display() {
        let err = ResolveError::InheritanceCycle {
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "inheritance cycle: A -> B -> A");
    }

    #[test]
    fn dangling_reference_display() {
        let err = ResolveError::DanglingReference {
            from: "Container".into(),
            name: "Ghost".into(),
        };
        assert_eq!(
            err.to_string(),
            "schema Container references unregistered model \"Ghost\""
        );
    }
}
