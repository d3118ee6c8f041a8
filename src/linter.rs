//! Universe linting - static analysis of type universe files.
//!
//! Checks universe files for:
//! - JSON syntax and descriptor shape errors
//! - References to types that are not described
//! - Inheritance cycles
//! - Inconsistent subtype declarations and discriminator mappings
//! - Properties published twice under the same name

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::descriptor::{TypeDescriptor, TypeId, TypeRef, TypeUniverse};
use crate::diagnostic::{Diagnostic, Severity};
use crate::loader::load_universe;

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_universe_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        total_warnings += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single universe file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let relative = file.strip_prefix(base_path).unwrap_or(file).to_path_buf();

    let universe = match load_universe(file) {
        Ok(u) => u,
        Err(e) => {
            return FileResult {
                file: relative,
                status: FileStatus::Error,
                diagnostics: vec![Diagnostic::error("E001", "/", format!("load error: {}", e))],
            };
        }
    };

    let diagnostics = lint_universe(&universe);

    let status = if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        FileStatus::Error
    } else if diagnostics.is_empty() {
        FileStatus::Ok
    } else {
        FileStatus::Warning
    };

    FileResult {
        file: relative,
        status,
        diagnostics,
    }
}

/// Run every check over an already loaded universe.
pub fn lint_universe(universe: &TypeUniverse) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for descriptor in universe.iter() {
        check_references(universe, descriptor, &mut diagnostics);
        check_inheritance(universe, descriptor, &mut diagnostics);
        check_subtypes(universe, descriptor, &mut diagnostics);
        check_property_names(descriptor, &mut diagnostics);
    }
    diagnostics
}

fn collect_named<'a>(ty: &'a TypeRef, out: &mut Vec<&'a TypeId>) {
    match ty {
        TypeRef::Named(id) => out.push(id),
        TypeRef::Container { element, .. } => collect_named(element, out),
        TypeRef::Map { value } => collect_named(value, out),
        TypeRef::Optional { inner } => collect_named(inner, out),
        TypeRef::Primitive { .. } | TypeRef::Any => {}
    }
}

fn check_references(
    universe: &TypeUniverse,
    descriptor: &TypeDescriptor,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let base = descriptor.id.as_str();
    let mut unknown = |path: String, id: &TypeId| {
        if universe.get(id).is_none() {
            diagnostics.push(Diagnostic::error(
                "E002",
                path,
                format!("unknown type reference: {}", id),
            ));
        }
    };

    for property in descriptor.properties() {
        let path = format!("{}/properties/{}", base, property.name);
        let mut ids = Vec::new();
        collect_named(&property.ty, &mut ids);
        if let Some(implementation) = &property.directives.implementation {
            collect_named(implementation, &mut ids);
        }
        if let Some(items) = property
            .directives
            .array
            .as_ref()
            .and_then(|a| a.items.implementation.as_ref())
        {
            collect_named(items, &mut ids);
        }
        for id in ids {
            unknown(path.clone(), id);
        }
    }

    if let Some(implementation) = &descriptor.directives.implementation {
        let mut ids = Vec::new();
        collect_named(implementation, &mut ids);
        for id in ids {
            unknown(format!("{}/implementation", base), id);
        }
    }
    if let Some(supertype) = &descriptor.supertype {
        unknown(format!("{}/extends", base), supertype);
    }
    for subtype in &descriptor.subtypes {
        unknown(format!("{}/subtypes", base), &subtype.target);
    }
    for entry in &descriptor.directives.discriminator_mapping {
        unknown(format!("{}/discriminatorMapping/{}", base, entry.value), &entry.target);
    }
}

fn check_inheritance(
    universe: &TypeUniverse,
    descriptor: &TypeDescriptor,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if let Err(e) = universe.ancestors(&descriptor.id) {
        diagnostics.push(Diagnostic::error("E003", descriptor.id.as_str(), e.to_string()));
    }
}

fn check_subtypes(
    universe: &TypeUniverse,
    descriptor: &TypeDescriptor,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let path = format!("{}/subtypes", descriptor.id);
    let mapping = &descriptor.directives.discriminator_mapping;

    for subtype in &descriptor.subtypes {
        if let Some(target) = universe.get(&subtype.target) {
            if let Some(supertype) = &target.supertype {
                if supertype != &descriptor.id {
                    diagnostics.push(Diagnostic::warning(
                        "W001",
                        path.clone(),
                        format!(
                            "declared subtype {} extends {} instead",
                            subtype.target, supertype
                        ),
                    ));
                }
            }
        }

        if mapping.is_empty() {
            continue;
        }
        let values: Vec<&str> = mapping
            .iter()
            .filter(|m| m.target == subtype.target)
            .map(|m| m.value.as_str())
            .collect();

        match (&subtype.name, values.is_empty()) {
            (_, true) => diagnostics.push(Diagnostic::warning(
                "W002",
                path.clone(),
                format!(
                    "declared subtype {} is missing from the discriminator mapping",
                    subtype.target
                ),
            )),
            (Some(name), false) if !values.contains(&name.as_str()) => {
                diagnostics.push(Diagnostic::warning(
                    "W004",
                    path.clone(),
                    format!(
                        "declared subtype {} is named \"{}\" but mapped as {}",
                        subtype.target,
                        name,
                        values.join(", ")
                    ),
                ))
            }
            _ => {}
        }
    }
}

fn check_property_names(descriptor: &TypeDescriptor, diagnostics: &mut Vec<Diagnostic>) {
    let mut seen = HashSet::new();
    for property in descriptor.properties() {
        if property.directives.hidden {
            continue;
        }
        let name = property.schema_name().to_string();
        if !seen.insert(name.clone()) {
            diagnostics.push(Diagnostic::warning(
                "W003",
                format!("{}/properties/{}", descriptor.id, property.name),
                format!("property name \"{}\" is published more than once", name),
            ));
        }
    }
}

fn collect_universe_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}
