//! Schema Loading
//!
//! Discovers kind directories under `<root>/<kinds_dir>`, compiles one schema
//! file per directory and extracts the declared name and metadata.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{CodegenError, Result};
use crate::schema::{SchemaCompiler, SchemaUnit, SchemaValue};

/// Configuration for kind loading
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Directory holding one subdirectory per kind, relative to the root
    pub kinds_dir: PathBuf,
    /// Subdirectory that holds templates rather than a kind
    pub template_dir: String,
    /// Fail instead of warning when a kind directory holds several files
    pub strict_single_file: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            kinds_dir: PathBuf::from("kinds"),
            template_dir: "tmpl".to_string(),
            strict_single_file: false,
        }
    }
}

/// Load every kind under `root`'s kinds directory.
///
/// Unit file paths are relative to `root` (`./kinds/team/team.json`).
/// Units come back in directory-listing order; callers sort them with
/// [`crate::schema::sort_units`]. Any error aborts the whole load.
pub fn load_units(root: &Path, options: &LoadOptions, compiler: &dyn SchemaCompiler) -> Result<Vec<SchemaUnit>> {
    let kinds_root = root.join(&options.kinds_dir);
    let entries = fs::read_dir(&kinds_root).map_err(|e| CodegenError::io(&kinds_root, e))?;

    let mut units = Vec::new();
    let mut by_name: HashMap<String, PathBuf> = HashMap::new();
    let mut by_output: HashMap<String, PathBuf> = HashMap::new();

    for entry in entries {
        let entry = entry.map_err(|e| CodegenError::io(&kinds_root, e))?;
        let file_type = entry.file_type().map_err(|e| CodegenError::io(entry.path(), e))?;
        if !file_type.is_dir() {
            continue;
        }
        if entry.file_name() == options.template_dir.as_str() {
            continue;
        }

        let kind_dir = entry.path();
        let file = select_file(&kind_dir, options)?;
        let unit = load_unit(root, &file, compiler)?;
        debug!(kind = %unit.name, file = %unit.file_path, "loaded kind");

        if let Some(first) = by_name.insert(unit.name.clone(), file.clone()) {
            return Err(CodegenError::DuplicateName {
                name: unit.name,
                first,
                second: file,
            });
        }
        if let Some(first) = by_output.insert(unit.output_name.clone(), file.clone()) {
            return Err(CodegenError::DuplicateName {
                name: unit.output_name,
                first,
                second: file,
            });
        }

        units.push(unit);
    }

    info!(kinds = units.len(), dir = %kinds_root.display(), "loaded kinds");
    Ok(units)
}

/// Pick the schema file of a kind directory: the lexically first regular file
fn select_file(kind_dir: &Path, options: &LoadOptions) -> Result<PathBuf> {
    let mut files = Vec::new();
    for entry in fs::read_dir(kind_dir).map_err(|e| CodegenError::io(kind_dir, e))? {
        let entry = entry.map_err(|e| CodegenError::io(kind_dir, e))?;
        let file_type = entry.file_type().map_err(|e| CodegenError::io(entry.path(), e))?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut files = files.into_iter();
    let Some(first) = files.next() else {
        return Err(CodegenError::Load {
            path: kind_dir.to_path_buf(),
            reason: "kind directory contains no schema file".to_string(),
        });
    };

    let ignored: Vec<String> = files.map(|p| p.display().to_string()).collect();
    if !ignored.is_empty() {
        if options.strict_single_file {
            return Err(CodegenError::Load {
                path: kind_dir.to_path_buf(),
                reason: format!("expected exactly one schema file, found {}", ignored.len() + 1),
            });
        }
        warn!(
            dir = %kind_dir.display(),
            using = %first.display(),
            ignored = ?ignored,
            "kind directory holds several files; using the first"
        );
    }

    Ok(first)
}

fn load_unit(root: &Path, file: &Path, compiler: &dyn SchemaCompiler) -> Result<SchemaUnit> {
    let source = fs::read_to_string(file).map_err(|e| CodegenError::io(file, e))?;
    let compiled = compiler.compile(&source, file)?;

    let name = match compiled.lookup_str("name") {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => {
            return Err(CodegenError::MissingName {
                path: file.to_path_buf(),
            })
        }
    };
    let is_group = compiled.lookup_bool("group").unwrap_or(false);

    let relative = file.strip_prefix(root).unwrap_or(file);
    let file_path = format!("./{}", relative.to_string_lossy().replace('\\', "/"));

    let value: Arc<dyn SchemaValue> = Arc::new(compiled);
    Ok(SchemaUnit::new(&name, file_path, is_group, value))
}
