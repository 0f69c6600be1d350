//! Schema values, compilers and loaded schema units
//!
//! Generators never touch a concrete compiler type. They see a [`SchemaUnit`]
//! whose compiled value is only reachable through the [`SchemaValue`] path
//! lookup capability.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{CodegenError, Result};

// =============================================================================
// Schema Value
// =============================================================================

/// Path-queryable view over a compiled schema.
///
/// Paths are dot separated (`spec.title`); a numeric segment indexes into a
/// list (`versions.0`). The empty path returns the root value.
pub trait SchemaValue: fmt::Debug + Send + Sync {
    /// Look up the value at `path`, if present
    fn lookup(&self, path: &str) -> Option<&Value>;

    /// Look up a string at `path`
    fn lookup_str(&self, path: &str) -> Option<&str> {
        self.lookup(path).and_then(Value::as_str)
    }

    /// Look up a bool at `path`
    fn lookup_bool(&self, path: &str) -> Option<bool> {
        self.lookup(path).and_then(Value::as_bool)
    }
}

/// A compiled schema backed by a JSON value tree
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchema {
    root: Value,
}

impl CompiledSchema {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Unify two compiled values into one.
    ///
    /// Objects merge key by key; any other pair of values must be equal.
    /// `origin` names the second operand in conflict errors.
    pub fn unify(self, other: CompiledSchema, origin: &Path) -> Result<CompiledSchema> {
        let mut root = self.root;
        unify_into(&mut root, other.root, "", origin)?;
        Ok(CompiledSchema { root })
    }
}

impl SchemaValue for CompiledSchema {
    fn lookup(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

fn unify_into(target: &mut Value, incoming: Value, path: &str, origin: &Path) -> Result<()> {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                match existing.get_mut(&key) {
                    Some(slot) => unify_into(slot, value, &child_path, origin)?,
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
            Ok(())
        }
        (existing, incoming) => {
            if *existing == incoming {
                Ok(())
            } else {
                Err(CodegenError::Compile {
                    path: origin.to_path_buf(),
                    reason: format!(
                        "conflicting values at '{}': {} vs {}",
                        if path.is_empty() { "<root>" } else { path },
                        existing,
                        incoming
                    ),
                })
            }
        }
    }
}

// =============================================================================
// Compiler
// =============================================================================

/// Source formats understood by [`FormatCompiler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Toml,
}

impl SourceFormat {
    /// Pick a format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("toml") => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Turns raw schema text into a compiled, path-queryable value.
pub trait SchemaCompiler {
    /// Compile one source. `origin` is used for format detection and errors.
    fn compile(&self, source: &str, origin: &Path) -> Result<CompiledSchema>;

    /// Compile several sources as one combined value
    fn compile_all(&self, sources: &[(PathBuf, String)]) -> Result<CompiledSchema> {
        let mut combined = CompiledSchema::new(Value::Object(Map::new()));
        for (path, source) in sources {
            let value = self.compile(source, path)?;
            combined = combined.unify(value, path)?;
        }
        Ok(combined)
    }
}

/// Compiler for JSON and TOML schema sources, chosen by file extension
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatCompiler;

impl SchemaCompiler for FormatCompiler {
    fn compile(&self, source: &str, origin: &Path) -> Result<CompiledSchema> {
        let format = SourceFormat::from_path(origin).ok_or_else(|| CodegenError::Compile {
            path: origin.to_path_buf(),
            reason: "unsupported schema file extension (expected .json or .toml)".to_string(),
        })?;

        let root = match format {
            SourceFormat::Json => serde_json::from_str::<Value>(source).map_err(|e| e.to_string()),
            SourceFormat::Toml => toml::from_str::<Value>(source).map_err(|e| e.to_string()),
        }
        .map_err(|reason| CodegenError::Compile {
            path: origin.to_path_buf(),
            reason,
        })?;

        if !root.is_object() {
            return Err(CodegenError::Compile {
                path: origin.to_path_buf(),
                reason: "schema root must be an object".to_string(),
            });
        }

        Ok(CompiledSchema::new(root))
    }
}

// =============================================================================
// Schema Unit
// =============================================================================

/// One loaded kind, ready for generation
#[derive(Debug, Clone)]
pub struct SchemaUnit {
    /// Declared name with `-` replaced by `_`
    pub name: String,
    /// Lower-cased `name`, used for output directories
    pub output_name: String,
    /// Source location, for diagnostics
    pub file_path: String,
    /// Whether this unit is a composite of several kinds
    pub is_group: bool,
    /// The compiled schema
    pub value: Arc<dyn SchemaValue>,
}

impl SchemaUnit {
    /// Build a unit from a raw declared name
    pub fn new(
        raw_name: &str,
        file_path: impl Into<String>,
        is_group: bool,
        value: Arc<dyn SchemaValue>,
    ) -> Self {
        let name = normalize_name(raw_name);
        let output_name = name.to_lowercase();
        Self {
            name,
            output_name,
            file_path: file_path.into(),
            is_group,
            value,
        }
    }
}

/// Replace every `-` with `_`
pub fn normalize_name(raw: &str) -> String {
    raw.replace('-', "_")
}

/// Sort units by name, ascending. Generation order depends on it.
pub fn sort_units(units: &mut [SchemaUnit]) {
    units.sort_by(|a, b| a.name.cmp(&b.name));
}
