//! Field definitions read out of a schema's `spec` object
//!
//! Type expressions:
//! - `string`, `int`, `float`, `bool`, `any`
//! - `[]T` for lists, `map[string]T` for string-keyed maps
//! - an identifier naming another type (e.g. a common schema type)
//! - a trailing `?` marks the field optional

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use serde_json::{Map, Value};

use super::jenny::JennyError;
use crate::schema::{SchemaUnit, SchemaValue};

static IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// A scalar or composite field type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Any,
    List(Box<FieldType>),
    Map(Box<FieldType>),
    Named(String),
}

/// One field of a spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
    pub optional: bool,
}

impl FieldType {
    /// Parse a type expression (without the optional marker)
    pub fn parse(expr: &str) -> Result<Self, JennyError> {
        let expr = expr.trim();
        if let Some(inner) = expr.strip_prefix("[]") {
            return Ok(Self::List(Box::new(Self::parse(inner)?)));
        }
        if let Some(inner) = expr.strip_prefix("map[string]") {
            return Ok(Self::Map(Box::new(Self::parse(inner)?)));
        }
        match expr {
            "string" => Ok(Self::String),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "bool" => Ok(Self::Bool),
            "any" => Ok(Self::Any),
            name if IDENT.is_match(name) => Ok(Self::Named(name.to_string())),
            other => Err(JennyError::new(format!("unsupported type expression '{}'", other))),
        }
    }
}

/// Read the field map at `path`. A missing path means no fields.
pub fn read_fields(value: &dyn SchemaValue, path: &str) -> Result<Vec<FieldDef>, JennyError> {
    match value.lookup(path) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(map)) => fields_from_map(map, path),
        Some(other) => Err(JennyError::new(format!(
            "'{}' must be an object of field types, found {}",
            path, other
        ))),
    }
}

/// Parse an object of `field -> type expression` entries, in key order
pub fn fields_from_map(map: &Map<String, Value>, path: &str) -> Result<Vec<FieldDef>, JennyError> {
    map.iter()
        .map(|(name, expr)| {
            if !IDENT.is_match(name) {
                return Err(JennyError::new(format!("invalid field name '{}.{}'", path, name)));
            }
            let expr = expr.as_str().ok_or_else(|| {
                JennyError::new(format!("type of '{}.{}' must be a string", path, name))
            })?;
            let (expr, optional) = match expr.trim().strip_suffix('?') {
                Some(inner) => (inner, true),
                None => (expr, false),
            };
            Ok(FieldDef {
                name: name.clone(),
                ty: FieldType::parse(expr)?,
                optional,
            })
        })
        .collect()
}

/// Whether `name` can be used as an identifier in every target language
pub fn is_identifier(name: &str) -> bool {
    IDENT.is_match(name)
}

/// Major version of a kind, or `None` when it declares no `version`.
///
/// A leading `v` is accepted; anything else must be semver.
pub fn major_version(unit: &SchemaUnit) -> Result<Option<u64>, JennyError> {
    let Some(raw) = unit.value.lookup_str("version") else {
        return Ok(None);
    };
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    let version = Version::parse(raw)
        .map_err(|e| JennyError::new(format!("invalid version '{}': {}", raw, e)))?;
    Ok(Some(version.major))
}

/// Convert to PascalCase (`library_panel`, `library-panel` → `LibraryPanel`)
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;

    for c in s.chars() {
        if c == '_' || c == '-' || c == ' ' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}
