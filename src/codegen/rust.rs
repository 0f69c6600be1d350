//! Rust Code Emitter
//!
//! Backend type system output: one spec module per kind.
//!
//! Key constraints:
//! - Reads the schema only through `SchemaValue` lookups
//! - Group kinds are composites rendered by the frontend only; they produce no
//!   Rust spec

use super::fields::{read_fields, to_pascal_case, FieldDef, FieldType};
use super::jenny::{Jenny, JennyError, UnitJenny};
use crate::schema::SchemaUnit;
use crate::vfs::GeneratedFile;

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "yield",
];

// =============================================================================
// Rust Spec Jenny
// =============================================================================

/// Emits `<kinds_dir>/<output_name>/<output_name>_spec_gen.rs` for each non-group kind
#[derive(Debug, Clone)]
pub struct RustSpecJenny {
    kinds_dir: String,
}

impl RustSpecJenny {
    pub fn new(kinds_dir: impl Into<String>) -> Self {
        Self {
            kinds_dir: kinds_dir.into(),
        }
    }
}

impl Jenny for RustSpecJenny {
    fn jenny_name(&self) -> &str {
        "RustSpecJenny"
    }
}

impl UnitJenny for RustSpecJenny {
    fn generate(&self, unit: &SchemaUnit) -> Result<Vec<GeneratedFile>, JennyError> {
        if unit.is_group {
            return Ok(Vec::new());
        }

        let fields = read_fields(unit.value.as_ref(), "spec")?;
        let mut output = String::new();

        output.push_str(&format!(
            "//! Spec types for the `{}` kind.\n\n",
            unit.name.escape_debug()
        ));

        if fields.iter().any(|f| uses_map(&f.ty)) {
            output.push_str("use std::collections::BTreeMap;\n\n");
        }
        output.push_str("use serde::{Deserialize, Serialize};\n\n");

        output.push_str(&format!("pub const KIND_NAME: &str = {:?};\n", unit.name));
        if let Some(version) = unit.value.lookup_str("version") {
            output.push_str(&format!("pub const KIND_VERSION: &str = {:?};\n", version));
        }
        output.push('\n');

        emit_struct(&mut output, "Spec", unit.value.lookup_str("description"), &fields);

        Ok(vec![GeneratedFile::new(
            format!(
                "{}/{}/{}_spec_gen.rs",
                self.kinds_dir, unit.output_name, unit.output_name
            ),
            output,
        )])
    }
}

// =============================================================================
// Struct Emission
// =============================================================================

fn emit_struct(output: &mut String, name: &str, description: Option<&str>, fields: &[FieldDef]) {
    match description {
        Some(text) => {
            for line in text.lines() {
                if line.trim().is_empty() {
                    output.push_str("///\n");
                } else {
                    output.push_str(&format!("/// {}\n", line));
                }
            }
        }
        None => output.push_str(&format!("/// {}\n", name)),
    }
    output.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
    output.push_str(&format!("pub struct {} {{\n", name));

    for field in fields {
        emit_field(output, field);
    }

    output.push_str("}\n");
}

fn emit_field(output: &mut String, field: &FieldDef) {
    let rust_name = to_snake_case(&field.name);
    if rust_name != field.name {
        output.push_str(&format!("    #[serde(rename = {:?})]\n", field.name));
    }

    let ty = rust_type(&field.ty);
    let full_type = if field.optional {
        output.push_str("    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n");
        format!("Option<{}>", ty)
    } else {
        ty
    };

    output.push_str(&format!("    pub {}: {},\n", escape_keyword(&rust_name), full_type));
}

/// Render a field type as Rust
pub fn rust_type(ty: &FieldType) -> String {
    match ty {
        FieldType::String => "String".to_string(),
        FieldType::Int => "i64".to_string(),
        FieldType::Float => "f64".to_string(),
        FieldType::Bool => "bool".to_string(),
        FieldType::Any => "serde_json::Value".to_string(),
        FieldType::List(inner) => format!("Vec<{}>", rust_type(inner)),
        FieldType::Map(inner) => format!("BTreeMap<String, {}>", rust_type(inner)),
        FieldType::Named(name) => to_pascal_case(name),
    }
}

fn uses_map(ty: &FieldType) -> bool {
    match ty {
        FieldType::Map(_) => true,
        FieldType::List(inner) => uses_map(inner),
        _ => false,
    }
}

// =============================================================================
// Helper Utilities
// =============================================================================

fn escape_keyword(name: &str) -> String {
    if RUST_KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}

/// Convert to snake_case
fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;

    for c in s.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c == '-' || c == ' ' {
            result.push('_');
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CompiledSchema, SchemaValue};
    use serde_json::json;
    use std::sync::Arc;

    fn unit(value: serde_json::Value, is_group: bool) -> SchemaUnit {
        let name = value["name"].as_str().unwrap().to_string();
        let value: Arc<dyn SchemaValue> = Arc::new(CompiledSchema::new(value));
        SchemaUnit::new(&name, "./kinds/test", is_group, value)
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("refreshInterval"), "refresh_interval");
        assert_eq!(to_snake_case("uid"), "uid");
        assert_eq!(to_snake_case("API"), "api");
    }

    #[test]
    fn test_emits_spec_struct() {
        let jenny = RustSpecJenny::new("pkg/kinds");
        let files = jenny
            .generate(&unit(
                json!({
                    "name": "playlist",
                    "version": "0.1.0",
                    "description": "A playlist of dashboards.",
                    "spec": {
                        "refreshInterval": "string?",
                        "items": "[]PlaylistItem",
                        "type": "string",
                        "labels": "map[string]string"
                    }
                }),
                false,
            ))
            .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "pkg/kinds/playlist/playlist_spec_gen.rs");
        let code = files[0].text().unwrap();
        assert!(code.contains("use std::collections::BTreeMap;"));
        assert!(code.contains("pub const KIND_NAME: &str = \"playlist\";"));
        assert!(code.contains("pub const KIND_VERSION: &str = \"0.1.0\";"));
        assert!(code.contains("/// A playlist of dashboards.\n"));
        assert!(code.contains("    pub items: Vec<PlaylistItem>,\n"));
        assert!(code.contains("    pub labels: BTreeMap<String, String>,\n"));
        assert!(code.contains(
            "    #[serde(rename = \"refreshInterval\")]\n    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n    pub refresh_interval: Option<String>,\n"
        ));
        assert!(code.contains("    pub r#type: String,\n"));
    }

    #[test]
    fn test_string_literals_are_escaped() {
        let jenny = RustSpecJenny::new("pkg/kinds");
        let files = jenny
            .generate(&unit(
                json!({
                    "name": "quote",
                    "version": "1.0.0\"; pub fn injected() {} //",
                    "description": "Ends a comment */ and\nspans lines.",
                    "spec": { "x": "string" }
                }),
                false,
            ))
            .unwrap();
        let code = files[0].text().unwrap();
        assert!(code.contains("pub const KIND_VERSION: &str = \"1.0.0\\\"; pub fn injected() {} //\";\n"));
        assert!(!code.contains("\npub fn injected"));
        assert!(code.contains("/// Ends a comment */ and\n/// spans lines.\n"));
    }

    #[test]
    fn test_group_kinds_produce_nothing() {
        let jenny = RustSpecJenny::new("pkg/kinds");
        let files = jenny.generate(&unit(json!({ "name": "bundle" }), true)).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_invalid_spec_is_an_error() {
        let jenny = RustSpecJenny::new("pkg/kinds");
        let result = jenny.generate(&unit(json!({ "name": "bad", "spec": { "x": "map[int]string" } }), false));
        assert!(result.is_err());
    }
}
