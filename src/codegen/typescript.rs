//! TypeScript Code Emitters
//!
//! Frontend type system output:
//! - `TsTypesJenny`: one interface file per kind, under a version directory
//! - `TsIndexJenny`: barrel file re-exporting every kind
//! - `CommonTsJenny`: the common schema, wrapped in a namespace declaration

use serde_json::Value;

use super::fields::{
    fields_from_map, is_identifier, major_version, read_fields, to_pascal_case, FieldDef, FieldType,
};
use super::jenny::{Jenny, JennyError, SetJenny, UnitJenny};
use crate::schema::SchemaUnit;
use crate::vfs::GeneratedFile;

/// Namespace used by the common schema when it doesn't declare a `package`
pub const DEFAULT_COMMON_PACKAGE: &str = "kindsys";

// =============================================================================
// Version Directory
// =============================================================================

/// `x` for unversioned or 0.x kinds, `v<major>` otherwise
pub fn version_dir(unit: &SchemaUnit) -> Result<String, JennyError> {
    match major_version(unit)? {
        None | Some(0) => Ok("x".to_string()),
        Some(major) => Ok(format!("v{}", major)),
    }
}

/// Module path of a kind's types file, relative to `raw_dir`, without extension
fn types_module(unit: &SchemaUnit) -> Result<String, JennyError> {
    Ok(format!(
        "{}/{}/{}_types.gen",
        unit.output_name,
        version_dir(unit)?,
        to_pascal_case(&unit.name)
    ))
}

// =============================================================================
// Per-kind Types
// =============================================================================

/// Emits `<raw_dir>/<output_name>/<x|vN>/<Name>_types.gen.ts`
#[derive(Debug, Clone)]
pub struct TsTypesJenny {
    raw_dir: String,
}

impl TsTypesJenny {
    pub fn new(raw_dir: impl Into<String>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
        }
    }
}

impl Jenny for TsTypesJenny {
    fn jenny_name(&self) -> &str {
        "TsTypesJenny"
    }
}

impl UnitJenny for TsTypesJenny {
    fn generate(&self, unit: &SchemaUnit) -> Result<Vec<GeneratedFile>, JennyError> {
        let fields = read_fields(unit.value.as_ref(), "spec")?;
        let type_name = to_pascal_case(&unit.name);

        let mut output = String::new();
        output.push_str(&format!("export const kindName = {};\n", ts_string(&unit.name)));
        if let Some(version) = unit.value.lookup_str("version") {
            output.push_str(&format!("export const kindVersion = {};\n", ts_string(version)));
        }
        output.push('\n');

        if let Some(description) = unit.value.lookup_str("description") {
            emit_doc(&mut output, description, "");
        }
        emit_interface(&mut output, &type_name, &fields, "");

        Ok(vec![GeneratedFile::new(
            format!("{}/{}.ts", self.raw_dir, types_module(unit)?),
            output,
        )])
    }
}

// =============================================================================
// Index
// =============================================================================

/// Emits a single barrel file re-exporting every kind's types
#[derive(Debug, Clone)]
pub struct TsIndexJenny {
    index_file: String,
    raw_import: String,
}

impl TsIndexJenny {
    /// `raw_import` is the import prefix of the raw directory as seen from the index
    pub fn new(index_file: impl Into<String>, raw_import: impl Into<String>) -> Self {
        Self {
            index_file: index_file.into(),
            raw_import: raw_import.into(),
        }
    }
}

impl Jenny for TsIndexJenny {
    fn jenny_name(&self) -> &str {
        "TsIndexJenny"
    }
}

impl SetJenny for TsIndexJenny {
    fn generate(&self, units: &[SchemaUnit]) -> Result<Vec<GeneratedFile>, JennyError> {
        let mut output = String::new();
        for unit in units {
            if !is_identifier(&unit.name) {
                return Err(JennyError::new(format!(
                    "kind '{}' cannot be exported under its name",
                    unit.name.escape_debug()
                )));
            }
            let module = format!("{}/{}", self.raw_import.trim_end_matches('/'), types_module(unit)?);
            output.push_str(&format!("export * as {} from {};\n", unit.name, ts_string(&module)));
        }
        Ok(vec![GeneratedFile::new(self.index_file.clone(), output)])
    }
}

// =============================================================================
// Common Schema
// =============================================================================

/// Emits every type of the combined common schema into one file.
///
/// The common schema declares `package` (namespace, defaults to `kindsys`) and
/// `types`, an object of type name → field map.
#[derive(Debug, Clone)]
pub struct CommonTsJenny {
    output_file: String,
}

impl CommonTsJenny {
    pub fn new(output_file: impl Into<String>) -> Self {
        Self {
            output_file: output_file.into(),
        }
    }
}

impl Jenny for CommonTsJenny {
    fn jenny_name(&self) -> &str {
        "CommonSchemaJenny"
    }
}

impl UnitJenny for CommonTsJenny {
    fn generate(&self, unit: &SchemaUnit) -> Result<Vec<GeneratedFile>, JennyError> {
        let package = unit
            .value
            .lookup_str("package")
            .unwrap_or(DEFAULT_COMMON_PACKAGE);
        if !package.split('.').all(is_identifier) {
            return Err(JennyError::new(format!(
                "invalid common package '{}'",
                package.escape_debug()
            )));
        }

        let mut output = format!("export namespace {} {{\n", package);
        match unit.value.lookup("types") {
            None | Some(Value::Null) => {}
            Some(Value::Object(types)) => {
                let mut first = true;
                for (name, spec) in types {
                    let map = spec.as_object().ok_or_else(|| {
                        JennyError::new(format!("common type '{}' must be an object", name))
                    })?;
                    let type_name = to_pascal_case(name);
                    if !is_identifier(&type_name) {
                        return Err(JennyError::new(format!(
                            "invalid common type name '{}'",
                            name.escape_debug()
                        )));
                    }
                    let fields = fields_from_map(map, &format!("types.{}", name))?;
                    if !first {
                        output.push('\n');
                    }
                    first = false;
                    emit_interface(&mut output, &type_name, &fields, "  ");
                }
            }
            Some(_) => return Err(JennyError::new("'types' must be an object")),
        }
        output.push_str("}\n");

        Ok(vec![GeneratedFile::new(self.output_file.clone(), output)])
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Single-quoted TypeScript string literal
fn ts_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn emit_doc(output: &mut String, text: &str, indent: &str) {
    // a literal `*/` would close the block early
    let text = text.replace("*/", "*\\/");
    output.push_str(&format!("{}/**\n", indent));
    for line in text.lines() {
        if line.trim().is_empty() {
            output.push_str(&format!("{} *\n", indent));
        } else {
            output.push_str(&format!("{} * {}\n", indent, line));
        }
    }
    output.push_str(&format!("{} */\n", indent));
}

fn emit_interface(output: &mut String, name: &str, fields: &[FieldDef], indent: &str) {
    output.push_str(&format!("{}export interface {} {{\n", indent, name));
    for field in fields {
        output.push_str(&format!(
            "{}  {}{}: {};\n",
            indent,
            field.name,
            if field.optional { "?" } else { "" },
            ts_type(&field.ty)
        ));
    }
    output.push_str(&format!("{}}}\n", indent));
}

/// Render a field type as TypeScript
pub fn ts_type(ty: &FieldType) -> String {
    match ty {
        FieldType::String => "string".to_string(),
        FieldType::Int | FieldType::Float => "number".to_string(),
        FieldType::Bool => "boolean".to_string(),
        FieldType::Any => "unknown".to_string(),
        FieldType::List(inner) => format!("Array<{}>", ts_type(inner)),
        FieldType::Map(inner) => format!("Record<string, {}>", ts_type(inner)),
        FieldType::Named(name) => to_pascal_case(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CompiledSchema, SchemaValue};
    use serde_json::json;
    use std::sync::Arc;

    fn unit(value: serde_json::Value) -> SchemaUnit {
        let name = value["name"].as_str().unwrap().to_string();
        let value: Arc<dyn SchemaValue> = Arc::new(CompiledSchema::new(value));
        SchemaUnit::new(&name, "./kinds/test", false, value)
    }

    #[test]
    fn test_version_dir() {
        assert_eq!(version_dir(&unit(json!({ "name": "a" }))).unwrap(), "x");
        assert_eq!(version_dir(&unit(json!({ "name": "a", "version": "0.4.1" }))).unwrap(), "x");
        assert_eq!(version_dir(&unit(json!({ "name": "a", "version": "v2.0.0" }))).unwrap(), "v2");
        assert!(version_dir(&unit(json!({ "name": "a", "version": "two" }))).is_err());
    }

    #[test]
    fn test_types_file() {
        let jenny = TsTypesJenny::new("packages/schema/src/raw");
        let files = jenny
            .generate(&unit(json!({
                "name": "library_panel",
                "version": "1.0.0",
                "description": "Reusable panel.",
                "spec": { "uid": "string", "tags": "[]string?", "model": "map[string]any" }
            })))
            .unwrap();
        assert_eq!(
            files[0].path,
            "packages/schema/src/raw/library_panel/v1/LibraryPanel_types.gen.ts"
        );
        let code = files[0].text().unwrap();
        assert!(code.starts_with("export const kindName = 'library_panel';\nexport const kindVersion = '1.0.0';\n\n"));
        assert!(code.contains("/**\n * Reusable panel.\n */\nexport interface LibraryPanel {\n"));
        assert!(code.contains("  model: Record<string, unknown>;\n"));
        assert!(code.contains("  tags?: Array<string>;\n"));
        assert!(code.contains("  uid: string;\n"));
    }

    #[test]
    fn test_types_file_escapes_text() {
        let jenny = TsTypesJenny::new("raw");
        let files = jenny
            .generate(&unit(json!({
                "name": "it's",
                "description": "Closes early */ if unescaped.",
                "spec": {}
            })))
            .unwrap();
        let code = files[0].text().unwrap();
        assert!(code.starts_with("export const kindName = 'it\\'s';\n"));
        assert!(code.contains(" * Closes early *\\/ if unescaped.\n */\n"));
        assert_eq!(code.matches("*/").count(), 1);
    }

    #[test]
    fn test_ts_string() {
        assert_eq!(ts_string("plain"), "'plain'");
        assert_eq!(ts_string("it's"), "'it\\'s'");
        assert_eq!(ts_string("a\\b\nc"), "'a\\\\b\\nc'");
    }

    #[test]
    fn test_index_rejects_unusable_names() {
        let jenny = TsIndexJenny::new("index.gen.ts", "./raw");
        let err = jenny.generate(&[unit(json!({ "name": "two words" }))]).unwrap_err();
        assert!(err.to_string().contains("cannot be exported"));
    }

    #[test]
    fn test_index_file() {
        let jenny = TsIndexJenny::new("packages/schema/src/index.gen.ts", "./raw");
        let units = vec![
            unit(json!({ "name": "playlist" })),
            unit(json!({ "name": "team", "version": "2.1.0" })),
        ];
        let files = jenny.generate(&units).unwrap();
        assert_eq!(
            files[0].text().unwrap(),
            "export * as playlist from './raw/playlist/x/Playlist_types.gen';\n\
             export * as team from './raw/team/v2/Team_types.gen';\n"
        );

        let empty = jenny.generate(&[]).unwrap();
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].text(), Some(""));
    }

    #[test]
    fn test_common_file() {
        let jenny = CommonTsJenny::new("packages/schema/src/common/common.gen.ts");
        let files = jenny
            .generate(&unit(json!({
                "name": "common",
                "types": {
                    "DataSourceRef": { "type": "string?", "uid": "string?" },
                    "TimeRange": { "from": "string", "to": "string" }
                }
            })))
            .unwrap();
        assert_eq!(
            files[0].text().unwrap(),
            "export namespace kindsys {\n\
             \x20 export interface DataSourceRef {\n\
             \x20   type?: string;\n\
             \x20   uid?: string;\n\
             \x20 }\n\
             \n\
             \x20 export interface TimeRange {\n\
             \x20   from: string;\n\
             \x20   to: string;\n\
             \x20 }\n\
             }\n"
        );
    }

    #[test]
    fn test_common_file_rejects_bad_types() {
        let jenny = CommonTsJenny::new("common.gen.ts");
        assert!(jenny.generate(&unit(json!({ "name": "common", "types": ["x"] }))).is_err());
        assert!(jenny
            .generate(&unit(json!({ "name": "common", "types": { "X": "string" } })))
            .is_err());
        assert!(jenny
            .generate(&unit(json!({ "name": "common", "types": { "a.b": {} } })))
            .is_err());
        assert!(jenny
            .generate(&unit(json!({ "name": "common", "package": "x {} y" })))
            .is_err());
    }
}
