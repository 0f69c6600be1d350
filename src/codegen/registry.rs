//! Core kind registry emitter
//!
//! A whole-set jenny: one Rust file enumerating every loaded kind.

use std::collections::HashMap;

use super::fields::{is_identifier, to_pascal_case};
use super::jenny::{Jenny, JennyError, SetJenny};
use crate::schema::SchemaUnit;
use crate::vfs::GeneratedFile;

/// Emits the `CoreKind` enum and `ALL_KINDS` table
#[derive(Debug, Clone)]
pub struct CoreRegistryJenny {
    registry_file: String,
}

impl CoreRegistryJenny {
    pub fn new(registry_file: impl Into<String>) -> Self {
        Self {
            registry_file: registry_file.into(),
        }
    }
}

impl Jenny for CoreRegistryJenny {
    fn jenny_name(&self) -> &str {
        "CoreRegistryJenny"
    }
}

impl SetJenny for CoreRegistryJenny {
    fn generate(&self, units: &[SchemaUnit]) -> Result<Vec<GeneratedFile>, JennyError> {
        let variants: Vec<(String, &SchemaUnit)> = units
            .iter()
            .map(|u| (to_pascal_case(&u.name), u))
            .collect();

        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (variant, unit) in &variants {
            if !is_identifier(variant) {
                return Err(JennyError::new(format!(
                    "kind '{}' does not map to a valid variant name",
                    unit.name.escape_debug()
                )));
            }
            if let Some(previous) = seen.insert(variant.as_str(), unit.name.as_str()) {
                return Err(JennyError::new(format!(
                    "kinds '{}' and '{}' map to the same variant {}",
                    previous, unit.name, variant
                )));
            }
        }

        let mut output = String::new();
        output.push_str("//! Registry of every core kind.\n\n");

        output.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]\n");
        output.push_str("pub enum CoreKind {\n");
        for (variant, _) in &variants {
            output.push_str(&format!("    {},\n", variant));
        }
        output.push_str("}\n\n");

        output.push_str("impl CoreKind {\n");
        emit_match(&mut output, "name", "&'static str", &variants, |u| format!("{:?}", u.name));
        output.push('\n');
        emit_match(&mut output, "machine_name", "&'static str", &variants, |u| {
            format!("{:?}", u.output_name)
        });
        output.push('\n');
        emit_match(&mut output, "is_group", "bool", &variants, |u| u.is_group.to_string());
        output.push('\n');
        emit_match(&mut output, "version", "Option<&'static str>", &variants, |u| {
            match u.value.lookup_str("version") {
                Some(v) => format!("Some({:?})", v),
                None => "None".to_string(),
            }
        });
        output.push_str("}\n\n");

        output.push_str("pub const ALL_KINDS: &[CoreKind] = &[\n");
        for (variant, _) in &variants {
            output.push_str(&format!("    CoreKind::{},\n", variant));
        }
        output.push_str("];\n");

        Ok(vec![GeneratedFile::new(self.registry_file.clone(), output)])
    }
}

fn emit_match<F>(output: &mut String, method: &str, ret: &str, variants: &[(String, &SchemaUnit)], value: F)
where
    F: Fn(&SchemaUnit) -> String,
{
    output.push_str(&format!("    pub const fn {}(self) -> {} {{\n", method, ret));
    output.push_str("        match self {\n");
    for (variant, unit) in variants {
        output.push_str(&format!("            Self::{} => {},\n", variant, value(unit)));
    }
    output.push_str("        }\n");
    output.push_str("    }\n");
}
