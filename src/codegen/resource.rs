//! Resource Emitter
//!
//! Wraps each kind's spec in a Kubernetes-style resource envelope:
//! `apiVersion`, `kind`, `metadata` and the kind's `Spec`.
//!
//! Key constraints:
//! - The emitted module sits next to `<name>_spec_gen.rs` and imports `Spec` from it
//! - Group kinds have no spec module, so they get no resource either

use super::fields::{major_version, to_pascal_case};
use super::jenny::{Jenny, JennyError, UnitJenny};
use crate::schema::SchemaUnit;
use crate::vfs::GeneratedFile;

/// API version of kinds with no version or a 0.x version
const UNSTABLE_API_VERSION: &str = "v0alpha1";

// =============================================================================
// Resource Jenny
// =============================================================================

/// Emits `<kinds_dir>/<output_name>/<output_name>_gen.rs` for each non-group kind
#[derive(Debug, Clone)]
pub struct K8sResourceJenny {
    kinds_dir: String,
    group: String,
}

impl K8sResourceJenny {
    /// `group` is the API group, as in `<group>/v1`
    pub fn new(kinds_dir: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            kinds_dir: kinds_dir.into(),
            group: group.into(),
        }
    }

    fn api_version(&self, unit: &SchemaUnit) -> Result<String, JennyError> {
        let version = match major_version(unit)? {
            None | Some(0) => UNSTABLE_API_VERSION.to_string(),
            Some(major) => format!("v{}", major),
        };
        if self.group.is_empty() {
            Ok(version)
        } else {
            Ok(format!("{}/{}", self.group, version))
        }
    }
}

impl Jenny for K8sResourceJenny {
    fn jenny_name(&self) -> &str {
        "K8sResourceJenny"
    }
}

impl UnitJenny for K8sResourceJenny {
    fn generate(&self, unit: &SchemaUnit) -> Result<Vec<GeneratedFile>, JennyError> {
        if unit.is_group {
            return Ok(Vec::new());
        }

        let kind = to_pascal_case(&unit.name);
        let mut output = String::new();

        output.push_str(&format!(
            "//! Resource types for the `{}` kind.\n\n",
            unit.name.escape_debug()
        ));
        output.push_str("use std::collections::BTreeMap;\n\n");
        output.push_str("use serde::{Deserialize, Serialize};\n\n");
        output.push_str(&format!("use super::{}_spec_gen::Spec;\n\n", unit.output_name));

        output.push_str(&format!("pub const API_VERSION: &str = {:?};\n", self.api_version(unit)?));
        output.push_str(&format!("pub const KIND: &str = {:?};\n\n", kind));

        emit_object_meta(&mut output);
        output.push('\n');
        emit_resource(&mut output, &kind);

        Ok(vec![GeneratedFile::new(
            format!("{}/{}/{}_gen.rs", self.kinds_dir, unit.output_name, unit.output_name),
            output,
        )])
    }
}

// =============================================================================
// Envelope Emission
// =============================================================================

fn emit_object_meta(output: &mut String) {
    output.push_str("/// Identity and bookkeeping of a resource\n");
    output.push_str("#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]\n");
    output.push_str("pub struct ObjectMeta {\n");
    output.push_str("    pub name: String,\n");
    output.push_str("    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n");
    output.push_str("    pub namespace: Option<String>,\n");
    output.push_str("    #[serde(default, skip_serializing_if = \"BTreeMap::is_empty\")]\n");
    output.push_str("    pub labels: BTreeMap<String, String>,\n");
    output.push_str("    #[serde(default, skip_serializing_if = \"BTreeMap::is_empty\")]\n");
    output.push_str("    pub annotations: BTreeMap<String, String>,\n");
    output.push_str("}\n");
}

fn emit_resource(output: &mut String, kind: &str) {
    output.push_str(&format!("/// A `{}` resource\n", kind.escape_debug()));
    output.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
    output.push_str("pub struct Resource {\n");
    output.push_str("    #[serde(rename = \"apiVersion\")]\n");
    output.push_str("    pub api_version: String,\n");
    output.push_str("    pub kind: String,\n");
    output.push_str("    pub metadata: ObjectMeta,\n");
    output.push_str("    pub spec: Spec,\n");
    output.push_str("}\n\n");

    output.push_str("impl Resource {\n");
    output.push_str("    pub fn new(metadata: ObjectMeta, spec: Spec) -> Self {\n");
    output.push_str("        Self {\n");
    output.push_str("            api_version: API_VERSION.to_string(),\n");
    output.push_str("            kind: KIND.to_string(),\n");
    output.push_str("            metadata,\n");
    output.push_str("            spec,\n");
    output.push_str("        }\n");
    output.push_str("    }\n");
    output.push_str("}\n");
}
