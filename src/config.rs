//! Configuration management for the kinds generator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (kindgen.toml)
//! - Environment variables (KINDGEN__*)
//!
//! ## Example config file (kindgen.toml):
//! ```toml
//! root = "."
//!
//! [inputs]
//! kinds_dir = "kinds"
//! template_dir = "tmpl"
//! common_dir = "packages/schema/src/common"
//!
//! [outputs]
//! rust_kinds_dir = "pkg/kinds"
//! ts_index_file = "packages/schema/src/index.gen.ts"
//!
//! [header]
//! regen_hint = "make gen-kinds"
//! ```

use std::path::{Path, PathBuf};

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::codegen::CommonOptions;
use crate::error::Result;
use crate::loader::LoadOptions;

/// Main configuration for the generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenConfig {
    /// Repository root every input and output path is relative to
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Input locations
    #[serde(default)]
    pub inputs: InputConfig,

    /// Output locations
    #[serde(default)]
    pub outputs: OutputConfig,

    /// Generated-file header settings
    #[serde(default)]
    pub header: HeaderConfig,

    /// Verify mode settings
    #[serde(default)]
    pub verify: VerifyConfig,
}

/// Where kinds and the common schema are read from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory with one subdirectory per kind
    #[serde(default = "default_kinds_dir")]
    pub kinds_dir: PathBuf,

    /// Subdirectory of `kinds_dir` that is not a kind
    #[serde(default = "default_template_dir")]
    pub template_dir: String,

    /// Directory with the shared schema files
    #[serde(default = "default_common_dir")]
    pub common_dir: PathBuf,

    /// Extension of common schema files
    #[serde(default = "default_common_extension")]
    pub common_extension: String,

    /// Fail when a kind directory holds more than one file
    #[serde(default)]
    pub strict_single_file: bool,
}

/// Where generated files go, relative to the root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_rust_kinds_dir")]
    pub rust_kinds_dir: String,

    /// API group of the generated resource types (`<group>/v<major>`)
    #[serde(default = "default_resource_group")]
    pub resource_group: String,

    #[serde(default = "default_registry_file")]
    pub registry_file: String,

    #[serde(default = "default_ts_raw_dir")]
    pub ts_raw_dir: String,

    #[serde(default = "default_ts_index_file")]
    pub ts_index_file: String,

    /// Import prefix of `ts_raw_dir` as seen from the index file
    #[serde(default = "default_ts_raw_import")]
    pub ts_raw_import: String,

    #[serde(default = "default_common_file")]
    pub common_file: String,

    /// Namespace declared by the common schema
    #[serde(default = "default_common_package_from")]
    pub common_package_from: String,

    /// Namespace the generated common file declares
    #[serde(default = "default_common_package_to")]
    pub common_package_to: String,
}

/// Header stamped on every generated file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderConfig {
    /// Generator program named in the header
    #[serde(default = "default_source_label")]
    pub source_label: String,

    /// Command readers should run to regenerate
    #[serde(default = "default_regen_hint")]
    pub regen_hint: String,
}

/// Verify mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Report generated files on disk that are no longer produced
    #[serde(default = "default_true")]
    pub detect_stale: bool,
}

// Default value functions
fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

fn default_kinds_dir() -> PathBuf {
    PathBuf::from("kinds")
}

fn default_template_dir() -> String {
    "tmpl".to_string()
}

fn default_common_dir() -> PathBuf {
    PathBuf::from("packages/schema/src/common")
}

fn default_common_extension() -> String {
    "json".to_string()
}

fn default_rust_kinds_dir() -> String {
    "pkg/kinds".to_string()
}

fn default_resource_group() -> String {
    "core.kinds.io".to_string()
}

fn default_registry_file() -> String {
    "pkg/registry/corekind/registry_gen.rs".to_string()
}

fn default_ts_raw_dir() -> String {
    "packages/schema/src/raw".to_string()
}

fn default_ts_index_file() -> String {
    "packages/schema/src/index.gen.ts".to_string()
}

fn default_ts_raw_import() -> String {
    "./raw".to_string()
}

fn default_common_file() -> String {
    "packages/schema/src/common/common.gen.ts".to_string()
}

fn default_common_package_from() -> String {
    "kindsys".to_string()
}

fn default_common_package_to() -> String {
    "common".to_string()
}

fn default_source_label() -> String {
    "src/bin/kinds_gen.rs".to_string()
}

fn default_regen_hint() -> String {
    "make gen-kinds".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            kinds_dir: default_kinds_dir(),
            template_dir: default_template_dir(),
            common_dir: default_common_dir(),
            common_extension: default_common_extension(),
            strict_single_file: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            rust_kinds_dir: default_rust_kinds_dir(),
            resource_group: default_resource_group(),
            registry_file: default_registry_file(),
            ts_raw_dir: default_ts_raw_dir(),
            ts_index_file: default_ts_index_file(),
            ts_raw_import: default_ts_raw_import(),
            common_file: default_common_file(),
            common_package_from: default_common_package_from(),
            common_package_to: default_common_package_to(),
        }
    }
}

impl OutputConfig {
    /// Directories every generated file lives under.
    ///
    /// Output directories plus the parents of the fixed-path files, without
    /// duplicates. Verify searches them for stale generated files.
    pub fn roots(&self) -> Vec<String> {
        let mut roots: Vec<String> = Vec::new();
        let dirs = [self.rust_kinds_dir.as_str(), self.ts_raw_dir.as_str()];
        let parents = [&self.registry_file, &self.ts_index_file, &self.common_file]
            .into_iter()
            .map(|file| parent_dir(file));
        for dir in dirs.into_iter().chain(parents) {
            let dir = dir.trim_end_matches('/');
            if !roots.iter().any(|r| r == dir) {
                roots.push(dir.to_string());
            }
        }
        roots
    }
}

/// Directory part of a `/`-separated path, empty for a bare file name
fn parent_dir(file: &str) -> &str {
    file.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            source_label: default_source_label(),
            regen_hint: default_regen_hint(),
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self { detect_stale: true }
    }
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            inputs: InputConfig::default(),
            outputs: OutputConfig::default(),
            header: HeaderConfig::default(),
            verify: VerifyConfig::default(),
        }
    }
}

impl GenConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, with an optional explicit file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = ["kindgen.toml", ".kindgen.toml", "config/kindgen.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // KINDGEN__INPUTS__KINDS_DIR=... style overrides
        builder = builder.add_source(
            Environment::with_prefix("KINDGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            kinds_dir: self.inputs.kinds_dir.clone(),
            template_dir: self.inputs.template_dir.clone(),
            strict_single_file: self.inputs.strict_single_file,
        }
    }

    pub fn common_options(&self) -> CommonOptions {
        CommonOptions {
            common_dir: self.inputs.common_dir.clone(),
            extension: self.inputs.common_extension.clone(),
            output_file: self.outputs.common_file.clone(),
            package_from: self.outputs.common_package_from.clone(),
            package_to: self.outputs.common_package_to.clone(),
        }
    }
}

// =============================================================================
// Pipeline Config
// =============================================================================

/// Whether a run writes to disk or only checks it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Write,
    Verify,
}

/// Per-run settings handed to the pipeline, instead of ambient process state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub root_dir: PathBuf,
    pub mode: Mode,
}

impl PipelineConfig {
    pub fn new(root_dir: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            root_dir: root_dir.into(),
            mode,
        }
    }
}
