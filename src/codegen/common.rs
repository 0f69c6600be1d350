//! Common-schema side channel
//!
//! The shared vocabulary is compiled as one combined unit, emitted by a single
//! jenny, renamed into its target namespace and then postprocessed like every
//! other output.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::jenny::{Jenny, UnitJenny};
use super::postprocess::{apply_step, PackageMapper, PostprocessorChain};
use super::typescript::CommonTsJenny;
use crate::error::{CodegenError, Result};
use crate::schema::{SchemaCompiler, SchemaUnit, SchemaValue};
use crate::vfs::VirtualTree;

/// Name of the synthetic unit the common schema is compiled into
pub const COMMON_UNIT_NAME: &str = "common";

/// Inputs and outputs of the common channel
#[derive(Debug, Clone)]
pub struct CommonOptions {
    /// Directory holding the shared schema files, relative to the root
    pub common_dir: PathBuf,
    /// Only files with this extension are compiled
    pub extension: String,
    /// Output path of the generated file
    pub output_file: String,
    /// Namespace the schema declares
    pub package_from: String,
    /// Namespace the generated file should declare
    pub package_to: String,
}

/// Run the common channel. Zero input files yields an empty tree.
pub fn generate_common(
    root: &Path,
    options: &CommonOptions,
    compiler: &dyn SchemaCompiler,
    chain: &PostprocessorChain,
) -> Result<VirtualTree> {
    let dir = root.join(&options.common_dir);
    let sources = collect_sources(&dir, &options.extension)?;
    if sources.is_empty() {
        warn!(dir = %dir.display(), extension = %options.extension, "no common schema files found");
        return Ok(VirtualTree::new());
    }
    debug!(files = sources.len(), "compiling common schema");

    let combined = compiler.compile_all(&sources)?;
    let value: Arc<dyn SchemaValue> = Arc::new(combined);
    let unit = SchemaUnit::new(
        COMMON_UNIT_NAME,
        format!("./{}", options.common_dir.to_string_lossy().replace('\\', "/")),
        false,
        value,
    );

    let jenny = CommonTsJenny::new(options.output_file.clone());
    let files = jenny.generate(&unit).map_err(|e| CodegenError::Generation {
        jenny: jenny.jenny_name().to_string(),
        unit: Some(unit.name.clone()),
        reason: e.0,
    })?;

    let mut tree = VirtualTree::new();
    for file in files {
        tree.add(file.with_origin(jenny.jenny_name()))?;
    }

    let mapper = PackageMapper::new(&options.package_from, &options.package_to)?;
    let tree = apply_step(&mapper, tree)?;
    let tree = chain.apply(tree)?;

    info!(files = tree.len(), "common schema generated");
    Ok(tree)
}

fn collect_sources(dir: &Path, extension: &str) -> Result<Vec<(PathBuf, String)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            CodegenError::Load {
                path,
                reason: e.to_string(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().map(|e| e != extension).unwrap_or(true) {
            continue;
        }
        let content = fs::read_to_string(entry.path()).map_err(|e| CodegenError::io(entry.path(), e))?;
        sources.push((entry.into_path(), content));
    }
    Ok(sources)
}
