//! Code Generation
//!
//! Generates the core kinds' target code from their schemas.
//!
//! Architecture:
//! - Jennies: named generators, per kind or over the whole kind set
//! - JennyList: runs jennies in order into one virtual tree
//! - Postprocessors: per-file transforms applied to everything produced
//! - Common channel: the shared schema, generated separately and merged
//!
//! The key constraint: jennies NEVER see the tree or each other's output, only
//! the loaded schema units.

pub mod common;
pub mod fields;
pub mod jenny;
pub mod list;
pub mod postprocess;
pub mod registry;
pub mod resource;
pub mod rust;
pub mod typescript;

pub use common::{generate_common, CommonOptions};
pub use jenny::{Generator, Jenny, JennyError, SetJenny, UnitJenny};
pub use list::JennyList;
pub use postprocess::{HeaderMapper, PackageMapper, Postprocessor, PostprocessorChain, GENERATED_MARKER};
pub use registry::CoreRegistryJenny;
pub use resource::K8sResourceJenny;
pub use rust::RustSpecJenny;
pub use typescript::{CommonTsJenny, TsIndexJenny, TsTypesJenny};

use std::path::Path;

use tracing::info;

use crate::config::{GenConfig, Mode, PipelineConfig};
use crate::error::{CodegenError, Result};
use crate::loader::load_units;
use crate::schema::{sort_units, FormatCompiler, SchemaCompiler};
use crate::vfs::{SyncReport, VerifyOptions, VirtualTree, WriteStats};

// =============================================================================
// Pipeline
// =============================================================================

/// The core kinds pipeline: every target emitter plus the header postprocessor
pub fn core_kinds_pipeline(config: &GenConfig) -> JennyList {
    let outputs = &config.outputs;
    let mut list = JennyList::new();
    list.append([
        Generator::per_unit(RustSpecJenny::new(outputs.rust_kinds_dir.clone())),
        Generator::per_unit(K8sResourceJenny::new(
            outputs.rust_kinds_dir.clone(),
            outputs.resource_group.clone(),
        )),
        Generator::whole_set(CoreRegistryJenny::new(outputs.registry_file.clone())),
        Generator::per_unit(TsTypesJenny::new(outputs.ts_raw_dir.clone())),
        Generator::whole_set(TsIndexJenny::new(
            outputs.ts_index_file.clone(),
            outputs.ts_raw_import.clone(),
        )),
    ])
    .add_postprocessor(HeaderMapper::new(
        config.header.source_label.clone(),
        config.header.regen_hint.clone(),
    ));
    list
}

/// Load, generate and merge everything under `root`. Nothing touches disk
/// besides reading inputs.
pub fn generate(config: &GenConfig, root: &Path) -> Result<VirtualTree> {
    generate_with(config, root, &FormatCompiler)
}

/// [`generate`] with a caller-supplied schema compiler
pub fn generate_with(config: &GenConfig, root: &Path, compiler: &dyn SchemaCompiler) -> Result<VirtualTree> {
    let mut units = load_units(root, &config.load_options(), compiler)?;
    sort_units(&mut units);

    let pipeline = core_kinds_pipeline(config);
    let mut tree = pipeline.generate(&units)?;

    let common = generate_common(root, &config.common_options(), compiler, pipeline.postprocessors())?;
    tree.merge(common)?;

    let fingerprint = tree.fingerprint();
    info!(
        kinds = units.len(),
        files = tree.len(),
        fingerprint = %fingerprint.short(),
        "generated tree"
    );
    Ok(tree)
}

// =============================================================================
// Public API
// =============================================================================

/// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Write mode: files were materialized
    Written(WriteStats),
    /// Verify mode: disk matches, `files` were checked
    Verified { files: usize },
}

/// Generate, then write or verify according to `pipeline.mode`.
///
/// In verify mode an unclean report becomes [`CodegenError::OutOfSync`].
pub fn run(config: &GenConfig, pipeline: &PipelineConfig) -> Result<RunOutcome> {
    let root = pipeline.root_dir.as_path();
    let tree = generate(config, root)?;

    match pipeline.mode {
        Mode::Write => {
            let stats = tree.write(root)?;
            Ok(RunOutcome::Written(stats))
        }
        Mode::Verify => {
            let report = verify_tree(config, &tree, root)?;
            if report.is_in_sync() {
                Ok(RunOutcome::Verified { files: tree.len() })
            } else {
                Err(CodegenError::OutOfSync {
                    report,
                    hint: config.header.regen_hint.clone(),
                })
            }
        }
    }
}

fn verify_tree(config: &GenConfig, tree: &VirtualTree, root: &Path) -> Result<SyncReport> {
    let options = VerifyOptions {
        stale_marker: config
            .verify
            .detect_stale
            .then(|| GENERATED_MARKER.to_string()),
        stale_roots: config.outputs.roots(),
    };
    tree.verify_with(root, &options)
}
