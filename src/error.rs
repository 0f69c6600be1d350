//! Error types for the kinds code generator

use std::path::PathBuf;

use thiserror::Error;

use crate::vfs::SyncReport;

/// Result type for codegen operations
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Code generation errors
///
/// Every variant is fatal to the run. Nothing retries; regeneration is cheap
/// and idempotent, so the operator re-runs the pipeline.
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Load error in {}: {reason}", .path.display())]
    Load { path: PathBuf, reason: String },

    #[error("Schema {} doesn't have the `name` field set", .path.display())]
    MissingName { path: PathBuf },

    #[error("Duplicate kind name '{name}': declared by {} and {}", .first.display(), .second.display())]
    DuplicateName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Compile error in {}: {reason}", .path.display())]
    Compile { path: PathBuf, reason: String },

    #[error("Jenny {jenny} failed{}: {reason}", for_unit(.unit))]
    Generation {
        jenny: String,
        unit: Option<String>,
        reason: String,
    },

    #[error("Output collision at {path}: produced by both {existing} and {incoming} with different content")]
    Collision {
        path: String,
        existing: String,
        incoming: String,
    },

    #[error("Invalid output path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("generated code is out of sync with inputs:\n{report}\nrun `{hint}` to regenerate")]
    OutOfSync { report: SyncReport, hint: String },

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

fn for_unit(unit: &Option<String>) -> String {
    unit.as_ref()
        .map(|u| format!(" for '{}'", u))
        .unwrap_or_default()
}

impl CodegenError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error belongs to the load phase (nothing was generated)
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::Load { .. } | Self::MissingName { .. } | Self::DuplicateName { .. } | Self::Compile { .. }
        )
    }
}
