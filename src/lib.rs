//! Kinds Code Generator
//!
//! A schema-driven, multi-target code generation pipeline for core kinds.
//! Kind schemas are loaded once, run through an ordered list of generators
//! ("jennies") and collected into a single virtual file tree that is either
//! written to disk or verified against it.
//!
//! ## Features
//!
//! - **Backend types**: one Rust spec module and one resource module per kind,
//!   plus a kind registry
//! - **Frontend types**: one TypeScript file per kind, in a version directory
//! - **Index**: a TypeScript barrel re-exporting every kind
//! - **Common schema**: shared vocabulary generated through a side channel
//! - **Verify mode**: a non-mutating check that disk matches generation
//!
//! ## Layout
//!
//! ```text
//! kinds/
//! ├── playlist/
//! │   └── playlist.json
//! ├── team/
//! │   └── team.toml
//! └── tmpl/            (skipped)
//! packages/schema/src/common/
//! └── *.json           (common schema)
//! ```

pub mod checksum;
pub mod codegen;
pub mod config;
pub mod error;
pub mod loader;
pub mod schema;
pub mod vfs;

pub use checksum::Checksum;
pub use codegen::{core_kinds_pipeline, generate, run, JennyList, RunOutcome};
pub use config::{GenConfig, Mode, PipelineConfig};
pub use error::{CodegenError, Result};
pub use loader::{load_units, LoadOptions};
pub use schema::{CompiledSchema, FormatCompiler, SchemaCompiler, SchemaUnit, SchemaValue};
pub use vfs::{GeneratedFile, SyncReport, VirtualTree};
