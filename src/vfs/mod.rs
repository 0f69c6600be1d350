//! Virtual File Tree
//!
//! An in-memory, path-keyed collection of generated files. Every jenny output
//! lands here first; the tree is then merged, postprocessed and finally either
//! written to disk or verified against it.
//!
//! Invariants:
//! - Paths are relative, `/`-separated and never contain `..`.
//! - No two entries share a path unless their content is byte-identical.

mod sync;

pub use sync::{FileDiff, SyncReport, VerifyOptions, WriteStats};

use std::collections::btree_map::{self, BTreeMap};

use tracing::debug;

use crate::checksum::Checksum;
use crate::error::{CodegenError, Result};

// =============================================================================
// Generated File
// =============================================================================

/// A single generated output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Output path, relative to the pipeline root
    pub path: String,
    /// Raw content
    pub content: Vec<u8>,
    /// Name of the jenny that produced this file
    pub origin: String,
}

impl GeneratedFile {
    /// Create a file with no origin yet; the jenny list stamps it.
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            origin: String::new(),
        }
    }

    /// Set the producing jenny
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Content as UTF-8, if it is valid UTF-8
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    pub fn checksum(&self) -> Checksum {
        Checksum::from_bytes(&self.content)
    }
}

/// Normalize a relative output path.
///
/// Backslashes become `/`, empty and `.` segments are dropped. Absolute paths
/// and `..` segments are rejected.
pub fn normalize_path(raw: &str) -> Result<String> {
    let unified = raw.replace('\\', "/");
    let invalid = |reason: &str| CodegenError::InvalidPath {
        path: raw.to_string(),
        reason: reason.to_string(),
    };

    if unified.starts_with('/') || has_drive_prefix(&unified) {
        return Err(invalid("output paths must be relative"));
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(invalid("output paths may not contain '..'")),
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(invalid("empty output path"));
    }
    Ok(segments.join("/"))
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

// =============================================================================
// Virtual Tree
// =============================================================================

/// Ordered-by-path mapping of generated files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualTree {
    files: BTreeMap<String, GeneratedFile>,
}

impl VirtualTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Get a file by (normalized) path
    pub fn get(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.get(path)
    }

    /// Iterate files in path order
    pub fn iter(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files.values()
    }

    /// All paths, in order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Add a file.
    ///
    /// A file at an already-occupied path is accepted only when its content is
    /// byte-identical to the existing entry; the first origin is kept.
    pub fn add(&mut self, mut file: GeneratedFile) -> Result<()> {
        file.path = normalize_path(&file.path)?;
        match self.files.entry(file.path.clone()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(file);
                Ok(())
            }
            btree_map::Entry::Occupied(slot) => {
                let existing = slot.get();
                if existing.content == file.content {
                    debug!(
                        path = %file.path,
                        existing = %existing.origin,
                        incoming = %file.origin,
                        "identical output produced twice"
                    );
                    Ok(())
                } else {
                    Err(CodegenError::Collision {
                        path: file.path,
                        existing: existing.origin.clone(),
                        incoming: file.origin,
                    })
                }
            }
        }
    }

    /// Union another tree into this one, with the same collision rules as [`add`](Self::add)
    pub fn merge(&mut self, other: VirtualTree) -> Result<()> {
        for file in other.files.into_values() {
            self.add(file)?;
        }
        Ok(())
    }

    /// Apply a transform to every file, producing a new tree.
    ///
    /// The transform may rename files; the result is rebuilt with collision checks.
    pub fn map<F>(self, mut f: F) -> Result<VirtualTree>
    where
        F: FnMut(GeneratedFile) -> Result<GeneratedFile>,
    {
        let mut mapped = VirtualTree::new();
        for file in self.files.into_values() {
            mapped.add(f(file)?)?;
        }
        Ok(mapped)
    }

    /// Fingerprint of every path and its content, in path order
    pub fn fingerprint(&self) -> Checksum {
        Checksum::from_entries(
            self.files
                .iter()
                .map(|(path, file)| (path.as_str(), file.content.as_slice())),
        )
    }
}

impl IntoIterator for VirtualTree {
    type Item = GeneratedFile;
    type IntoIter = btree_map::IntoValues<String, GeneratedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_values()
    }
}
