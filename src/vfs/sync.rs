//! Terminal operations: materialize a tree on disk, or check disk against it

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use similar::TextDiff;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{GeneratedFile, VirtualTree};
use crate::error::{CodegenError, Result};

/// Options for [`VirtualTree::verify_with`]
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// When set, files carrying this marker within their first lines that are
    /// not part of the tree are reported as extra.
    pub stale_marker: Option<String>,
    /// Output roots searched recursively for stale files, relative to the
    /// verify root. An empty entry stands for the root itself and is not
    /// recursed into. When empty, only the directories the tree writes to are
    /// searched, without recursion.
    pub stale_roots: Vec<String>,
}

/// Outcome of [`VirtualTree::write`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Files whose content changed or that did not exist before
    pub written: usize,
    /// Files that already held the expected content (rewritten anyway)
    pub unchanged: usize,
}

/// A single differing file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    /// Unified diff from disk to expected content, when both sides are UTF-8
    pub diff: Option<String>,
}

/// Structured result of [`VirtualTree::verify`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Expected files absent on disk
    pub missing: Vec<String>,
    /// Generated files on disk that the tree no longer produces
    pub extra: Vec<String>,
    /// Files present on disk with different content
    pub differing: Vec<FileDiff>,
}

impl SyncReport {
    pub fn is_in_sync(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.differing.is_empty()
    }

    /// Every out-of-sync path, sorted
    pub fn paths(&self) -> Vec<&str> {
        let mut all: Vec<&str> = self
            .missing
            .iter()
            .chain(self.extra.iter())
            .map(String::as_str)
            .chain(self.differing.iter().map(|d| d.path.as_str()))
            .collect();
        all.sort_unstable();
        all
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for path in &self.missing {
            writeln!(f, "  missing:  {}", path)?;
        }
        for path in &self.extra {
            writeln!(f, "  extra:    {}", path)?;
        }
        for diff in &self.differing {
            writeln!(f, "  modified: {}", diff.path)?;
            if let Some(text) = &diff.diff {
                for line in text.lines() {
                    writeln!(f, "    {}", line)?;
                }
            }
        }
        Ok(())
    }
}

impl VirtualTree {
    /// Write every file under `root`, creating parent directories and
    /// overwriting existing content.
    ///
    /// Not transactional: an error part way through leaves earlier files written.
    pub fn write(&self, root: &Path) -> Result<WriteStats> {
        let mut stats = WriteStats::default();
        for file in self.iter() {
            let target = root.join(&file.path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| CodegenError::io(parent, e))?;
            }

            let checksum = file.checksum();
            match fs::read(&target) {
                Ok(existing) if checksum.verify(&existing) => stats.unchanged += 1,
                _ => stats.written += 1,
            }

            fs::write(&target, &file.content).map_err(|e| CodegenError::io(&target, e))?;
            debug!(path = %file.path, origin = %file.origin, checksum = %checksum.short(), "wrote");
        }
        info!(written = stats.written, unchanged = stats.unchanged, "generated files written");
        Ok(stats)
    }

    /// Compare every file against `root` without touching disk
    pub fn verify(&self, root: &Path) -> Result<SyncReport> {
        self.verify_with(root, &VerifyOptions::default())
    }

    /// Like [`verify`](Self::verify), optionally also reporting stale generated files
    pub fn verify_with(&self, root: &Path, options: &VerifyOptions) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        for file in self.iter() {
            let target = root.join(&file.path);
            match fs::read(&target) {
                Ok(actual) if actual == file.content => {}
                Ok(actual) => report.differing.push(FileDiff {
                    path: file.path.clone(),
                    diff: unified_diff(file, &actual),
                }),
                Err(e) if e.kind() == ErrorKind::NotFound => report.missing.push(file.path.clone()),
                Err(e) => return Err(CodegenError::io(&target, e)),
            }
        }

        if let Some(marker) = &options.stale_marker {
            report.extra = self.stale_files(root, marker, &options.stale_roots)?;
        }

        debug!(
            missing = report.missing.len(),
            extra = report.extra.len(),
            differing = report.differing.len(),
            "verify finished"
        );
        Ok(report)
    }

    /// Files under the output roots that carry `marker` but are not in the tree
    fn stale_files(&self, root: &Path, marker: &str, roots: &[String]) -> Result<Vec<String>> {
        // (directory, max walk depth)
        let scans: Vec<(String, usize)> = if roots.is_empty() {
            self.paths()
                .map(|p| p.rsplit_once('/').map(|(dir, _)| dir).unwrap_or(""))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|dir| (dir.to_string(), 1))
                .collect()
        } else {
            roots
                .iter()
                .map(|r| {
                    let dir = r.replace('\\', "/").trim_matches('/').to_string();
                    // the root itself is only searched at the top level
                    let depth = if dir.is_empty() { 1 } else { usize::MAX };
                    (dir, depth)
                })
                .collect()
        };

        let mut stale = BTreeSet::new();
        for (dir, depth) in scans {
            let abs = root.join(&dir);
            if !abs.is_dir() {
                continue;
            }

            for entry in WalkDir::new(&abs).max_depth(depth).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| abs.clone());
                    CodegenError::io(path, e.into())
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Some(rel) = relative_path(root, entry.path()) else {
                    continue;
                };
                if self.get(&rel).is_some() || stale.contains(&rel) {
                    continue;
                }
                let content = fs::read(entry.path()).map_err(|e| CodegenError::io(entry.path(), e))?;
                if carries_marker(&content, marker) {
                    stale.insert(rel);
                }
            }
        }
        Ok(stale.into_iter().collect())
    }
}

/// `path` relative to `root`, `/`-separated, if it is valid UTF-8
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    rel.to_str().map(|s| s.replace('\\', "/"))
}

/// Whether the marker appears within the first few lines of `content`
fn carries_marker(content: &[u8], marker: &str) -> bool {
    let head = String::from_utf8_lossy(&content[..content.len().min(1024)]);
    head.lines().take(3).any(|line| line.contains(marker))
}

fn unified_diff(expected: &GeneratedFile, actual: &[u8]) -> Option<String> {
    let expected_text = expected.text()?;
    let actual_text = std::str::from_utf8(actual).ok()?;
    let on_disk = format!("{} (on disk)", expected.path);
    let generated = format!("{} (generated)", expected.path);
    Some(
        TextDiff::from_lines(actual_text, expected_text)
            .unified_diff()
            .context_radius(2)
            .header(&on_disk, &generated)
            .to_string(),
    )
}
