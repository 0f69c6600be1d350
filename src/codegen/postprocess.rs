//! Postprocessors
//!
//! Uniform per-file transforms applied after generation, regardless of which
//! jenny produced the file.

use regex::Regex;

use super::jenny::JennyError;
use crate::error::{CodegenError, Result};
use crate::vfs::{GeneratedFile, VirtualTree};

/// First line of every generated-file header; also used to detect stale output.
pub const GENERATED_MARKER: &str = "Code generated - EDITING IS FUTILE. DO NOT EDIT.";

/// A total transform over a single generated file
pub trait Postprocessor: Send + Sync {
    fn name(&self) -> &str;

    fn process(&self, file: GeneratedFile) -> std::result::Result<GeneratedFile, JennyError>;
}

/// Postprocessors applied in registration order
#[derive(Default)]
pub struct PostprocessorChain {
    steps: Vec<Box<dyn Postprocessor>>,
}

impl PostprocessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: impl Postprocessor + 'static) {
        self.steps.push(Box::new(step));
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step over every file of `tree`
    pub fn apply(&self, tree: VirtualTree) -> Result<VirtualTree> {
        self.steps.iter().try_fold(tree, |tree, step| apply_step(step.as_ref(), tree))
    }
}

/// Run one postprocessor over `tree`, attributing failures to it
pub fn apply_step(step: &dyn Postprocessor, tree: VirtualTree) -> Result<VirtualTree> {
    tree.map(|file| {
        let path = file.path.clone();
        step.process(file).map_err(|e| CodegenError::Generation {
            jenny: step.name().to_string(),
            unit: Some(path),
            reason: e.0,
        })
    })
}

// =============================================================================
// Header Mapper
// =============================================================================

/// Comment syntax for a file, by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentStyle {
    Slash,
    Hash,
}

impl CommentStyle {
    fn for_path(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.').map(|(_, ext)| ext)?;
        match ext {
            "rs" | "ts" | "tsx" | "js" | "go" => Some(Self::Slash),
            "toml" | "yaml" | "yml" | "py" => Some(Self::Hash),
            _ => None,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Slash => "//",
            Self::Hash => "#",
        }
    }
}

/// Prepends the "generated, do not edit" header to every file that has a
/// known comment syntax. Files without one (JSON, for instance) pass through.
#[derive(Debug, Clone)]
pub struct HeaderMapper {
    source_label: String,
    regen_command: String,
}

impl HeaderMapper {
    /// `source_label` names the generator program; `regen_command` is what
    /// the header tells readers to run.
    pub fn new(source_label: impl Into<String>, regen_command: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
            regen_command: regen_command.into(),
        }
    }

    fn header(&self, style: CommentStyle, origin: &str) -> String {
        let c = style.prefix();
        let mut out = String::new();
        out.push_str(&format!("{} {}\n", c, GENERATED_MARKER));
        out.push_str(&format!("{}\n", c));
        out.push_str(&format!("{} Generated by:\n", c));
        out.push_str(&format!("{}     {}\n", c, self.source_label));
        out.push_str(&format!("{} Using jennies:\n", c));
        out.push_str(&format!("{}     {}\n", c, origin));
        out.push_str(&format!("{}\n", c));
        out.push_str(&format!(
            "{} Run '{}' from repository root to regenerate.\n\n",
            c, self.regen_command
        ));
        out
    }
}

impl Postprocessor for HeaderMapper {
    fn name(&self) -> &str {
        "HeaderMapper"
    }

    fn process(&self, mut file: GeneratedFile) -> std::result::Result<GeneratedFile, JennyError> {
        let Some(style) = CommentStyle::for_path(&file.path) else {
            return Ok(file);
        };
        let marker_line = format!("{} {}", style.prefix(), GENERATED_MARKER);
        if file.content.starts_with(marker_line.as_bytes()) {
            return Ok(file);
        }

        let header = self.header(style, &file.origin);
        file.content.splice(0..0, header.into_bytes());
        Ok(file)
    }
}

// =============================================================================
// Package Mapper
// =============================================================================

/// Rewrites the leading `export namespace <from>` declaration to `<to>`.
///
/// Purely textual. Only a declaration at the very start of the file matches,
/// so the mapper must run before any header is prepended.
#[derive(Debug, Clone)]
pub struct PackageMapper {
    pattern: Regex,
    replacement: String,
}

impl PackageMapper {
    pub fn new(from: &str, to: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(r"\Aexport namespace {}\b", regex::escape(from)))?;
        Ok(Self {
            pattern,
            replacement: format!("export namespace {}", to),
        })
    }
}

impl Postprocessor for PackageMapper {
    fn name(&self) -> &str {
        "PackageMapper"
    }

    fn process(&self, mut file: GeneratedFile) -> std::result::Result<GeneratedFile, JennyError> {
        let text = String::from_utf8(file.content)
            .map_err(|_| JennyError::new(format!("{} is not valid UTF-8", file.path)))?;
        file.content = self
            .pattern
            .replace(&text, regex::NoExpand(&self.replacement))
            .into_owned()
            .into_bytes();
        Ok(file)
    }
}
