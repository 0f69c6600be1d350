//! Jenny List
//!
//! The pipeline runner. Holds generators in registration order, a namer used
//! for error attribution and the postprocessor chain applied to the result.

use tracing::{debug, info};

use super::jenny::{Generator, JennyError};
use super::postprocess::{Postprocessor, PostprocessorChain};
use crate::error::{CodegenError, Result};
use crate::schema::SchemaUnit;
use crate::vfs::{GeneratedFile, VirtualTree};

type Namer = Box<dyn Fn(&SchemaUnit) -> String + Send + Sync>;

/// Ordered generators plus the postprocessors applied to everything they produce
pub struct JennyList {
    generators: Vec<Generator>,
    postprocessors: PostprocessorChain,
    namer: Namer,
}

impl Default for JennyList {
    fn default() -> Self {
        Self::new()
    }
}

impl JennyList {
    /// A list that names units by their `name`
    pub fn new() -> Self {
        Self::with_namer(|unit| unit.name.clone())
    }

    /// A list with a custom namer for diagnostics
    pub fn with_namer<F>(namer: F) -> Self
    where
        F: Fn(&SchemaUnit) -> String + Send + Sync + 'static,
    {
        Self {
            generators: Vec::new(),
            postprocessors: PostprocessorChain::new(),
            namer: Box::new(namer),
        }
    }

    /// Register generators; they run in the order appended
    pub fn append(&mut self, generators: impl IntoIterator<Item = Generator>) -> &mut Self {
        self.generators.extend(generators);
        self
    }

    pub fn add_postprocessor(&mut self, postprocessor: impl Postprocessor + 'static) -> &mut Self {
        self.postprocessors.push(postprocessor);
        self
    }

    /// Registered generator names, in order
    pub fn names(&self) -> Vec<&str> {
        self.generators.iter().map(Generator::name).collect()
    }

    /// The postprocessor chain, for reuse by side channels
    pub fn postprocessors(&self) -> &PostprocessorChain {
        &self.postprocessors
    }

    /// Run every generator over `units` and postprocess the result.
    ///
    /// `units` should already be sorted by name. Any error aborts the run.
    pub fn generate(&self, units: &[SchemaUnit]) -> Result<VirtualTree> {
        let mut tree = VirtualTree::new();

        for generator in &self.generators {
            let before = tree.len();
            match generator {
                Generator::PerUnit(jenny) => {
                    for unit in units {
                        let files = jenny
                            .generate(unit)
                            .map_err(|e| self.generation_error(generator, Some(unit), e))?;
                        for file in files {
                            check_namespace(&file, unit).map_err(|e| self.generation_error(generator, Some(unit), e))?;
                            tree.add(file.with_origin(jenny.jenny_name()))?;
                        }
                    }
                }
                Generator::WholeSet(jenny) => {
                    let files = jenny
                        .generate(units)
                        .map_err(|e| self.generation_error(generator, None, e))?;
                    for file in files {
                        tree.add(file.with_origin(jenny.jenny_name()))?;
                    }
                }
            }
            debug!(jenny = generator.name(), files = tree.len() - before, "jenny finished");
        }

        let tree = self.postprocessors.apply(tree)?;
        info!(
            jennies = self.generators.len(),
            units = units.len(),
            files = tree.len(),
            "generation finished"
        );
        Ok(tree)
    }

    fn generation_error(&self, generator: &Generator, unit: Option<&SchemaUnit>, err: JennyError) -> CodegenError {
        CodegenError::Generation {
            jenny: generator.name().to_string(),
            unit: unit.map(|u| (self.namer)(u)),
            reason: err.0,
        }
    }
}

/// Per-unit output must live under the unit's `output_name`, either as a path
/// segment or as the file name stem, so that two units cannot collide.
///
/// The stem is the whole file name or the part before a `_` or `.` separator:
/// `team` owns `team.txt` and `team_gen.rs` but not `teammate.txt`.
fn check_namespace(file: &GeneratedFile, unit: &SchemaUnit) -> std::result::Result<(), JennyError> {
    let unified = file.path.replace('\\', "/");
    let mut segments = unified.split('/').filter(|s| !s.is_empty());
    let in_namespace = segments.clone().any(|s| s == unit.output_name)
        || segments
            .next_back()
            .map(|name| owns_file_name(&name.to_lowercase(), &unit.output_name))
            .unwrap_or(false);

    if in_namespace {
        Ok(())
    } else {
        Err(JennyError::new(format!(
            "output path '{}' is outside the '{}' namespace",
            file.path, unit.output_name
        )))
    }
}

fn owns_file_name(file_name: &str, output_name: &str) -> bool {
    match file_name.strip_prefix(output_name) {
        Some(rest) => rest.is_empty() || rest.starts_with(['_', '.']),
        None => false,
    }
}
