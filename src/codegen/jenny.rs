//! Jennies: named, pure transformations from schema input to generated files

use thiserror::Error;

use crate::schema::SchemaUnit;
use crate::vfs::GeneratedFile;

/// Failure reported by a jenny or postprocessor.
///
/// The jenny list attaches the jenny name and unit before surfacing it as a
/// [`CodegenError::Generation`](crate::CodegenError::Generation).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct JennyError(pub String);

impl JennyError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Anything that can be registered in a jenny list has a stable name.
pub trait Jenny: Send + Sync {
    fn jenny_name(&self) -> &str;
}

/// A jenny invoked once per schema unit
pub trait UnitJenny: Jenny {
    fn generate(&self, unit: &SchemaUnit) -> Result<Vec<GeneratedFile>, JennyError>;
}

/// A jenny invoked once with the whole, sorted unit set
pub trait SetJenny: Jenny {
    fn generate(&self, units: &[SchemaUnit]) -> Result<Vec<GeneratedFile>, JennyError>;
}

/// A registered generator, tagged by invocation shape
pub enum Generator {
    PerUnit(Box<dyn UnitJenny>),
    WholeSet(Box<dyn SetJenny>),
}

impl Generator {
    pub fn per_unit(jenny: impl UnitJenny + 'static) -> Self {
        Self::PerUnit(Box::new(jenny))
    }

    pub fn whole_set(jenny: impl SetJenny + 'static) -> Self {
        Self::WholeSet(Box::new(jenny))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::PerUnit(j) => j.jenny_name(),
            Self::WholeSet(j) => j.jenny_name(),
        }
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PerUnit(j) => write!(f, "PerUnit({})", j.jenny_name()),
            Self::WholeSet(j) => write!(f, "WholeSet({})", j.jenny_name()),
        }
    }
}
