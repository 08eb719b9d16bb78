pub mod config;
pub mod duplication;
pub mod error;
pub mod ir;
pub mod parse;
pub mod transform;

use std::path::PathBuf;

use config::{FunctionTarget, ModelTarget};
use ir::{Endpoint, ModelEntity};

/// A generated file with its full output path and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

/// Trait for code generators that render the model and endpoint IR.
pub trait CodeGenerator {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Render the given models. The caller has already dropped the ones the
    /// duplication policy skips.
    fn generate_models(
        &self,
        models: &[&ModelEntity],
        target: &ModelTarget,
    ) -> Result<Vec<GeneratedFile>, Self::Error>;

    /// Render the service interface, the functions class and any result
    /// wrappers for the given endpoints.
    fn generate_functions(
        &self,
        endpoints: &[Endpoint],
        target: &FunctionTarget,
    ) -> Result<Vec<GeneratedFile>, Self::Error>;
}
