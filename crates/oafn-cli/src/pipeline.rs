use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{error, info};
use serde::Serialize;

use oafn_core::config::{RunConfig, ServiceTarget};
use oafn_core::duplication::DuplicationRegistry;
use oafn_core::ir::{Endpoint, ModelEntity};
use oafn_core::parse;
use oafn_core::parse::ref_resolve::RefResolver;
use oafn_core::parse::spec::OpenApiSpec;
use oafn_core::transform::{
    KnownTypes, ModelOptions, Resolution, resolve_endpoints, resolve_models,
};
use oafn_core::{CodeGenerator, GeneratedFile};

/// What one service produced: the files that passed the duplication policy
/// and how many definitions had to be skipped.
#[derive(Debug, Default)]
pub struct ServiceReport {
    pub files: Vec<GeneratedFile>,
    pub failures: usize,
}

impl ServiceReport {
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

/// Parse a document and bundle the files it references.
pub fn load_document(path: &Path) -> Result<OpenApiSpec> {
    let spec = parse::load(path)?;
    RefResolver::for_spec_file(path)
        .resolve_spec(&spec)
        .with_context(|| format!("failed to resolve references in {}", path.display()))
}

/// Resolve and render one service. Definitions that fail are logged and
/// counted; the rest still render.
pub fn run_service<G: CodeGenerator>(
    target: &ServiceTarget,
    generator: &G,
    registry: &mut DuplicationRegistry,
) -> Result<ServiceReport> {
    let spec = load_document(&target.api_path)?;
    let mut report = ServiceReport::default();

    let mut known = None;
    if let Some(model) = &target.model {
        let resolution = resolve_models(&spec, &model.model_options())?;
        report.failures += log_failures(target.index, &resolution.models);

        let admitted: Vec<&ModelEntity> = resolution
            .models
            .items
            .iter()
            .filter(|m| registry.admit(m.name(), *m))
            .collect();
        report
            .files
            .extend(generator.generate_models(&admitted, model)?);
        known = Some(resolution.known_types);
    }

    if let Some(function) = &target.function {
        let known = known.unwrap_or_else(|| match &spec.components {
            Some(components) => {
                KnownTypes::scan(&components.schemas, function.naming.clone(), |_| true)
            }
            None => KnownTypes::default(),
        });
        let endpoints = resolve_endpoints(&spec, &known)?;
        report.failures += log_failures(target.index, &endpoints);
        report
            .files
            .extend(generator.generate_functions(&endpoints.items, function)?);
    }

    report
        .files
        .retain(|f| registry.admit(&f.path.to_string_lossy(), &f.content));
    Ok(report)
}

/// Totals for a whole `generate` run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub written: usize,
    pub failed: usize,
}

/// Run every configured service in order. A service that fails at any
/// stage, writing included, is logged and counted; later services still run.
pub fn generate_all<G: CodeGenerator>(
    config: &RunConfig,
    base_dir: &Path,
    generator: &G,
) -> Result<RunSummary> {
    let mut registry = DuplicationRegistry::new(config.duplication_mode()?);
    let targets = config.service_targets(base_dir);
    let mut summary = RunSummary {
        total: targets.len(),
        ..RunSummary::default()
    };

    for target in targets {
        let target = match target {
            Ok(target) => target,
            Err(err) => {
                error!("{err}");
                summary.failed += 1;
                continue;
            }
        };
        eprintln!("Generating service #{} from {}", target.index, target.api_path.display());
        let report = match run_service(&target, generator, &mut registry) {
            Ok(report) => report,
            Err(err) => {
                error!("service #{}: {err:#}", target.index);
                summary.failed += 1;
                continue;
            }
        };
        match write_files(&report.files) {
            Ok(written) => summary.written += written,
            Err(err) => {
                error!("service #{}: {err:#}", target.index);
                summary.failed += 1;
                continue;
            }
        }
        if !report.is_clean() {
            summary.failed += 1;
        }
    }
    Ok(summary)
}

fn log_failures<T>(index: usize, resolution: &Resolution<T>) -> usize {
    for failure in &resolution.failures {
        error!("service #{index}: {failure}");
    }
    resolution.failures.len()
}

/// Write generated files, creating their folders. Returns the number written.
pub fn write_files(files: &[GeneratedFile]) -> Result<usize> {
    for file in files {
        if let Some(parent) = file.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&file.path, &file.content)
            .with_context(|| format!("failed to write {}", file.path.display()))?;
        info!("wrote {}", file.path.display());
    }
    Ok(files.len())
}

/// A document resolved with default options, for `validate` and `inspect`.
pub struct ResolvedDocument {
    pub spec: OpenApiSpec,
    pub models: Resolution<ModelEntity>,
    pub endpoints: Resolution<Endpoint>,
}

/// Resolve whichever of `components` and `paths` the document has.
pub fn resolve_document(path: &Path) -> Result<ResolvedDocument> {
    let spec = load_document(path)?;

    let (models, known) = if spec.components.is_some() {
        let resolution = resolve_models(&spec, &ModelOptions::default())?;
        (resolution.models, resolution.known_types)
    } else {
        (Resolution::default(), KnownTypes::default())
    };
    let endpoints = if spec.paths.is_some() {
        resolve_endpoints(&spec, &known)?
    } else {
        Resolution::default()
    };

    Ok(ResolvedDocument {
        spec,
        models,
        endpoints,
    })
}

#[derive(Serialize)]
pub struct InspectSummary<'a> {
    pub title: &'a str,
    pub version: &'a str,
    pub models: &'a [ModelEntity],
    pub endpoints: &'a [Endpoint],
    pub failures: Vec<String>,
}

impl<'a> From<&'a ResolvedDocument> for InspectSummary<'a> {
    fn from(doc: &'a ResolvedDocument) -> Self {
        Self {
            title: &doc.spec.info.title,
            version: &doc.spec.info.version,
            models: &doc.models.items,
            endpoints: &doc.endpoints.items,
            failures: doc
                .models
                .failures
                .iter()
                .chain(&doc.endpoints.failures)
                .map(ToString::to_string)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oafn_core::duplication::DuplicationMode;
    use oafn_csharp::CSharpGenerator;

    const PETSTORE: &str = include_str!("../../oafn-core/tests/fixtures/petstore.yaml");

    fn workspace(config: &str) -> (tempfile::TempDir, RunConfig) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("petstore.yaml"), PETSTORE).unwrap();
        let config: RunConfig = serde_yaml_ng::from_str(config).unwrap();
        config.validate().unwrap();
        (dir, config)
    }

    fn file_names(report: &ServiceReport) -> Vec<String> {
        report
            .files
            .iter()
            .filter_map(|f| f.path.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn renders_a_full_service_and_counts_failures() {
        let (dir, config) = workspace(
            r#"
services:
  - apiPath: petstore.yaml
    model: { namespace: Pets.Model, targetFolder: out/Model }
    function: { name: Pets, namespace: Pets, targetFolder: out }
"#,
        );
        let target = config.service_targets(dir.path()).remove(0).unwrap();
        let mut registry = DuplicationRegistry::new(DuplicationMode::Overwrite);
        let report = run_service(&target, &CSharpGenerator, &mut registry).unwrap();

        // Broken and Ambiguous models, the orphan and upload operations.
        assert_eq!(report.failures, 4);
        assert!(!report.is_clean());

        let names = file_names(&report);
        assert!(names.contains(&"Child.generated.cs".to_string()));
        assert!(names.contains(&"IPetsService.generated.cs".to_string()));
        assert!(names.contains(&"PetsFunctions.generated.cs".to_string()));

        assert_eq!(write_files(&report.files).unwrap(), report.files.len());
        assert!(dir.path().join("out/Model/Child.generated.cs").exists());
        assert!(dir.path().join("out/PetsFunctions.generated.cs").exists());
    }

    #[test]
    fn once_mode_skips_repeated_models() {
        let (dir, config) = workspace(
            r#"
config: { duplicates: once }
services:
  - apiPath: petstore.yaml
    model: { namespace: A, targetFolder: a }
  - apiPath: petstore.yaml
    model: { namespace: B, targetFolder: b }
"#,
        );
        let mut registry = DuplicationRegistry::new(config.duplication_mode().unwrap());
        let reports: Vec<ServiceReport> = config
            .service_targets(dir.path())
            .into_iter()
            .map(|t| run_service(&t.unwrap(), &CSharpGenerator, &mut registry).unwrap())
            .collect();

        assert!(file_names(&reports[0]).contains(&"Cat.generated.cs".to_string()));
        assert!(reports[1].files.is_empty());
        assert_eq!(reports[1].failures, 2);
    }

    #[test]
    fn a_write_failure_does_not_stop_later_services() {
        let (dir, config) = workspace(
            r#"
services:
  - apiPath: petstore.yaml
    model: { namespace: A, targetFolder: blocked/a, excludes: [Broken, Ambiguous] }
  - apiPath: petstore.yaml
    model: { namespace: B, targetFolder: b, excludes: [Broken, Ambiguous] }
"#,
        );
        // A regular file where the first service needs a directory.
        fs::write(dir.path().join("blocked"), "").unwrap();

        let summary = generate_all(&config, dir.path(), &CSharpGenerator).unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.failed, 1);
        assert!(summary.written > 0);
        assert!(dir.path().join("b/Cat.generated.cs").exists());
        assert!(!dir.path().join("blocked/a").exists());
    }

    #[test]
    fn missing_document_fails_the_service() {
        let (dir, config) = workspace(
            r#"
services:
  - apiPath: missing.yaml
    model: { namespace: A, targetFolder: a }
"#,
        );
        let target = config.service_targets(dir.path()).remove(0).unwrap();
        let mut registry = DuplicationRegistry::new(DuplicationMode::Overwrite);
        assert!(run_service(&target, &CSharpGenerator, &mut registry).is_err());
    }

    #[test]
    fn inspect_summary_lists_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("petstore.yaml");
        fs::write(&path, PETSTORE).unwrap();

        let doc = resolve_document(&path).unwrap();
        let summary = InspectSummary::from(&doc);
        assert_eq!(summary.title, "Petstore");
        assert_eq!(summary.models.len(), 5);
        assert_eq!(summary.endpoints.len(), 5);
        assert_eq!(summary.failures.len(), 4);
        assert!(summary.failures[0].starts_with("Broken.nested:"));
    }
}
