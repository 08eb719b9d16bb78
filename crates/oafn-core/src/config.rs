use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::duplication::DuplicationMode;
use crate::error::ConfigError;
use crate::transform::{ModelOptions, Naming};

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "oafn.yml";

/// Template generation used when none is configured.
pub const DEFAULT_VERSION: u8 = 3;

/// The placeholder in a function boilerplate that stands for the generated body.
pub const BASE_PLACEHOLDER: &str = "{BASE}";

/// Top-level run configuration loaded from `oafn.yml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Run-wide settings, the outermost layer every service falls back to.
    pub config: Settings,
    pub services: Vec<ServiceConfig>,
}

/// Settings that can be given for the whole run and overridden per service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub version: Option<u8>,
    /// `overwrite` or `once`; only read from the run-wide layer.
    pub duplicates: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub imports: Option<Vec<String>>,
    pub boilerplate: Option<String>,
}

impl Settings {
    /// Fill every unset field from `parent`.
    pub fn over(&self, parent: &Settings) -> Settings {
        Settings {
            version: self.version.or(parent.version),
            duplicates: self.duplicates.clone().or_else(|| parent.duplicates.clone()),
            prefix: self.prefix.clone().or_else(|| parent.prefix.clone()),
            suffix: self.suffix.clone().or_else(|| parent.suffix.clone()),
            imports: self.imports.clone().or_else(|| parent.imports.clone()),
            boilerplate: self
                .boilerplate
                .clone()
                .or_else(|| parent.boilerplate.clone()),
        }
    }
}

/// One OpenAPI document and what to generate from it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    pub api_path: Option<String>,
    pub config: Settings,
    pub model: Option<ModelBlock>,
    pub function: Option<FunctionBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelBlock {
    pub namespace: Option<String>,
    pub target_folder: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub excludes: Vec<String>,
    pub includes: Vec<String>,
    pub imports: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FunctionBlock {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub target_folder: Option<String>,
    pub functions_name: Option<String>,
    pub interface_name: Option<String>,
    pub interface_namespace: Option<String>,
    pub interface_target_folder: Option<String>,
    pub boilerplate: Option<String>,
    pub imports: Option<Vec<String>>,
}

/// Pick the innermost value that is set.
pub fn layered<T>(local: Option<T>, parent: Option<T>, default: T) -> T {
    local.or(parent).unwrap_or(default)
}

/// Where and how the models of one service are written.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTarget {
    pub namespace: String,
    pub target_folder: PathBuf,
    pub naming: Naming,
    pub excludes: Vec<String>,
    pub includes: Vec<String>,
    pub imports: Vec<String>,
    pub version: u8,
}

impl ModelTarget {
    pub fn model_options(&self) -> ModelOptions {
        ModelOptions {
            naming: self.naming.clone(),
            excludes: self.excludes.clone(),
            includes: self.includes.clone(),
        }
    }
}

/// Where and how the service interface and functions of one service are
/// written.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTarget {
    pub name: String,
    pub namespace: String,
    pub target_folder: PathBuf,
    pub functions_name: String,
    pub interface_name: String,
    pub interface_namespace: String,
    pub interface_target_folder: PathBuf,
    /// Wraps every function body; contains `{BASE}` where the body goes.
    pub boilerplate: String,
    pub imports: Vec<String>,
    /// Class naming used when no model block resolves the types.
    pub naming: Naming,
    pub version: u8,
}

/// A fully resolved service entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceTarget {
    /// Position in the `services` list, used in log lines.
    pub index: usize,
    pub api_path: PathBuf,
    pub model: Option<ModelTarget>,
    pub function: Option<FunctionTarget>,
}

impl RunConfig {
    pub fn duplication_mode(&self) -> Result<DuplicationMode, ConfigError> {
        match &self.config.duplicates {
            Some(mode) => mode.parse(),
            None => Ok(DuplicationMode::default()),
        }
    }

    /// Check the run-wide settings that every service depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.duplication_mode()?;
        check_version(self.config.version)?;
        Ok(())
    }

    /// Resolve every service, relative paths against `base_dir`. A broken
    /// entry fails on its own without affecting the others.
    pub fn service_targets(&self, base_dir: &Path) -> Vec<Result<ServiceTarget, ConfigError>> {
        self.services
            .iter()
            .enumerate()
            .map(|(index, service)| service.resolve(index, &self.config, base_dir))
            .collect()
    }
}

impl ServiceConfig {
    pub fn resolve(
        &self,
        index: usize,
        run: &Settings,
        base_dir: &Path,
    ) -> Result<ServiceTarget, ConfigError> {
        let missing = |key: &str| ConfigError::MissingKey {
            index,
            key: key.to_string(),
        };
        let settings = self.config.over(run);
        let version = check_version(settings.version)?;
        let api_path = self.api_path.as_deref().ok_or_else(|| missing("apiPath"))?;

        let model = self
            .model
            .as_ref()
            .map(|block| -> Result<ModelTarget, ConfigError> {
                Ok(ModelTarget {
                    namespace: block
                        .namespace
                        .clone()
                        .ok_or_else(|| missing("model.namespace"))?,
                    target_folder: base_dir.join(
                        block
                            .target_folder
                            .as_deref()
                            .ok_or_else(|| missing("model.targetFolder"))?,
                    ),
                    naming: Naming::new(
                        layered(block.prefix.clone(), settings.prefix.clone(), String::new()),
                        layered(block.suffix.clone(), settings.suffix.clone(), String::new()),
                    ),
                    excludes: block.excludes.clone(),
                    includes: block.includes.clone(),
                    imports: layered(block.imports.clone(), settings.imports.clone(), Vec::new()),
                    version,
                })
            })
            .transpose()?;

        let mut function = self
            .function
            .as_ref()
            .map(|block| -> Result<FunctionTarget, ConfigError> {
                let name = block.name.clone().ok_or_else(|| missing("function.name"))?;
                let namespace = block
                    .namespace
                    .clone()
                    .ok_or_else(|| missing("function.namespace"))?;
                let target_folder = base_dir.join(
                    block
                        .target_folder
                        .as_deref()
                        .ok_or_else(|| missing("function.targetFolder"))?,
                );
                Ok(FunctionTarget {
                    functions_name: layered(
                        block.functions_name.clone(),
                        None,
                        format!("{name}Functions"),
                    ),
                    interface_name: layered(
                        block.interface_name.clone(),
                        None,
                        format!("I{name}Service"),
                    ),
                    interface_namespace: layered(
                        block.interface_namespace.clone(),
                        None,
                        namespace.clone(),
                    ),
                    interface_target_folder: block
                        .interface_target_folder
                        .as_deref()
                        .map(|folder| base_dir.join(folder))
                        .unwrap_or_else(|| target_folder.clone()),
                    boilerplate: layered(
                        block.boilerplate.clone(),
                        settings.boilerplate.clone(),
                        BASE_PLACEHOLDER.to_string(),
                    ),
                    imports: layered(block.imports.clone(), settings.imports.clone(), Vec::new()),
                    naming: Naming::new(
                        settings.prefix.clone().unwrap_or_default(),
                        settings.suffix.clone().unwrap_or_default(),
                    ),
                    version,
                    name,
                    namespace,
                    target_folder,
                })
            })
            .transpose()?;

        // Functions reference the model types of the same service.
        if let (Some(model), Some(function)) = (&model, function.as_mut()) {
            function.naming = model.naming.clone();
            if model.namespace != function.namespace && !function.imports.contains(&model.namespace) {
                function.imports.push(model.namespace.clone());
            }
        }

        Ok(ServiceTarget {
            index,
            api_path: base_dir.join(api_path),
            model,
            function,
        })
    }
}

fn check_version(version: Option<u8>) -> Result<u8, ConfigError> {
    match version.unwrap_or(DEFAULT_VERSION) {
        v @ 1..=3 => Ok(v),
        other => Err(ConfigError::UnsupportedVersion(other)),
    }
}

/// Load and validate a run configuration.
pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: RunConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# oafn configuration
config:
  version: 3            # template generation: 1 | 2 | 3
  duplicates: overwrite # overwrite | once
  # prefix: ""
  # suffix: ""

services:
  - apiPath: openapi.yml
    model:
      namespace: MyApi.Model
      targetFolder: output/Model
      # excludes: []
      # includes: []
    function:
      name: MyApi
      namespace: MyApi
      targetFolder: output
      # functionsName: MyApiFunctions
      # interfaceName: IMyApiService
      # interfaceNamespace: MyApi.Interfaces
      # interfaceTargetFolder: output/Interfaces
      # boilerplate: "{BASE}"
"#
}
