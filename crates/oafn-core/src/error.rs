use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid reference format: {0}")]
    InvalidRefFormat(String),

    #[error("reference target not found: {0}")]
    RefTargetNotFound(String),

    #[error("circular reference detected: {0}")]
    CircularRef(String),

    #[error("remote references are not supported: {0}")]
    RemoteRef(String),

    #[error("failed to load referenced document: {0}")]
    External(#[from] Box<ParseError>),
}

/// A definition the resolvers cannot turn into IR.
///
/// `location` names the schema/property or operation the failure belongs to,
/// e.g. `Order.items` or `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {kind}")]
pub struct DefinitionError {
    pub location: String,
    pub kind: DefinitionErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionErrorKind {
    #[error("missing required field `{0}`")]
    MissingRequiredField(String),

    #[error("ambiguous inheritance: {0}")]
    AmbiguousInheritance(String),

    #[error("unsupported nesting: {0}")]
    UnsupportedNesting(String),

    #[error("unsupported schema: {0}")]
    UnsupportedSchema(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("unsupported body shape: {0}")]
    UnsupportedBodyShape(String),

    #[error("2xx responses disagree on their content type")]
    InconsistentResponseType,

    #[error("class name `{name}` is already generated for schema `{first}`")]
    NameCollision { name: String, first: String },
}

impl DefinitionError {
    pub fn new(location: impl Into<String>, kind: DefinitionErrorKind) -> Self {
        Self {
            location: location.into(),
            kind,
        }
    }

    /// Prefix the location with an outer context, e.g. the schema a failing
    /// property belongs to.
    pub fn within(mut self, outer: &str) -> Self {
        self.location = format!("{outer}.{}", self.location);
        self
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("unknown duplication mode `{0}` (expected `overwrite` or `once`)")]
    UnknownDuplicationMode(String),

    #[error("unsupported template version {0} (expected 1, 2 or 3)")]
    UnsupportedVersion(u8),

    #[error("service #{index}: missing required key `{key}`")]
    MissingKey { index: usize, key: String },
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("document has no `{0}` section")]
    MissingSection(&'static str),
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to render {artifact}: {message}")]
    Render { artifact: String, message: String },

    #[error("generation failed: {0}")]
    Other(String),
}
