use indexmap::IndexMap;
use serde::Deserialize;

use super::components::Components;
use super::operation::PathItem;

/// Info object describing the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Info {
    pub title: String,

    pub description: Option<String>,

    pub version: String,
}

/// Top-level OpenAPI 3.x document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpenApiSpec {
    pub openapi: String,

    pub info: Info,

    /// `None` when the document has no `paths` key, which the endpoint walk
    /// treats differently from an empty map.
    pub paths: Option<IndexMap<String, PathItem>>,

    pub components: Option<Components>,
}
