use serde::Deserialize;

use super::schema::SchemaOrRef;

/// A media type object. Only the schema takes part in resolution.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaType {
    pub schema: Option<SchemaOrRef>,
}
