use indexmap::IndexMap;
use serde::Serialize;

pub use crate::parse::operation::HttpMethod;

use super::types::TypeRef;

/// A fully resolved operation, ready for an emitter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    pub operation_id: String,
    /// `{OperationId}Async`.
    pub name: String,
    pub method: HttpMethod,
    /// The path with leading and trailing slashes removed.
    pub path: String,
    pub documentation: Vec<String>,
    /// Path parameters only, path-level first.
    pub parameters: Vec<PathParameter>,
    pub needs_request_body: bool,
    /// Every response with a numeric status code, in document order.
    pub responses: Vec<ResponseInfo>,
    pub response_summary: ResponseSummary,
    pub body_summary: Option<BodySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathParameter {
    pub name: String,
    pub type_ref: TypeRef,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseInfo {
    pub code: u16,
    pub description: String,
    /// `None` for a response without a body, or one whose body could not
    /// be resolved.
    pub content: Option<TypeRef>,
}

impl ResponseInfo {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.code)
    }
}

/// What the success path of an operation returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseSummary {
    /// No 2xx response, or 2xx responses that disagree on their type.
    Untyped,
    Single {
        content: Option<TypeRef>,
        code: u16,
    },
    /// Several 2xx codes sharing one type.
    MultiCode {
        content: Option<TypeRef>,
        codes: Vec<u16>,
        /// `{Type}ResultWrapper` when the content is typed.
        wrapper: Option<String>,
    },
}

impl ResponseSummary {
    pub fn content(&self) -> Option<&TypeRef> {
        match self {
            Self::Untyped => None,
            Self::Single { content, .. } | Self::MultiCode { content, .. } => content.as_ref(),
        }
    }
}

/// The shape of a request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodySummary {
    Simple {
        type_ref: TypeRef,
    },
    /// A discriminated `oneOf`: the body is parsed into one of `candidates`
    /// by reading `discriminator` from the payload.
    DiscriminatedUnion {
        candidates: Vec<String>,
        /// Wire value to candidate type name.
        mapping: IndexMap<String, String>,
        /// The discriminator property as it appears on the wire.
        discriminator: String,
    },
}
