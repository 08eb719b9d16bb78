use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::error::{DefinitionError, DefinitionErrorKind, TransformError};
use crate::ir::{Endpoint, HttpMethod, PathParameter, ResponseInfo, ResponseSummary, TypeRef};
use crate::parse::operation::Operation;
use crate::parse::parameter::{ParameterLocation, ParameterOrRef};
use crate::parse::request_body::RequestBodyOrRef;
use crate::parse::response::ResponseOrRef;
use crate::parse::schema::SchemaOrRef;
use crate::parse::spec::OpenApiSpec;

use super::Resolution;
use super::content_resolver::{resolve_body, resolve_content_type, resolve_element};
use super::known_types::KnownTypes;
use super::type_converter::to_identifier;

/// Build the endpoint IR from `paths`, in document order.
pub fn resolve_endpoints(
    spec: &OpenApiSpec,
    known: &KnownTypes,
) -> Result<Resolution<Endpoint>, TransformError> {
    let paths = spec
        .paths
        .as_ref()
        .ok_or(TransformError::MissingSection("paths"))?;
    let empty = IndexMap::new();
    let schemas = spec
        .components
        .as_ref()
        .map(|c| &c.schemas)
        .unwrap_or(&empty);

    let mut endpoints = Resolution::default();
    for (path, item) in paths {
        for (method, op) in &item.operations {
            let context = EndpointContext {
                path,
                method: *method,
                path_parameters: &item.parameters,
                schemas,
                known,
            };
            match resolve_endpoint(&context, op) {
                Ok(endpoint) => endpoints.items.push(endpoint),
                Err(err) => endpoints.failures.push(err),
            }
        }
    }
    Ok(endpoints)
}

/// Everything an operation is resolved against besides the operation itself.
pub struct EndpointContext<'a> {
    pub path: &'a str,
    pub method: HttpMethod,
    /// Parameters declared on the path item, inherited by every operation.
    pub path_parameters: &'a [ParameterOrRef],
    pub schemas: &'a IndexMap<String, SchemaOrRef>,
    pub known: &'a KnownTypes,
}

impl EndpointContext<'_> {
    fn location(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

pub fn resolve_endpoint(ctx: &EndpointContext<'_>, op: &Operation) -> Result<Endpoint, DefinitionError> {
    let location = ctx.location();
    let fail = |kind| DefinitionError::new(location.clone(), kind);

    let operation_id = op.operation_id.clone().ok_or_else(|| {
        fail(DefinitionErrorKind::MissingRequiredField(
            "operationId".to_string(),
        ))
    })?;

    let parameters = path_parameters(ctx, op).map_err(fail)?;

    let mut responses = Vec::new();
    let mut degraded = BTreeSet::new();
    for (code, response) in &op.responses {
        let Ok(code_number) = code.parse::<u16>() else {
            debug!("{location}: response `{code}` has no numeric status, not summarized");
            continue;
        };
        let ResponseOrRef::Response(response) = response else {
            warn!("{location}: response {code} is an unresolved reference, treating it as untyped");
            degraded.insert(code_number);
            continue;
        };
        let content = match resolve_content_type(&response.content, ctx.known) {
            Ok(content) => content,
            Err(kind) => {
                warn!(
                    "{}; treating the response as untyped",
                    DefinitionError::new(format!("{location} response {code}"), kind)
                );
                degraded.insert(code_number);
                None
            }
        };
        responses.push(ResponseInfo {
            code: code_number,
            description: response.description.clone(),
            content,
        });
    }

    let body_summary = match &op.request_body {
        Some(RequestBodyOrRef::RequestBody(body)) => {
            resolve_body(&body.content, ctx.schemas, ctx.known).map_err(fail)?
        }
        Some(RequestBodyOrRef::Ref { ref_path }) => {
            return Err(fail(DefinitionErrorKind::UnsupportedBodyShape(format!(
                "unresolved request body reference {ref_path}"
            ))));
        }
        None => None,
    };

    let response_summary = summarize_responses(&location, &responses, &degraded);

    Ok(Endpoint {
        name: format!("{}Async", to_identifier(&operation_id)),
        operation_id,
        method: ctx.method,
        path: ctx.path.trim_matches('/').to_string(),
        documentation: documentation(op),
        parameters,
        needs_request_body: op.request_body.is_some(),
        responses,
        response_summary,
        body_summary,
    })
}

/// Path-level parameters first, then the operation's own. Only `in: path`
/// parameters take part in the signature.
fn path_parameters(
    ctx: &EndpointContext<'_>,
    op: &Operation,
) -> Result<Vec<PathParameter>, DefinitionErrorKind> {
    let mut out = Vec::new();
    for param in ctx.path_parameters.iter().chain(&op.parameters) {
        let param = match param {
            ParameterOrRef::Parameter(param) => param,
            ParameterOrRef::Ref { ref_path } => {
                return Err(DefinitionErrorKind::UnsupportedSchema(format!(
                    "unresolved parameter reference {ref_path}"
                )));
            }
        };
        if param.location != ParameterLocation::Path {
            continue;
        }
        let schema = param.schema.as_ref().ok_or_else(|| {
            DefinitionErrorKind::UnsupportedSchema(format!(
                "path parameter `{}` has no schema",
                param.name
            ))
        })?;
        let type_ref = resolve_element(schema, ctx.known)
            .ok()
            .filter(TypeRef::is_scalar)
            .ok_or_else(|| {
                DefinitionErrorKind::UnsupportedSchema(format!(
                    "path parameter `{}` must be a primitive",
                    param.name
                ))
            })?;
        out.push(PathParameter {
            name: param.name.clone(),
            type_ref,
            description: param.description.clone(),
        });
    }
    Ok(out)
}

fn documentation(op: &Operation) -> Vec<String> {
    let mut lines: Vec<String> = op
        .description
        .as_deref()
        .or(op.summary.as_deref())
        .map(|text| text.lines().map(|l| l.trim_end().to_string()).collect())
        .unwrap_or_default();
    for (code, response) in &op.responses {
        if let ResponseOrRef::Response(response) = response {
            lines.push(format!("{code} -> {}", response.description.trim()));
        }
    }
    lines
}

/// Derive the success-path summary from the 2xx responses.
pub fn summarize_responses(
    location: &str,
    responses: &[ResponseInfo],
    degraded: &BTreeSet<u16>,
) -> ResponseSummary {
    let success: Vec<&ResponseInfo> = responses.iter().filter(|r| r.is_success()).collect();
    let Some(first) = success.first() else {
        return ResponseSummary::Untyped;
    };
    if success.iter().any(|r| degraded.contains(&r.code)) {
        return ResponseSummary::Untyped;
    }

    let content = first.content.clone();
    if success.iter().any(|r| r.content != content) {
        warn!(
            "{}; falling back to an untyped result",
            DefinitionError::new(location, DefinitionErrorKind::InconsistentResponseType)
        );
        return ResponseSummary::Untyped;
    }

    if success.len() == 1 {
        return ResponseSummary::Single {
            content,
            code: first.code,
        };
    }
    ResponseSummary::MultiCode {
        wrapper: content
            .as_ref()
            .map(|t| format!("{}ResultWrapper", t.stem())),
        codes: success.iter().map(|r| r.code).collect(),
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(code: u16, content: Option<TypeRef>) -> ResponseInfo {
        ResponseInfo {
            code,
            description: String::new(),
            content,
        }
    }

    #[test]
    fn multi_code_summary_gets_a_wrapper() {
        let order = Some(TypeRef::entity("Order"));
        let responses = vec![
            response(200, order.clone()),
            response(201, order.clone()),
            response(404, None),
        ];
        let summary = summarize_responses("GET orders", &responses, &BTreeSet::new());
        assert_eq!(
            summary,
            ResponseSummary::MultiCode {
                content: order,
                codes: vec![200, 201],
                wrapper: Some("OrderResultWrapper".to_string()),
            }
        );
    }

    #[test]
    fn disagreeing_success_types_are_untyped() {
        let responses = vec![
            response(200, Some(TypeRef::entity("A"))),
            response(201, Some(TypeRef::entity("B"))),
        ];
        let summary = summarize_responses("GET x", &responses, &BTreeSet::new());
        assert_eq!(summary, ResponseSummary::Untyped);
    }

    #[test]
    fn single_code_without_body() {
        let responses = vec![response(204, None)];
        let summary = summarize_responses("DELETE x", &responses, &BTreeSet::new());
        assert_eq!(
            summary,
            ResponseSummary::Single {
                content: None,
                code: 204
            }
        );
    }

    #[test]
    fn degraded_success_response_is_untyped() {
        let responses = vec![response(200, None)];
        let degraded = BTreeSet::from([200]);
        assert_eq!(
            summarize_responses("GET x", &responses, &degraded),
            ResponseSummary::Untyped
        );
    }

    #[test]
    fn no_success_response_is_untyped() {
        let responses = vec![response(400, None)];
        assert_eq!(
            summarize_responses("GET x", &responses, &BTreeSet::new()),
            ResponseSummary::Untyped
        );
    }
}
