use minijinja::context;
use oafn_core::config::FunctionTarget;
use oafn_core::error::GeneratorError;
use oafn_core::ir::{BodySummary, Endpoint};
use serde::Serialize;

use crate::templates::{Slot, TemplateSet};
use crate::type_mapper::{result_type, type_ref_to_csharp};

#[derive(Debug, Serialize)]
pub struct ServiceMethod {
    pub name: String,
    pub result: String,
    pub params: Vec<String>,
    pub documentation: Vec<String>,
}

/// Emit the service interface the functions class delegates to.
pub fn emit_service(
    templates: &TemplateSet,
    endpoints: &[Endpoint],
    target: &FunctionTarget,
    imports: &[String],
) -> Result<String, GeneratorError> {
    let methods: Vec<ServiceMethod> = endpoints
        .iter()
        .flat_map(|ep| service_methods(ep, templates.version()))
        .collect();

    templates.render(
        Slot::Service,
        context! {
            namespace => target.interface_namespace.clone(),
            name => target.interface_name.clone(),
            functions_name => target.functions_name.clone(),
            imports => imports,
            methods => methods,
        },
    )
}

/// `{type} {name}` for every path parameter.
pub fn parameter_declarations(endpoint: &Endpoint) -> Vec<String> {
    endpoint
        .parameters
        .iter()
        .map(|p| format!("{} {}", type_ref_to_csharp(&p.type_ref), p.name))
        .collect()
}

/// The interface methods for one endpoint: one per body type a
/// discriminated body can take, otherwise exactly one.
pub fn service_methods(endpoint: &Endpoint, version: u8) -> Vec<ServiceMethod> {
    let base = parameter_declarations(endpoint);
    let method = |params: Vec<String>, result: &str| ServiceMethod {
        name: endpoint.name.clone(),
        result: result.to_string(),
        params,
        documentation: endpoint.documentation.clone(),
    };

    if version == 1 {
        let mut params = base;
        if endpoint.needs_request_body {
            params.push("HttpContent contentPayload".to_string());
        }
        return vec![method(params, "Task<HttpResponseMessage>")];
    }

    let result = if version >= 3 {
        result_type(&endpoint.response_summary)
    } else {
        "Task<IActionResult>".to_string()
    };
    let with_payload = |payload: Option<String>| {
        let mut params = base.clone();
        params.extend(payload);
        if version == 2 {
            params.push("HttpRequest request".to_string());
        }
        method(params, &result)
    };

    match &endpoint.body_summary {
        Some(BodySummary::Simple { type_ref }) => {
            vec![with_payload(Some(format!("{} payload", type_ref_to_csharp(type_ref))))]
        }
        Some(BodySummary::DiscriminatedUnion { candidates, .. }) => candidates
            .iter()
            .map(|candidate| with_payload(Some(format!("{candidate} payload"))))
            .collect(),
        None if endpoint.needs_request_body && version >= 3 => {
            vec![with_payload(Some("Stream stream".to_string()))]
        }
        None => vec![with_payload(None)],
    }
}
