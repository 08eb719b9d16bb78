use log::warn;
use minijinja::context;
use oafn_core::config::{BASE_PLACEHOLDER, FunctionTarget};
use oafn_core::error::GeneratorError;
use oafn_core::ir::{BodySummary, Endpoint, ResponseSummary};

use crate::templates::{Slot, TemplateSet};
use crate::type_mapper::type_ref_to_csharp;

use super::service::parameter_declarations;

/// Placeholder in the boilerplate that expands to the bare service call.
pub const CALL_PLACEHOLDER: &str = "{CALL}";

/// Emit the class of HTTP-triggered functions, one per endpoint.
pub fn emit_functions(
    templates: &TemplateSet,
    endpoints: &[Endpoint],
    target: &FunctionTarget,
    imports: &[String],
) -> Result<String, GeneratorError> {
    let methods = endpoints
        .iter()
        .map(|ep| emit_method(templates, ep, target))
        .collect::<Result<Vec<_>, _>>()?;

    templates.render(
        Slot::Functions,
        context! {
            namespace => target.namespace.clone(),
            class_name => target.functions_name.clone(),
            interface_name => target.interface_name.clone(),
            imports => imports,
            methods => methods,
        },
    )
}

fn emit_method(
    templates: &TemplateSet,
    endpoint: &Endpoint,
    target: &FunctionTarget,
) -> Result<String, GeneratorError> {
    let version = templates.version();
    let (statements, call) = if version == 1 {
        v1_invocation(endpoint)
    } else {
        invocation(endpoint, version)
    };
    let body = apply_boilerplate(&target.boilerplate, &statements, call.as_deref(), endpoint);

    templates.render(
        Slot::FunctionMethod,
        context! {
            name => endpoint.name.clone(),
            operation => endpoint.method.as_str().to_ascii_lowercase(),
            path => endpoint.path.clone(),
            params => parameter_declarations(endpoint),
            param_names => endpoint.parameters.iter().map(|p| p.name.clone()).collect::<Vec<_>>(),
            body => body,
        },
    )
}

/// Substitute the generated statements into the boilerplate and split the
/// result into lines.
pub fn apply_boilerplate(
    boilerplate: &str,
    statements: &[String],
    call: Option<&str>,
    endpoint: &Endpoint,
) -> Vec<String> {
    let mut text = boilerplate.replace(BASE_PLACEHOLDER, &statements.join("\n"));
    if text.contains(CALL_PLACEHOLDER) {
        match call {
            Some(call) => text = text.replace(CALL_PLACEHOLDER, call),
            None => warn!(
                "{}: {CALL_PLACEHOLDER} has no single service call to expand to; left as is",
                endpoint.operation_id
            ),
        }
    }
    text.lines().map(str::to_string).collect()
}

fn call_arguments(endpoint: &Endpoint) -> Vec<String> {
    endpoint.parameters.iter().map(|p| p.name.clone()).collect()
}

fn v1_invocation(endpoint: &Endpoint) -> (Vec<String>, Option<String>) {
    let mut args = call_arguments(endpoint);
    if endpoint.needs_request_body {
        args.push("req.Content".to_string());
    }
    let call = format!("{}({})", endpoint.name, args.join(", "));
    (
        vec![format!("return await Service(req, log).{call};")],
        Some(call),
    )
}

/// Statements for versions 2 and 3. A discriminated body is parsed once and
/// dispatched to the overload matching its discriminator.
fn invocation(endpoint: &Endpoint, version: u8) -> (Vec<String>, Option<String>) {
    let args = call_arguments(endpoint);
    let call_with = |payload: Option<String>| {
        let mut args = args.clone();
        args.extend(payload);
        if version == 2 {
            args.push("request".to_string());
        }
        format!("await _service.{}({})", endpoint.name, args.join(", "))
    };

    match &endpoint.body_summary {
        Some(BodySummary::DiscriminatedUnion {
            mapping,
            discriminator,
            ..
        }) => {
            let mut lines = vec![
                "var jObject = await ParseJson<JObject>(request.Body);".to_string(),
                format!("switch (jObject[\"{discriminator}\"]?.ToString())"),
                "{".to_string(),
            ];
            for (wire, candidate) in mapping {
                let call = call_with(Some(format!("ToObject<{candidate}>(jObject)")));
                lines.push(format!("    case \"{wire}\":"));
                lines.push("    {".to_string());
                lines.extend(
                    result_statements(&call, &endpoint.response_summary, version)
                        .into_iter()
                        .map(|s| format!("        {s}")),
                );
                lines.push("    }".to_string());
            }
            let allowed: Vec<&str> = mapping.keys().map(String::as_str).collect();
            lines.push("    default:".to_string());
            lines.push(format!(
                "        return new BadRequestObjectResult(\"{discriminator} must be one of: {}\");",
                allowed.join(", ")
            ));
            lines.push("}".to_string());
            (lines, None)
        }
        body => {
            let payload = match body {
                Some(BodySummary::Simple { type_ref }) => Some(format!(
                    "await ParseJson<{}>(request.Body)",
                    type_ref_to_csharp(type_ref)
                )),
                _ if endpoint.needs_request_body && version >= 3 => {
                    Some("request.Body".to_string())
                }
                _ => None,
            };
            let call = call_with(payload);
            (
                result_statements(&call, &endpoint.response_summary, version),
                Some(call),
            )
        }
    }
}

/// Await the service call and turn its result into an action result.
fn result_statements(call: &str, summary: &ResponseSummary, version: u8) -> Vec<String> {
    if version < 3 {
        return vec![format!("return {call};")];
    }
    match summary {
        ResponseSummary::Untyped => vec![format!("return {call};")],
        ResponseSummary::Single {
            content: None,
            code,
        } => vec![
            format!("{call};"),
            format!("return new StatusCodeResult({code});"),
        ],
        ResponseSummary::Single {
            content: Some(_),
            code,
        } => vec![
            format!("var result = {call};"),
            format!("return new JsonResult(result) {{ StatusCode = {code} }};"),
        ],
        ResponseSummary::MultiCode {
            wrapper: Some(_), ..
        } => vec![
            format!("var result = {call};"),
            "return new JsonResult(result.Data) { StatusCode = (int)result.ResultCode };"
                .to_string(),
        ],
        ResponseSummary::MultiCode { .. } => vec![
            format!("var code = {call};"),
            "return new StatusCodeResult(code);".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oafn_core::ir::{HttpMethod, PathParameter, ScalarType, TypeRef};

    fn endpoint(body: Option<BodySummary>, summary: ResponseSummary) -> Endpoint {
        Endpoint {
            operation_id: "putPet".to_string(),
            name: "PutPetAsync".to_string(),
            method: HttpMethod::Put,
            path: "pets/{petId}".to_string(),
            documentation: Vec::new(),
            parameters: vec![PathParameter {
                name: "petId".to_string(),
                type_ref: TypeRef::scalar(ScalarType::Long),
                description: None,
            }],
            needs_request_body: body.is_some(),
            responses: Vec::new(),
            response_summary: summary,
            body_summary: body,
        }
    }

    #[test]
    fn test_single_typed_result() {
        let ep = endpoint(
            Some(BodySummary::Simple {
                type_ref: TypeRef::entity("Pet"),
            }),
            ResponseSummary::Single {
                content: Some(TypeRef::entity("Pet")),
                code: 200,
            },
        );
        let (statements, call) = invocation(&ep, 3);
        insta::assert_snapshot!(statements.join("\n"), @r"
        var result = await _service.PutPetAsync(petId, await ParseJson<Pet>(request.Body));
        return new JsonResult(result) { StatusCode = 200 };
        ");
        assert!(call.is_some());
    }

    #[test]
    fn test_version_two_passes_the_request() {
        let ep = endpoint(None, ResponseSummary::Untyped);
        let (statements, _) = invocation(&ep, 2);
        assert_eq!(statements, vec!["return await _service.PutPetAsync(petId, request);"]);
    }

    #[test]
    fn test_union_dispatch() {
        let mapping = [("cat", "Cat"), ("dog", "Dog")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let ep = endpoint(
            Some(BodySummary::DiscriminatedUnion {
                candidates: vec!["Cat".to_string(), "Dog".to_string()],
                mapping,
                discriminator: "kind".to_string(),
            }),
            ResponseSummary::Single {
                content: None,
                code: 204,
            },
        );
        let (statements, call) = invocation(&ep, 3);
        assert!(call.is_none());
        assert_eq!(statements[1], "switch (jObject[\"kind\"]?.ToString())");
        assert!(statements.contains(&"    case \"dog\":".to_string()));
        assert!(statements.contains(
            &"        await _service.PutPetAsync(petId, ToObject<Dog>(jObject));".to_string()
        ));
        assert!(statements.contains(&"        return new StatusCodeResult(204);".to_string()));
    }

    #[test]
    fn test_boilerplate_wraps_the_body() {
        let ep = endpoint(None, ResponseSummary::Untyped);
        let statements = vec!["return await _service.PutPetAsync(petId);".to_string()];
        let body = apply_boilerplate(
            "using (Timer.Start())\n{\n    {BASE}\n}",
            &statements,
            Some("await _service.PutPetAsync(petId)"),
            &ep,
        );
        assert_eq!(
            body,
            vec![
                "using (Timer.Start())",
                "{",
                "    return await _service.PutPetAsync(petId);",
                "}"
            ]
        );

        let body = apply_boilerplate("return Ok({CALL});", &statements, Some("X()"), &ep);
        assert_eq!(body, vec!["return Ok(X());"]);
    }
}
