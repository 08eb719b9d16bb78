use indexmap::IndexMap;
use minijinja::context;
use oafn_core::GeneratedFile;
use oafn_core::config::FunctionTarget;
use oafn_core::error::GeneratorError;
use oafn_core::ir::Endpoint;

use super::output_file;
use crate::templates::{Slot, TemplateSet};
use crate::type_mapper::type_ref_to_csharp;

/// Folder, below the functions folder, that holds the error classes.
pub const ERRORS_FOLDER: &str = "Errors";

/// The abstract exception every generated error class derives from.
pub const BASE_CLIENT_ERROR: &str = "ClientError";

/// Namespace of the error classes for a functions target.
pub fn errors_namespace(target: &FunctionTarget) -> String {
    format!("{}.{ERRORS_FOLDER}", target.namespace)
}

/// One exception class a service implementation throws to answer with a
/// documented 4xx response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientErrorClass {
    pub name: String,
    pub code: u16,
    /// C# type of the response body; `None` for responses without content.
    pub element: Option<String>,
}

/// Collect the error classes for every 4xx response, in endpoint order.
/// A body type maps to one class, so it may only appear under one code.
pub fn client_error_classes(
    endpoints: &[Endpoint],
) -> Result<Vec<ClientErrorClass>, GeneratorError> {
    let mut classes: IndexMap<String, ClientErrorClass> = IndexMap::new();
    for endpoint in endpoints {
        for response in endpoint.responses.iter().filter(|r| r.is_client_error()) {
            let class = match &response.content {
                Some(content) => ClientErrorClass {
                    name: format!("{}{BASE_CLIENT_ERROR}", content.stem()),
                    code: response.code,
                    element: Some(type_ref_to_csharp(content)),
                },
                None => ClientErrorClass {
                    name: format!("Generic{}{BASE_CLIENT_ERROR}", response.code),
                    code: response.code,
                    element: None,
                },
            };
            match classes.get(&class.name) {
                Some(existing) if existing.code != class.code => {
                    return Err(GeneratorError::Other(format!(
                        "{}: {} is returned with status {} and {}; one error class cannot carry both",
                        endpoint.operation_id,
                        class.element.as_deref().unwrap_or(&class.name),
                        existing.code,
                        class.code
                    )));
                }
                Some(_) => {}
                None => {
                    classes.insert(class.name.clone(), class);
                }
            }
        }
    }
    Ok(classes.into_values().collect())
}

/// Emit the shared `ClientError` base plus one class per documented 4xx
/// response, into `{target_folder}/Errors`.
pub fn emit_errors(
    templates: &TemplateSet,
    endpoints: &[Endpoint],
    target: &FunctionTarget,
    imports: &[String],
) -> Result<Vec<GeneratedFile>, GeneratorError> {
    let folder = target.target_folder.join(ERRORS_FOLDER);
    let namespace = errors_namespace(target);

    let base = templates.render(
        Slot::ClientErrorBase,
        context! {
            namespace => namespace.clone(),
            name => BASE_CLIENT_ERROR,
        },
    )?;
    let mut files = vec![output_file(&folder, BASE_CLIENT_ERROR, base)];

    for class in client_error_classes(endpoints)? {
        let class_imports: &[String] = if class.element.is_some() { imports } else { &[] };
        let content = templates.render(
            Slot::ClientError,
            context! {
                namespace => namespace.clone(),
                imports => class_imports,
                name => class.name.clone(),
                base => BASE_CLIENT_ERROR,
                code => class.code,
                element => class.element.clone(),
            },
        )?;
        files.push(output_file(&folder, &class.name, content));
    }
    Ok(files)
}
