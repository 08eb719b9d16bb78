use std::collections::HashSet;

use minijinja::context;
use oafn_core::GeneratedFile;
use oafn_core::config::FunctionTarget;
use oafn_core::error::GeneratorError;
use oafn_core::ir::{Endpoint, ResponseSummary};

use super::output_file;
use crate::templates::{Slot, TemplateSet};
use crate::type_mapper::type_ref_to_csharp;

/// Emit one `{Type}ResultWrapper` per distinct wrapper the endpoints return.
/// Wrappers live next to the service interface that returns them.
pub fn emit_wrappers(
    templates: &TemplateSet,
    endpoints: &[Endpoint],
    target: &FunctionTarget,
    imports: &[String],
) -> Result<Vec<GeneratedFile>, GeneratorError> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for endpoint in endpoints {
        let ResponseSummary::MultiCode {
            content: Some(content),
            codes,
            wrapper: Some(wrapper),
        } = &endpoint.response_summary
        else {
            continue;
        };
        if !seen.insert(wrapper.as_str()) {
            continue;
        }
        let content = templates.render(
            Slot::ResultWrapper,
            context! {
                namespace => target.interface_namespace.clone(),
                imports => imports,
                name => wrapper.clone(),
                base => type_ref_to_csharp(content),
                codes => codes.clone(),
            },
        )?;
        files.push(output_file(&target.interface_target_folder, wrapper, content));
    }
    Ok(files)
}
