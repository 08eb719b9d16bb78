use log::debug;
use oafn_core::config::{FunctionTarget, ModelTarget};
use oafn_core::error::GeneratorError;
use oafn_core::ir::{Endpoint, ModelEntity};
use oafn_core::{CodeGenerator, GeneratedFile};

use crate::emitters;
use crate::emitters::{errors, merge_imports, output_file};
use crate::templates::TemplateSet;

/// C# Azure Functions generator: model classes, the service interface the
/// functions delegate to and the functions class itself.
#[derive(Debug, Default)]
pub struct CSharpGenerator;

impl CodeGenerator for CSharpGenerator {
    type Error = GeneratorError;

    fn generate_models(
        &self,
        models: &[&ModelEntity],
        target: &ModelTarget,
    ) -> Result<Vec<GeneratedFile>, GeneratorError> {
        let templates = TemplateSet::new(target.version)?;
        emitters::models::emit_models(&templates, models, target)
    }

    fn generate_functions(
        &self,
        endpoints: &[Endpoint],
        target: &FunctionTarget,
    ) -> Result<Vec<GeneratedFile>, GeneratorError> {
        let templates = TemplateSet::new(target.version)?;

        let interface_imports = target.imports.clone();
        let mut extra = Vec::new();
        if target.interface_namespace != target.namespace {
            extra.push(target.interface_namespace.clone());
        }
        if templates.version() >= 3 {
            extra.push(errors::errors_namespace(target));
        }
        let function_imports = merge_imports([target.imports.as_slice(), extra.as_slice()]);

        let mut files = Vec::new();
        if templates.version() >= 3 {
            files.extend(emitters::wrappers::emit_wrappers(
                &templates,
                endpoints,
                target,
                &interface_imports,
            )?);
            files.extend(errors::emit_errors(
                &templates,
                endpoints,
                target,
                &target.imports,
            )?);
        }

        let service =
            emitters::service::emit_service(&templates, endpoints, target, &interface_imports)?;
        files.push(output_file(
            &target.interface_target_folder,
            &target.interface_name,
            service,
        ));

        let functions =
            emitters::functions::emit_functions(&templates, endpoints, target, &function_imports)?;
        files.push(output_file(
            &target.target_folder,
            &target.functions_name,
            functions,
        ));

        debug!(
            "rendered {} endpoints of {} into {} files",
            endpoints.len(),
            target.name,
            files.len()
        );
        Ok(files)
    }
}
