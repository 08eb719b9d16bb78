use heck::ToLowerCamelCase;
use log::debug;
use minijinja::context;
use oafn_core::GeneratedFile;
use oafn_core::config::ModelTarget;
use oafn_core::error::GeneratorError;
use oafn_core::ir::{
    Capability, EnumTable, InterfaceModel, ModelEntity, ObjectModel, Property, TypeRef,
};
use oafn_core::transform::to_identifier;
use serde::Serialize;

use super::{doc_lines, merge_imports, output_file};
use crate::templates::{Slot, TemplateSet};
use crate::type_mapper::{default_initializer, scalar_to_csharp, type_ref_to_csharp, update_statement};

/// Name of the converter class shared by every date-only property.
pub const DATE_CONVERTER: &str = "CustomJsonDateConverter";

/// Emit one file per model, plus the date converter when any model needs it.
pub fn emit_models(
    templates: &TemplateSet,
    models: &[&ModelEntity],
    target: &ModelTarget,
) -> Result<Vec<GeneratedFile>, GeneratorError> {
    let mut files = Vec::with_capacity(models.len() + 1);
    for model in models {
        let content = match model {
            ModelEntity::Object(object) => emit_object(templates, object, target)?,
            ModelEntity::Interface(interface) => emit_interface(templates, interface, target)?,
        };
        let file = output_file(&target.target_folder, model.name(), content);
        debug!("rendered {} -> {}", model.name(), file.path.display());
        files.push(file);
    }

    let needs_converter = models.iter().any(|m| {
        m.as_object()
            .is_some_and(|o| o.capabilities.contains(&Capability::DateConverter))
    });
    if needs_converter {
        let content = templates.render(
            Slot::DateConverter,
            context! { namespace => target.namespace.clone() },
        )?;
        files.push(output_file(&target.target_folder, DATE_CONVERTER, content));
    }
    Ok(files)
}

#[derive(Serialize)]
struct PropertyCtx {
    name: String,
    member: String,
    field: String,
    #[serde(rename = "type")]
    type_name: String,
    property_init: String,
    field_init: String,
    required_clause: &'static str,
    is_date: bool,
    description: Vec<String>,
    #[serde(rename = "enum")]
    enum_ctx: Option<EnumCtx>,
}

#[derive(Serialize)]
struct EnumCtx {
    constants: Vec<ConstantCtx>,
    names: Vec<String>,
    allowed_name: String,
}

#[derive(Serialize)]
struct ConstantCtx {
    declaration: String,
    name: String,
    literal: String,
}

#[derive(Serialize)]
struct MappingCtx {
    wire: String,
    child: String,
}

pub fn emit_object(
    templates: &TemplateSet,
    object: &ObjectModel,
    target: &ModelTarget,
) -> Result<String, GeneratorError> {
    let properties: Vec<PropertyCtx> = object.properties.iter().map(property_ctx).collect();
    let updates: Vec<String> = object
        .properties
        .iter()
        .map(|p| update_statement(&to_identifier(&p.name), p))
        .collect();

    let parents: Vec<&str> = object
        .parent
        .iter()
        .chain(&object.interfaces)
        .map(String::as_str)
        .collect();
    let parents_clause = if parents.is_empty() {
        String::new()
    } else {
        format!(" : {}", parents.join(", "))
    };

    let imports = merge_imports([
        capability_imports(object).as_slice(),
        target.imports.as_slice(),
    ]);

    templates.render(
        Slot::Model,
        context! {
            namespace => target.namespace.clone(),
            imports => imports,
            name => object.name.clone(),
            raw_name => object.raw_name.clone(),
            description => doc_lines(object.description.as_deref()),
            parents_clause => parents_clause,
            parent => object.parent.clone(),
            properties => properties,
            updates => updates,
        },
    )
}

pub fn emit_interface(
    templates: &TemplateSet,
    interface: &InterfaceModel,
    target: &ModelTarget,
) -> Result<String, GeneratorError> {
    let mapping: Vec<MappingCtx> = interface
        .mapping
        .iter()
        .map(|(wire, child)| MappingCtx {
            wire: wire.clone(),
            child: child.clone(),
        })
        .collect();

    templates.render(
        Slot::Interface,
        context! {
            namespace => target.namespace.clone(),
            imports => target.imports.clone(),
            name => interface.name.clone(),
            raw_name => interface.raw_name.clone(),
            description => doc_lines(interface.description.as_deref()),
            discriminator => interface.discriminator.clone(),
            mapping => mapping,
        },
    )
}

fn capability_imports(object: &ObjectModel) -> Vec<String> {
    let mut imports = Vec::new();
    for capability in &object.capabilities {
        let needed: &[&str] = match capability {
            Capability::Collections => &["System.Collections.Generic", "System.Linq"],
            Capability::Immutable => &["System.Collections.Immutable", "System.Linq"],
            Capability::DateConverter => &[],
        };
        for import in needed {
            if !imports.iter().any(|i| i == import) {
                imports.push(import.to_string());
            }
        }
    }
    imports
}

fn property_ctx(property: &Property) -> PropertyCtx {
    let type_name = type_ref_to_csharp(&property.type_ref);
    let initializer = default_initializer(property);
    let required_clause = match (property.is_required, property.nullable) {
        (true, true) => ", Required = Required.AllowNull",
        (true, false) => ", Required = Required.Always",
        (false, _) => "",
    };
    PropertyCtx {
        name: property.name.clone(),
        member: to_identifier(&property.name),
        field: property.name.to_lower_camel_case(),
        property_init: initializer
            .as_ref()
            .map(|i| format!(" = {i};"))
            .unwrap_or_default(),
        field_init: initializer.map(|i| format!(" = {i}")).unwrap_or_default(),
        required_clause,
        is_date: property.is_date,
        description: doc_lines(property.description.as_deref()),
        enum_ctx: property
            .enum_table
            .as_ref()
            .map(|table| enum_ctx(table, &property.type_ref, &type_name)),
        type_name,
    }
}

fn enum_ctx(table: &EnumTable, type_ref: &TypeRef, type_name: &str) -> EnumCtx {
    let constant_type = match type_ref {
        TypeRef::Scalar { scalar, .. } => scalar_to_csharp(*scalar, false),
        other => type_ref_to_csharp(other),
    };
    let constants = table
        .constants
        .iter()
        .map(|c| ConstantCtx {
            declaration: if c.literal == "null" {
                format!("public static readonly {type_name}")
            } else {
                format!("public const {constant_type}")
            },
            name: c.name.clone(),
            literal: c.literal.clone(),
        })
        .collect();
    EnumCtx {
        constants,
        names: table.constants.iter().map(|c| c.name.clone()).collect(),
        allowed_name: table.allowed_values_name.clone(),
    }
}
