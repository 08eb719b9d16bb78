use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value;

use crate::error::{DefinitionError, DefinitionErrorKind, TransformError};
use crate::ir::{
    Capability, DefaultValue, EnumConstant, EnumTable, InterfaceModel, ModelEntity, ObjectModel,
    Property, TypeRef,
};
use crate::parse::schema::{AdditionalProperties, Schema, SchemaOrRef, SchemaType};
use crate::parse::spec::OpenApiSpec;

use super::Resolution;
use super::known_types::{KnownTypes, ResolvedRef};
use super::type_converter::{
    Naming, capitalize_first, is_date_schema, is_primitive_schema, ref_name,
    sanitize_identifier, schema_scalar, to_identifier,
};

/// Which component schemas become models and how they are named.
#[derive(Debug, Clone, Default)]
pub struct ModelOptions {
    pub naming: Naming,
    pub excludes: Vec<String>,
    /// When non-empty, only these schemas are generated.
    pub includes: Vec<String>,
}

impl ModelOptions {
    pub fn admits(&self, raw: &str) -> bool {
        if self.excludes.iter().any(|e| e == raw) {
            return false;
        }
        self.includes.is_empty() || self.includes.iter().any(|i| i == raw)
    }
}

/// The model walk's output: the entities plus the alias table the endpoint
/// walk must reuse.
#[derive(Debug, Clone)]
pub struct ModelResolution {
    pub known_types: KnownTypes,
    pub models: Resolution<ModelEntity>,
}

/// Build the model IR from `components.schemas`.
pub fn resolve_models(
    spec: &OpenApiSpec,
    options: &ModelOptions,
) -> Result<ModelResolution, TransformError> {
    let components = spec
        .components
        .as_ref()
        .ok_or(TransformError::MissingSection("components"))?;

    let known_types = KnownTypes::scan(&components.schemas, options.naming.clone(), |raw| {
        options.admits(raw)
    });

    let mut models = Resolution::default();
    // Class name -> the raw schema key that produced it first.
    let mut claimed: HashMap<String, String> = HashMap::new();
    for (raw, schema_or_ref) in &components.schemas {
        if !options.admits(raw) {
            debug!("skipping {raw}: filtered by excludes/includes");
            continue;
        }
        let schema = match schema_or_ref {
            SchemaOrRef::Ref { ref_path } => {
                debug!("{raw} is a reference to {ref_path}; no model generated");
                continue;
            }
            SchemaOrRef::Schema(schema) => schema,
        };
        if is_primitive_schema(schema) {
            continue;
        }
        if schema.primary_type() == Some(SchemaType::Array) {
            warn!("{raw}: top-level array schemas have no model; reference the item type instead");
            continue;
        }
        match resolve_entity(raw, schema, &known_types) {
            Ok(entity) => match claimed.get(entity.name()) {
                Some(first) => models.failures.push(DefinitionError::new(
                    raw.as_str(),
                    DefinitionErrorKind::NameCollision {
                        name: entity.name().to_string(),
                        first: first.clone(),
                    },
                )),
                None => {
                    claimed.insert(entity.name().to_string(), raw.clone());
                    models.items.push(entity);
                }
            },
            Err(err) => models.failures.push(err),
        }
    }

    link_interfaces(&mut models.items);

    Ok(ModelResolution {
        known_types,
        models,
    })
}

/// Resolve one named component schema into a model.
pub fn resolve_entity(
    raw: &str,
    schema: &Schema,
    known: &KnownTypes,
) -> Result<ModelEntity, DefinitionError> {
    if !schema.one_of.is_empty() {
        return resolve_interface(raw, schema, known).map(ModelEntity::Interface);
    }
    resolve_object(raw, schema, known).map(ModelEntity::Object)
}

fn resolve_interface(
    raw: &str,
    schema: &Schema,
    known: &KnownTypes,
) -> Result<InterfaceModel, DefinitionError> {
    let fail = |kind| DefinitionError::new(raw, kind);
    let discriminator = schema.discriminator.as_ref().ok_or_else(|| {
        fail(DefinitionErrorKind::UnsupportedSchema(
            "oneOf requires a discriminator".to_string(),
        ))
    })?;

    let wire_values = invert_mapping(&discriminator.mapping);
    let mut children = Vec::new();
    let mut mapping = IndexMap::new();
    for member in &schema.one_of {
        match member {
            SchemaOrRef::Ref { ref_path } => {
                let child = match known.resolve(ref_path) {
                    ResolvedRef::Entity(name) => name,
                    ResolvedRef::Alias(_) => {
                        return Err(fail(DefinitionErrorKind::UnsupportedSchema(format!(
                            "oneOf member {ref_path} is a primitive alias"
                        ))));
                    }
                };
                let target = ref_name(ref_path);
                let wire = wire_values
                    .get(target)
                    .cloned()
                    .unwrap_or_else(|| target.to_string());
                mapping.insert(wire, child.clone());
                children.push(child);
            }
            SchemaOrRef::Schema(inline) if inline.is_required_only() => {
                debug!("{raw}: skipping oneOf member that only lists required properties");
            }
            SchemaOrRef::Schema(_) => {
                return Err(fail(DefinitionErrorKind::UnsupportedSchema(
                    "oneOf members must be references".to_string(),
                )));
            }
        }
    }

    Ok(InterfaceModel {
        raw_name: raw.to_string(),
        name: known.naming().class_name(raw),
        description: schema.description.clone(),
        children,
        discriminator: to_identifier(&discriminator.property_name),
        mapping,
    })
}

/// Discriminator mappings go wire value to `$ref`; the resolvers look them
/// up the other way, by the referenced schema's bare name.
pub(crate) fn invert_mapping(mapping: &IndexMap<String, String>) -> IndexMap<String, String> {
    mapping
        .iter()
        .map(|(wire, target)| (ref_name(target).to_string(), wire.clone()))
        .collect()
}

fn resolve_object(
    raw: &str,
    schema: &Schema,
    known: &KnownTypes,
) -> Result<ObjectModel, DefinitionError> {
    let fail = |kind| DefinitionError::new(raw, kind);
    let empty = Schema::default();

    let mut parent = None;
    let mut body = schema;
    if !schema.all_of.is_empty() {
        let mut inline: Option<&Schema> = None;
        for member in &schema.all_of {
            match member {
                SchemaOrRef::Ref { ref_path } => {
                    if parent.is_some() {
                        return Err(fail(DefinitionErrorKind::AmbiguousInheritance(
                            "allOf lists more than one $ref".to_string(),
                        )));
                    }
                    match known.resolve(ref_path) {
                        ResolvedRef::Entity(name) => parent = Some(name),
                        ResolvedRef::Alias(_) => {
                            return Err(fail(DefinitionErrorKind::UnsupportedSchema(format!(
                                "cannot inherit from primitive alias {ref_path}"
                            ))));
                        }
                    }
                }
                SchemaOrRef::Schema(member)
                    if member.schema_type.is_some() || !member.properties.is_empty() =>
                {
                    if inline.is_some() {
                        return Err(fail(DefinitionErrorKind::AmbiguousInheritance(
                            "allOf lists more than one inline schema".to_string(),
                        )));
                    }
                    inline = Some(&**member);
                }
                SchemaOrRef::Schema(_) => {}
            }
        }
        if !schema.properties.is_empty() {
            warn!("{raw}: properties next to allOf are ignored; move them into the allOf member");
        }
        body = match inline {
            Some(member) => member,
            None => {
                warn!("{raw}: allOf has no inline member, generating a class without properties");
                &empty
            }
        };
    }

    let mut properties = Vec::with_capacity(body.properties.len());
    let mut capabilities = BTreeSet::new();
    for (name, prop) in &body.properties {
        let property = resolve_property(name, prop, body.is_required(name), known)
            .map_err(|kind| DefinitionError::new(format!("{raw}.{name}"), kind))?;
        capabilities.extend(property_capabilities(&property));
        properties.push(property);
    }

    Ok(ObjectModel {
        raw_name: raw.to_string(),
        name: known.naming().class_name(raw),
        description: schema.description.clone().or_else(|| body.description.clone()),
        properties,
        parent,
        interfaces: Vec::new(),
        capabilities,
    })
}

fn property_capabilities(property: &Property) -> impl Iterator<Item = Capability> {
    [
        (property.is_list || property.is_map()).then_some(Capability::Collections),
        property.enum_table.is_some().then_some(Capability::Immutable),
        property.is_date.then_some(Capability::DateConverter),
    ]
    .into_iter()
    .flatten()
}

/// Append every interface to the members of its union, in model order.
fn link_interfaces(models: &mut [ModelEntity]) {
    let memberships: Vec<(String, Vec<String>)> = models
        .iter()
        .filter_map(ModelEntity::as_interface)
        .map(|i| (i.name.clone(), i.children.clone()))
        .collect();

    for (interface, children) in memberships {
        for model in models.iter_mut() {
            if let ModelEntity::Object(object) = model {
                if children.contains(&object.name) && !object.interfaces.contains(&interface) {
                    object.interfaces.push(interface.clone());
                }
            }
        }
    }
}

/// Resolve one property following the precedence: reference, single-member
/// union, array, map, scalar.
pub fn resolve_property(
    name: &str,
    schema_or_ref: &SchemaOrRef,
    required: bool,
    known: &KnownTypes,
) -> Result<Property, DefinitionErrorKind> {
    let schema = match schema_or_ref {
        SchemaOrRef::Ref { ref_path } => {
            return reference_property(name, ref_path, required, false, None, known);
        }
        SchemaOrRef::Schema(schema) => &**schema,
    };

    // A wrapped reference takes its nullability from the wrapper.
    let nullable = schema.is_nullable();
    if !schema.any_of.is_empty() {
        return match schema.any_of.as_slice() {
            [SchemaOrRef::Ref { ref_path }] => reference_property(
                name,
                ref_path,
                required,
                nullable,
                schema.description.clone(),
                known,
            ),
            _ => Err(DefinitionErrorKind::UnsupportedSchema(
                "anyOf must contain exactly one $ref".to_string(),
            )),
        };
    }
    if !schema.all_of.is_empty() {
        // A lone `$ref` wrapped in allOf is how documents attach a description to a reference.
        return match schema.all_of.as_slice() {
            [SchemaOrRef::Ref { ref_path }] => reference_property(
                name,
                ref_path,
                required,
                nullable,
                schema.description.clone(),
                known,
            ),
            _ => Err(DefinitionErrorKind::UnsupportedNesting(
                "inline allOf; declare the combined schema under components".to_string(),
            )),
        };
    }
    if !schema.one_of.is_empty() {
        return Err(DefinitionErrorKind::UnsupportedNesting(
            "inline oneOf; declare the union under components".to_string(),
        ));
    }

    inline_property(name, schema, required, false, None, known)
}

/// `site_nullable` is the `nullable` flag of the schema wrapping the
/// reference, if any.
fn reference_property(
    name: &str,
    ref_path: &str,
    required: bool,
    site_nullable: bool,
    description: Option<String>,
    known: &KnownTypes,
) -> Result<Property, DefinitionErrorKind> {
    match known.resolve(ref_path) {
        ResolvedRef::Alias(body) => {
            inline_property(name, body, required, site_nullable, description, known)
        }
        ResolvedRef::Entity(type_name) => Ok(Property {
            name: name.to_string(),
            type_ref: TypeRef::Entity(type_name),
            is_list: false,
            is_required: required,
            nullable: !required || site_nullable,
            is_date: false,
            is_basic_type: false,
            default: Some(if required {
                DefaultValue::NewInstance
            } else {
                DefaultValue::Null
            }),
            enum_table: None,
            description,
        }),
    }
}

fn inline_property(
    name: &str,
    schema: &Schema,
    required: bool,
    site_nullable: bool,
    description: Option<String>,
    known: &KnownTypes,
) -> Result<Property, DefinitionErrorKind> {
    let description = description.or_else(|| schema.description.clone());
    let nullable = site_nullable || schema.is_nullable();

    match schema.primary_type() {
        Some(SchemaType::Array) => {
            let items = schema.items.as_deref().ok_or_else(|| {
                DefinitionErrorKind::UnsupportedNesting("array without items".to_string())
            })?;
            let item = element_type(items, nullable, known).ok_or_else(|| {
                DefinitionErrorKind::UnsupportedNesting(
                    "array items must be a $ref or a primitive".to_string(),
                )
            })?;
            Ok(Property {
                name: name.to_string(),
                is_basic_type: item.is_scalar(),
                type_ref: TypeRef::list(item),
                is_list: true,
                is_required: required,
                nullable,
                is_date: false,
                default: Some(DefaultValue::EmptyList),
                enum_table: None,
                description,
            })
        }
        Some(SchemaType::Object) => {
            if !schema.properties.is_empty() {
                return Err(DefinitionErrorKind::UnsupportedNesting(
                    "inline object properties; declare the object under components".to_string(),
                ));
            }
            let Some(AdditionalProperties::Schema(values)) = &schema.additional_properties else {
                return Err(DefinitionErrorKind::UnsupportedNesting(
                    "object properties need an additionalProperties schema".to_string(),
                ));
            };
            let value = element_type(values, nullable, known).ok_or_else(|| {
                DefinitionErrorKind::UnsupportedNesting(
                    "additionalProperties must be a $ref or a primitive".to_string(),
                )
            })?;
            Ok(Property {
                name: name.to_string(),
                is_basic_type: value.is_scalar(),
                type_ref: TypeRef::map(value),
                is_list: false,
                is_required: required,
                nullable,
                is_date: false,
                default: Some(DefaultValue::EmptyMap),
                enum_table: None,
                description,
            })
        }
        _ if !schema.properties.is_empty() => Err(DefinitionErrorKind::UnsupportedNesting(
            "inline object properties; declare the object under components".to_string(),
        )),
        _ => {
            let scalar = schema_scalar(schema)?;
            let default = match &schema.default_value {
                Some(value) => Some(default_literal(value)?),
                None if nullable || !required => Some(DefaultValue::Null),
                None => None,
            };
            let marked = nullable && default == Some(DefaultValue::Null);
            let enum_table = (!schema.enum_values.is_empty() && scalar.supports_enum())
                .then(|| enum_table(name, &schema.enum_values))
                .transpose()?;
            Ok(Property {
                name: name.to_string(),
                type_ref: TypeRef::Scalar {
                    scalar,
                    nullable: marked,
                },
                is_list: false,
                is_required: required,
                nullable,
                is_date: is_date_schema(schema),
                is_basic_type: true,
                default,
                enum_table,
                description,
            })
        }
    }
}

/// The element type of a list or map: a reference or a primitive. Anything
/// else has no element type.
pub(crate) fn element_type(
    schema_or_ref: &SchemaOrRef,
    nullable: bool,
    known: &KnownTypes,
) -> Option<TypeRef> {
    let schema = match schema_or_ref {
        SchemaOrRef::Ref { ref_path } => match known.resolve(ref_path) {
            ResolvedRef::Entity(name) => return Some(TypeRef::Entity(name)),
            ResolvedRef::Alias(body) => body,
        },
        SchemaOrRef::Schema(schema) => &**schema,
    };
    if !is_primitive_schema(schema) {
        return None;
    }
    let scalar = schema_scalar(schema).ok()?;
    Some(TypeRef::Scalar { scalar, nullable })
}

fn default_literal(value: &Value) -> Result<DefaultValue, DefinitionErrorKind> {
    match value {
        Value::Null => Ok(DefaultValue::Null),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            Ok(DefaultValue::Literal(scalar_literal(value)))
        }
        Value::Array(_) | Value::Object(_) => Err(DefinitionErrorKind::UnsupportedSchema(
            "default of a scalar must be a scalar".to_string(),
        )),
    }
}

/// Render a JSON scalar as a C-family literal.
fn scalar_literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Constants for every enum value. Two values whose names only differ in
/// characters the sanitizer replaces cannot both become constants.
fn enum_table(property: &str, values: &[Value]) -> Result<EnumTable, DefinitionErrorKind> {
    let prefix = to_identifier(property);
    let mut constants: Vec<EnumConstant> = Vec::with_capacity(values.len());
    for value in values {
        let segment = match value {
            Value::Null => "Null".to_string(),
            Value::String(s) => capitalize_first(s),
            other => capitalize_first(&other.to_string()),
        };
        let constant = EnumConstant {
            name: sanitize_identifier(&format!("{prefix}{segment}Value")),
            literal: scalar_literal(value),
        };
        if let Some(clash) = constants.iter().find(|c| c.name == constant.name) {
            return Err(DefinitionErrorKind::UnsupportedSchema(format!(
                "enum values {} and {} both map to the constant {}",
                clash.literal, constant.literal, constant.name
            )));
        }
        constants.push(constant);
    }
    Ok(EnumTable {
        constants,
        allowed_values_name: format!("AllowedValuesFor{prefix}"),
    })
}
