use indexmap::IndexMap;
use log::debug;

use crate::error::DefinitionErrorKind;
use crate::ir::{BodySummary, TypeRef};
use crate::parse::media_type::MediaType;
use crate::parse::schema::{Schema, SchemaOrRef, SchemaType};

use super::known_types::{KnownTypes, ResolvedRef};
use super::schema_resolver::{element_type, invert_mapping};
use super::type_converter::{is_primitive_schema, ref_name, schema_scalar};

pub const JSON_MEDIA_TYPE: &str = "application/json";

/// The schema of a content block, which must declare exactly one media type
/// and that one JSON. An empty block has no schema.
pub fn json_schema(
    content: &IndexMap<String, MediaType>,
) -> Result<Option<&SchemaOrRef>, DefinitionErrorKind> {
    let mut entries = content.iter();
    let (media_type, media) = match (entries.next(), entries.next()) {
        (None, _) => return Ok(None),
        (Some(entry), None) => entry,
        (Some(_), Some(_)) => {
            let declared: Vec<&str> = content.keys().map(String::as_str).collect();
            return Err(DefinitionErrorKind::UnsupportedMediaType(format!(
                "expected a single media type, found {}",
                declared.join(", ")
            )));
        }
    };
    if !media_type.eq_ignore_ascii_case(JSON_MEDIA_TYPE) {
        return Err(DefinitionErrorKind::UnsupportedMediaType(format!(
            "only {JSON_MEDIA_TYPE} is supported, found {media_type}"
        )));
    }
    Ok(media.schema.as_ref())
}

/// Resolve a response or simple body content block to its type.
pub fn resolve_content_type(
    content: &IndexMap<String, MediaType>,
    known: &KnownTypes,
) -> Result<Option<TypeRef>, DefinitionErrorKind> {
    match json_schema(content)? {
        Some(schema) => resolve_element(schema, known).map(Some),
        None => Ok(None),
    }
}

/// A body or response element: a reference, a primitive, or an array of
/// either.
pub fn resolve_element(
    schema_or_ref: &SchemaOrRef,
    known: &KnownTypes,
) -> Result<TypeRef, DefinitionErrorKind> {
    let schema = match schema_or_ref {
        SchemaOrRef::Ref { ref_path } => match known.resolve(ref_path) {
            ResolvedRef::Entity(name) => return Ok(TypeRef::Entity(name)),
            ResolvedRef::Alias(body) => body,
        },
        SchemaOrRef::Schema(schema) => &**schema,
    };

    if is_primitive_schema(schema) {
        return Ok(TypeRef::scalar(schema_scalar(schema)?));
    }
    if schema.primary_type() == Some(SchemaType::Array) {
        if let Some(item) = schema
            .items
            .as_deref()
            .and_then(|items| element_type(items, false, known))
        {
            return Ok(TypeRef::list(item));
        }
    }
    Err(DefinitionErrorKind::UnsupportedBodyShape(
        "expected a $ref, a primitive, or an array of either".to_string(),
    ))
}

/// Resolve a request body content block. A discriminated `oneOf`, inline or
/// behind a `$ref`, becomes a union the body is dispatched over.
pub fn resolve_body(
    content: &IndexMap<String, MediaType>,
    schemas: &IndexMap<String, SchemaOrRef>,
    known: &KnownTypes,
) -> Result<Option<BodySummary>, DefinitionErrorKind> {
    let Some(schema_or_ref) = json_schema(content)? else {
        return Ok(None);
    };

    if let Some(union) = union_schema(schema_or_ref, schemas) {
        return resolve_union(union, known).map(Some);
    }

    let type_ref = resolve_element(schema_or_ref, known)?;
    Ok(Some(BodySummary::Simple { type_ref }))
}

fn union_schema<'a>(
    schema_or_ref: &'a SchemaOrRef,
    schemas: &'a IndexMap<String, SchemaOrRef>,
) -> Option<&'a Schema> {
    let schema = match schema_or_ref {
        SchemaOrRef::Ref { ref_path } => schemas.get(ref_name(ref_path))?.as_schema()?,
        SchemaOrRef::Schema(schema) => &**schema,
    };
    (!schema.one_of.is_empty()).then_some(schema)
}

fn resolve_union(schema: &Schema, known: &KnownTypes) -> Result<BodySummary, DefinitionErrorKind> {
    let discriminator = schema.discriminator.as_ref().ok_or_else(|| {
        DefinitionErrorKind::UnsupportedBodyShape(
            "oneOf body without a discriminator cannot be dispatched".to_string(),
        )
    })?;

    let wire_values = invert_mapping(&discriminator.mapping);
    let mut candidates = Vec::new();
    let mut mapping = IndexMap::new();
    for member in &schema.one_of {
        let ref_path = match member {
            SchemaOrRef::Ref { ref_path } => ref_path,
            SchemaOrRef::Schema(inline) if inline.is_required_only() => {
                debug!("skipping oneOf body member that only lists required properties");
                continue;
            }
            SchemaOrRef::Schema(_) => {
                return Err(DefinitionErrorKind::UnsupportedBodyShape(
                    "oneOf body members must be references".to_string(),
                ));
            }
        };
        let ResolvedRef::Entity(candidate) = known.resolve(ref_path) else {
            return Err(DefinitionErrorKind::UnsupportedBodyShape(format!(
                "oneOf body member {ref_path} is a primitive alias"
            )));
        };
        let target = ref_name(ref_path);
        let wire = wire_values
            .get(target)
            .cloned()
            .unwrap_or_else(|| target.to_string());
        mapping.insert(wire, candidate.clone());
        candidates.push(candidate);
    }

    Ok(BodySummary::DiscriminatedUnion {
        candidates,
        mapping,
        discriminator: discriminator.property_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ScalarType;

    fn content(yaml: &str) -> IndexMap<String, MediaType> {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn single_json_media_type_is_required() {
        let two = content(
            r#"
application/json: { schema: { type: string } }
application/xml: { schema: { type: string } }
"#,
        );
        assert!(matches!(
            json_schema(&two),
            Err(DefinitionErrorKind::UnsupportedMediaType(_))
        ));

        let text = content("text/plain: { schema: { type: string } }\n");
        assert!(matches!(
            json_schema(&text),
            Err(DefinitionErrorKind::UnsupportedMediaType(_))
        ));

        let upper = content("Application/JSON: { schema: { type: string } }\n");
        assert!(json_schema(&upper).unwrap().is_some());
    }

    #[test]
    fn arrays_of_references_become_lists() {
        let c = content(
            "application/json: { schema: { type: array, items: { $ref: '#/components/schemas/Pet' } } }\n",
        );
        let t = resolve_content_type(&c, &KnownTypes::default()).unwrap();
        assert_eq!(t, Some(TypeRef::list(TypeRef::entity("Pet"))));
    }

    #[test]
    fn primitive_content() {
        let c = content("application/json: { schema: { type: integer, format: int64 } }\n");
        let t = resolve_content_type(&c, &KnownTypes::default()).unwrap();
        assert_eq!(t, Some(TypeRef::scalar(ScalarType::Long)));
    }

    #[test]
    fn inline_objects_are_rejected() {
        let c = content(
            "application/json: { schema: { type: object, properties: { a: { type: string } } } }\n",
        );
        assert!(matches!(
            resolve_content_type(&c, &KnownTypes::default()),
            Err(DefinitionErrorKind::UnsupportedBodyShape(_))
        ));
    }

    #[test]
    fn union_without_discriminator_is_rejected() {
        let c = content(
            r#"
application/json:
  schema:
    oneOf:
      - $ref: '#/components/schemas/Cat'
      - $ref: '#/components/schemas/Dog'
"#,
        );
        let err = resolve_body(&c, &IndexMap::new(), &KnownTypes::default()).unwrap_err();
        assert!(matches!(err, DefinitionErrorKind::UnsupportedBodyShape(_)));
    }
}
