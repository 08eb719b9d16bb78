use std::fs;

use oafn_core::error::{ParseError, ResolveError};
use oafn_core::ir::HttpMethod;
use oafn_core::parse;
use oafn_core::parse::ref_resolve::RefResolver;
use oafn_core::transform::{ModelOptions, resolve_models};

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

#[test]
fn parse_petstore() {
    let spec = parse::from_yaml(PETSTORE).expect("should parse petstore.yaml");
    assert_eq!(spec.openapi, "3.0.3");
    assert_eq!(spec.info.title, "Petstore");

    let paths = spec.paths.as_ref().unwrap();
    assert_eq!(paths.len(), 4);
    let pet = &paths["/pets/{petId}/"];
    let methods: Vec<_> = pet.operations.iter().map(|(m, _)| *m).collect();
    assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Put, HttpMethod::Delete]);
    assert_eq!(pet.parameters.len(), 1);
}

#[test]
fn rejects_swagger_2() {
    let err = parse::from_yaml("openapi: 2.0.0\ninfo: { title: t, version: '1' }\n").unwrap_err();
    assert!(matches!(err, ParseError::UnsupportedVersion(v) if v == "2.0.0"));
}

#[test]
fn loads_json_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("api.json");
    fs::write(
        &path,
        r#"{"openapi": "3.1.0", "info": {"title": "J", "version": "1"}, "paths": {}}"#,
    )
    .unwrap();
    let spec = parse::load(&path).unwrap();
    assert_eq!(spec.info.title, "J");
}

#[test]
fn bundles_external_schemas_transitively() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("shared")).unwrap();
    fs::write(
        dir.path().join("api.yml"),
        r#"
openapi: 3.0.0
info: { title: t, version: '1' }
paths: {}
components:
  schemas:
    Order:
      type: object
      properties:
        customer: { $ref: 'shared/common.yml#/components/schemas/Customer' }
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("shared/common.yml"),
        r#"
components:
  schemas:
    Customer:
      type: object
      properties:
        address: { $ref: '#/components/schemas/Address' }
        tag: { $ref: 'tag.yml' }
    Address:
      type: object
      properties:
        street: { type: string }
"#,
    )
    .unwrap();
    fs::write(dir.path().join("shared/tag.yml"), "type: string\n").unwrap();

    let path = dir.path().join("api.yml");
    let spec = parse::load(&path).unwrap();
    let spec = RefResolver::for_spec_file(&path).resolve_spec(&spec).unwrap();

    let schemas = &spec.components.as_ref().unwrap().schemas;
    let keys: Vec<_> = schemas.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Order", "Address", "tag", "Customer"]);

    let order = schemas["Order"].as_schema().unwrap();
    assert_eq!(
        order.properties["customer"].as_ref_path(),
        Some("#/components/schemas/Customer")
    );

    let models = resolve_models(&spec, &ModelOptions::default()).unwrap();
    assert!(models.models.is_clean());
    assert!(models.known_types.is_alias("Tag"));
}

#[test]
fn remote_references_are_rejected() {
    let spec = parse::from_yaml(
        r#"
openapi: 3.0.0
info: { title: t, version: '1' }
components:
  schemas:
    A: { $ref: 'https://example.com/a.yml#/A' }
"#,
    )
    .unwrap();
    let err = RefResolver::new(".").resolve_spec(&spec).unwrap_err();
    assert!(matches!(err, ResolveError::RemoteRef(_)));
}

#[test]
fn circular_response_references_are_detected() {
    let spec = parse::from_yaml(
        r#"
openapi: 3.0.0
info: { title: t, version: '1' }
paths:
  /a:
    get:
      operationId: a
      responses:
        '200': { $ref: '#/components/responses/One' }
components:
  responses:
    One: { $ref: '#/components/responses/Two' }
    Two: { $ref: '#/components/responses/One' }
"#,
    )
    .unwrap();
    let err = RefResolver::new(".").resolve_spec(&spec).unwrap_err();
    assert!(matches!(err, ResolveError::CircularRef(_)));
}
