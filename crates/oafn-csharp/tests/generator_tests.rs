use std::path::{Path, PathBuf};

use oafn_core::config::{FunctionTarget, ModelTarget};
use oafn_core::ir::{Endpoint, ModelEntity};
use oafn_core::parse;
use oafn_core::parse::ref_resolve::RefResolver;
use oafn_core::transform::{ModelOptions, Naming, resolve_endpoints, resolve_models};
use oafn_core::{CodeGenerator, GeneratedFile};
use oafn_csharp::CSharpGenerator;

const PETSTORE: &str = include_str!("../../oafn-core/tests/fixtures/petstore.yaml");

fn resolve() -> (Vec<ModelEntity>, Vec<Endpoint>) {
    let spec = parse::from_yaml(PETSTORE).unwrap();
    let spec = RefResolver::new(".").resolve_spec(&spec).unwrap();
    let models = resolve_models(&spec, &ModelOptions::default()).unwrap();
    let endpoints = resolve_endpoints(&spec, &models.known_types).unwrap();
    (models.models.items, endpoints.items)
}

fn model_target(version: u8) -> ModelTarget {
    ModelTarget {
        namespace: "Pets.Model".to_string(),
        target_folder: PathBuf::from("out/Model"),
        naming: Naming::default(),
        excludes: Vec::new(),
        includes: Vec::new(),
        imports: Vec::new(),
        version,
    }
}

fn function_target(version: u8) -> FunctionTarget {
    FunctionTarget {
        name: "Pets".to_string(),
        namespace: "Pets".to_string(),
        target_folder: PathBuf::from("out"),
        functions_name: "PetsFunctions".to_string(),
        interface_name: "IPetsService".to_string(),
        interface_namespace: "Pets.Interfaces".to_string(),
        interface_target_folder: PathBuf::from("out/Interfaces"),
        boilerplate: "{BASE}".to_string(),
        imports: vec!["Pets.Model".to_string()],
        naming: Naming::default(),
        version,
    }
}

fn file<'a>(files: &'a [GeneratedFile], path: &str) -> &'a str {
    files
        .iter()
        .find(|f| f.path == Path::new(path))
        .map(|f| f.content.as_str())
        .unwrap_or_else(|| panic!("no file {path}"))
}

#[test]
fn one_model_file_per_entity_plus_the_date_converter() {
    let (models, _) = resolve();
    let refs: Vec<&ModelEntity> = models.iter().collect();
    let files = CSharpGenerator.generate_models(&refs, &model_target(3)).unwrap();

    let paths: Vec<_> = files.iter().map(|f| f.path.to_string_lossy().into_owned()).collect();
    assert_eq!(
        paths,
        vec![
            "out/Model/Base.generated.cs",
            "out/Model/Child.generated.cs",
            "out/Model/Cat.generated.cs",
            "out/Model/Dog.generated.cs",
            "out/Model/Animal.generated.cs",
            "out/Model/CustomJsonDateConverter.generated.cs",
        ]
    );
}

#[test]
fn object_models_render_inheritance_and_attributes() {
    let (models, _) = resolve();
    let refs: Vec<&ModelEntity> = models.iter().collect();
    let files = CSharpGenerator.generate_models(&refs, &model_target(3)).unwrap();

    let child = file(&files, "out/Model/Child.generated.cs");
    assert!(child.contains("namespace Pets.Model {"));
    assert!(child.contains("public partial class Child : Base {"));
    assert!(child.contains("public const string ChildObjectName = \"Child\";"));
    assert!(child.contains("[JsonProperty(\"name\", Required = Required.Always)]"));
    assert!(child.contains("[JsonConverter(typeof(CustomJsonDateConverter))]"));
    assert!(child.contains("UpdateWithBase(other);"));
    assert!(child.contains("using System.Collections.Immutable;"));
    assert!(child.contains("MergeWithChild(JToken other"));

    let cat = file(&files, "out/Model/Cat.generated.cs");
    assert!(cat.contains("public partial class Cat : Animal {"));

    let animal = file(&files, "out/Model/Animal.generated.cs");
    assert!(animal.contains("public partial interface Animal {"));
    assert!(animal.contains("\"dog\" => Dog"));
}

#[test]
fn version_one_models_have_no_merge_helpers() {
    let (models, _) = resolve();
    let refs: Vec<&ModelEntity> = models.iter().collect();
    let files = CSharpGenerator.generate_models(&refs, &model_target(1)).unwrap();

    let child = file(&files, "out/Model/Child.generated.cs");
    assert!(child.contains("public void UpdateWithChild(Child other)"));
    assert!(!child.contains("MergeWith"));
}

#[test]
fn typed_service_interface() {
    let (_, endpoints) = resolve();
    let files = CSharpGenerator
        .generate_functions(&endpoints, &function_target(3))
        .unwrap();

    let service = file(&files, "out/Interfaces/IPetsService.generated.cs");
    assert!(service.contains("namespace Pets.Interfaces {"));
    assert!(service.contains("public interface IPetsService {"));
    assert!(service.contains("Task<Animal> GetPetAsync(long petId);"));
    assert!(service.contains("Task<AnimalResultWrapper> PutPetAsync(long petId, Cat payload);"));
    assert!(service.contains("Task<AnimalResultWrapper> PutPetAsync(long petId, Dog payload);"));
    assert!(service.contains("Task DeletePetAsync(long petId);"));
    assert!(service.contains("Task<IActionResult> ListPetsAsync();"));
    assert!(service.contains("Task<Child> CreatePetAsync(Child payload);"));
    assert!(service.contains("/// Fetch one pet."));
    assert!(service.contains("/// 404 -> not found"));

    let wrapper = file(&files, "out/Interfaces/AnimalResultWrapper.generated.cs");
    assert!(wrapper.contains("public partial class AnimalResultWrapper"));
    assert!(wrapper.contains("Code200 = 200,"));
    assert!(wrapper.contains("Code201 = 201\n"));
}

#[test]
fn typed_functions_class() {
    let (_, endpoints) = resolve();
    let files = CSharpGenerator
        .generate_functions(&endpoints, &function_target(3))
        .unwrap();

    let functions = file(&files, "out/PetsFunctions.generated.cs");
    assert!(functions.contains("using Pets.Model;"));
    assert!(functions.contains("using Pets.Interfaces;"));
    assert!(functions.contains("public class PetsFunctions"));
    assert!(functions.contains("[FunctionName(\"GetPetAsync\")]"));
    assert!(functions.contains("\"get\", Route = \"pets/{petId}\""));
    assert!(functions.contains("HttpRequest request, long petId)"));
    assert!(functions.contains("var result = await _service.GetPetAsync(petId);"));
    assert!(functions.contains("return new JsonResult(result) { StatusCode = 200 };"));
    assert!(functions.contains("switch (jObject[\"kind\"]?.ToString())"));
    assert!(functions.contains("await _service.PutPetAsync(petId, ToObject<Cat>(jObject));"));
    assert!(functions.contains("return new StatusCodeResult(204);"));
    assert!(functions.contains(
        "await _service.CreatePetAsync(await ParseJson<Child>(request.Body));"
    ));
    assert!(functions.contains("catch (BadHttpRequestException err)"));
}

#[test]
fn version_three_emits_client_errors() {
    let (_, endpoints) = resolve();
    let files = CSharpGenerator
        .generate_functions(&endpoints, &function_target(3))
        .unwrap();

    let base = file(&files, "out/Errors/ClientError.generated.cs");
    assert!(base.contains("namespace Pets.Errors"));
    assert!(base.contains("public abstract class ClientError : Exception"));
    assert!(base.contains("public abstract IActionResult Result { get; }"));

    let not_found = file(&files, "out/Errors/Generic404ClientError.generated.cs");
    assert!(not_found.contains("public class Generic404ClientError : ClientError"));
    assert!(not_found.contains("new StatusCodeResult(404)"));

    let functions = file(&files, "out/PetsFunctions.generated.cs");
    assert!(functions.contains("using Pets.Errors;"));
    assert!(functions.contains("catch (ClientError err) {\n                return err.Result;"));
}

#[test]
fn version_two_passes_the_request_through() {
    let (_, endpoints) = resolve();
    let files = CSharpGenerator
        .generate_functions(&endpoints, &function_target(2))
        .unwrap();

    let service = file(&files, "out/Interfaces/IPetsService.generated.cs");
    assert!(service.contains("Task<IActionResult> DeletePetAsync(long petId, HttpRequest request);"));
    assert!(!files.iter().any(|f| f.path.ends_with("AnimalResultWrapper.generated.cs")));

    let functions = file(&files, "out/PetsFunctions.generated.cs");
    assert!(functions.contains("return await _service.DeletePetAsync(petId, request);"));
    assert!(!functions.contains("BadHttpRequestException err"));
    assert!(!functions.contains("ClientError"));
    assert!(!files.iter().any(|f| f.path.starts_with("out/Errors")));
}

#[test]
fn version_one_uses_a_static_service_accessor() {
    let (_, endpoints) = resolve();
    let files = CSharpGenerator
        .generate_functions(&endpoints, &function_target(1))
        .unwrap();
    assert_eq!(files.len(), 2);

    let service = file(&files, "out/Interfaces/IPetsService.generated.cs");
    assert!(service.contains("Task<HttpResponseMessage> CreatePetAsync(HttpContent contentPayload);"));

    let functions = file(&files, "out/PetsFunctions.generated.cs");
    assert!(functions.contains("public static partial class PetsFunctions"));
    assert!(functions.contains("public static partial IPetsService Service(HttpRequestMessage req, ILogger log);"));
    assert!(functions.contains("return await Service(req, log).CreatePetAsync(req.Content);"));
}

#[test]
fn boilerplate_wraps_every_body() {
    let (_, endpoints) = resolve();
    let mut target = function_target(3);
    target.boilerplate = "using (Metrics.Time())\n{\n    {BASE}\n}".to_string();
    let files = CSharpGenerator.generate_functions(&endpoints, &target).unwrap();

    let functions = file(&files, "out/PetsFunctions.generated.cs");
    assert_eq!(functions.matches("using (Metrics.Time())").count(), 5);
}

#[test]
fn rendering_is_deterministic() {
    let render = || {
        let (models, endpoints) = resolve();
        let refs: Vec<&ModelEntity> = models.iter().collect();
        let mut files = CSharpGenerator.generate_models(&refs, &model_target(3)).unwrap();
        files.extend(
            CSharpGenerator
                .generate_functions(&endpoints, &function_target(3))
                .unwrap(),
        );
        files
    };
    assert_eq!(render(), render());
}
