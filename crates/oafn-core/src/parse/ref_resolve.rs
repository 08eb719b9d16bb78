use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, warn};

use super::components::Components;
use super::media_type::MediaType;
use super::parameter::{Parameter, ParameterOrRef};
use super::request_body::{RequestBody, RequestBodyOrRef};
use super::response::{Response, ResponseOrRef};
use super::schema::{AdditionalProperties, Schema, SchemaOrRef};
use super::spec::OpenApiSpec;
use crate::error::ResolveError;

/// Prepares a parsed spec for the resolvers.
///
/// Schema references that point into other files are bundled into
/// `components.schemas` and rewritten to local references, transitively.
/// Local schema references are kept, since class names are derived from
/// them. Parameter, request body and response references are inlined.
pub struct RefResolver {
    base_dir: PathBuf,
    documents: HashMap<PathBuf, serde_json::Value>,
    imported: HashSet<(PathBuf, String)>,
}

/// Where a reference was found: the root document or an external file.
struct Origin {
    dir: PathBuf,
    file: Option<PathBuf>,
}

impl RefResolver {
    /// Resolve relative file references against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            documents: HashMap::new(),
            imported: HashSet::new(),
        }
    }

    /// Resolve relative file references against the directory of `spec_path`.
    pub fn for_spec_file(spec_path: &Path) -> Self {
        let dir = spec_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Self::new(dir)
    }

    pub fn resolve_spec(&mut self, spec: &OpenApiSpec) -> Result<OpenApiSpec, ResolveError> {
        let mut resolved = spec.clone();
        self.bundle_external_schemas(&mut resolved)?;
        inline_components(&mut resolved)?;
        Ok(resolved)
    }

    fn bundle_external_schemas(&mut self, spec: &mut OpenApiSpec) -> Result<(), ResolveError> {
        let root = Origin {
            dir: self.base_dir.clone(),
            file: None,
        };
        let mut imports = IndexMap::new();

        if let Some(components) = spec.components.as_mut() {
            for schema in components.schemas.values_mut() {
                self.bundle(schema, &root, &mut imports)?;
            }
            for param in components.parameters.values_mut() {
                self.bundle_parameter(param, &root, &mut imports)?;
            }
            for body in components.request_bodies.values_mut() {
                if let RequestBodyOrRef::RequestBody(body) = body {
                    self.bundle_content(&mut body.content, &root, &mut imports)?;
                }
            }
            for response in components.responses.values_mut() {
                if let ResponseOrRef::Response(response) = response {
                    self.bundle_content(&mut response.content, &root, &mut imports)?;
                }
            }
        }

        if let Some(paths) = spec.paths.as_mut() {
            for item in paths.values_mut() {
                for param in &mut item.parameters {
                    self.bundle_parameter(param, &root, &mut imports)?;
                }
                for (_, op) in &mut item.operations {
                    for param in &mut op.parameters {
                        self.bundle_parameter(param, &root, &mut imports)?;
                    }
                    if let Some(RequestBodyOrRef::RequestBody(body)) = op.request_body.as_mut() {
                        self.bundle_content(&mut body.content, &root, &mut imports)?;
                    }
                    for response in op.responses.values_mut() {
                        if let ResponseOrRef::Response(response) = response {
                            self.bundle_content(&mut response.content, &root, &mut imports)?;
                        }
                    }
                }
            }
        }

        if imports.is_empty() {
            return Ok(());
        }
        let components = spec.components.get_or_insert_with(Components::default);
        for (name, schema) in imports {
            if components.schemas.contains_key(&name) {
                warn!("external schema {name} shadowed by a local schema of the same name");
                continue;
            }
            debug!("bundled external schema {name}");
            components.schemas.insert(name, schema);
        }
        Ok(())
    }

    fn bundle_parameter(
        &mut self,
        param: &mut ParameterOrRef,
        origin: &Origin,
        imports: &mut IndexMap<String, SchemaOrRef>,
    ) -> Result<(), ResolveError> {
        if let ParameterOrRef::Parameter(Parameter {
            schema: Some(schema),
            ..
        }) = param
        {
            self.bundle(schema, origin, imports)?;
        }
        Ok(())
    }

    fn bundle_content(
        &mut self,
        content: &mut IndexMap<String, MediaType>,
        origin: &Origin,
        imports: &mut IndexMap<String, SchemaOrRef>,
    ) -> Result<(), ResolveError> {
        for media in content.values_mut() {
            if let Some(schema) = media.schema.as_mut() {
                self.bundle(schema, origin, imports)?;
            }
        }
        Ok(())
    }

    fn bundle(
        &mut self,
        schema: &mut SchemaOrRef,
        origin: &Origin,
        imports: &mut IndexMap<String, SchemaOrRef>,
    ) -> Result<(), ResolveError> {
        match schema {
            SchemaOrRef::Ref { ref_path } => {
                if let Some(local) = self.import(ref_path, origin, imports)? {
                    *ref_path = local;
                }
                Ok(())
            }
            SchemaOrRef::Schema(inner) => self.bundle_nested(inner, origin, imports),
        }
    }

    fn bundle_nested(
        &mut self,
        schema: &mut Schema,
        origin: &Origin,
        imports: &mut IndexMap<String, SchemaOrRef>,
    ) -> Result<(), ResolveError> {
        for prop in schema.properties.values_mut() {
            self.bundle(prop, origin, imports)?;
        }
        if let Some(items) = schema.items.as_mut() {
            self.bundle(items, origin, imports)?;
        }
        if let Some(AdditionalProperties::Schema(value)) = schema.additional_properties.as_mut() {
            self.bundle(value, origin, imports)?;
        }
        for member in schema
            .all_of
            .iter_mut()
            .chain(schema.one_of.iter_mut())
            .chain(schema.any_of.iter_mut())
        {
            self.bundle(member, origin, imports)?;
        }
        Ok(())
    }

    /// Import the target of an external reference. Returns the local
    /// reference to rewrite to, or `None` for a reference that is already
    /// local to the root document.
    fn import(
        &mut self,
        ref_path: &str,
        origin: &Origin,
        imports: &mut IndexMap<String, SchemaOrRef>,
    ) -> Result<Option<String>, ResolveError> {
        let (file_part, pointer) = ref_path.split_once('#').unwrap_or((ref_path, ""));

        let file = if file_part.is_empty() {
            match &origin.file {
                None => return Ok(None),
                Some(file) => file.clone(),
            }
        } else if file_part.starts_with("http://") || file_part.starts_with("https://") {
            return Err(ResolveError::RemoteRef(ref_path.to_string()));
        } else {
            origin.dir.join(file_part)
        };

        let name = pointer
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
            .or_else(|| {
                file.file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
        let local = format!("#/components/schemas/{name}");

        if !self.imported.insert((file.clone(), pointer.to_string())) {
            return Ok(Some(local));
        }

        let document = self.document(&file)?;
        let target = if pointer.is_empty() {
            document.clone()
        } else {
            document
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))?
        };
        let mut schema: SchemaOrRef = serde_json::from_value(target)
            .map_err(|e| ResolveError::InvalidRefFormat(format!("{ref_path}: {e}")))?;

        let nested = Origin {
            dir: file.parent().unwrap_or(Path::new(".")).to_path_buf(),
            file: Some(file),
        };
        self.bundle(&mut schema, &nested, imports)?;

        if imports.contains_key(&name) {
            warn!("external schema {name} imported from more than one file, keeping the first");
        } else {
            imports.insert(name, schema);
        }
        Ok(Some(local))
    }

    fn document(&mut self, file: &Path) -> Result<&serde_json::Value, ResolveError> {
        if !self.documents.contains_key(file) {
            let value = super::load_value(file).map_err(Box::new)?;
            self.documents.insert(file.to_path_buf(), value);
        }
        Ok(&self.documents[file])
    }
}

fn inline_components(spec: &mut OpenApiSpec) -> Result<(), ResolveError> {
    let components = spec.components.clone().unwrap_or_default();
    let Some(paths) = spec.paths.as_mut() else {
        return Ok(());
    };

    for item in paths.values_mut() {
        inline_parameters(&mut item.parameters, &components)?;
        for (_, op) in &mut item.operations {
            inline_parameters(&mut op.parameters, &components)?;
            if let Some(body) = op.request_body.as_mut() {
                *body = RequestBodyOrRef::RequestBody(follow(body, &components)?);
            }
            for response in op.responses.values_mut() {
                *response = ResponseOrRef::Response(follow(response, &components)?);
            }
        }
    }
    Ok(())
}

fn inline_parameters(
    params: &mut [ParameterOrRef],
    components: &Components,
) -> Result<(), ResolveError> {
    for param in params {
        *param = ParameterOrRef::Parameter(follow(param, components)?);
    }
    Ok(())
}

/// A reusable component section whose entries are either inline or `$ref`.
trait ComponentRef: Sized {
    type Target: Clone;
    const SECTION: &'static str;

    fn ref_path(&self) -> Option<&str>;
    fn target(&self) -> Option<&Self::Target>;
    fn section(components: &Components) -> &IndexMap<String, Self>;
}

impl ComponentRef for ParameterOrRef {
    type Target = Parameter;
    const SECTION: &'static str = "parameters";

    fn ref_path(&self) -> Option<&str> {
        match self {
            Self::Ref { ref_path } => Some(ref_path),
            Self::Parameter(_) => None,
        }
    }

    fn target(&self) -> Option<&Parameter> {
        match self {
            Self::Ref { .. } => None,
            Self::Parameter(p) => Some(p),
        }
    }

    fn section(components: &Components) -> &IndexMap<String, Self> {
        &components.parameters
    }
}

impl ComponentRef for RequestBodyOrRef {
    type Target = RequestBody;
    const SECTION: &'static str = "requestBodies";

    fn ref_path(&self) -> Option<&str> {
        match self {
            Self::Ref { ref_path } => Some(ref_path),
            Self::RequestBody(_) => None,
        }
    }

    fn target(&self) -> Option<&RequestBody> {
        match self {
            Self::Ref { .. } => None,
            Self::RequestBody(b) => Some(b),
        }
    }

    fn section(components: &Components) -> &IndexMap<String, Self> {
        &components.request_bodies
    }
}

impl ComponentRef for ResponseOrRef {
    type Target = Response;
    const SECTION: &'static str = "responses";

    fn ref_path(&self) -> Option<&str> {
        match self {
            Self::Ref { ref_path } => Some(ref_path),
            Self::Response(_) => None,
        }
    }

    fn target(&self) -> Option<&Response> {
        match self {
            Self::Ref { .. } => None,
            Self::Response(r) => Some(r),
        }
    }

    fn section(components: &Components) -> &IndexMap<String, Self> {
        &components.responses
    }
}

/// Follow a chain of component references to the inline definition.
fn follow<T: ComponentRef>(entry: &T, components: &Components) -> Result<T::Target, ResolveError> {
    let mut current = entry;
    let mut seen = HashSet::new();
    loop {
        if let Some(target) = current.target() {
            return Ok(target.clone());
        }
        let ref_path = current.ref_path().unwrap_or_default();
        if !seen.insert(ref_path.to_string()) {
            return Err(ResolveError::CircularRef(ref_path.to_string()));
        }
        let name = parse_ref_name(ref_path, T::SECTION)?;
        current = T::section(components)
            .get(name)
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))?;
    }
}

/// Parse a `$ref` path like `#/components/schemas/Foo` and extract the name.
pub fn parse_ref_name<'a>(
    ref_path: &'a str,
    expected_section: &str,
) -> Result<&'a str, ResolveError> {
    let stripped = ref_path
        .strip_prefix("#/components/")
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    let (section, name) = stripped
        .split_once('/')
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    if section != expected_section {
        return Err(ResolveError::InvalidRefFormat(format!(
            "expected section '{}', got '{}' in {}",
            expected_section, section, ref_path
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ref_name_checks_section() {
        assert_eq!(
            parse_ref_name("#/components/responses/NotFound", "responses").unwrap(),
            "NotFound"
        );
        assert!(matches!(
            parse_ref_name("#/components/schemas/Pet", "responses"),
            Err(ResolveError::InvalidRefFormat(_))
        ));
        assert!(matches!(
            parse_ref_name("Pet", "schemas"),
            Err(ResolveError::InvalidRefFormat(_))
        ));
    }
}
