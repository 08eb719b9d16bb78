use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use crate::parse::schema::{Schema, SchemaOrRef};

use super::type_converter::{Naming, is_primitive_schema, ref_name};

/// What a schema reference stands for once primitive aliases are taken into
/// account.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedRef<'a> {
    /// The target is a bare primitive; use its body instead of a class.
    Alias(&'a Schema),
    /// The target is a generated class with this name.
    Entity(String),
}

/// The naming and primitive-alias table shared by the model and endpoint
/// walks, so both resolve a reference to the same type.
#[derive(Debug, Clone, Default)]
pub struct KnownTypes {
    naming: Naming,
    /// Generated name to primitive body.
    aliases: IndexMap<String, Schema>,
    /// Raw name to raw name, for component schemas that are only a `$ref`.
    redirects: IndexMap<String, String>,
}

impl KnownTypes {
    /// Register every admitted component schema whose body is a bare
    /// primitive.
    pub fn scan(
        schemas: &IndexMap<String, SchemaOrRef>,
        naming: Naming,
        admits: impl Fn(&str) -> bool,
    ) -> Self {
        let mut known = Self {
            naming,
            ..Self::default()
        };
        for (raw, schema) in schemas {
            match schema {
                SchemaOrRef::Ref { ref_path } => {
                    known
                        .redirects
                        .insert(raw.clone(), ref_name(ref_path).to_string());
                }
                SchemaOrRef::Schema(schema) => {
                    if !admits(raw) || !is_primitive_schema(schema) {
                        continue;
                    }
                    let name = known.naming.class_name(raw);
                    debug!("{raw} is a primitive alias, substituting its body for {name}");
                    known.aliases.insert(name, schema.as_ref().clone());
                }
            }
        }
        known
    }

    pub fn naming(&self) -> &Naming {
        &self.naming
    }

    /// Resolve a `$ref` to either the primitive body of an alias or the name
    /// of the class generated for its target.
    pub fn resolve(&self, ref_path: &str) -> ResolvedRef<'_> {
        let raw = self.follow_redirects(ref_name(ref_path));
        let name = self.naming.class_name(raw);
        match self.aliases.get(&name) {
            Some(schema) => ResolvedRef::Alias(schema),
            None => ResolvedRef::Entity(name),
        }
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn follow_redirects<'a>(&'a self, mut raw: &'a str) -> &'a str {
        let mut seen = HashSet::new();
        while let Some(next) = self.redirects.get(raw) {
            if !seen.insert(raw) {
                break;
            }
            raw = next.as_str();
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schemas(yaml: &str) -> IndexMap<String, SchemaOrRef> {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn primitive_schemas_become_aliases() {
        let table = schemas(
            r#"
Email: { type: string, format: email }
Pet:
  type: object
  properties:
    name: { type: string }
"#,
        );
        let known = KnownTypes::scan(&table, Naming::new("", "Model"), |_| true);
        assert!(known.is_alias("EmailModel"));
        match known.resolve("#/components/schemas/Email") {
            ResolvedRef::Alias(schema) => assert_eq!(schema.format.as_deref(), Some("email")),
            other => panic!("expected alias, got {other:?}"),
        }
        assert_eq!(
            known.resolve("#/components/schemas/Pet"),
            ResolvedRef::Entity("PetModel".to_string())
        );
    }

    #[test]
    fn filtered_schemas_are_not_aliases() {
        let table = schemas("Token: { type: string }\n");
        let known = KnownTypes::scan(&table, Naming::default(), |raw| raw != "Token");
        assert_eq!(
            known.resolve("#/components/schemas/Token"),
            ResolvedRef::Entity("Token".to_string())
        );
    }

    #[test]
    fn component_refs_redirect_to_their_target() {
        let table = schemas(
            r#"
Id: { type: integer, format: int64 }
OrderId: { $ref: '#/components/schemas/Id' }
Loop: { $ref: '#/components/schemas/Loop' }
"#,
        );
        let known = KnownTypes::scan(&table, Naming::default(), |_| true);
        assert!(matches!(
            known.resolve("#/components/schemas/OrderId"),
            ResolvedRef::Alias(_)
        ));
        assert_eq!(
            known.resolve("#/components/schemas/Loop"),
            ResolvedRef::Entity("Loop".to_string())
        );
    }
}
