use std::fmt;

use serde::Serialize;

/// A scalar the type converter maps a primitive `(type, format)` pair onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScalarType {
    Guid,
    DateTime,
    Long,
    ULong,
    UInt,
    Int,
    Double,
    Bool,
    String,
}

impl ScalarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guid => "Guid",
            Self::DateTime => "DateTime",
            Self::Long => "long",
            Self::ULong => "ulong",
            Self::UInt => "uint",
            Self::Int => "int",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::String => "string",
        }
    }

    /// `string` is a reference type and never takes a nullable marker.
    pub fn accepts_nullable_marker(&self) -> bool {
        !matches!(self, Self::String)
    }

    /// Render the scalar, appending `?` when `nullable` and the scalar
    /// accepts the marker.
    pub fn render(&self, nullable: bool) -> String {
        if nullable && self.accepts_nullable_marker() {
            format!("{}?", self.as_str())
        } else {
            self.as_str().to_string()
        }
    }

    /// Enumeration tables are only synthesized for these bases.
    pub fn supports_enum(&self) -> bool {
        matches!(self, Self::String | Self::Int | Self::Long | Self::Double)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved type: a scalar, a generated entity, or a collection of
/// either.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum TypeRef {
    Scalar { scalar: ScalarType, nullable: bool },
    Entity(String),
    List(Box<TypeRef>),
    /// String-keyed map.
    Map(Box<TypeRef>),
}

impl TypeRef {
    pub fn scalar(scalar: ScalarType) -> Self {
        Self::Scalar {
            scalar,
            nullable: false,
        }
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Self::Entity(name.into())
    }

    pub fn list(item: TypeRef) -> Self {
        Self::List(Box::new(item))
    }

    pub fn map(value: TypeRef) -> Self {
        Self::Map(Box::new(value))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar { .. })
    }

    /// The innermost entity name, looking through collections.
    pub fn entity_name(&self) -> Option<&str> {
        match self {
            Self::Entity(name) => Some(name),
            Self::List(inner) | Self::Map(inner) => inner.entity_name(),
            Self::Scalar { .. } => None,
        }
    }

    /// Identifier-safe stem used to name synthetic types derived from this
    /// one, e.g. `OrderResultWrapper` or `IntListResultWrapper`.
    pub fn stem(&self) -> String {
        match self {
            Self::Scalar { scalar, .. } => {
                let raw = scalar.as_str();
                let mut chars = raw.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
            Self::Entity(name) => name.clone(),
            Self::List(inner) => format!("{}List", inner.stem()),
            Self::Map(inner) => format!("{}Map", inner.stem()),
        }
    }
}

/// The default a generated property is initialized with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    /// A declared `default`, already rendered as a literal (`"abc"`, `true`, `5`).
    Literal(String),
    Null,
    /// A fresh instance of the property's entity type.
    NewInstance,
    EmptyList,
    EmptyMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_marker_skips_string() {
        assert_eq!(ScalarType::Int.render(true), "int?");
        assert_eq!(ScalarType::Guid.render(true), "Guid?");
        assert_eq!(ScalarType::String.render(true), "string");
        assert_eq!(ScalarType::Long.render(false), "long");
    }

    #[test]
    fn stems_name_collections() {
        assert_eq!(TypeRef::entity("Order").stem(), "Order");
        assert_eq!(TypeRef::list(TypeRef::scalar(ScalarType::Int)).stem(), "IntList");
        assert_eq!(
            TypeRef::map(TypeRef::entity("Pet")).stem(),
            "PetMap"
        );
    }

    #[test]
    fn entity_name_looks_through_collections() {
        let t = TypeRef::list(TypeRef::map(TypeRef::entity("Pet")));
        assert_eq!(t.entity_name(), Some("Pet"));
        assert_eq!(TypeRef::scalar(ScalarType::Bool).entity_name(), None);
    }
}
