use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;

use super::types::{DefaultValue, TypeRef};

/// A generated model: a concrete class or a polymorphic interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelEntity {
    Object(ObjectModel),
    Interface(InterfaceModel),
}

impl ModelEntity {
    /// The generated (prefixed, suffixed) name.
    pub fn name(&self) -> &str {
        match self {
            Self::Object(o) => &o.name,
            Self::Interface(i) => &i.name,
        }
    }

    /// The key the schema had in the document.
    pub fn raw_name(&self) -> &str {
        match self {
            Self::Object(o) => &o.raw_name,
            Self::Interface(i) => &i.raw_name,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectModel> {
        match self {
            Self::Object(o) => Some(o),
            Self::Interface(_) => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceModel> {
        match self {
            Self::Object(_) => None,
            Self::Interface(i) => Some(i),
        }
    }
}

/// Something a generated model needs beyond the base language imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Lists or maps.
    Collections,
    /// Enumeration allowed-value sets.
    Immutable,
    /// Date-only values that need a custom converter.
    DateConverter,
}

/// A concrete class built from `properties`, optionally inheriting a parent
/// through `allOf`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectModel {
    pub raw_name: String,
    pub name: String,
    pub description: Option<String>,
    pub properties: Vec<Property>,
    pub parent: Option<String>,
    /// Interfaces this class is a member of, in document order.
    pub interfaces: Vec<String>,
    pub capabilities: BTreeSet<Capability>,
}

/// A polymorphic base built from a discriminated `oneOf`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceModel {
    pub raw_name: String,
    pub name: String,
    pub description: Option<String>,
    pub children: Vec<String>,
    /// The discriminator property, as an identifier.
    pub discriminator: String,
    /// Wire value to child name.
    pub mapping: IndexMap<String, String>,
}

/// One property of an [`ObjectModel`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    /// Name as it appears on the wire.
    pub name: String,
    pub type_ref: TypeRef,
    pub is_list: bool,
    pub is_required: bool,
    pub nullable: bool,
    pub is_date: bool,
    /// Scalars and collections of scalars; these are copied by value.
    pub is_basic_type: bool,
    pub default: Option<DefaultValue>,
    pub enum_table: Option<EnumTable>,
    pub description: Option<String>,
}

impl Property {
    pub fn is_map(&self) -> bool {
        matches!(self.type_ref, TypeRef::Map(_))
    }
}

/// Named constants for an enumerated property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumTable {
    pub constants: Vec<EnumConstant>,
    /// Name of the collection constant holding every allowed value.
    pub allowed_values_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumConstant {
    pub name: String,
    /// The wire value rendered as a literal: `"active"`, `3`, or `null`.
    pub literal: String,
}
