use crate::error::DefinitionErrorKind;
use crate::ir::ScalarType;
use crate::parse::schema::{Schema, SchemaType};

/// Map a primitive `(type, format)` pair onto a scalar. Unknown formats fall
/// back to the base type; non-primitive types have no scalar.
pub fn scalar_type(
    schema_type: Option<SchemaType>,
    format: Option<&str>,
) -> Result<ScalarType, DefinitionErrorKind> {
    let scalar = match (schema_type, format) {
        (Some(SchemaType::String), Some("uuid")) => ScalarType::Guid,
        (Some(SchemaType::String), Some("date" | "date-time")) => ScalarType::DateTime,
        (Some(SchemaType::String), _) => ScalarType::String,
        (Some(SchemaType::Integer), Some("int64")) => ScalarType::Long,
        (Some(SchemaType::Integer), Some("uint64")) => ScalarType::ULong,
        (Some(SchemaType::Integer), Some("uint32")) => ScalarType::UInt,
        (Some(SchemaType::Integer), _) => ScalarType::Int,
        (Some(SchemaType::Number), _) => ScalarType::Double,
        (Some(SchemaType::Boolean), _) => ScalarType::Bool,
        (Some(other), _) => {
            return Err(DefinitionErrorKind::UnsupportedSchema(format!(
                "`{}` has no scalar representation",
                other.as_str()
            )));
        }
        (None, _) => {
            return Err(DefinitionErrorKind::UnsupportedSchema(
                "schema declares neither `type` nor `$ref`".to_string(),
            ));
        }
    };
    Ok(scalar)
}

/// Scalar for a schema, taking `type` and `format` from it.
pub fn schema_scalar(schema: &Schema) -> Result<ScalarType, DefinitionErrorKind> {
    scalar_type(schema.primary_type(), schema.format.as_deref())
}

pub fn is_primitive(schema_type: Option<SchemaType>) -> bool {
    matches!(
        schema_type,
        Some(SchemaType::String | SchemaType::Integer | SchemaType::Number | SchemaType::Boolean)
    )
}

/// A primitive schema with no object shape: the body of a type alias.
pub fn is_primitive_schema(schema: &Schema) -> bool {
    is_primitive(schema.primary_type()) && schema.properties.is_empty()
}

/// Date-only values; `date-time` is handled natively.
pub fn is_date_schema(schema: &Schema) -> bool {
    schema.primary_type() == Some(SchemaType::String) && schema.format.as_deref() == Some("date")
}

/// Turn a raw name into an identifier by splitting on `-` and `_` and
/// uppercasing the first letter of every segment.
///
/// A separator survives as `_` where dropping it would change the meaning on
/// a second pass: before an uppercase letter or digit, between empty
/// segments, and at either end. The result is never empty and applying the
/// function twice yields the same string.
pub fn to_identifier(raw: &str) -> String {
    if raw.is_empty() {
        return "_".to_string();
    }

    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < chars.len() {
        if !is_separator(chars[i]) {
            if out.is_empty() || out.ends_with('_') {
                out.extend(chars[i].to_uppercase());
            } else {
                out.push(chars[i]);
            }
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && is_separator(chars[i]) {
            i += 1;
        }
        let run = i - start;
        let leading = start == 0;
        let next = chars.get(i).copied();

        let kept = match next {
            None => run,
            Some(_) if leading => run,
            Some(c) if has_uppercase(c) => run - 1,
            Some(_) => run,
        };
        out.extend(std::iter::repeat_n('_', kept));
        if let Some(c) = next.filter(|c| has_uppercase(*c)) {
            out.extend(c.to_uppercase());
            i += 1;
        }
    }
    out
}

fn is_separator(c: char) -> bool {
    c == '-' || c == '_'
}

/// Lowercase letters that actually change when uppercased.
fn has_uppercase(c: char) -> bool {
    c.is_lowercase() && c.to_uppercase().next() != Some(c)
}

/// Uppercase the first character and leave the rest alone.
pub fn capitalize_first(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replace every run of non-alphanumeric characters with a single `_`.
pub fn sanitize_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// Prefix and suffix applied to every generated class name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Naming {
    pub prefix: String,
    pub suffix: String,
}

impl Naming {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn class_name(&self, raw: &str) -> String {
        format!("{}{}{}", self.prefix, to_identifier(raw), self.suffix)
    }

    /// Class name for the schema a `$ref` points at.
    pub fn class_name_from_ref(&self, ref_path: &str) -> String {
        self.class_name(ref_name(ref_path))
    }
}

/// The schema key a `$ref` points at: its last `/` segment.
pub fn ref_name(ref_path: &str) -> &str {
    ref_path.rsplit('/').next().unwrap_or(ref_path)
}
