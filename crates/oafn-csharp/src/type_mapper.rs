use oafn_core::ir::{DefaultValue, Property, ResponseSummary, ScalarType, TypeRef};

/// Map a scalar onto its C# spelling.
pub fn scalar_to_csharp(scalar: ScalarType, nullable: bool) -> String {
    let base = match scalar {
        ScalarType::Guid => "System.Guid",
        ScalarType::DateTime => "System.DateTime",
        other => other.as_str(),
    };
    if nullable && scalar.accepts_nullable_marker() {
        format!("{base}?")
    } else {
        base.to_string()
    }
}

/// Map a `TypeRef` to its C# type string.
pub fn type_ref_to_csharp(type_ref: &TypeRef) -> String {
    match type_ref {
        TypeRef::Scalar { scalar, nullable } => scalar_to_csharp(*scalar, *nullable),
        TypeRef::Entity(name) => name.clone(),
        TypeRef::List(item) => format!("ICollection<{}>", type_ref_to_csharp(item)),
        TypeRef::Map(value) => format!("Dictionary<string, {}>", type_ref_to_csharp(value)),
    }
}

/// The initializer expression for a property, if it gets one.
///
/// A `null` default on a value type without the nullable marker would not
/// compile, so those properties keep the language default instead.
pub fn default_initializer(property: &Property) -> Option<String> {
    match property.default.as_ref()? {
        DefaultValue::Literal(literal) => Some(literal.clone()),
        DefaultValue::Null => match &property.type_ref {
            TypeRef::Scalar { scalar, nullable } if scalar.accepts_nullable_marker() && !nullable => {
                None
            }
            _ => Some("null".to_string()),
        },
        DefaultValue::NewInstance => Some(format!("new {}()", type_ref_to_csharp(&property.type_ref))),
        DefaultValue::EmptyList => match &property.type_ref {
            TypeRef::List(item) => Some(format!("new List<{}>()", type_ref_to_csharp(item))),
            other => Some(format!("new {}()", type_ref_to_csharp(other))),
        },
        DefaultValue::EmptyMap => Some(format!("new {}()", type_ref_to_csharp(&property.type_ref))),
    }
}

/// The statement that copies one property from `other` in `UpdateWith{Name}`.
pub fn update_statement(member: &str, property: &Property) -> String {
    let copy = match &property.type_ref {
        TypeRef::List(_) if property.is_basic_type => "?.ToList()".to_string(),
        TypeRef::Entity(name) if property.nullable => format!("?.To{name}()"),
        TypeRef::Entity(name) => format!(".To{name}()"),
        _ => String::new(),
    };
    format!("{member} = other.{member}{copy};")
}

/// The task type a typed service method returns for a response summary.
pub fn result_type(summary: &ResponseSummary) -> String {
    match summary {
        ResponseSummary::Untyped => "Task<IActionResult>".to_string(),
        ResponseSummary::Single { content: None, .. } => "Task".to_string(),
        ResponseSummary::Single {
            content: Some(content),
            ..
        } => format!("Task<{}>", type_ref_to_csharp(content)),
        ResponseSummary::MultiCode {
            wrapper: Some(wrapper),
            ..
        } => format!("Task<{wrapper}>"),
        ResponseSummary::MultiCode { .. } => "Task<int>".to_string(),
    }
}
