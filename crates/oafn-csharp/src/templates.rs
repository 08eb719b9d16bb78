use minijinja::{Environment, Value};
use oafn_core::error::GeneratorError;

/// Every template, keyed by `{layer}/{slot}`. The `base` layer covers every
/// version; `v{n}` layers replace single slots for that version only.
const TEMPLATES: &[(&str, &str)] = &[
    ("base/model", include_str!("../templates/base/model.cs.j2")),
    ("base/interface", include_str!("../templates/base/interface.cs.j2")),
    ("base/date_converter", include_str!("../templates/base/date_converter.cs.j2")),
    ("base/service", include_str!("../templates/base/service.cs.j2")),
    ("base/functions", include_str!("../templates/base/functions.cs.j2")),
    ("base/function_method", include_str!("../templates/base/function_method.cs.j2")),
    ("base/result_wrapper", include_str!("../templates/base/result_wrapper.cs.j2")),
    ("base/client_error_base", include_str!("../templates/base/client_error_base.cs.j2")),
    ("base/client_error", include_str!("../templates/base/client_error.cs.j2")),
    ("v1/model", include_str!("../templates/v1/model.cs.j2")),
    ("v1/functions", include_str!("../templates/v1/functions.cs.j2")),
    ("v1/function_method", include_str!("../templates/v1/function_method.cs.j2")),
    ("v3/function_method", include_str!("../templates/v3/function_method.cs.j2")),
];

/// A named slot in the output, rendered by whichever template the configured
/// version selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Model,
    Interface,
    DateConverter,
    Service,
    Functions,
    FunctionMethod,
    ResultWrapper,
    ClientErrorBase,
    ClientError,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Interface => "interface",
            Self::DateConverter => "date_converter",
            Self::Service => "service",
            Self::Functions => "functions",
            Self::FunctionMethod => "function_method",
            Self::ResultWrapper => "result_wrapper",
            Self::ClientErrorBase => "client_error_base",
            Self::ClientError => "client_error",
        }
    }
}

/// The templates of one generation version.
pub struct TemplateSet {
    env: Environment<'static>,
    version: u8,
}

impl TemplateSet {
    pub fn new(version: u8) -> Result<Self, GeneratorError> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        for &(name, source) in TEMPLATES {
            env.add_template(name, source).map_err(|e| render_error(name, e))?;
        }
        Ok(Self { env, version })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// The template name a slot resolves to for this version.
    pub fn template_name(&self, slot: Slot) -> String {
        let versioned = format!("v{}/{}", self.version, slot.as_str());
        if TEMPLATES.iter().any(|(name, _)| *name == versioned) {
            versioned
        } else {
            format!("base/{}", slot.as_str())
        }
    }

    pub fn render(&self, slot: Slot, ctx: Value) -> Result<String, GeneratorError> {
        let name = self.template_name(slot);
        let tmpl = self
            .env
            .get_template(&name)
            .map_err(|e| render_error(&name, e))?;
        tmpl.render(ctx).map_err(|e| render_error(&name, e))
    }
}

fn render_error(artifact: &str, err: minijinja::Error) -> GeneratorError {
    GeneratorError::Render {
        artifact: artifact.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_overrides() {
        let v1 = TemplateSet::new(1).unwrap();
        assert_eq!(v1.template_name(Slot::Model), "v1/model");
        assert_eq!(v1.template_name(Slot::Service), "base/service");

        let v2 = TemplateSet::new(2).unwrap();
        assert_eq!(v2.template_name(Slot::Model), "base/model");
        assert_eq!(v2.template_name(Slot::FunctionMethod), "base/function_method");

        let v3 = TemplateSet::new(3).unwrap();
        assert_eq!(v3.template_name(Slot::FunctionMethod), "v3/function_method");
    }
}
