//! Template-backed render capability.
//!
//! Templates live in a directory as `<component-name>.html` and are loaded at
//! render time, so markup can change without recompiling. Each template sees
//! the component's attributes plus `component_id`, `component_name` and a
//! freshly minted `checksum` of the attributes for the client to send back.

use std::path::Path;

use anyhow::{Context, Result};
use minijinja::{Environment, path_loader};
use serde_json::Value;

use crate::core::checksum::ChecksumValidator;
use crate::core::component::{Component, Render};

/// [`Render`] implementation on top of minijinja.
pub struct TemplateRenderer {
    env: Environment<'static>,
    validator: ChecksumValidator,
}

impl TemplateRenderer {
    /// Renderer loading templates from `dir`.
    pub fn from_dir(dir: &Path, validator: ChecksumValidator) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(dir));
        Self { env, validator }
    }

    /// Renderer with no templates; add them with [`TemplateRenderer::add_template`].
    pub fn empty(validator: ChecksumValidator) -> Self {
        Self {
            env: Environment::new(),
            validator,
        }
    }

    pub fn add_template(&mut self, name: &str, source: &str) -> Result<()> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())
            .with_context(|| format!("parse template {name}"))
    }
}

impl Render for TemplateRenderer {
    fn render(&self, component: &dyn Component) -> Result<String> {
        let name = component.template_name();
        let template = self
            .env
            .get_template(&name)
            .with_context(|| format!("load template {name}"))?;

        let attributes = component.attributes();
        let checksum = self.validator.generate(&attributes)?;

        let mut ctx = attributes;
        ctx.insert("component_id".to_string(), Value::from(component.id()));
        ctx.insert("component_name".to_string(), Value::from(component.name()));
        ctx.insert("checksum".to_string(), Value::from(checksum));

        template
            .render(&ctx)
            .with_context(|| format!("render template {name}"))
    }
}
