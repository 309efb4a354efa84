//! Jinja-style template rendering for generated pages.
//!
//! Templates live as plain files in a directory supplied on the command
//! line. Both required templates are checked at construction time so a
//! missing template fails the run before any fetch starts.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use minijinja::Environment;
use serde::Serialize;
use tracing::error;

/// Front-matter fragment prepended to index files; keyed on `version` and
/// `name`.
pub const INDEX_HEADER_TEMPLATE: &str = "indexHeader.txt";
/// Body of the generated per-source contents page.
pub const CONTENTS_TEMPLATE: &str = "contents.md";

/// Renders named templates from a template directory with a flat context.
#[derive(Debug)]
pub struct TemplateRenderer {
    template_dir: PathBuf,
}

impl TemplateRenderer {
    pub fn new(template_dir: impl Into<PathBuf>) -> Result<Self> {
        let template_dir = template_dir.into();
        for name in [INDEX_HEADER_TEMPLATE, CONTENTS_TEMPLATE] {
            let template_path = template_dir.join(name);
            if !template_path.is_file() {
                error!(template = %template_path.display(), "Template file does not exist");
                anyhow::bail!("Template file does not exist: {}", template_path.display());
            }
        }
        Ok(Self { template_dir })
    }

    pub fn render<C: Serialize>(&self, template_name: &str, context: C) -> Result<String> {
        let template_path = self.template_dir.join(template_name);
        let template = fs::read_to_string(&template_path)
            .with_context(|| format!("Failed to read template {}", template_path.display()))?;

        let mut env = Environment::new();
        // Rendered fragments are written or prepended verbatim, so the
        // template's final newline must survive.
        env.set_keep_trailing_newline(true);
        env.add_template(template_name, &template)
            .with_context(|| format!("Invalid template {}", template_path.display()))?;
        let rendered = env
            .get_template(template_name)
            .and_then(|t| t.render(context))
            .with_context(|| format!("Failed to render template {}", template_path.display()))?;
        Ok(rendered)
    }
}
