//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to the
//! embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, warn};

use super::embedded;

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that checks `override_dir` before the embedded prompts
    pub fn new(override_dir: Option<&Path>) -> Self {
        debug!(?override_dir, "PromptLoader::new: called");
        let override_dir = override_dir.filter(|dir| {
            let exists = dir.is_dir();
            if !exists {
                warn!(dir = %dir.display(), "Prompt override directory not found, using embedded prompts");
            }
            exists
        });

        Self {
            hbs: Self::engine(),
            override_dir: override_dir.map(Path::to_path_buf),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    /// Prompts are plain text, not HTML
    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Override: `{override_dir}/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in override directory");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt override {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: not found in override directory");
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    ///
    /// Surrounding whitespace is trimmed from the result.
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;

        self.hbs
            .render_template(&template, context)
            .map(|text| text.trim().to_string())
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}
