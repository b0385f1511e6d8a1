//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to
//! embedded defaults.

use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::embedded;

/// Errors from template registration or rendering
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Invalid template '{name}': {source}")]
    Template {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("Failed to render '{name}': {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },

    #[error("Failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
}

impl PromptLoader {
    /// Loader with only the embedded templates
    pub fn embedded() -> Result<Self, PromptError> {
        Self::new(None)
    }

    /// Loader that prefers `{override_dir}/{name}.pmt` over the embedded copy
    pub fn new(override_dir: Option<&Path>) -> Result<Self, PromptError> {
        debug!(?override_dir, "PromptLoader::new: called");
        let mut hbs = Handlebars::new();
        // Prompts are plain text, never HTML
        hbs.register_escape_fn(handlebars::no_escape);

        for name in embedded::NAMES {
            let source = match override_dir.map(|dir| dir.join(format!("{}.pmt", name))) {
                Some(path) if path.exists() => {
                    info!(template = name, path = %path.display(), "Using prompt override");
                    std::fs::read_to_string(&path).map_err(|source| PromptError::Io { path, source })?
                }
                _ => embedded::get_embedded(name).unwrap_or_default().to_string(),
            };
            hbs.register_template_string(name, source)
                .map_err(|source| PromptError::Template {
                    name: name.to_string(),
                    source: Box::new(source),
                })?;
        }

        Ok(Self { hbs })
    }

    /// Render a registered template with `data`
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, PromptError> {
        debug!(%name, "PromptLoader::render: called");
        self.hbs.render(name, data).map_err(|source| PromptError::Render {
            name: name.to_string(),
            source: Box::new(source),
        })
    }
}
