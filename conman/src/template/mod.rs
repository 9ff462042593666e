//! Template rendering facade.
//!
//! Templates are written in the Tera dialect (`{{ name }}`,
//! `{{ value | upper }}`, `{% if %}`). Auto-escaping is disabled and
//! undefined variables are errors. Every render sees the same immutable set
//! of helper filters from [`FunctionRegistry`].

use std::path::{Path, PathBuf};

use tera::Tera;
use thiserror::Error;

use crate::context::Context;

/// Helper filters available to every template.
pub mod functions;

pub use functions::FunctionRegistry;

/// Errors raised while rendering templates.
///
/// Tera keeps the useful part of a failure (the line, the undefined name) in
/// the source chain, so callers should print the whole chain.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template could not be parsed or rendered.
    #[error("failed to render '{name}'")]
    Render {
        /// Template text or source path.
        name: String,
        #[source]
        source: tera::Error,
    },
    /// The context could not be turned into a render context.
    #[error("invalid template context")]
    Context(#[source] tera::Error),
    /// A template file could not be read or written.
    #[error("failed to access '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders template strings and files against a [`Context`].
#[derive(Debug, Clone)]
pub struct Renderer {
    tera: Tera,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(&FunctionRegistry::builtin())
    }
}

impl Renderer {
    /// Creates a renderer with the filters in `registry`.
    pub fn new(registry: &FunctionRegistry) -> Self {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        registry.install(&mut tera);
        Self { tera }
    }

    /// Renders `text` against `context`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Render`] when `text` is not a valid template
    /// or references something the context does not have.
    pub fn render_string(&mut self, text: &str, context: &Context) -> Result<String, TemplateError> {
        let ctx = render_context(context)?;
        self.tera
            .render_str(text, &ctx)
            .map_err(|source| TemplateError::Render {
                name: text.to_string(),
                source,
            })
    }

    /// Renders the template file `src` into `dest`.
    ///
    /// Parent directories of `dest` are created as needed. `dest` is only
    /// written once the template rendered successfully.
    ///
    /// # Errors
    ///
    /// Returns an error when `src` cannot be read, fails to render, or `dest`
    /// cannot be written.
    pub fn render_to_file(
        &mut self,
        src: &Path,
        dest: &Path,
        context: &Context,
    ) -> Result<(), TemplateError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| TemplateError::Io { path, source }
        };

        let text = std::fs::read_to_string(src).map_err(io_err(src))?;
        let ctx = render_context(context)?;
        let rendered = self
            .tera
            .render_str(&text, &ctx)
            .map_err(|source| TemplateError::Render {
                name: src.display().to_string(),
                source,
            })?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        std::fs::write(dest, rendered).map_err(io_err(dest))?;
        debug!("rendered {} -> {}", src.display(), dest.display());
        Ok(())
    }
}

fn render_context(context: &Context) -> Result<tera::Context, TemplateError> {
    tera::Context::from_serialize(context.as_map()).map_err(TemplateError::Context)
}
