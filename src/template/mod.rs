//! Output templates.
//!
//! Templates use Jinja syntax (via minijinja) with `trim_blocks` and
//! `lstrip_blocks` enabled. The variables available are the fields of
//! [`RenderContext`](crate::pipeline::RenderContext).

use std::fmt;
use std::fs;
use std::path::Path;

use minijinja::Environment;
use serde::Serialize;

use crate::app::Result;

const TEMPLATE_NAME: &str = "bookmark";

pub const BUILTIN_TEMPLATE: &str = "Title: {{ description }}
Category: linklist
Link: {{ url }}
Date: {{ local_date }}
Tags: {{ tags|join(', ') }}
Status: draft

{{ extended }}
";

/// Where a compiled template came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    File(String),
    Builtin,
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::File(path) => write!(f, "'{}'", path),
            TemplateSource::Builtin => f.write_str("built-in"),
        }
    }
}

/// A compiled bookmark template.
pub struct BookmarkTemplate {
    env: Environment<'static>,
    source: TemplateSource,
}

impl BookmarkTemplate {
    /// Compile template source text.
    pub fn compile(source_text: impl Into<String>, source: TemplateSource) -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template_owned(TEMPLATE_NAME, source_text.into())?;
        Ok(Self { env, source })
    }

    /// The template used when no custom one can be loaded.
    pub fn builtin() -> Self {
        Self::compile(BUILTIN_TEMPLATE, TemplateSource::Builtin)
            .expect("built-in template must compile")
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    pub fn render<S: Serialize>(&self, ctx: &S) -> Result<String> {
        let template = self.env.get_template(TEMPLATE_NAME)?;
        Ok(template.render(ctx)?)
    }
}

/// Load and compile the template file at `path`.
///
/// Fails on a missing/unreadable file or a syntax error; callers decide
/// whether to fall back to [`BookmarkTemplate::builtin`].
pub fn resolve<P: AsRef<Path>>(path: P) -> Result<BookmarkTemplate> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    BookmarkTemplate::compile(text, TemplateSource::File(path.display().to_string()))
}

/// [`resolve`], falling back to the built-in template with a warning.
pub fn resolve_or_default<P: AsRef<Path>>(path: P) -> BookmarkTemplate {
    let path = path.as_ref();
    match resolve(path) {
        Ok(template) => template,
        Err(e) => {
            tracing::warn!(
                "Could not load custom template '{}' ({}), using default",
                path.display(),
                e
            );
            BookmarkTemplate::builtin()
        }
    }
}
