//! Prompt registry.
//!
//! Prompts are `tera` templates addressed by `(namespace, name)`. Rendering
//! fails on any undefined variable. File-backed prompts remember their path
//! and are re-read by [`PromptRegistry::reload`].
//!
//! A process-wide registry is available through [`PromptRegistry::global`];
//! populate it at startup, before completions that use it are issued.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, PoisonError, RwLock};

use serde::Serialize;
use tera::{Context, Tera};

use modelgate_types::error::PromptError;

pub const DEFAULT_NAMESPACE: &str = "default";

static GLOBAL_PROMPTS: OnceLock<PromptRegistry> = OnceLock::new();

#[derive(Debug, Clone)]
enum PromptSource {
    Inline,
    File(PathBuf),
}

#[derive(Default)]
struct Inner {
    tera: Tera,
    sources: BTreeMap<(String, String), PromptSource>,
}

/// Explicit `(namespace, name)` to template mapping.
#[derive(Default)]
pub struct PromptRegistry {
    inner: RwLock<Inner>,
}

fn template_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

/// Flatten a tera error and its causes into one line.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static PromptRegistry {
        GLOBAL_PROMPTS.get_or_init(PromptRegistry::new)
    }

    /// Register an inline template in the default namespace.
    pub fn register(&self, name: &str, template: &str) -> Result<(), PromptError> {
        self.register_in(DEFAULT_NAMESPACE, name, template)
    }

    /// Register an inline template. Replaces any prompt with the same key.
    pub fn register_in(&self, namespace: &str, name: &str, template: &str) -> Result<(), PromptError> {
        self.add(namespace, name, template, PromptSource::Inline)
    }

    /// Register a template read from `path` in the default namespace.
    pub fn register_file(&self, name: &str, path: impl AsRef<Path>) -> Result<(), PromptError> {
        let path = path.as_ref();
        let template = read_template(name, path)?;
        self.add(DEFAULT_NAMESPACE, name, &template, PromptSource::File(path.to_path_buf()))
    }

    fn add(
        &self,
        namespace: &str,
        name: &str,
        template: &str,
        source: PromptSource,
    ) -> Result<(), PromptError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner
            .tera
            .add_raw_template(&template_key(namespace, name), template)
            .map_err(|e| PromptError::Render {
                name: name.to_string(),
                message: describe(&e),
            })?;
        inner
            .sources
            .insert((namespace.to_string(), name.to_string()), source);
        tracing::info!(namespace = %namespace, prompt = %name, "Registered prompt");
        Ok(())
    }

    /// Look up a prompt in the default namespace.
    pub fn get(&self, name: &str) -> Option<PromptRenderer<'_>> {
        self.get_in(DEFAULT_NAMESPACE, name)
    }

    pub fn get_in(&self, namespace: &str, name: &str) -> Option<PromptRenderer<'_>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .sources
            .contains_key(&(namespace.to_string(), name.to_string()))
            .then(|| PromptRenderer {
                registry: self,
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    /// Render a prompt in the default namespace.
    pub fn render<C: Serialize>(&self, name: &str, context: &C) -> Result<String, PromptError> {
        self.render_in(DEFAULT_NAMESPACE, name, context)
    }

    pub fn render_in<C: Serialize>(
        &self,
        namespace: &str,
        name: &str,
        context: &C,
    ) -> Result<String, PromptError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        if !inner
            .sources
            .contains_key(&(namespace.to_string(), name.to_string()))
        {
            return Err(PromptError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }

        let render_err = |e: tera::Error| PromptError::Render {
            name: name.to_string(),
            message: describe(&e),
        };
        let context = Context::from_serialize(context).map_err(render_err)?;
        inner
            .tera
            .render(&template_key(namespace, name), &context)
            .map_err(render_err)
    }

    /// All registered `(namespace, name)` pairs, sorted.
    pub fn list(&self) -> Vec<(String, String)> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.sources.keys().cloned().collect()
    }

    /// Re-read every file-backed prompt. Returns how many were reloaded.
    ///
    /// Stops at the first unreadable or unparsable file; prompts reloaded
    /// before it keep their new content.
    pub fn reload(&self) -> Result<usize, PromptError> {
        let files: Vec<(String, String, PathBuf)> = {
            let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            inner
                .sources
                .iter()
                .filter_map(|((ns, name), source)| match source {
                    PromptSource::File(path) => Some((ns.clone(), name.clone(), path.clone())),
                    PromptSource::Inline => None,
                })
                .collect()
        };

        for (namespace, name, path) in &files {
            let template = read_template(name, path)?;
            self.add(namespace, name, &template, PromptSource::File(path.clone()))?;
        }

        tracing::info!(count = files.len(), "Reloaded file-backed prompts");
        Ok(files.len())
    }
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry")
            .field("prompts", &self.list())
            .finish()
    }
}

fn read_template(name: &str, path: &Path) -> Result<String, PromptError> {
    std::fs::read_to_string(path).map_err(|e| PromptError::Io {
        name: name.to_string(),
        message: format!("{}: {e}", path.display()),
    })
}

/// A registered prompt, callable by logical name.
#[derive(Debug, Clone)]
pub struct PromptRenderer<'a> {
    registry: &'a PromptRegistry,
    namespace: String,
    name: String,
}

impl PromptRenderer<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn render<C: Serialize>(&self, context: &C) -> Result<String, PromptError> {
        self.registry.render_in(&self.namespace, &self.name, context)
    }
}
