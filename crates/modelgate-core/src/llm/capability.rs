//! Capability registry: model name to [`ModelCapabilities`].
//!
//! The registry is filled once at startup and read concurrently by every
//! adapter afterwards, so it hands out `Arc`s and never mutates shared state.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use modelgate_types::capability::{ExpectedType, ModelCapabilities, ParamType};
use modelgate_types::llm::LlmError;

static GLOBAL_REGISTRY: OnceLock<CapabilityRegistry> = OnceLock::new();

/// Registry of known models, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    models: HashMap<String, Arc<ModelCapabilities>>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in model entries.
    pub fn with_builtin_models() -> Self {
        let mut registry = Self::new();
        for caps in builtin_models() {
            registry.insert(caps);
        }
        registry
    }

    /// Add or replace a model entry.
    pub fn insert(&mut self, caps: ModelCapabilities) {
        self.models.insert(caps.name.clone(), Arc::new(caps));
    }

    /// Add every entry from `models`, replacing any with the same name.
    pub fn extend(&mut self, models: impl IntoIterator<Item = ModelCapabilities>) {
        for caps in models {
            self.insert(caps);
        }
    }

    /// Look up a model by name.
    ///
    /// An unknown model is a caller error and is never retried.
    pub fn lookup(&self, model_name: &str) -> Result<Arc<ModelCapabilities>, LlmError> {
        self.models.get(model_name).cloned().ok_or_else(|| {
            tracing::error!(model = %model_name, "Unsupported model requested");
            LlmError::UnsupportedModel(model_name.to_string())
        })
    }

    /// Sorted list of registered model names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Install the process-wide registry. Call once, at startup.
    pub fn init_global(registry: CapabilityRegistry) -> Result<(), LlmError> {
        GLOBAL_REGISTRY.set(registry).map_err(|_| {
            LlmError::Config("capability registry already initialized".to_string())
        })
    }

    /// The process-wide registry; the built-in models if none was installed.
    pub fn global() -> &'static CapabilityRegistry {
        GLOBAL_REGISTRY.get_or_init(Self::with_builtin_models)
    }
}

fn feature(name: &str, t: ParamType) -> (String, ExpectedType) {
    (name.to_string(), ExpectedType::One(t))
}

/// Built-in model entries.
pub fn builtin_models() -> Vec<ModelCapabilities> {
    let gpt4o_family = |name: &str| {
        ModelCapabilities::with_defaults(
            name,
            "2024-12-01",
            [
                feature("temperature", ParamType::Float),
                feature("top_p", ParamType::Float),
                feature("tool_choice", ParamType::Any),
                feature("tools", ParamType::Any),
            ],
        )
    };

    vec![
        ModelCapabilities::with_defaults(
            "gpt-5",
            "2025-03-01",
            [
                feature("reasoning_effort", ParamType::String),
                feature("tools", ParamType::Any),
                feature("tool_choice", ParamType::String),
                feature("parallel_tool_calls", ParamType::Bool),
            ],
        ),
        gpt4o_family("gpt-4o"),
        gpt4o_family("gpt-4o-mini"),
        ModelCapabilities::with_defaults(
            "o3-mini",
            "2025-01-31",
            [
                feature("reasoning_effort", ParamType::String),
                feature("tools", ParamType::Any),
                feature("tool_choice", ParamType::String),
            ],
        ),
    ]
}
