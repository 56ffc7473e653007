//! BoxLlmProvider -- object-safe dynamic dispatch wrapper for LlmProvider.
//!
//! 1. `LlmProviderDyn` is the object-safe trait with boxed futures
//! 2. A blanket impl covers every `T: LlmProvider`
//! 3. `BoxLlmProvider` wraps `Box<dyn LlmProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use modelgate_types::capability::ModelCapabilities;
use modelgate_types::llm::{Completion, LlmError, ProviderType, ToolDefinition, UserPrompt};

use super::provider::LlmProvider;
use super::request::CompletionArgs;
use super::tool::Tool;

/// Object-safe version of [`LlmProvider`] with boxed futures.
pub trait LlmProviderDyn: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    fn model(&self) -> &ModelCapabilities;

    fn register_tool(&self, tool: Arc<dyn Tool>) -> ToolDefinition;

    fn get_completion_boxed<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: UserPrompt,
        args: CompletionArgs,
    ) -> Pin<Box<dyn Future<Output = Result<Completion, LlmError>> + Send + 'a>>;
}

impl<T: LlmProvider> LlmProviderDyn for T {
    fn provider_type(&self) -> ProviderType {
        LlmProvider::provider_type(self)
    }

    fn model(&self) -> &ModelCapabilities {
        LlmProvider::model(self)
    }

    fn register_tool(&self, tool: Arc<dyn Tool>) -> ToolDefinition {
        LlmProvider::register_tool(self, tool)
    }

    fn get_completion_boxed<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: UserPrompt,
        args: CompletionArgs,
    ) -> Pin<Box<dyn Future<Output = Result<Completion, LlmError>> + Send + 'a>> {
        Box::pin(self.get_completion(system_prompt, user_prompt, args))
    }
}

/// Type-erased LLM provider for runtime backend selection.
///
/// Since `LlmProvider` uses RPITIT it cannot be a trait object directly;
/// the factory hands out this wrapper instead.
pub struct BoxLlmProvider {
    inner: Box<dyn LlmProviderDyn + Send + Sync>,
}

impl BoxLlmProvider {
    /// Wrap a concrete `LlmProvider` in a type-erased box.
    pub fn new<T: LlmProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn provider_type(&self) -> ProviderType {
        self.inner.provider_type()
    }

    pub fn model(&self) -> &ModelCapabilities {
        self.inner.model()
    }

    pub fn register_tool(&self, tool: Arc<dyn Tool>) -> ToolDefinition {
        self.inner.register_tool(tool)
    }

    pub async fn get_completion(
        &self,
        system_prompt: &str,
        user_prompt: impl Into<UserPrompt>,
        args: CompletionArgs,
    ) -> Result<Completion, LlmError> {
        self.inner
            .get_completion_boxed(system_prompt, user_prompt.into(), args)
            .await
    }
}

impl std::fmt::Debug for BoxLlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxLlmProvider")
            .field("provider_type", &self.inner.provider_type())
            .field("model", &self.inner.model().name)
            .finish()
    }
}
