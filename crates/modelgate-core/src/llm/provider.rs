//! LlmProvider trait definition.
//!
//! Every backend family implements this trait, usually through the generic
//! [`ProviderAdapter`](super::adapter::ProviderAdapter). Uses RPITIT for
//! `get_completion`; callers that select a backend at runtime hold a
//! [`BoxLlmProvider`](super::box_provider::BoxLlmProvider) instead.

use std::sync::Arc;

use modelgate_types::capability::ModelCapabilities;
use modelgate_types::llm::{Completion, LlmError, ProviderType, ToolDefinition, UserPrompt};

use super::request::CompletionArgs;
use super::tool::Tool;

/// A completion backend bound to one model.
pub trait LlmProvider: Send + Sync {
    /// Backend family of this provider.
    fn provider_type(&self) -> ProviderType;

    /// Capabilities of the model this provider targets.
    fn model(&self) -> &ModelCapabilities;

    /// Register a tool on this provider instance.
    ///
    /// The tool stays registered for the lifetime of the instance and may be
    /// invoked by any later completion that triggers a tool call.
    fn register_tool(&self, tool: Arc<dyn Tool>) -> ToolDefinition;

    /// Run one chat turn: system prompt first, user prompt second.
    ///
    /// Returns the trimmed text content, the result of the dispatched tool
    /// call when the backend asked for one, or content plus usage when
    /// `return_usage` was requested.
    fn get_completion(
        &self,
        system_prompt: &str,
        user_prompt: UserPrompt,
        args: CompletionArgs,
    ) -> impl std::future::Future<Output = Result<Completion, LlmError>> + Send;
}
