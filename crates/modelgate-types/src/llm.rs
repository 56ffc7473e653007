//! LLM request/response types for modelgate.
//!
//! These types model the provider-agnostic shapes that flow through the
//! adapter layer: prompts and content blocks, the conversation transcript,
//! tool definitions and invocations, usage accounting, and error handling.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Keyword argument that asks for usage alongside content. Never forwarded.
pub const RETURN_USAGE_KEY: &str = "return_usage";

/// Keyword argument carrying the tool selection mode. Forwarded verbatim.
pub const TOOL_CHOICE_KEY: &str = "tool_choice";

/// Role of a message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// Resolution hint for image content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    Auto,
    Low,
    High,
}

/// Reference to an image, by URL or data URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ImageDetail>,
}

/// A typed block of user content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        ContentBlock::ImageUrl {
            image_url: ImageUrl {
                url: url.into(),
                detail: None,
            },
        }
    }
}

/// The user turn: a single text block or an ordered sequence of content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserPrompt {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl From<&str> for UserPrompt {
    fn from(s: &str) -> Self {
        UserPrompt::Text(s.to_string())
    }
}

impl From<String> for UserPrompt {
    fn from(s: String) -> Self {
        UserPrompt::Text(s)
    }
}

impl From<Vec<ContentBlock>> for UserPrompt {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        UserPrompt::Blocks(blocks)
    }
}

impl TryFrom<Value> for UserPrompt {
    type Error = LlmError;

    /// Accept a JSON string or an array of content-block objects.
    ///
    /// Anything else (numbers, objects, arrays of non-blocks, unknown block
    /// types) is rejected before any network call is made.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Ok(UserPrompt::Text(text)),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| {
                    serde_json::from_value::<ContentBlock>(item).map_err(|e| {
                        LlmError::InvalidPrompt(format!("content block {idx}: {e}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(UserPrompt::Blocks),
            other => Err(LlmError::InvalidPrompt(format!(
                "user prompt must be a string or a list of content blocks, got {}",
                crate::capability::ParamType::name_of(&other)
            ))),
        }
    }
}

/// A message in the running conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: UserPrompt,
    },
    Assistant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolInvocationRequest>,
    },
    Tool {
        call_id: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn role(&self) -> MessageRole {
        match self {
            ChatMessage::System { .. } => MessageRole::System,
            ChatMessage::User { .. } => MessageRole::User,
            ChatMessage::Assistant { .. } => MessageRole::Assistant,
            ChatMessage::Tool { .. } => MessageRole::Tool,
        }
    }
}

/// Tool description forwarded to the backend as part of the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// Structural description of accepted arguments. Forwarded, not enforced.
    pub parameters: Value,
}

/// A backend's request to invoke a locally registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    /// Correlation token; echoed back unchanged in the tool result message.
    pub call_id: String,
    pub tool_name: String,
    /// Serialized (JSON) argument object, exactly as the backend sent it.
    pub arguments: String,
}

/// Tool selection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    None,
    Required,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::None => "none",
            ToolChoice::Required => "required",
        }
    }
}

impl fmt::Display for ToolChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ToolChoice::Auto),
            "none" => Ok(ToolChoice::None),
            "required" => Ok(ToolChoice::Required),
            other => Err(format!("invalid tool choice: '{other}'")),
        }
    }
}

/// One decoded choice/candidate of a backend response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatChoice {
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolInvocationRequest>,
    pub finish_reason: Option<String>,
}

/// A backend response decoded into the provider-agnostic shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: Option<String>,
    pub choices: Vec<ChatChoice>,
}

/// Token accounting for a completion. Missing counters are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl UsageRecord {
    pub fn is_empty(&self) -> bool {
        self.prompt_tokens == 0 && self.completion_tokens == 0 && self.total_tokens == 0
    }
}

/// Normalized result of `get_completion`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Completion {
    /// Trimmed text content, or the result of a dispatched tool call.
    Text(String),
    /// Content paired with usage, when `return_usage` was requested.
    WithUsage { content: String, usage: UsageRecord },
}

impl Completion {
    pub fn content(&self) -> &str {
        match self {
            Completion::Text(content) | Completion::WithUsage { content, .. } => content,
        }
    }

    pub fn usage(&self) -> Option<&UsageRecord> {
        match self {
            Completion::Text(_) => None,
            Completion::WithUsage { usage, .. } => Some(usage),
        }
    }

    pub fn into_parts(self) -> (String, Option<UsageRecord>) {
        match self {
            Completion::Text(content) => (content, None),
            Completion::WithUsage { content, usage } => (content, Some(usage)),
        }
    }
}

/// Backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderType {
    #[serde(rename = "azure-ai-project")]
    AzureAiProject,
    #[serde(rename = "azure-ai-inference")]
    AzureAiInference,
    #[serde(rename = "azure_openai")]
    AzureOpenAi,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::AzureAiProject => "azure-ai-project",
            ProviderType::AzureAiInference => "azure-ai-inference",
            ProviderType::AzureOpenAi => "azure_openai",
            ProviderType::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "azure-ai-project" => Ok(ProviderType::AzureAiProject),
            "azure-ai-inference" => Ok(ProviderType::AzureAiInference),
            "azure_openai" => Ok(ProviderType::AzureOpenAi),
            "openai" => Ok(ProviderType::OpenAi),
            other => Err(LlmError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Errors from LLM adapter operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("unsupported provider type: {0}")]
    UnsupportedProvider(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("feature '{key}' must be of type {expected} for model {model}, got {actual}")]
    InvalidArgumentType {
        model: String,
        key: String,
        expected: String,
        actual: String,
    },

    #[error("invalid prompt: {0}")]
    InvalidPrompt(String),

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no response received from {provider}")]
    EmptyResponse { provider: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("failed to decode arguments for tool '{tool_name}': {message}")]
    ToolDecode { tool_name: String, message: String },

    #[error("tool '{tool_name}' failed with arguments {arguments}: {message}")]
    ToolExecution {
        tool_name: String,
        arguments: String,
        message: String,
    },
}

impl LlmError {
    /// Network/HTTP-layer failures worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Provider { .. } | LlmError::RateLimited { .. } | LlmError::Overloaded(_)
        )
    }
}
