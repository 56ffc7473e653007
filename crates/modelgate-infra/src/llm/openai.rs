//! OpenAI and Azure OpenAI chat backends.
//!
//! Both speak the same chat-completions body; they differ in URL shape and
//! auth header. On Azure the deployment name is part of the path.

use secrecy::SecretString;
use serde_json::Value;

use modelgate_core::llm::adapter::{ChatBackend, ProviderAdapter};
use modelgate_core::llm::request::RequestPayload;
use modelgate_types::llm::{ChatMessage, ChatResponse, LlmError, ProviderType, ToolDefinition};

use super::http::{AuthScheme, HttpTransport};
use super::wire::{self, WireOptions};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat-completions backend.
pub struct OpenAiBackend {
    transport: HttpTransport,
    provider_type: ProviderType,
}

impl OpenAiBackend {
    /// OpenAI proper (or any server exposing `{base}/chat/completions`).
    pub fn openai(api_key: SecretString, base_url: Option<&str>) -> Result<Self, LlmError> {
        let base = base_url.unwrap_or(OPENAI_BASE_URL).trim_end_matches('/');
        Ok(Self {
            transport: HttpTransport::new(
                format!("{base}/chat/completions"),
                AuthScheme::Bearer,
                api_key,
            )?,
            provider_type: ProviderType::OpenAi,
        })
    }

    /// An Azure OpenAI deployment.
    pub fn azure(
        api_key: SecretString,
        endpoint: &str,
        deployment: &str,
        api_version: &str,
    ) -> Result<Self, LlmError> {
        let endpoint = endpoint.trim_end_matches('/');
        Ok(Self {
            transport: HttpTransport::new(
                format!(
                    "{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={api_version}"
                ),
                AuthScheme::ApiKey,
                api_key,
            )?,
            provider_type: ProviderType::AzureOpenAi,
        })
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }
}

impl ChatBackend for OpenAiBackend {
    fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    fn encode_messages(&self, messages: &[ChatMessage]) -> Value {
        wire::encode_messages(messages, WireOptions::default())
    }

    fn encode_tools(&self, tools: &[ToolDefinition]) -> Value {
        wire::encode_tools(tools)
    }

    async fn send(&self, payload: &RequestPayload) -> Result<Value, LlmError> {
        self.transport.post_json(&payload.to_value()).await
    }

    fn decode_response(&self, raw: &Value) -> Result<ChatResponse, LlmError> {
        wire::decode_response(raw)
    }
}

/// OpenAI / Azure OpenAI provider.
pub type OpenAiProvider = ProviderAdapter<OpenAiBackend>;
