//! Azure AI Project chat backend.
//!
//! Project-scoped model deployments served under `{endpoint}/models`.
//! Requests default to `temperature = 0.7` unless the caller sets one.

use secrecy::SecretString;
use serde_json::{Map, Value};

use modelgate_core::llm::adapter::{ChatBackend, ProviderAdapter};
use modelgate_core::llm::request::RequestPayload;
use modelgate_types::llm::{ChatMessage, ChatResponse, LlmError, ProviderType, ToolDefinition};

use super::http::{AuthScheme, HttpTransport};
use super::wire::{self, WireOptions};

pub const DEFAULT_TEMPERATURE: f64 = 0.7;

pub struct AzureProjectBackend {
    transport: HttpTransport,
}

impl AzureProjectBackend {
    pub fn new(api_key: SecretString, endpoint: &str, api_version: &str) -> Result<Self, LlmError> {
        let endpoint = endpoint.trim_end_matches('/');
        Ok(Self {
            transport: HttpTransport::new(
                format!("{endpoint}/models/chat/completions?api-version={api_version}"),
                AuthScheme::ApiKey,
                api_key,
            )?,
        })
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }
}

impl ChatBackend for AzureProjectBackend {
    fn provider_type(&self) -> ProviderType {
        ProviderType::AzureAiProject
    }

    fn default_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("temperature".to_string(), Value::from(DEFAULT_TEMPERATURE));
        params
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

/// Azure AI Project provider.
pub type AzureProjectProvider = ProviderAdapter<AzureProjectBackend>;
