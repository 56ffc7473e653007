//! Azure AI Inference chat backend.
//!
//! The user turn is always sent as a content-item array, and image items
//! without an explicit detail are sent with `high` detail.

use secrecy::SecretString;
use serde_json::Value;

use modelgate_core::llm::adapter::{ChatBackend, ProviderAdapter};
use modelgate_core::llm::request::RequestPayload;
use modelgate_types::llm::{
    ChatMessage, ChatResponse, ImageDetail, LlmError, ProviderType, ToolDefinition,
};

use super::http::{AuthScheme, HttpTransport};
use super::wire::{self, WireOptions};

const WIRE: WireOptions = WireOptions {
    user_text_as_items: true,
    default_image_detail: Some(ImageDetail::High),
};

pub struct AzureInferenceBackend {
    transport: HttpTransport,
}

impl AzureInferenceBackend {
    pub fn new(api_key: SecretString, endpoint: &str, api_version: &str) -> Result<Self, LlmError> {
        let endpoint = endpoint.trim_end_matches('/');
        Ok(Self {
            transport: HttpTransport::new(
                format!("{endpoint}/chat/completions?api-version={api_version}"),
                AuthScheme::ApiKey,
                api_key,
            )?,
        })
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }
}

impl ChatBackend for AzureInferenceBackend {
    fn provider_type(&self) -> ProviderType {
        ProviderType::AzureAiInference
    }

    fn encode_messages(&self, messages: &[ChatMessage]) -> Value {
        wire::encode_messages(messages, WIRE)
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

/// Azure AI Inference provider.
pub type AzureInferenceProvider = ProviderAdapter<AzureInferenceBackend>;
