//! LLM backend implementations.
//!
//! Concrete [`ChatBackend`](modelgate_core::llm::adapter::ChatBackend)s for
//! OpenAI, Azure OpenAI, Azure AI Inference and Azure AI Project, all over
//! one OpenAI-style wire codec. Also provides the provider factory
//! ([`create_provider`]) and a connection check ([`test_provider_connection`]).

pub mod azure_inference;
pub mod azure_project;
pub mod http;
pub mod openai;
pub mod wire;

use secrecy::{ExposeSecret, SecretString};

use modelgate_core::llm::adapter::ProviderAdapter;
use modelgate_core::llm::box_provider::BoxLlmProvider;
use modelgate_core::llm::capability::CapabilityRegistry;
use modelgate_core::llm::request::CompletionArgs;
use modelgate_core::llm::retry::RetryPolicy;
use modelgate_types::llm::{LlmError, ProviderType};

use crate::config::AppConfig;

use self::azure_inference::AzureInferenceBackend;
use self::azure_project::AzureProjectBackend;
use self::openai::OpenAiBackend;

/// Everything the factory needs to build a provider.
#[derive(Debug)]
pub struct ProviderSettings {
    /// Provider type name, e.g. "azure-ai-project".
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    pub api_version: String,
    pub api_key: Option<SecretString>,
    pub openai_api_key: Option<SecretString>,
    pub openai_base_url: Option<String>,
    pub retry: RetryPolicy,
}

fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}

impl From<&AppConfig> for ProviderSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            provider: config.default_provider.clone(),
            model: config.model.clone(),
            endpoint: config.azure_endpoint.clone(),
            api_version: config.azure_api_version.clone(),
            api_key: config.azure_api_key.as_ref().map(copy_secret),
            openai_api_key: config.openai_api_key.as_ref().map(copy_secret),
            openai_base_url: config.openai_endpoint.clone(),
            retry: RetryPolicy::transient(config.retry_max_attempts, config.retry_delay_base),
        }
    }
}

/// Create a [`BoxLlmProvider`] for the configured model and backend.
///
/// # Errors
///
/// - `UnsupportedModel` if the model is not in `registry`
/// - `UnsupportedProvider` if the provider type is unknown
/// - `AuthenticationFailed` if the selected backend has no API key
/// - `Config` if an Azure backend has no endpoint
pub fn create_provider(
    settings: &ProviderSettings,
    registry: &CapabilityRegistry,
) -> Result<BoxLlmProvider, LlmError> {
    let capabilities = registry.lookup(&settings.model)?;
    let provider_type: ProviderType = settings.provider.parse()?;

    if provider_type != ProviderType::OpenAi && settings.endpoint.trim().is_empty() {
        return Err(LlmError::Config(format!(
            "{provider_type} requires an endpoint"
        )));
    }

    let azure_key = || {
        settings
            .api_key
            .as_ref()
            .map(copy_secret)
            .ok_or(LlmError::AuthenticationFailed)
    };

    let provider = match provider_type {
        ProviderType::AzureAiProject => {
            let backend = AzureProjectBackend::new(azure_key()?, &settings.endpoint, &settings.api_version)?;
            BoxLlmProvider::new(ProviderAdapter::new(backend, capabilities).with_retry(settings.retry))
        }
        ProviderType::AzureAiInference => {
            let backend =
                AzureInferenceBackend::new(azure_key()?, &settings.endpoint, &settings.api_version)?;
            BoxLlmProvider::new(ProviderAdapter::new(backend, capabilities).with_retry(settings.retry))
        }
        ProviderType::AzureOpenAi => {
            let backend = OpenAiBackend::azure(
                azure_key()?,
                &settings.endpoint,
                &settings.model,
                &settings.api_version,
            )?;
            BoxLlmProvider::new(ProviderAdapter::new(backend, capabilities).with_retry(settings.retry))
        }
        ProviderType::OpenAi => {
            let key = settings
                .openai_api_key
                .as_ref()
                .map(copy_secret)
                .ok_or(LlmError::AuthenticationFailed)?;
            let backend = OpenAiBackend::openai(key, settings.openai_base_url.as_deref())?;
            BoxLlmProvider::new(ProviderAdapter::new(backend, capabilities).with_retry(settings.retry))
        }
    };

    tracing::info!(
        provider = %provider_type,
        model = %settings.model,
        "Created provider"
    );
    Ok(provider)
}

/// Check provider connectivity with a minimal "Hello" completion.
pub async fn test_provider_connection(provider: &BoxLlmProvider) -> Result<(), LlmError> {
    let args = if provider.model().supports("max_tokens") {
        CompletionArgs::new().max_tokens(10)
    } else {
        CompletionArgs::new()
    };
    provider
        .get_completion("You are a helpful assistant.", "Hello", args)
        .await?;
    Ok(())
}
