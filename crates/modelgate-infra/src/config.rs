//! Application configuration loader.
//!
//! Values come from three places, looked up in a fixed order:
//! - secrets (API keys): secrets directory, then environment, then default
//! - plain settings: environment, then secrets directory, then default
//!
//! A `.env` file in the working directory is loaded first and overrides the
//! process environment. Missing required values are errors; missing
//! optional values are logged and left unset.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::SecretString;
use serde::Deserialize;

use modelgate_core::llm::capability::CapabilityRegistry;
use modelgate_core::llm::retry::{DEFAULT_DELAY_BASE, DEFAULT_MAX_ATTEMPTS};
use modelgate_core::service::secret::SecretService;
use modelgate_types::capability::{ExpectedType, ModelCapabilities};
use modelgate_types::error::ConfigError;

use crate::secret::build_secret_chain;
use crate::secret::env::EnvSecretProvider;
use crate::secret::file::DEFAULT_SECRETS_DIR;

pub const DEFAULT_PROVIDER: &str = "azure-ai-project";

pub mod keys {
    pub const DEFAULT_PROVIDER: &str = "DEFAULT_PROVIDER";
    pub const DEPLOYMENT_NAME: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
    pub const AZURE_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
    pub const AZURE_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
    pub const AZURE_API_KEY: &str = "AZURE_OPENAI_API_KEY";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const OPENAI_ENDPOINT: &str = "OPENAI_ENDPOINT";
    pub const SECRETS_PATH: &str = "AKEYLESS_SECRETS_PATH";
    pub const MODELS_FILE: &str = "MODELGATE_MODELS_FILE";
    pub const RETRY_MAX_ATTEMPTS: &str = "MODELGATE_RETRY_MAX_ATTEMPTS";
    pub const RETRY_DELAY_BASE: &str = "MODELGATE_RETRY_DELAY_BASE";
}

/// Resolved application configuration.
///
/// API keys are held as [`SecretString`] and print redacted.
#[derive(Debug)]
pub struct AppConfig {
    pub default_provider: String,
    /// Model identifier; also the Azure OpenAI deployment name.
    pub model: String,
    pub azure_endpoint: String,
    pub azure_api_version: String,
    pub azure_api_key: Option<SecretString>,
    pub openai_api_key: Option<SecretString>,
    pub openai_endpoint: Option<String>,
    pub secrets_dir: PathBuf,
    pub models_file: Option<PathBuf>,
    pub retry_max_attempts: u32,
    pub retry_delay_base: u32,
}

impl AppConfig {
    /// Load `.env`, then resolve every key from the secrets directory named
    /// by `AKEYLESS_SECRETS_PATH` (default `/etc/secrets`) and the environment.
    pub async fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv_override() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
        }

        let env = SecretService::new(vec![Arc::new(EnvSecretProvider::new())]);
        let secrets_dir = env
            .get_secret(keys::SECRETS_PATH)
            .await
            .map_err(|e| lookup_error(keys::SECRETS_PATH, e))?
            .unwrap_or_else(|| DEFAULT_SECRETS_DIR.to_string());

        let chain = build_secret_chain(&secrets_dir);
        Self::resolve(&chain, PathBuf::from(secrets_dir)).await
    }

    /// Resolve every key through `secret_chain` (highest priority first for
    /// secret values); plain settings use the same chain reversed.
    pub async fn resolve(secret_chain: &SecretService, secrets_dir: PathBuf) -> Result<Self, ConfigError> {
        let resolver = Resolver {
            secret: secret_chain,
            plain: secret_chain.reversed(),
        };

        let config = Self {
            default_provider: resolver
                .plain_or(keys::DEFAULT_PROVIDER, DEFAULT_PROVIDER)
                .await?,
            model: resolver.required(keys::DEPLOYMENT_NAME).await?,
            azure_endpoint: resolver.required(keys::AZURE_ENDPOINT).await?,
            azure_api_version: resolver.required(keys::AZURE_API_VERSION).await?,
            azure_api_key: resolver.secret(keys::AZURE_API_KEY).await?,
            openai_api_key: resolver.secret(keys::OPENAI_API_KEY).await?,
            openai_endpoint: resolver.optional(keys::OPENAI_ENDPOINT).await?,
            secrets_dir,
            models_file: resolver.optional(keys::MODELS_FILE).await?.map(PathBuf::from),
            retry_max_attempts: resolver
                .number(keys::RETRY_MAX_ATTEMPTS, DEFAULT_MAX_ATTEMPTS)
                .await?,
            retry_delay_base: resolver
                .number(keys::RETRY_DELAY_BASE, DEFAULT_DELAY_BASE)
                .await?,
        };

        tracing::info!(
            provider = %config.default_provider,
            model = %config.model,
            secrets_dir = %config.secrets_dir.display(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Built-in capability registry, extended by the model catalog if one is configured.
    pub async fn capability_registry(&self) -> Result<CapabilityRegistry, ConfigError> {
        let mut registry = CapabilityRegistry::with_builtin_models();
        if let Some(path) = &self.models_file {
            registry.extend(load_model_catalog(path).await?);
        }
        Ok(registry)
    }
}

struct Resolver<'a> {
    secret: &'a SecretService,
    plain: SecretService,
}

impl Resolver<'_> {
    async fn lookup(chain: &SecretService, key: &str) -> Result<Option<String>, ConfigError> {
        chain
            .get_secret(key)
            .await
            .map(|v| v.map(|s| s.trim().to_string()))
            .map_err(|e| lookup_error(key, e))
    }

    async fn required(&self, key: &str) -> Result<String, ConfigError> {
        Self::lookup(&self.plain, key).await?.ok_or_else(|| {
            tracing::error!(key = %key, "Required config not set");
            ConfigError::MissingRequired(key.to_string())
        })
    }

    async fn optional(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = Self::lookup(&self.plain, key).await?;
        if value.is_none() {
            tracing::warn!(key = %key, "Optional config not set");
        }
        Ok(value)
    }

    async fn plain_or(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        Ok(Self::lookup(&self.plain, key)
            .await?
            .unwrap_or_else(|| default.to_string()))
    }

    async fn secret(&self, key: &str) -> Result<Option<SecretString>, ConfigError> {
        let value = Self::lookup(self.secret, key).await?;
        if value.is_none() {
            tracing::warn!(key = %key, "Optional secret not set");
        }
        Ok(value.map(SecretString::from))
    }

    async fn number(&self, key: &str, default: u32) -> Result<u32, ConfigError> {
        match Self::lookup(&self.plain, key).await? {
            None => Ok(default),
            Some(raw) => raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                message: format!("expected a non-negative integer, got '{raw}': {e}"),
            }),
        }
    }
}

fn lookup_error(key: &str, err: modelgate_types::error::SecretError) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: err.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ModelCatalog {
    #[serde(default)]
    models: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    features: HashMap<String, ExpectedType>,
}

/// Read a TOML model catalog.
///
/// Each `[[models]]` entry's features are merged over the default feature set.
pub async fn load_model_catalog(path: &Path) -> Result<Vec<ModelCapabilities>, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let catalog: ModelCatalog = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let models: Vec<ModelCapabilities> = catalog
        .models
        .into_iter()
        .map(|entry| ModelCapabilities::with_defaults(entry.name, entry.version, entry.features))
        .collect();

    tracing::info!(path = %path.display(), count = models.len(), "Loaded model catalog");
    Ok(models)
}
