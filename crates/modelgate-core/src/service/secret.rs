//! SecretService resolves values through a chain of providers.
//!
//! Providers are ordered by precedence (first match wins). Configuration
//! loading builds two orderings over the same providers: secrets prefer the
//! secrets directory, plain settings prefer the environment.

use modelgate_types::error::SecretError;

use crate::repository::secret::DynSecretProvider;

/// Chain of secret providers, highest priority first.
#[derive(Clone)]
pub struct SecretService {
    providers: Vec<DynSecretProvider>,
}

impl SecretService {
    pub fn new(providers: Vec<DynSecretProvider>) -> Self {
        Self { providers }
    }

    /// Resolve `key` through the chain. Empty values count as absent.
    pub async fn get_secret(&self, key: &str) -> Result<Option<String>, SecretError> {
        for provider in &self.providers {
            if let Some(value) = provider.get_boxed(key).await? {
                if value.trim().is_empty() {
                    continue;
                }
                tracing::debug!(key = %key, provider = provider.name(), "Resolved value");
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Same chain, reversed precedence.
    pub fn reversed(&self) -> Self {
        let mut providers = self.providers.clone();
        providers.reverse();
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

impl std::fmt::Debug for SecretService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretService")
            .field("providers", &self.provider_names())
            .finish()
    }
}
