//! Environment variable secret provider.

use modelgate_core::repository::secret::SecretProvider;
use modelgate_types::error::SecretError;

/// Read-only provider backed by the process environment.
pub struct EnvSecretProvider;

impl EnvSecretProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EnvSecretProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretProvider for EnvSecretProvider {
    fn name(&self) -> &str {
        "env"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        match std::env::var(key) {
            Ok(val) => Ok(Some(val)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            // Present but not valid Unicode; secrets must be strings.
            Err(std::env::VarError::NotUnicode(_)) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_var_is_none() {
        let provider = EnvSecretProvider::new();
        let val = provider
            .get("MODELGATE_TEST_DEFINITELY_UNSET_7f3a")
            .await
            .unwrap();
        assert!(val.is_none());
    }

    #[tokio::test]
    async fn test_reads_existing_var() {
        // PATH is set in every test environment.
        let provider = EnvSecretProvider::new();
        assert!(provider.get("PATH").await.unwrap().is_some());
    }
}
