//! Secret provider trait definition.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use modelgate_types::error::SecretError;

/// Read-only source of secret and configuration values.
///
/// Implementations: environment variables and a secrets directory
/// (one `{key}.txt` file per value) in `modelgate-infra`.
pub trait SecretProvider: Send + Sync {
    /// Short label used in logs (e.g., "env", "file").
    fn name(&self) -> &str;

    /// Retrieve a value by key. `None` if this provider does not hold it.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, SecretError>> + Send;
}

/// Object-safe version of [`SecretProvider`].
pub trait SecretProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn get_boxed<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, SecretError>> + Send + 'a>>;
}

impl<T: SecretProvider> SecretProviderDyn for T {
    fn name(&self) -> &str {
        SecretProvider::name(self)
    }

    fn get_boxed<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, SecretError>> + Send + 'a>> {
        Box::pin(self.get(key))
    }
}

/// Shared, type-erased secret provider.
pub type DynSecretProvider = Arc<dyn SecretProviderDyn>;
