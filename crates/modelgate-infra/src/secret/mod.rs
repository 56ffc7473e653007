//! Secret provider implementations.
//!
//! - `env`: environment variables
//! - `file`: a secrets directory holding one `{key}.txt` file per value

pub mod env;
pub mod file;

use std::sync::Arc;

use modelgate_core::service::secret::SecretService;

use self::env::EnvSecretProvider;
use self::file::FileSecretProvider;

/// Resolution chain for secret values: secrets directory first, then environment.
///
/// Plain settings use [`SecretService::reversed`] on the same chain.
pub fn build_secret_chain(secrets_dir: impl Into<std::path::PathBuf>) -> SecretService {
    SecretService::new(vec![
        Arc::new(FileSecretProvider::new(secrets_dir)),
        Arc::new(EnvSecretProvider::new()),
    ])
}
