//! Secrets-directory provider.
//!
//! Each value lives in `{dir}/{key}.txt`, the layout secret-injection
//! sidecars mount into containers. Contents are trimmed; an empty file is
//! treated as absent.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use modelgate_core::repository::secret::SecretProvider;
use modelgate_types::error::SecretError;

pub const DEFAULT_SECRETS_DIR: &str = "/etc/secrets";

pub struct FileSecretProvider {
    dir: PathBuf,
}

impl FileSecretProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.txt"))
    }
}

impl SecretProvider for FileSecretProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        // Keys never address anything outside the secrets directory.
        if key.is_empty() || key.contains(['/', '\\']) || key.contains("..") {
            return Ok(None);
        }

        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let value = contents.trim();
                if value.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(value.to_string()))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read secret file");
                Err(SecretError::StorageError(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        }
    }
}
