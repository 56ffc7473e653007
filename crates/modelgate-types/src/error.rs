use thiserror::Error;

/// Errors raised by a tool callable.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Failed(String),
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required config: {0}")]
    MissingRequired(String),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Errors related to secret operations.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret provider unavailable")]
    ProviderUnavailable,

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors from prompt registration and rendering.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt '{name}' not registered (ns={namespace})")]
    NotFound { namespace: String, name: String },

    #[error("failed to render prompt '{name}': {message}")]
    Render { name: String, message: String },

    #[error("failed to load prompt '{name}': {message}")]
    Io { name: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired("AZURE_OPENAI_ENDPOINT".to_string());
        assert_eq!(err.to_string(), "missing required config: AZURE_OPENAI_ENDPOINT");
    }

    #[test]
    fn test_prompt_error_display() {
        let err = PromptError::NotFound {
            namespace: "default".to_string(),
            name: "greet".to_string(),
        };
        assert_eq!(err.to_string(), "prompt 'greet' not registered (ns=default)");
    }

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::Failed("division by zero".to_string());
        assert_eq!(err.to_string(), "division by zero");
    }
}
