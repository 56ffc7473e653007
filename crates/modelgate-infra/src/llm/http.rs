//! JSON-over-HTTPS transport shared by the chat backends.
//!
//! The API key is wrapped in [`SecretString`] and only exposed when the
//! auth header is attached. `HttpTransport` intentionally does not derive
//! Debug.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use modelgate_types::llm::LlmError;

/// How the API key is presented to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `api-key: <key>`
    ApiKey,
}

pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    auth: AuthScheme,
    api_key: SecretString,
}

impl HttpTransport {
    /// Per-request timeout. Long generations can take minutes.
    const TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new(url: String, auth: AuthScheme, api_key: SecretString) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|e| LlmError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            auth,
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `body` and return the parsed JSON response.
    pub async fn post_json(&self, body: &Value) -> Result<Value, LlmError> {
        let request = self.client.post(&self.url).json(body);
        let request = match self.auth {
            AuthScheme::Bearer => request.bearer_auth(self.api_key.expose_secret()),
            AuthScheme::ApiKey => request.header("api-key", self.api_key.expose_secret()),
        };

        let response = request.send().await.map_err(|e| LlmError::Provider {
            message: format!("HTTP request failed: {e}"),
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = retry_after_ms(response.headers());
            let error_body = response.text().await.unwrap_or_default();
            return Err(status_error(status, retry_after_ms, error_body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))
    }
}

/// `retry-after` in whole seconds, converted to milliseconds.
fn retry_after_ms(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| secs.saturating_mul(1000))
}

/// Map a non-success status to the error taxonomy.
pub fn status_error(status: StatusCode, retry_after_ms: Option<u64>, body: String) -> LlmError {
    match status.as_u16() {
        400 | 404 | 422 => LlmError::InvalidRequest(format!("HTTP {status}: {body}")),
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited { retry_after_ms },
        503 | 529 => LlmError::Overloaded(body),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, None, "bad".into()),
            LlmError::InvalidRequest(_)
        ));
        assert!(matches!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, None, String::new()),
            LlmError::InvalidRequest(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, None, String::new()),
            LlmError::AuthenticationFailed
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, Some(2000), String::new()),
            LlmError::RateLimited {
                retry_after_ms: Some(2000)
            }
        ));
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, None, String::new()),
            LlmError::Overloaded(_)
        ));
        assert!(matches!(
            status_error(StatusCode::from_u16(529).unwrap(), None, String::new()),
            LlmError::Overloaded(_)
        ));
        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, None, "boom".into());
        assert!(err.is_transient());
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_retry_after_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after_ms(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_after_ms(&headers), Some(3000));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after_ms(&headers), None);
    }
}
