//! Generic provider adapter.
//!
//! [`ProviderAdapter`] implements the completion contract once:
//! prompt translation, tool registration, capability filtering, retry,
//! tool dispatch and usage extraction. Each backend family only supplies a
//! [`ChatBackend`]: how messages and tools are encoded, how the payload is
//! sent, and how a raw response is decoded.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::Instrument;

use modelgate_types::capability::ModelCapabilities;
use modelgate_types::llm::{
    ChatMessage, ChatResponse, Completion, LlmError, ProviderType, TOOL_CHOICE_KEY,
    ToolDefinition, UserPrompt,
};

use super::provider::LlmProvider;
use super::request::{CompletionArgs, build_request, RequestPayload};
use super::retry::{RetryPolicy, run_with_retry};
use super::tool::{Tool, ToolRegistry};
use super::usage::extract_usage;

/// Wire-level operations of one backend family.
pub trait ChatBackend: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    /// Parameters applied when the caller did not set them.
    fn default_params(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Translate the transcript into the backend's native message list.
    fn encode_messages(&self, messages: &[ChatMessage]) -> Value;

    /// Translate tool definitions into the backend's native tool list.
    fn encode_tools(&self, tools: &[ToolDefinition]) -> Value;

    /// Send one request. Called once per attempt.
    fn send(
        &self,
        payload: &RequestPayload,
    ) -> impl Future<Output = Result<Value, LlmError>> + Send;

    /// Decode a raw response body.
    fn decode_response(&self, raw: &Value) -> Result<ChatResponse, LlmError>;
}

/// [`LlmProvider`] over any [`ChatBackend`].
///
/// Holds the only mutable per-instance state: its tool registry. Share an
/// adapter between call sites only when they are meant to share tools.
pub struct ProviderAdapter<B> {
    backend: B,
    capabilities: Arc<ModelCapabilities>,
    tools: ToolRegistry,
    retry: RetryPolicy,
}

impl<B: ChatBackend> ProviderAdapter<B> {
    pub fn new(backend: B, capabilities: Arc<ModelCapabilities>) -> Self {
        Self {
            backend,
            capabilities,
            tools: ToolRegistry::new(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Assemble the payload for one call. Registers the call's tools.
    fn prepare(
        &self,
        transcript: &[ChatMessage],
        args: &CompletionArgs,
    ) -> Result<RequestPayload, LlmError> {
        let definitions: Vec<ToolDefinition> = args
            .callable_tools()
            .iter()
            .map(|tool| self.tools.register(Arc::clone(tool)))
            .collect();

        // A declared tool_choice is type-checked like any other parameter;
        // otherwise it bypasses the filter and is forwarded verbatim.
        let tool_choice_declared = self.capabilities.supports(TOOL_CHOICE_KEY);

        let mut params = self.backend.default_params();
        for (key, value) in args.params() {
            if key != TOOL_CHOICE_KEY || tool_choice_declared {
                params.insert(key.clone(), value.clone());
            }
        }

        let mut payload = build_request(&self.capabilities, &params)?;
        payload.insert("messages", self.backend.encode_messages(transcript));
        if !definitions.is_empty() {
            payload.insert("tools", self.backend.encode_tools(&definitions));
        }
        if !tool_choice_declared {
            if let Some(choice) = args.tool_choice_value() {
                payload.insert(TOOL_CHOICE_KEY, choice.clone());
            }
        }

        tracing::debug!(
            model = %self.capabilities.name,
            keys = ?payload.as_map().keys().collect::<Vec<_>>(),
            tools = definitions.len(),
            "Built request payload"
        );
        Ok(payload)
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: UserPrompt,
        args: CompletionArgs,
    ) -> Result<Completion, LlmError> {
        let mut transcript = vec![
            ChatMessage::System {
                content: system_prompt.to_string(),
            },
            ChatMessage::User {
                content: user_prompt,
            },
        ];

        let payload = self.prepare(&transcript, &args)?;
        let raw = run_with_retry(&self.retry, || self.backend.send(&payload)).await?;
        let response = self.backend.decode_response(&raw)?;

        let Some(choice) = response.choices.into_iter().next() else {
            tracing::error!(
                provider = %self.backend.provider_type(),
                model = %self.capabilities.name,
                "No response received"
            );
            return Err(LlmError::EmptyResponse {
                provider: self.backend.provider_type().to_string(),
            });
        };

        if !choice.tool_calls.is_empty() {
            transcript.push(ChatMessage::Assistant {
                content: choice.content.clone(),
                tool_calls: choice.tool_calls.clone(),
            });
            let result = self.tools.dispatch(&mut transcript, &choice.tool_calls)?;
            return Ok(Completion::Text(result.unwrap_or_default()));
        }

        let content = choice
            .content
            .ok_or_else(|| LlmError::MalformedResponse("choice has no content".to_string()))?
            .trim()
            .to_string();

        if args.wants_usage() {
            Ok(Completion::WithUsage {
                content,
                usage: extract_usage(&raw),
            })
        } else {
            Ok(Completion::Text(content))
        }
    }
}

impl<B: ChatBackend> LlmProvider for ProviderAdapter<B> {
    fn provider_type(&self) -> ProviderType {
        self.backend.provider_type()
    }

    fn model(&self) -> &ModelCapabilities {
        &self.capabilities
    }

    fn register_tool(&self, tool: Arc<dyn Tool>) -> ToolDefinition {
        self.tools.register(tool)
    }

    async fn get_completion(
        &self,
        system_prompt: &str,
        user_prompt: UserPrompt,
        args: CompletionArgs,
    ) -> Result<Completion, LlmError> {
        let span = tracing::info_span!(
            "chat",
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = %self.backend.provider_type(),
            gen_ai.request.model = %self.capabilities.name,
        );
        self.complete(system_prompt, user_prompt, args)
            .instrument(span)
            .await
    }
}

impl<B> fmt::Debug for ProviderAdapter<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("model", &self.capabilities.name)
            .field("tools", &self.tools)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use serde_json::json;

    use modelgate_types::error::ToolError;
    use modelgate_types::llm::{ContentBlock, ToolChoice, UsageRecord};

    use crate::llm::capability::CapabilityRegistry;
    use crate::llm::tool::FnTool;

    /// Backend that replays canned responses and records every payload.
    #[derive(Default)]
    struct MockBackend {
        responses: Mutex<VecDeque<Result<Value, LlmError>>>,
        sent: Mutex<Vec<Value>>,
        defaults: Map<String, Value>,
    }

    impl MockBackend {
        fn replying(responses: Vec<Result<Value, LlmError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<Value> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl ChatBackend for MockBackend {
        fn provider_type(&self) -> ProviderType {
            ProviderType::OpenAi
        }

        fn default_params(&self) -> Map<String, Value> {
            self.defaults.clone()
        }

        fn encode_messages(&self, messages: &[ChatMessage]) -> Value {
            serde_json::to_value(messages).unwrap()
        }

        fn encode_tools(&self, tools: &[ToolDefinition]) -> Value {
            serde_json::to_value(tools).unwrap()
        }

        async fn send(&self, payload: &RequestPayload) -> Result<Value, LlmError> {
            self.sent.lock().unwrap().push(payload.to_value());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Provider {
                    message: "no canned response".to_string(),
                }))
        }

        fn decode_response(&self, raw: &Value) -> Result<ChatResponse, LlmError> {
            serde_json::from_value(raw.clone()).map_err(|e| LlmError::Deserialization(e.to_string()))
        }
    }

    fn text_response(content: &str) -> Value {
        json!({
            "id": "resp-1",
            "choices": [{"content": content, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
        })
    }

    fn tool_response(calls: Value) -> Value {
        json!({
            "choices": [{"content": null, "tool_calls": calls, "finish_reason": "tool_calls"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
        })
    }

    fn adapter(model: &str, backend: MockBackend) -> ProviderAdapter<MockBackend> {
        let caps = CapabilityRegistry::with_builtin_models().lookup(model).unwrap();
        ProviderAdapter::new(backend, caps)
            .with_retry(RetryPolicy::transient(3, 2).with_unit(Duration::from_millis(1)))
    }

    #[tokio::test]
    async fn test_text_response_trimmed_without_usage() {
        let provider = adapter("gpt-4o", MockBackend::replying(vec![Ok(text_response("  hello \n"))]));
        let out = provider
            .get_completion("be brief", "hi".into(), CompletionArgs::new().return_usage(false))
            .await
            .unwrap();
        assert_eq!(out, Completion::Text("hello".to_string()));
    }

    #[tokio::test]
    async fn test_return_usage_pairs_content_and_usage() {
        let provider = adapter("gpt-4o", MockBackend::replying(vec![Ok(text_response("hello"))]));
        let out = provider
            .get_completion("sys", "hi".into(), CompletionArgs::new().return_usage(true))
            .await
            .unwrap();
        assert_eq!(
            out,
            Completion::WithUsage {
                content: "hello".to_string(),
                usage: UsageRecord {
                    prompt_tokens: 10,
                    completion_tokens: 4,
                    total_tokens: 14
                }
            }
        );
    }

    #[tokio::test]
    async fn test_payload_shape() {
        let provider = adapter("gpt-4o", MockBackend::replying(vec![Ok(text_response("ok"))]));
        let prompt = UserPrompt::Blocks(vec![
            ContentBlock::text("describe"),
            ContentBlock::image("https://example.com/a.png"),
        ]);
        let args = CompletionArgs::new()
            .temperature(0.2)
            .reasoning_effort("high")
            .tool(Arc::new(FnTool::new("get_time", |_| Ok("noon".to_string()))))
            .tool_choice(ToolChoice::Auto);

        provider.get_completion("sys", prompt, args).await.unwrap();

        let sent = provider.backend().sent();
        assert_eq!(sent.len(), 1);
        let body = &sent[0];
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["temperature"], json!(0.2));
        assert!(body.get("reasoning_effort").is_none());
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["name"], "get_time");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(provider.tools().contains("get_time"));
    }

    #[tokio::test]
    async fn test_tool_choice_forwarded_even_when_unsupported() {
        let caps = Arc::new(ModelCapabilities::with_defaults(
            "plain",
            "v1",
            Vec::<(String, _)>::new(),
        ));
        let provider = ProviderAdapter::new(MockBackend::replying(vec![Ok(text_response("ok"))]), caps);
        provider
            .get_completion("sys", "hi".into(), CompletionArgs::new().tool_choice(ToolChoice::None))
            .await
            .unwrap();
        assert_eq!(provider.backend().sent()[0]["tool_choice"], "none");
    }

    #[tokio::test]
    async fn test_declared_tool_choice_is_type_checked() {
        let provider = adapter("gpt-5", MockBackend::replying(vec![Ok(text_response("ok"))]));
        let err = provider
            .get_completion("sys", "hi".into(), CompletionArgs::new().param("tool_choice", 42))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LlmError::InvalidArgumentType { ref key, ref actual, .. } if key == "tool_choice" && actual == "int"
        ));
        assert!(provider.backend().sent().is_empty());
    }

    #[tokio::test]
    async fn test_declared_tool_choice_forwarded_when_valid() {
        let provider = adapter("gpt-5", MockBackend::replying(vec![Ok(text_response("ok"))]));
        provider
            .get_completion("sys", "hi".into(), CompletionArgs::new().tool_choice(ToolChoice::Required))
            .await
            .unwrap();
        assert_eq!(provider.backend().sent()[0]["tool_choice"], "required");
    }

    #[tokio::test]
    async fn test_invalid_argument_fails_before_send() {
        let provider = adapter("gpt-4o", MockBackend::replying(vec![Ok(text_response("ok"))]));
        let err = provider
            .get_completion("sys", "hi".into(), CompletionArgs::new().param("max_tokens", "many"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidArgumentType { .. }));
        assert!(provider.backend().sent().is_empty());
    }

    #[tokio::test]
    async fn test_empty_choices_is_error_not_retried() {
        let provider = adapter(
            "gpt-4o",
            MockBackend::replying(vec![Ok(json!({"choices": []})), Ok(text_response("late"))]),
        );
        let err = provider
            .get_completion("sys", "hi".into(), CompletionArgs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse { ref provider } if provider == "openai"));
        assert_eq!(provider.backend().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_content_is_malformed() {
        let provider = adapter(
            "gpt-4o",
            MockBackend::replying(vec![Ok(json!({"choices": [{"content": null}]}))]),
        );
        let err = provider
            .get_completion("sys", "hi".into(), CompletionArgs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_transient_error_retried() {
        let provider = adapter(
            "gpt-4o",
            MockBackend::replying(vec![
                Err(LlmError::Overloaded("busy".to_string())),
                Ok(text_response("second time")),
            ]),
        );
        let out = provider
            .get_completion("sys", "hi".into(), CompletionArgs::new())
            .await
            .unwrap();
        assert_eq!(out.content(), "second time");
        assert_eq!(provider.backend().sent().len(), 2);
    }

    #[tokio::test]
    async fn test_auth_failure_not_retried() {
        let provider = adapter(
            "gpt-4o",
            MockBackend::replying(vec![Err(LlmError::AuthenticationFailed), Ok(text_response("x"))]),
        );
        let err = provider
            .get_completion("sys", "hi".into(), CompletionArgs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::AuthenticationFailed));
        assert_eq!(provider.backend().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_tool_call_returns_tool_result_without_usage() {
        let provider = adapter(
            "gpt-4o",
            MockBackend::replying(vec![Ok(tool_response(json!([
                {"call_id": "call_1", "tool_name": "add", "arguments": "{\"a\": 2, \"b\": 3}"}
            ])))]),
        );
        provider.register_tool(Arc::new(FnTool::new("add", |args| {
            let a = args.get("a").and_then(Value::as_i64).ok_or_else(|| ToolError::InvalidArguments("a".into()))?;
            let b = args.get("b").and_then(Value::as_i64).ok_or_else(|| ToolError::InvalidArguments("b".into()))?;
            Ok((a + b).to_string())
        })));

        let out = provider
            .get_completion("sys", "add 2 and 3".into(), CompletionArgs::new().return_usage(true))
            .await
            .unwrap();
        assert_eq!(out, Completion::Text("5".to_string()));
    }

    #[tokio::test]
    async fn test_unregistered_tool_call_is_noop() {
        let provider = adapter(
            "gpt-4o",
            MockBackend::replying(vec![Ok(tool_response(json!([
                {"call_id": "call_1", "tool_name": "foo", "arguments": "{}"}
            ])))]),
        );
        let out = provider
            .get_completion("sys", "hi".into(), CompletionArgs::new())
            .await
            .unwrap();
        assert_eq!(out, Completion::Text(String::new()));
    }

    #[tokio::test]
    async fn test_backend_defaults_merged_under_caller_params() {
        let mut backend = MockBackend::replying(vec![Ok(text_response("a")), Ok(text_response("b"))]);
        backend.defaults.insert("temperature".to_string(), json!(0.7));
        let provider = adapter("gpt-4o", backend);

        provider
            .get_completion("sys", "hi".into(), CompletionArgs::new())
            .await
            .unwrap();
        provider
            .get_completion("sys", "hi".into(), CompletionArgs::new().temperature(0.1))
            .await
            .unwrap();

        let sent = provider.backend().sent();
        assert_eq!(sent[0]["temperature"], json!(0.7));
        assert_eq!(sent[1]["temperature"], json!(0.1));
    }

    #[tokio::test]
    async fn test_boxed_provider_delegates() {
        let provider = crate::llm::box_provider::BoxLlmProvider::new(adapter(
            "gpt-5",
            MockBackend::replying(vec![Ok(text_response(" boxed "))]),
        ));
        assert_eq!(provider.provider_type(), ProviderType::OpenAi);
        assert_eq!(provider.model().name, "gpt-5");
        let out = provider
            .get_completion("sys", "hi", CompletionArgs::new())
            .await
            .unwrap();
        assert_eq!(out.content(), "boxed");
    }
}
