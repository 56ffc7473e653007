//! Capability-filtered request payloads.
//!
//! [`build_request`] turns caller keyword arguments into the provider
//! payload: supported keys are type-checked and forwarded, unsupported keys
//! are dropped with a warning, and null values are ignored.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use modelgate_types::capability::{ModelCapabilities, ParamType};
use modelgate_types::llm::{LlmError, RETURN_USAGE_KEY, TOOL_CHOICE_KEY, ToolChoice};

use super::tool::Tool;

/// Caller-supplied options for a single completion call.
///
/// Generation parameters are an open key/value map so that model catalogs
/// can declare parameters this crate has no setter for. Callable tools
/// travel separately and are never type-checked against the catalog.
#[derive(Clone, Default)]
pub struct CompletionArgs {
    params: Map<String, Value>,
    tools: Vec<Arc<dyn Tool>>,
}

impl CompletionArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary parameter. `Value::Null` means "not provided".
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn temperature(self, temperature: f64) -> Self {
        self.param("temperature", temperature)
    }

    pub fn top_p(self, top_p: f64) -> Self {
        self.param("top_p", top_p)
    }

    pub fn max_tokens(self, max_tokens: u64) -> Self {
        self.param("max_tokens", max_tokens)
    }

    pub fn max_completion_tokens(self, max_completion_tokens: u64) -> Self {
        self.param("max_completion_tokens", max_completion_tokens)
    }

    pub fn seed(self, seed: i64) -> Self {
        self.param("seed", seed)
    }

    pub fn stream(self, stream: bool) -> Self {
        self.param("stream", stream)
    }

    pub fn reasoning_effort(self, effort: impl Into<String>) -> Self {
        self.param("reasoning_effort", effort.into())
    }

    pub fn response_format(self, format: Value) -> Self {
        self.param("response_format", format)
    }

    pub fn tool_choice(self, choice: ToolChoice) -> Self {
        self.param(TOOL_CHOICE_KEY, choice.as_str())
    }

    /// Ask for a [`UsageRecord`](modelgate_types::llm::UsageRecord) alongside the content.
    pub fn return_usage(self, return_usage: bool) -> Self {
        self.param(RETURN_USAGE_KEY, return_usage)
    }

    /// Attach a callable tool for this call.
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn callable_tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Whether `return_usage` was set to a truthy value.
    pub fn wants_usage(&self) -> bool {
        self.params.get(RETURN_USAGE_KEY).is_some_and(is_truthy)
    }

    /// The caller's tool selection mode, forwarded verbatim when present.
    pub fn tool_choice_value(&self) -> Option<&Value> {
        self.params.get(TOOL_CHOICE_KEY).filter(|v| !v.is_null())
    }
}

impl fmt::Debug for CompletionArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tool_names: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
        f.debug_struct("CompletionArgs")
            .field("params", &self.params)
            .field("tools", &tool_names)
            .finish()
    }
}

/// Provider request payload. Always contains `model`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPayload {
    body: Map<String, Value>,
}

impl RequestPayload {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.body.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.body.insert(key.into(), value);
    }

    pub fn model(&self) -> &str {
        self.body.get("model").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.body
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.body.clone())
    }
}

/// Build a request payload for `caps` from the caller's keyword arguments.
///
/// - `model` is always set to the model name.
/// - Null values and `return_usage` are ignored.
/// - Supported keys must carry a value of the declared type, otherwise the
///   call fails with [`LlmError::InvalidArgumentType`] naming the key, the
///   expected type and the actual type.
/// - Unsupported keys are dropped with a warning. This is the only trace
///   the caller gets of the drop.
pub fn build_request(
    caps: &ModelCapabilities,
    params: &Map<String, Value>,
) -> Result<RequestPayload, LlmError> {
    let mut body = Map::new();
    body.insert("model".to_string(), Value::String(caps.name.clone()));

    for (key, value) in params {
        if value.is_null() || key == RETURN_USAGE_KEY {
            continue;
        }

        let Some(expected) = caps.expected(key) else {
            tracing::warn!(
                model = %caps.name,
                feature = %key,
                "Feature not supported by model, dropping it from the request"
            );
            continue;
        };

        if !expected.matches(value) {
            let actual = ParamType::name_of(value);
            tracing::error!(
                model = %caps.name,
                feature = %key,
                expected = %expected,
                actual = %actual,
                "Invalid type for feature"
            );
            return Err(LlmError::InvalidArgumentType {
                model: caps.name.clone(),
                key: key.clone(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }

        body.insert(key.clone(), value.clone());
    }

    Ok(RequestPayload { body })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelgate_types::capability::ExpectedType;
    use serde_json::json;

    use crate::llm::capability::CapabilityRegistry;
    use crate::llm::tool::FnTool;

    fn gpt4o() -> Arc<ModelCapabilities> {
        CapabilityRegistry::with_builtin_models().lookup("gpt-4o").unwrap()
    }

    fn gpt5() -> Arc<ModelCapabilities> {
        CapabilityRegistry::with_builtin_models().lookup("gpt-5").unwrap()
    }

    #[test]
    fn test_supported_forwarded_unsupported_dropped_null_ignored() {
        let caps = ModelCapabilities::with_defaults(
            "m",
            "v1",
            [("temperature", ExpectedType::from(ParamType::Float))],
        );
        let args = CompletionArgs::new()
            .temperature(0.7)
            .max_tokens(100)
            .top_p(0.9)
            .param("stream", Value::Null);

        let payload = build_request(&caps, args.params()).unwrap();
        assert_eq!(
            payload.to_value(),
            json!({"model": "m", "temperature": 0.7, "max_tokens": 100})
        );
        assert!(!payload.contains_key("top_p"));
        assert!(!payload.contains_key("stream"));
    }

    #[test]
    fn test_wrong_type_names_key_and_types() {
        let args = CompletionArgs::new().param("temperature", "hot");
        let err = build_request(&gpt4o(), args.params()).unwrap_err();
        match err {
            LlmError::InvalidArgumentType {
                model,
                key,
                expected,
                actual,
            } => {
                assert_eq!(model, "gpt-4o");
                assert_eq!(key, "temperature");
                assert_eq!(expected, "float");
                assert_eq!(actual, "string");
            }
            other => panic!("expected InvalidArgumentType, got {other:?}"),
        }
    }

    #[test]
    fn test_integer_temperature_is_rejected() {
        let args = CompletionArgs::new().param("temperature", 1);
        let err = build_request(&gpt4o(), args.params()).unwrap_err();
        assert!(matches!(err, LlmError::InvalidArgumentType { ref actual, .. } if actual == "int"));
    }

    #[test]
    fn test_return_usage_truthiness() {
        assert!(!CompletionArgs::new().wants_usage());
        assert!(CompletionArgs::new().param("return_usage", 1).wants_usage());
        assert!(CompletionArgs::new().param("return_usage", "yes").wants_usage());
        assert!(!CompletionArgs::new().param("return_usage", 0).wants_usage());
        assert!(!CompletionArgs::new().param("return_usage", "").wants_usage());
        assert!(!CompletionArgs::new().param("return_usage", Value::Null).wants_usage());
        assert!(!CompletionArgs::new().return_usage(false).wants_usage());
    }

    #[test]
    fn test_return_usage_never_forwarded() {
        let args = CompletionArgs::new().return_usage(true).seed(7);
        let payload = build_request(&gpt4o(), args.params()).unwrap();
        assert!(!payload.contains_key(RETURN_USAGE_KEY));
        assert_eq!(payload.get("seed"), Some(&json!(7)));
        assert!(args.wants_usage());
    }

    #[test]
    fn test_empty_args_yield_model_only() {
        let payload = build_request(&gpt5(), &Map::new()).unwrap();
        assert_eq!(payload.to_value(), json!({"model": "gpt-5"}));
        assert_eq!(payload.model(), "gpt-5");
    }

    #[test]
    fn test_gpt5_drops_temperature_keeps_reasoning_effort() {
        let args = CompletionArgs::new()
            .temperature(0.2)
            .reasoning_effort("low")
            .max_completion_tokens(512);
        let payload = build_request(&gpt5(), args.params()).unwrap();
        assert!(!payload.contains_key("temperature"));
        assert_eq!(payload.get("reasoning_effort"), Some(&json!("low")));
        assert_eq!(payload.get("max_completion_tokens"), Some(&json!(512)));
    }

    #[test]
    fn test_response_format_accepts_any_structure() {
        let args = CompletionArgs::new().response_format(json!({"type": "json_object"}));
        let payload = build_request(&gpt4o(), args.params()).unwrap();
        assert_eq!(payload.get("response_format"), Some(&json!({"type": "json_object"})));
    }

    #[test]
    fn test_tool_choice_accessor() {
        let args = CompletionArgs::new().tool_choice(ToolChoice::Required);
        assert_eq!(args.tool_choice_value(), Some(&json!("required")));
        assert!(CompletionArgs::new().tool_choice_value().is_none());
    }

    #[test]
    fn test_debug_lists_tool_names() {
        let args = CompletionArgs::new().tool(Arc::new(FnTool::new("get_time", |_| Ok(String::new()))));
        let debug = format!("{args:?}");
        assert!(debug.contains("get_time"));
    }
}
