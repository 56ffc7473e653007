//! Tool registry and dispatcher.
//!
//! Tools are local callables a backend may ask to invoke mid-conversation.
//! Each adapter instance owns one [`ToolRegistry`]; the same tool may be
//! registered in several registries, each holding its own `Arc`.
//!
//! Dispatch executes only the first tool call that resolves to a registered
//! tool. Remaining calls requested in the same turn are not executed.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Map, Value, json};

use modelgate_types::error::ToolError;
use modelgate_types::llm::{ChatMessage, LlmError, ToolDefinition, ToolInvocationRequest};

/// Description used when a tool carries no documentation.
pub const DEFAULT_TOOL_DESCRIPTION: &str = "No description provided.";

/// A locally registered callable that a backend may invoke.
pub trait Tool: Send + Sync {
    /// Identifier the backend uses to call the tool.
    fn name(&self) -> &str;

    /// Human-readable documentation, if any.
    fn description(&self) -> Option<&str> {
        None
    }

    /// JSON schema of accepted arguments. Open by default.
    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    /// Run the tool synchronously with decoded keyword arguments.
    fn call(&self, arguments: Map<String, Value>) -> Result<String, ToolError>;
}

type ToolFn = dyn Fn(Map<String, Value>) -> Result<String, ToolError> + Send + Sync;

/// A [`Tool`] built from a closure.
pub struct FnTool {
    name: String,
    description: Option<String>,
    parameters: Value,
    func: Box<ToolFn>,
}

impl FnTool {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: None,
            parameters: json!({"type": "object", "properties": {}}),
            func: Box::new(func),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }
}

impl fmt::Debug for FnTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn parameters_schema(&self) -> Value {
        self.parameters.clone()
    }

    fn call(&self, arguments: Map<String, Value>) -> Result<String, ToolError> {
        (self.func)(arguments)
    }
}

/// Build the definition forwarded to the backend for a tool.
pub fn tool_definition(tool: &dyn Tool) -> ToolDefinition {
    ToolDefinition {
        name: tool.name().to_string(),
        description: tool
            .description()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(DEFAULT_TOOL_DESCRIPTION)
            .to_string(),
        parameters: tool.parameters_schema(),
    }
}

/// Name-indexed tool registry.
///
/// Registration of an existing name replaces the previous tool
/// (last writer wins); concurrent registration never corrupts the map.
#[derive(Default)]
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool and return its definition for the request payload.
    pub fn register(&self, tool: Arc<dyn Tool>) -> ToolDefinition {
        let definition = tool_definition(tool.as_ref());
        if self.tools.insert(definition.name.clone(), tool).is_some() {
            tracing::debug!(tool = %definition.name, "Replaced previously registered tool");
        }
        tracing::info!(tool = %definition.name, "Registered tool");
        definition
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Sorted list of registered tool names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve the backend's tool calls, in order.
    ///
    /// - Arguments are decoded first; malformed arguments fail the dispatch
    ///   before any tool runs.
    /// - Unregistered names are skipped with a warning.
    /// - The first registered tool is executed; its result is appended to
    ///   `transcript` as a tool message carrying the original `call_id` and
    ///   returned. Later calls in the batch are not executed.
    /// - Tool failures are logged with name and arguments, then propagated.
    ///
    /// Returns `Ok(None)` when no requested tool was registered.
    pub fn dispatch(
        &self,
        transcript: &mut Vec<ChatMessage>,
        requests: &[ToolInvocationRequest],
    ) -> Result<Option<String>, LlmError> {
        for request in requests {
            let arguments = decode_arguments(request)?;

            let Some(tool) = self.get(&request.tool_name) else {
                tracing::warn!(tool = %request.tool_name, "No registered tool found, skipping");
                continue;
            };

            let args_repr = Value::Object(arguments.clone()).to_string();
            match tool.call(arguments) {
                Ok(result) => {
                    tracing::info!(
                        tool = %request.tool_name,
                        arguments = %args_repr,
                        result = %result,
                        "Executed tool"
                    );
                    transcript.push(ChatMessage::Tool {
                        call_id: request.call_id.clone(),
                        content: result.clone(),
                    });
                    return Ok(Some(result));
                }
                Err(err) => {
                    tracing::error!(
                        tool = %request.tool_name,
                        arguments = %args_repr,
                        error = %err,
                        "Error executing tool"
                    );
                    return Err(LlmError::ToolExecution {
                        tool_name: request.tool_name.clone(),
                        arguments: args_repr,
                        message: err.to_string(),
                    });
                }
            }
        }

        Ok(None)
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

/// Decode a call's serialized arguments into a keyword map.
///
/// An empty argument string is treated as `{}`.
fn decode_arguments(request: &ToolInvocationRequest) -> Result<Map<String, Value>, LlmError> {
    let raw = if request.arguments.trim().is_empty() {
        "{}"
    } else {
        request.arguments.as_str()
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => {
            let message = format!(
                "expected a JSON object, got {}",
                modelgate_types::capability::ParamType::name_of(&other)
            );
            tracing::error!(tool = %request.tool_name, arguments = %raw, %message, "Failed to decode tool arguments");
            Err(LlmError::ToolDecode {
                tool_name: request.tool_name.clone(),
                message,
            })
        }
        Err(e) => {
            tracing::error!(tool = %request.tool_name, arguments = %raw, error = %e, "Failed to decode tool arguments");
            Err(LlmError::ToolDecode {
                tool_name: request.tool_name.clone(),
                message: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn invocation(call_id: &str, name: &str, arguments: &str) -> ToolInvocationRequest {
        ToolInvocationRequest {
            call_id: call_id.to_string(),
            tool_name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    fn echo_tool(name: &str, calls: Arc<AtomicUsize>) -> Arc<dyn Tool> {
        let label = name.to_string();
        Arc::new(FnTool::new(name, move |args| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{label}:{}", Value::Object(args)))
        }))
    }

    #[test]
    fn test_register_uses_fallback_description() {
        let registry = ToolRegistry::new();
        let def = registry.register(echo_tool("get_time", Arc::default()));
        assert_eq!(def.name, "get_time");
        assert_eq!(def.description, DEFAULT_TOOL_DESCRIPTION);
        assert_eq!(def.parameters, json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn test_register_uses_tool_description() {
        let registry = ToolRegistry::new();
        let tool = FnTool::new("get_time", |_| Ok("noon".to_string()))
            .with_description("Return the current time.");
        let def = registry.register(Arc::new(tool));
        assert_eq!(def.description, "Return the current time.");
    }

    #[test]
    fn test_reregistration_overwrites() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(FnTool::new("t", |_| Ok("first".to_string()))));
        registry.register(Arc::new(FnTool::new("t", |_| Ok("second".to_string()))));
        assert_eq!(registry.len(), 1);

        let mut transcript = Vec::new();
        let out = registry
            .dispatch(&mut transcript, &[invocation("c1", "t", "{}")])
            .unwrap();
        assert_eq!(out.as_deref(), Some("second"));
    }

    #[test]
    fn test_dispatch_skips_unregistered_then_runs_registered() {
        let registry = ToolRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        registry.register(echo_tool("known", calls.clone()));

        let mut transcript = Vec::new();
        let out = registry
            .dispatch(
                &mut transcript,
                &[
                    invocation("c1", "unknown", "{}"),
                    invocation("c2", "known", r#"{"x": 1}"#),
                ],
            )
            .unwrap();

        assert_eq!(out.as_deref(), Some(r#"known:{"x":1}"#));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            transcript,
            vec![ChatMessage::Tool {
                call_id: "c2".to_string(),
                content: r#"known:{"x":1}"#.to_string(),
            }]
        );
    }

    #[test]
    fn test_dispatch_runs_only_first_registered_call() {
        let registry = ToolRegistry::new();
        let first_calls = Arc::new(AtomicUsize::new(0));
        let second_calls = Arc::new(AtomicUsize::new(0));
        registry.register(echo_tool("first", first_calls.clone()));
        registry.register(echo_tool("second", second_calls.clone()));

        let mut transcript = Vec::new();
        let out = registry
            .dispatch(
                &mut transcript,
                &[invocation("c1", "first", "{}"), invocation("c2", "second", "{}")],
            )
            .unwrap();

        assert_eq!(out.as_deref(), Some("first:{}"));
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_dispatch_only_unregistered_is_noop() {
        let registry = ToolRegistry::new();
        let mut transcript = Vec::new();
        let out = registry
            .dispatch(&mut transcript, &[invocation("c1", "foo", "{}")])
            .unwrap();
        assert!(out.is_none());
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_dispatch_decode_error_before_any_call() {
        let registry = ToolRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        registry.register(echo_tool("known", calls.clone()));

        let mut transcript = Vec::new();
        let err = registry
            .dispatch(&mut transcript, &[invocation("c1", "known", "{not json")])
            .unwrap_err();

        assert!(matches!(err, LlmError::ToolDecode { ref tool_name, .. } if tool_name == "known"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_dispatch_rejects_non_object_arguments() {
        let registry = ToolRegistry::new();
        registry.register(echo_tool("known", Arc::default()));
        let mut transcript = Vec::new();
        let err = registry
            .dispatch(&mut transcript, &[invocation("c1", "known", "[1, 2]")])
            .unwrap_err();
        assert!(matches!(err, LlmError::ToolDecode { .. }));
    }

    #[test]
    fn test_dispatch_empty_arguments_decode_as_empty_object() {
        let registry = ToolRegistry::new();
        registry.register(echo_tool("known", Arc::default()));
        let mut transcript = Vec::new();
        let out = registry
            .dispatch(&mut transcript, &[invocation("c1", "known", "")])
            .unwrap();
        assert_eq!(out.as_deref(), Some("known:{}"));
    }

    #[test]
    fn test_dispatch_propagates_tool_failure() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(FnTool::new("boom", |_| {
            Err(ToolError::Failed("exploded".to_string()))
        })));

        let mut transcript = Vec::new();
        let err = registry
            .dispatch(&mut transcript, &[invocation("c1", "boom", r#"{"a": true}"#)])
            .unwrap_err();

        match err {
            LlmError::ToolExecution {
                tool_name,
                arguments,
                message,
            } => {
                assert_eq!(tool_name, "boom");
                assert_eq!(arguments, r#"{"a":true}"#);
                assert_eq!(message, "exploded");
            }
            other => panic!("expected ToolExecution, got {other:?}"),
        }
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_same_tool_in_two_registries() {
        let tool = echo_tool("shared", Arc::default());
        let a = ToolRegistry::new();
        let b = ToolRegistry::new();
        a.register(Arc::clone(&tool));
        b.register(tool);
        assert!(a.contains("shared"));
        assert!(b.contains("shared"));
    }

    #[tokio::test]
    async fn test_concurrent_registration_last_writer_wins() {
        let registry = Arc::new(ToolRegistry::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.register(Arc::new(FnTool::new("same", move |_| Ok(i.to_string()))));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(registry.len(), 1);
        assert!(registry.get("same").is_some());
    }
}
