//! OpenAI-style chat-completions codec shared by every backend.
//!
//! Request bodies: `messages` (system / user / assistant / tool), user
//! content as a string or as `text` / `image_url` items, tools as
//! `{"type": "function", "function": {...}}`. Responses are read from
//! `choices[].message` and `choices[].finish_reason`.

use serde::Deserialize;
use serde_json::{Value, json};

use modelgate_types::llm::{
    ChatChoice, ChatMessage, ChatResponse, ContentBlock, ImageDetail, LlmError, ToolDefinition,
    ToolInvocationRequest, UserPrompt,
};

/// Per-backend encoding choices.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireOptions {
    /// Send a plain-text user prompt as a one-item content array.
    pub user_text_as_items: bool,
    /// Detail applied to image items that do not set one.
    pub default_image_detail: Option<ImageDetail>,
}

pub fn encode_messages(messages: &[ChatMessage], options: WireOptions) -> Value {
    Value::Array(messages.iter().map(|m| encode_message(m, options)).collect())
}

fn encode_message(message: &ChatMessage, options: WireOptions) -> Value {
    match message {
        ChatMessage::System { content } => json!({"role": "system", "content": content}),
        ChatMessage::User { content } => json!({"role": "user", "content": encode_user(content, options)}),
        ChatMessage::Assistant {
            content,
            tool_calls,
        } => {
            let mut msg = json!({"role": "assistant", "content": content});
            if !tool_calls.is_empty() {
                msg["tool_calls"] = tool_calls.iter().map(encode_tool_call).collect();
            }
            msg
        }
        ChatMessage::Tool { call_id, content } => {
            json!({"role": "tool", "tool_call_id": call_id, "content": content})
        }
    }
}

fn encode_user(prompt: &UserPrompt, options: WireOptions) -> Value {
    match prompt {
        UserPrompt::Text(text) if options.user_text_as_items => {
            json!([{"type": "text", "text": text}])
        }
        UserPrompt::Text(text) => Value::String(text.clone()),
        UserPrompt::Blocks(blocks) => blocks
            .iter()
            .map(|block| encode_block(block, options))
            .collect(),
    }
}

fn encode_block(block: &ContentBlock, options: WireOptions) -> Value {
    match block {
        ContentBlock::Text { text } => json!({"type": "text", "text": text}),
        ContentBlock::ImageUrl { image_url } => {
            let mut image = json!({"url": image_url.url});
            if let Some(detail) = image_url.detail.or(options.default_image_detail) {
                image["detail"] = json!(detail);
            }
            json!({"type": "image_url", "image_url": image})
        }
    }
}

fn encode_tool_call(call: &ToolInvocationRequest) -> Value {
    json!({
        "id": call.call_id,
        "type": "function",
        "function": {"name": call.tool_name, "arguments": call.arguments}
    })
}

pub fn encode_tools(tools: &[ToolDefinition]) -> Value {
    tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                }
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    id: Option<String>,
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: Option<WireMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

pub fn decode_response(raw: &Value) -> Result<ChatResponse, LlmError> {
    let wire = WireResponse::deserialize(raw)
        .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

    let choices = wire
        .choices
        .into_iter()
        .map(|choice| {
            let message = choice.message.ok_or_else(|| {
                LlmError::MalformedResponse("choice has no message".to_string())
            })?;
            Ok(ChatChoice {
                content: message.content,
                tool_calls: message
                    .tool_calls
                    .unwrap_or_default()
                    .into_iter()
                    .map(|call| ToolInvocationRequest {
                        call_id: call.id,
                        tool_name: call.function.name,
                        arguments: call.function.arguments,
                    })
                    .collect(),
                finish_reason: choice.finish_reason,
            })
        })
        .collect::<Result<Vec<_>, LlmError>>()?;

    Ok(ChatResponse {
        id: wire.id,
        choices,
    })
}
