//! [`ClientWrapper`] for Ollama's native `/api/chat` endpoint with tool calling.
//!
//! # Example
//!
//! ```rust,no_run
//! use ecpp_assistant::client_wrapper::{ClientWrapper, Message};
//! use ecpp_assistant::clients::ollama::OllamaClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let client = OllamaClient::new("http://localhost:11434", "qwen2.5");
//!     let reply = client
//!         .send_message(&[Message::user("Say hello in one word.")], None)
//!         .await?;
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```

use crate::ecpp::client_wrapper::{ClientWrapper, Message, Role, ToolCallRequest, ToolDefinition};
use crate::ecpp::clients::http_pool::get_http_client;
use crate::ecpp::config::EcppConfig;
use crate::ecpp::error::EcppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::error::Error;
use std::time::Duration;

/// Chat replies from local models can be slow; this bounds one round-trip.
const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(300);

pub struct OllamaClient {
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout: DEFAULT_CHAT_TIMEOUT,
        }
    }

    pub fn from_config(config: &EcppConfig) -> Self {
        Self::new(&config.llm_base_url, &config.llm_model)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<WireMessage>,
}

/// Assistant reply as sent by the endpoint. `content` and `tool_calls` may be
/// missing or `null`; everything else is kept for the next request.
#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<Value>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Render one transcript entry in the chat endpoint's wire shape.
pub fn message_to_wire(message: &Message) -> Value {
    let mut wire = Map::new();
    for (key, value) in &message.extra_fields {
        wire.insert(key.clone(), value.clone());
    }
    wire.insert("role".into(), json!(message.role));
    wire.insert("content".into(), Value::String(message.content.clone()));
    if !message.tool_calls.is_empty() {
        let calls: Vec<Value> = message.tool_calls.iter().map(tool_call_to_wire).collect();
        wire.insert("tool_calls".into(), Value::Array(calls));
    }
    if let (Role::Tool, Some(name)) = (message.role, &message.tool_name) {
        wire.insert("name".into(), Value::String(name.clone()));
    }
    Value::Object(wire)
}

fn tool_call_to_wire(call: &ToolCallRequest) -> Value {
    let arguments = Value::Object(call.arguments.clone());
    match &call.wire {
        Some(Value::Object(original))
            if original.get("function").map_or(false, Value::is_object) =>
        {
            let mut wire = original.clone();
            if let Some(Value::Object(function)) = wire.get_mut("function") {
                function.insert("name".into(), Value::String(call.name.clone()));
                function.insert("arguments".into(), arguments);
            }
            Value::Object(wire)
        }
        _ => json!({
            "function": {
                "name": call.name,
                "arguments": arguments,
            }
        }),
    }
}

/// Decode one entry of a reply's `tool_calls`.
fn tool_call_from_wire(call: Value) -> Result<ToolCallRequest, EcppError> {
    let name = call
        .pointer("/function/name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            EcppError::parse("tool call without a function name", &call.to_string())
        })?;
    let arguments = call
        .pointer("/function/arguments")
        .cloned()
        .unwrap_or(Value::Null);
    let arguments = decode_arguments(&name, arguments)?;
    Ok(ToolCallRequest::new(name, arguments).with_wire(call))
}

pub fn tool_to_wire(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

/// Normalise tool-call arguments to a mapping.
///
/// Models may send an object or a JSON-encoded string; `null` counts as no
/// arguments. Anything else is a parse error.
pub fn decode_arguments(tool: &str, arguments: Value) -> Result<Map<String, Value>, EcppError> {
    match arguments {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        Value::String(raw) if raw.trim().is_empty() => Ok(Map::new()),
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(EcppError::parse(format!("arguments for {}", tool), &raw)),
        },
        other => Err(EcppError::parse(
            format!("arguments for {}", tool),
            &other.to_string(),
        )),
    }
}

#[async_trait]
impl ClientWrapper for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        messages: &[Message],
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        let tools: Option<Vec<Value>> = tools
            .filter(|t| !t.is_empty())
            .map(|t| t.iter().map(tool_to_wire).collect());
        let request = ChatRequest {
            model: &self.model,
            stream: false,
            messages: messages.iter().map(message_to_wire).collect(),
            tool_choice: tools.as_ref().map(|_| "auto"),
            tools,
        };

        log::debug!(
            "POST {} ({} messages, model {})",
            self.chat_url(),
            request.messages.len(),
            self.model
        );

        let client = get_http_client(&self.base_url, self.timeout)?;
        let response = client.post(self.chat_url()).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            log::error!("Chat endpoint returned {}: {}", status, body);
            return Err(Box::new(EcppError::Llm(format!("{}: {}", status, body))));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            log::error!("Unreadable chat response: {}", e);
            EcppError::parse("chat response", &body)
        })?;
        let wire = parsed
            .message
            .ok_or_else(|| EcppError::Llm("chat response has no message".to_string()))?;

        let tool_calls = wire
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(tool_call_from_wire)
            .collect::<Result<Vec<_>, _>>()?;

        let mut extra = wire.extra;
        extra.remove("role");
        Ok(Message::assistant(wire.content.unwrap_or_default(), tool_calls)
            .with_extra_fields(extra))
    }
}
