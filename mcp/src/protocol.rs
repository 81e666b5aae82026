//! JSON-RPC 2.0 envelopes and the subset of MCP payloads used by the tool roles.

use crate::error::McpError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Version string carried in every JSON-RPC envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision announced during `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Method names exchanged between client and server.
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const PING: &str = "ping";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}

/// Standard JSON-RPC error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// A request, or a notification when `id` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Build a request that expects a response.
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(Value::from(id)),
            method: method.into(),
            params,
        }
    }

    /// Build a notification (no id, no response expected).
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// A response to a request. Exactly one of `result` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Any message that can arrive on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
}

impl JsonRpcMessage {
    /// Classify a decoded JSON value: objects with a `method` are requests or
    /// notifications, objects with `result` or `error` are responses.
    pub fn from_value(value: Value) -> Result<Self, McpError> {
        let object = value
            .as_object()
            .ok_or_else(|| McpError::Protocol("JSON-RPC message must be an object".into()))?;

        if object.contains_key("method") {
            Ok(JsonRpcMessage::Request(serde_json::from_value(value)?))
        } else if object.contains_key("result") || object.contains_key("error") {
            Ok(JsonRpcMessage::Response(serde_json::from_value(value)?))
        } else {
            Err(McpError::Protocol(
                "message is neither a request nor a response".into(),
            ))
        }
    }

    pub fn parse(line: &str) -> Result<Self, McpError> {
        let value: Value = serde_json::from_str(line)?;
        Self::from_value(value)
    }
}

/// Name and version of either side of the connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

impl Implementation {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    pub client_info: Implementation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    pub server_info: Implementation,
}

/// A tool as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<ToolInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Unit of tool output.
///
/// Only text blocks are produced by this workspace; anything else a foreign
/// server returns is preserved verbatim in [`ContentBlock::Other`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ContentBlock {
    Text(String),
    Other(Value),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(text) => Some(text),
            ContentBlock::Other(_) => None,
        }
    }
}

impl From<Value> for ContentBlock {
    fn from(value: Value) -> Self {
        let is_text = value.get("type").and_then(Value::as_str) == Some("text");
        match value.get("text").and_then(Value::as_str) {
            Some(text) if is_text => ContentBlock::Text(text.to_string()),
            _ => ContentBlock::Other(value),
        }
    }
}

impl From<ContentBlock> for Value {
    fn from(block: ContentBlock) -> Self {
        match block {
            ContentBlock::Text(text) => serde_json::json!({ "type": "text", "text": text }),
            ContentBlock::Other(value) => value,
        }
    }
}

impl fmt::Display for ContentBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentBlock::Text(text) => f.write_str(text),
            ContentBlock::Other(value) => write!(f, "{}", value),
        }
    }
}

/// Result of `tools/call`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl CallToolResult {
    pub fn success(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    /// A failed execution reported in-band, as a single text block.
    pub fn error_text(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(message)],
            is_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_and_notification_serialization() {
        let request = JsonRpcRequest::new(7, methods::TOOLS_LIST, None);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list"}));

        let notification = JsonRpcRequest::notification(methods::INITIALIZED, None);
        let value = serde_json::to_value(&notification).unwrap();
        assert!(value.get("id").is_none());
        assert!(notification.is_notification());
    }

    #[test]
    fn test_message_classification() {
        let request = JsonRpcMessage::parse(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).unwrap();
        assert!(matches!(request, JsonRpcMessage::Request(ref r) if r.method == "ping"));

        let response =
            JsonRpcMessage::parse(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#).unwrap();
        assert!(matches!(response, JsonRpcMessage::Response(ref r) if r.error.is_none()));

        let failure = JsonRpcMessage::parse(
            r#"{"jsonrpc":"2.0","id":2,"error":{"code":-32601,"message":"nope"}}"#,
        )
        .unwrap();
        match failure {
            JsonRpcMessage::Response(r) => assert_eq!(r.error.unwrap().code, -32601),
            other => panic!("unexpected message: {:?}", other),
        }

        assert!(JsonRpcMessage::parse(r#"{"jsonrpc":"2.0","id":3}"#).is_err());
        assert!(JsonRpcMessage::parse("[1,2]").is_err());
        assert!(JsonRpcMessage::parse("not json").is_err());
    }

    #[test]
    fn test_content_block_wire_shape() {
        let block = ContentBlock::text("Business: Acme");
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({"type": "text", "text": "Business: Acme"})
        );

        let image: ContentBlock =
            serde_json::from_value(json!({"type": "image", "data": "AAAA", "mimeType": "image/png"}))
                .unwrap();
        assert!(image.as_text().is_none());
        assert!(image.to_string().contains("image/png"));
    }

    #[test]
    fn test_call_tool_result_is_error_flag() {
        let ok = CallToolResult::success(vec![ContentBlock::text("done")]);
        let value = serde_json::to_value(&ok).unwrap();
        assert!(value.get("isError").is_none());

        let failed = CallToolResult::error_text("boom");
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["isError"], json!(true));

        let parsed: CallToolResult = serde_json::from_value(json!({"content": []})).unwrap();
        assert!(!parsed.is_error);
    }
}
