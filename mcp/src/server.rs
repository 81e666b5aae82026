//! Stdio MCP server.
//!
//! [`McpServer`] reads one JSON-RPC message per line, answers requests in
//! arrival order and delegates tool listing and execution to a
//! [`ToolHandler`]. Requests are handled strictly one after another.
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use mcp::{CallToolResult, ContentBlock, McpError, McpServer, ToolHandler, ToolInfo};
//! use std::sync::Arc;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl ToolHandler for Echo {
//!     async fn list_tools(&self) -> Vec<ToolInfo> {
//!         vec![ToolInfo {
//!             name: "echo".into(),
//!             description: Some("Echo the input".into()),
//!             input_schema: serde_json::json!({"type": "object"}),
//!         }]
//!     }
//!
//!     async fn call_tool(
//!         &self,
//!         _name: &str,
//!         arguments: serde_json::Value,
//!     ) -> Result<CallToolResult, McpError> {
//!         Ok(CallToolResult::success(vec![ContentBlock::text(arguments.to_string())]))
//!     }
//! }
//!
//! # async fn run() -> Result<(), McpError> {
//! McpServer::new("echo-server", "1.0.0", Arc::new(Echo)).serve_stdio().await
//! # }
//! ```

use crate::error::McpError;
use crate::protocol::{
    error_codes, methods, CallToolParams, CallToolResult, Implementation, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, ToolInfo, JSONRPC_VERSION, PROTOCOL_VERSION,
};
use crate::transport::LineTransport;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// Source of the tools a server exposes.
///
/// Returning `Err` from [`call_tool`](ToolHandler::call_tool) produces a
/// JSON-RPC error response; failures that should reach the model as tool
/// output belong in a [`CallToolResult`] with `is_error` set.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn list_tools(&self) -> Vec<ToolInfo>;

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError>;
}

pub struct McpServer {
    info: Implementation,
    handler: Arc<dyn ToolHandler>,
}

impl McpServer {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            info: Implementation::new(name, version),
            handler,
        }
    }

    pub fn info(&self) -> &Implementation {
        &self.info
    }

    /// Serve on the current process's stdin/stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<(), McpError> {
        self.serve(LineTransport::new(tokio::io::stdin(), tokio::io::stdout()))
            .await
    }

    /// Serve on an arbitrary transport until the peer closes it.
    pub async fn serve<R, W>(&self, mut transport: LineTransport<R, W>) -> Result<(), McpError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        while let Some(line) = transport.recv_line().await? {
            let message = match JsonRpcMessage::parse(&line) {
                Ok(message) => message,
                Err(e) => {
                    log::warn!("Discarding malformed message: {}", e);
                    let response = JsonRpcResponse::failure(
                        Value::Null,
                        JsonRpcError::new(error_codes::PARSE_ERROR, e.to_string()),
                    );
                    transport.send(&response).await?;
                    continue;
                }
            };

            match message {
                JsonRpcMessage::Request(request) => {
                    if let Some(response) = self.handle_request(request).await {
                        transport.send(&response).await?;
                    }
                }
                JsonRpcMessage::Response(response) => {
                    log::debug!("Ignoring unsolicited response id={}", response.id);
                }
            }
        }
        log::debug!("MCP peer closed the connection");
        Ok(())
    }

    /// Produce the response for one request; notifications yield `None`.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = match request.id.clone() {
            Some(id) => id,
            None => {
                log::debug!("Received notification: {}", request.method);
                return None;
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            log::warn!("Rejecting request with jsonrpc={:?}", request.jsonrpc);
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(
                    error_codes::INVALID_REQUEST,
                    format!("Unsupported jsonrpc version: {}", request.jsonrpc),
                ),
            ));
        }

        let outcome = match request.method.as_str() {
            methods::INITIALIZE => self.initialize(request.params),
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => {
                let tools = self.handler.list_tools().await;
                serde_json::to_value(ListToolsResult { tools })
                    .map_err(|e| McpError::internal(e.to_string()))
            }
            methods::TOOLS_CALL => self.call_tool(request.params).await,
            other => Err(McpError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                log::error!("Request {} failed: {}", request.method, e);
                JsonRpcResponse::failure(id, e.to_rpc_error())
            }
        })
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, McpError> {
        // Echo the client's protocol revision when it sends one.
        let protocol_version = match params.map(serde_json::from_value::<InitializeParams>) {
            Some(Ok(params)) => {
                log::info!(
                    "Client {} {} connected",
                    params.client_info.name,
                    params.client_info.version
                );
                params.protocol_version
            }
            Some(Err(e)) => {
                log::warn!("Unreadable initialize params: {}", e);
                PROTOCOL_VERSION.to_string()
            }
            None => PROTOCOL_VERSION.to_string(),
        };

        let result = InitializeResult {
            protocol_version,
            capabilities: json!({ "tools": {} }),
            server_info: self.info.clone(),
        };
        serde_json::to_value(result).map_err(|e| McpError::internal(e.to_string()))
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params: CallToolParams = params
            .ok_or_else(|| McpError::invalid_params("tools/call requires params"))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| McpError::invalid_params(e.to_string()))
            })?;

        log::info!("tools/call {}", params.name);
        let result: CallToolResult = self.handler.call_tool(&params.name, params.arguments).await?;
        serde_json::to_value(result).map_err(|e| McpError::internal(e.to_string()))
    }
}
