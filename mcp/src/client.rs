//! MCP client side: launches a server as a child process (or attaches to an
//! existing pair of streams) and issues requests one at a time.

use crate::error::McpError;
use crate::protocol::{
    error_codes, methods, CallToolParams, CallToolResult, Implementation, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, ToolInfo, PROTOCOL_VERSION,
};
use crate::transport::LineTransport;
use serde_json::{json, Value};
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Resolve how to launch a server script.
///
/// `.py` files run under `python3` (`python` on Windows), `.js` files under
/// `node`. Any other path is accepted only if it names an executable file,
/// which is then launched directly.
pub fn server_command(path: &str) -> Result<(String, Vec<String>), McpError> {
    if path.ends_with(".py") {
        let interpreter = if cfg!(windows) { "python" } else { "python3" };
        return Ok((interpreter.to_string(), vec![path.to_string()]));
    }
    if path.ends_with(".js") {
        return Ok(("node".to_string(), vec![path.to_string()]));
    }
    if is_executable(Path::new(path)) {
        return Ok((path.to_string(), Vec::new()));
    }
    Err(McpError::Transport(
        "Server script must be a .js or .py file".to_string(),
    ))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("exe"))
            .unwrap_or(false)
}

pub struct McpClient {
    transport: LineTransport<BoxedReader, BoxedWriter>,
    next_id: u64,
    child: Option<Child>,
    server_info: Option<Implementation>,
}

impl McpClient {
    /// Attach to a server reachable through an existing pair of streams.
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            transport: LineTransport::new(Box::new(reader) as BoxedReader, Box::new(writer) as BoxedWriter),
            next_id: 1,
            child: None,
            server_info: None,
        }
    }

    /// Launch the server script as a child process speaking MCP on its stdio.
    ///
    /// The child's stderr is inherited so server logs stay visible.
    pub async fn spawn(path: &str) -> Result<Self, McpError> {
        let (program, args) = server_command(path)?;
        log::info!("Launching MCP server: {} {}", program, args.join(" "));

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| McpError::Transport(format!("failed to launch {}: {}", program, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Transport("server stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Transport("server stdout unavailable".to_string()))?;

        let mut client = Self::new(stdout, stdin);
        client.child = Some(child);
        Ok(client)
    }

    pub fn server_info(&self) -> Option<&Implementation> {
        self.server_info.as_ref()
    }

    /// Perform the `initialize` handshake and send `notifications/initialized`.
    pub async fn initialize(
        &mut self,
        client_name: &str,
        client_version: &str,
    ) -> Result<InitializeResult, McpError> {
        let params = serde_json::to_value(InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: json!({}),
            client_info: Implementation::new(client_name, client_version),
        })?;
        let result = self.request(methods::INITIALIZE, Some(params)).await?;
        let result: InitializeResult = serde_json::from_value(result)?;
        log::info!(
            "Connected to MCP server {} {} (protocol {})",
            result.server_info.name,
            result.server_info.version,
            result.protocol_version
        );
        self.server_info = Some(result.server_info.clone());
        self.notify(methods::INITIALIZED, None).await?;
        Ok(result)
    }

    pub async fn list_tools(&mut self) -> Result<Vec<ToolInfo>, McpError> {
        let result = self.request(methods::TOOLS_LIST, None).await?;
        let listed: ListToolsResult = serde_json::from_value(result)?;
        Ok(listed.tools)
    }

    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, McpError> {
        let params = serde_json::to_value(CallToolParams {
            name: name.to_string(),
            arguments,
        })?;
        let result = self.request(methods::TOOLS_CALL, Some(params)).await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn ping(&mut self) -> Result<(), McpError> {
        self.request(methods::PING, None).await.map(|_| ())
    }

    /// Close the connection and reap the child process, if any.
    ///
    /// Closing stdin lets a well-behaved server exit on its own; a server
    /// that does not is killed.
    pub async fn close(&mut self) {
        if let Err(e) = self.transport.shutdown().await {
            log::debug!("Error closing MCP transport: {}", e);
        }
        if let Some(mut child) = self.child.take() {
            match tokio::time::timeout(std::time::Duration::from_secs(2), child.wait()).await {
                Ok(Ok(status)) => log::debug!("MCP server exited with {}", status),
                Ok(Err(e)) => log::warn!("Failed waiting for MCP server: {}", e),
                Err(_) => {
                    log::warn!("MCP server did not exit, killing it");
                    if let Err(e) = child.kill().await {
                        log::warn!("Failed to kill MCP server: {}", e);
                    }
                }
            }
        }
    }

    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        self.transport
            .send(&JsonRpcRequest::notification(method, params))
            .await
    }

    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let id = self.next_id;
        self.next_id += 1;
        log::debug!("-> {} (id={})", method, id);
        self.transport
            .send(&JsonRpcRequest::new(id, method, params))
            .await?;

        let expected = Value::from(id);
        loop {
            let line = self.transport.recv_line().await?.ok_or(McpError::Closed)?;
            let message = match JsonRpcMessage::parse(&line) {
                Ok(message) => message,
                Err(e) => {
                    log::warn!("Ignoring unparsable line from server: {}", e);
                    continue;
                }
            };

            match message {
                JsonRpcMessage::Response(response) if response.id == expected => {
                    if let Some(error) = response.error {
                        return Err(McpError::Rpc {
                            code: error.code,
                            message: error.message,
                        });
                    }
                    return Ok(response.result.unwrap_or(Value::Null));
                }
                JsonRpcMessage::Response(response) => {
                    log::warn!("Ignoring response with unexpected id {}", response.id);
                }
                JsonRpcMessage::Request(request) => self.answer_server_request(request).await?,
            }
        }
    }

    async fn answer_server_request(&mut self, request: JsonRpcRequest) -> Result<(), McpError> {
        let id = match request.id {
            Some(id) => id,
            None => {
                log::debug!("Server notification: {}", request.method);
                return Ok(());
            }
        };
        let response = if request.method == methods::PING {
            JsonRpcResponse::success(id, json!({}))
        } else {
            JsonRpcResponse::failure(
                id,
                JsonRpcError::new(
                    error_codes::METHOD_NOT_FOUND,
                    format!("Method not found: {}", request.method),
                ),
            )
        };
        self.transport.send(&response).await
    }
}
