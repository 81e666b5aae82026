//! # mcp
//!
//! A small Model Context Protocol runtime: JSON-RPC 2.0 message types, a
//! newline-delimited transport that works over any pair of async byte streams
//! (a child process's stdio, the current process's stdio, or an in-memory
//! duplex pipe in tests), and the two protocol roles built on top of it.
//!
//! ```text
//! McpClient ──(tools/list, tools/call)──▶ LineTransport ──▶ McpServer ──▶ ToolHandler
//! ```
//!
//! * [`McpServer`] answers `initialize`, `ping`, `tools/list` and `tools/call`
//!   by delegating to a [`ToolHandler`].
//! * [`McpClient`] launches (or attaches to) a server and issues requests one at
//!   a time, matching responses by id.
//!
//! ```rust,no_run
//! use mcp::McpClient;
//!
//! # async fn run() -> Result<(), mcp::McpError> {
//! let mut client = McpClient::spawn("server.py").await?;
//! client.initialize("mcp-client-cli", "1.0.0").await?;
//! for tool in client.list_tools().await? {
//!     println!("{}", tool.name);
//! }
//! client.close().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod server;
pub mod transport;

pub use client::{server_command, McpClient};
pub use error::McpError;
pub use protocol::{
    CallToolParams, CallToolResult, ContentBlock, Implementation, InitializeResult,
    JsonRpcError, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ToolInfo,
};
pub use server::{McpServer, ToolHandler};
pub use transport::LineTransport;
