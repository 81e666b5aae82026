use crate::protocol::{error_codes, JsonRpcError};
use std::error::Error;
use std::fmt;

/// Error types for MCP transport and protocol operations
#[derive(Debug, Clone, PartialEq)]
pub enum McpError {
    /// Reading from or writing to the underlying stream failed, or the peer
    /// process could not be launched.
    Transport(String),
    /// The peer answered with a JSON-RPC error object.
    Rpc { code: i64, message: String },
    /// A message could not be decoded or violated the protocol.
    Protocol(String),
    /// The peer closed the stream while a response was outstanding.
    Closed,
}

impl McpError {
    pub fn method_not_found(method: &str) -> Self {
        McpError::Rpc {
            code: error_codes::METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        McpError::Rpc {
            code: error_codes::INVALID_PARAMS,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        McpError::Rpc {
            code: error_codes::INTERNAL_ERROR,
            message: message.into(),
        }
    }

    /// Render as a JSON-RPC error object for the wire.
    pub fn to_rpc_error(&self) -> JsonRpcError {
        match self {
            McpError::Rpc { code, message } => JsonRpcError::new(*code, message.clone()),
            other => JsonRpcError::new(error_codes::INTERNAL_ERROR, other.to_string()),
        }
    }
}

impl fmt::Display for McpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            McpError::Transport(msg) => write!(f, "MCP transport error: {}", msg),
            McpError::Rpc { code, message } => write!(f, "MCP error {}: {}", code, message),
            McpError::Protocol(msg) => write!(f, "MCP protocol error: {}", msg),
            McpError::Closed => write!(f, "MCP connection closed"),
        }
    }
}

impl Error for McpError {}

impl From<std::io::Error> for McpError {
    fn from(err: std::io::Error) -> Self {
        McpError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::Protocol(err.to_string())
    }
}
