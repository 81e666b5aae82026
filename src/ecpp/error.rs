use std::error::Error;
use std::fmt;

/// Error types for ECPP operations, tool dispatch and the conversation loop
#[derive(Debug, Clone, PartialEq)]
pub enum EcppError {
    /// Login did not produce a session id or a user record.
    Auth(String),
    /// An authenticated operation was attempted without a session token.
    Unauthenticated,
    /// The remote API answered with a non-success status.
    Remote(String),
    /// Tool arguments failed schema validation.
    InvalidArguments { tool: String, reason: String },
    /// No tool with this name is registered.
    UnknownTool(String),
    /// Network, process or tool-protocol failure.
    Transport(String),
    /// A response body could not be decoded. `raw_prefix` holds the first
    /// 100 characters of the raw text.
    Parse { context: String, raw_prefix: String },
    /// The chat endpoint failed or returned something unusable.
    Llm(String),
    /// The model kept requesting tools past the configured limit.
    MaxToolIterationsExceeded(usize),
}

/// Characters of a raw response kept for diagnostics.
pub const RAW_PREFIX_LEN: usize = 100;

impl EcppError {
    pub fn invalid_arguments(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        EcppError::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Build a parse error, keeping a character-safe prefix of `raw`.
    pub fn parse(context: impl Into<String>, raw: &str) -> Self {
        EcppError::Parse {
            context: context.into(),
            raw_prefix: raw.chars().take(RAW_PREFIX_LEN).collect(),
        }
    }
}

impl fmt::Display for EcppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcppError::Auth(msg) => write!(f, "Authentication failed: {}", msg),
            EcppError::Unauthenticated => write!(f, "No valid session ID. Please login again."),
            EcppError::Remote(msg) => write!(f, "{}", msg),
            EcppError::InvalidArguments { tool, reason } => {
                write!(f, "Invalid arguments for {}: {}", tool, reason)
            }
            EcppError::UnknownTool(name) => write!(f, "Unknown tool: {}", name),
            EcppError::Transport(msg) => write!(f, "Transport error: {}", msg),
            EcppError::Parse { context, .. } => write!(f, "Error parsing {}", context),
            EcppError::Llm(msg) => write!(f, "LLM error: {}", msg),
            EcppError::MaxToolIterationsExceeded(limit) => {
                write!(f, "Exceeded maximum of {} tool iterations", limit)
            }
        }
    }
}

impl Error for EcppError {}

impl From<reqwest::Error> for EcppError {
    fn from(err: reqwest::Error) -> Self {
        EcppError::Transport(err.to_string())
    }
}

impl From<mcp::McpError> for EcppError {
    fn from(err: mcp::McpError) -> Self {
        EcppError::Transport(err.to_string())
    }
}
