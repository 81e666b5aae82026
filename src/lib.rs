//! # ECPP Assistant
//!
//! A chat assistant that lets a local LLM drive the ECPP back office. The
//! model sees four tools (log in, search senders, create a business sender,
//! list the transfer batches you created) and this crate runs the loop that
//! executes the model's tool calls and feeds the results back until it
//! answers in plain text.
//!
//! The crate is layered leaf-first:
//!
//! * **Remote operations**: [`remote::EcppClient`] talks to the ECPP HTTP API
//!   and owns the session token ([`session::SessionContext`]).
//! * **Tools**: [`ecpp_tools`] is the static tool table; [`bridge::EcppToolProtocol`]
//!   validates calls, routes them to the remote client and renders text blocks.
//! * **Tool transport**: the workspace crate `mcp` carries tool calls over
//!   stdio. `ecpp-server` serves the bridge; [`mcp_tool_protocol::McpToolProtocol`]
//!   is the client side.
//! * **LLM**: [`ClientWrapper`] with an Ollama implementation in
//!   [`clients::ollama`].
//! * **Loop**: [`orchestrator::Orchestrator`] keeps the transcript and runs the
//!   bounded tool loop; [`shell::run_shell`] puts a prompt in front of it.
//!
//! ```text
//! shell → Orchestrator ─┬─ ClientWrapper (Ollama /api/chat)
//!                       └─ ToolProtocol ─ McpToolProtocol ═stdio═ ecpp-server ─ EcppToolProtocol ─ EcppClient
//! ```
//!
//! ## Running the loop in-process
//!
//! The bridge is itself a [`tool_protocol::ToolProtocol`], so the MCP hop is
//! optional:
//!
//! ```rust,no_run
//! use ecpp_assistant::bridge::EcppToolProtocol;
//! use ecpp_assistant::clients::ollama::OllamaClient;
//! use ecpp_assistant::orchestrator::Orchestrator;
//! use ecpp_assistant::remote::EcppClient;
//! use ecpp_assistant::EcppConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     ecpp_assistant::init_logger();
//!     ecpp_assistant::load_settings();
//!     let config = EcppConfig::from_env();
//!
//!     let remote = Arc::new(EcppClient::from_config(&config));
//!     let tools = Arc::new(EcppToolProtocol::new(remote));
//!     let llm = Arc::new(OllamaClient::from_config(&config));
//!
//!     let mut orchestrator = Orchestrator::new(llm, tools).await?.with_config(&config);
//!     let answer = orchestrator
//!         .process_query("Log in as alice with password secret, then list my senders")
//!         .await?;
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Output goes to stderr, which keeps stdout free for the MCP stdio
/// transport. Levels come from `RUST_LOG`.
///
/// ```rust
/// ecpp_assistant::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

/// Load `.env` from the working directory (or a parent) into the process
/// environment. Variables already set are left untouched. Returns the file
/// that was read, if any.
pub fn load_settings() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            log::debug!("Loaded settings from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            log::warn!("Could not read .env: {}", e);
            None
        }
    }
}

/// Like [`load_settings`] for an explicit file.
pub fn load_settings_from(path: &Path) -> Result<(), dotenvy::Error> {
    dotenvy::from_path(path)
}

pub mod ecpp;

// Re-exporting key items for easier external access.
pub use ecpp::bridge;
pub use ecpp::client_wrapper;
pub use ecpp::client_wrapper::{ClientWrapper, Message, Role, ToolCallRequest, ToolDefinition};
pub use ecpp::clients;
pub use ecpp::config;
pub use ecpp::config::EcppConfig;
pub use ecpp::ecpp_tools;
pub use ecpp::error::EcppError;
pub use ecpp::event;
pub use ecpp::event::{AgentEvent, EventHandler};
pub use ecpp::mcp_tool_protocol;
pub use ecpp::orchestrator;
pub use ecpp::orchestrator::Orchestrator;
pub use ecpp::remote;
pub use ecpp::session;
pub use ecpp::shell;
pub use ecpp::tool_protocol;
