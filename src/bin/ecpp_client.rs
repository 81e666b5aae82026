//! Interactive chat client: launches an MCP tool server and lets the
//! configured LLM use its tools.
//!
//! Usage: `ecpp-client <path_to_server_script>`

use ecpp_assistant::clients::ollama::OllamaClient;
use ecpp_assistant::mcp_tool_protocol::McpToolProtocol;
use ecpp_assistant::orchestrator::Orchestrator;
use ecpp_assistant::shell::run_shell;
use ecpp_assistant::EcppConfig;
use std::sync::Arc;
use tokio::io::BufReader;

#[tokio::main]
async fn main() {
    ecpp_assistant::init_logger();
    ecpp_assistant::load_settings();

    let server_script = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            println!("Usage: ecpp-client <path_to_server_script>");
            return;
        }
    };

    let config = EcppConfig::from_env();
    let tools = match McpToolProtocol::connect(&server_script).await {
        Ok(tools) => Arc::new(tools),
        Err(e) => {
            eprintln!("Failed to connect to MCP server: {}", e);
            std::process::exit(1);
        }
    };
    println!("Connected to server with tools: {:?}", tools.tool_names());

    let llm = Arc::new(OllamaClient::from_config(&config));
    let mut orchestrator = match Orchestrator::new(llm, tools).await {
        Ok(orchestrator) => orchestrator.with_config(&config),
        Err(e) => {
            eprintln!("Failed to load tools: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = BufReader::new(tokio::io::stdin());
    if let Err(e) = run_shell(&mut orchestrator, stdin, tokio::io::stdout()).await {
        log::error!("Terminal I/O failed: {}", e);
    }

    if let Err(e) = orchestrator.shutdown().await {
        log::warn!("Error while closing the tool server: {}", e);
    }
}
