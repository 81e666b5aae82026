//! Serves the ECPP tools over MCP on stdin/stdout.
//!
//! Logs go to stderr; stdout carries only protocol messages.

use ecpp_assistant::bridge::EcppToolProtocol;
use ecpp_assistant::remote::EcppClient;
use ecpp_assistant::EcppConfig;
use mcp::McpServer;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    ecpp_assistant::init_logger();
    ecpp_assistant::load_settings();
    let config = EcppConfig::from_env();
    log::info!("ECPP API at {}", config.api_base_url);

    let remote = Arc::new(EcppClient::from_config(&config));
    let handler = Arc::new(EcppToolProtocol::new(remote));
    let server = McpServer::new("ecpp", env!("CARGO_PKG_VERSION"), handler);

    log::info!("Serving {} {}", server.info().name, server.info().version);
    eprintln!("MCP Server running on stdio");
    if let Err(e) = server.serve_stdio().await {
        eprintln!("Fatal error in main(): {}", e);
        std::process::exit(1);
    }
}
