//! [`ToolProtocol`] backed by an MCP server reached over stdio.

use crate::ecpp::error::EcppError;
use crate::ecpp::tool_protocol::{ToolMetadata, ToolProtocol, ToolResult};
use async_trait::async_trait;
use mcp::McpClient;
use serde_json::Value;
use std::error::Error;
use tokio::sync::Mutex;

pub const CLIENT_NAME: &str = "mcp-client-cli";
pub const CLIENT_VERSION: &str = "1.0.0";

/// Tools served by a connected MCP server.
///
/// The tool list is fetched once during [`connect`](Self::connect) /
/// [`from_client`](Self::from_client) and cached.
pub struct McpToolProtocol {
    client: Mutex<McpClient>,
    tools: Vec<ToolMetadata>,
}

impl McpToolProtocol {
    /// Launch the server script and complete the MCP handshake.
    pub async fn connect(server_script: &str) -> Result<Self, EcppError> {
        let client = McpClient::spawn(server_script).await?;
        Self::from_client(client).await
    }

    /// Handshake with an already attached client and load its tools.
    pub async fn from_client(mut client: McpClient) -> Result<Self, EcppError> {
        client.initialize(CLIENT_NAME, CLIENT_VERSION).await?;
        let tools: Vec<ToolMetadata> = client
            .list_tools()
            .await?
            .into_iter()
            .map(|info| {
                ToolMetadata::from_json_schema(
                    &info.name,
                    info.description.as_deref().unwrap_or_default(),
                    &info.input_schema,
                )
            })
            .collect();

        log::info!(
            "Connected to server with tools: {:?}",
            tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>()
        );
        Ok(Self {
            client: Mutex::new(client),
            tools,
        })
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }
}

#[async_trait]
impl ToolProtocol for McpToolProtocol {
    async fn execute(
        &self,
        tool_name: &str,
        arguments: Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        let mut client = self.client.lock().await;
        match client.call_tool(tool_name, arguments).await {
            Ok(result) => Ok(ToolResult::from(result)),
            Err(e) => {
                log::error!("tools/call {} failed: {}", tool_name, e);
                Err(Box::new(EcppError::from(e)))
            }
        }
    }

    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>> {
        Ok(self.tools.clone())
    }

    fn protocol_name(&self) -> &str {
        "mcp-stdio"
    }

    async fn shutdown(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.client.lock().await.close().await;
        Ok(())
    }
}
