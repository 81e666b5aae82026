//! Routes tool calls to [`EcppOperations`] and renders the results as
//! content blocks.
//!
//! [`EcppToolProtocol`] is used in two places: directly as a
//! [`ToolProtocol`] when the orchestrator runs in-process, and as the
//! [`mcp::ToolHandler`] behind the `ecpp-server` binary.
//!
//! Login and sender creation raise their errors. Sender search and review
//! listing turn every failure into a single explanatory text block so the
//! model can relay it.

use crate::ecpp::ecpp_tools::{ecpp_tools, EcppToolCall};
use crate::ecpp::error::EcppError;
use crate::ecpp::remote::{BatchSummary, EcppOperations, Profile, SenderSearch, SenderSummary};
use crate::ecpp::tool_protocol::{ToolMetadata, ToolProtocol, ToolResult};
use async_trait::async_trait;
use mcp::protocol::error_codes;
use mcp::{CallToolResult, ContentBlock, McpError, ToolInfo};
use serde_json::Value;
use std::error::Error;
use std::sync::Arc;

pub const NO_SESSION_TEXT: &str = "Error: No valid session ID. Please login again.";
pub const NO_SENDERS_TEXT: &str = "No senders found matching your criteria.";
pub const NO_BATCHES_TEXT: &str = "No transfer batches created by you.";

pub struct EcppToolProtocol {
    remote: Arc<dyn EcppOperations>,
}

impl EcppToolProtocol {
    pub fn new(remote: Arc<dyn EcppOperations>) -> Self {
        Self { remote }
    }

    /// Validate, route and render one tool call.
    pub async fn dispatch(
        &self,
        tool_name: &str,
        arguments: Value,
    ) -> Result<Vec<ContentBlock>, EcppError> {
        let call = EcppToolCall::parse(tool_name, &arguments).map_err(|e| {
            log::warn!("Rejected call to {}: {}", tool_name, e);
            e
        })?;
        log::info!("Dispatching tool {}", call.tool_name());

        match call {
            EcppToolCall::Login { username, password } => {
                let profile = self.remote.login(&username, &password).await?;
                Ok(render_profile(&profile))
            }
            EcppToolCall::SearchSenders { sender_name } => {
                Ok(match self.remote.search_senders(&sender_name).await {
                    Ok(search) => render_search(&search),
                    Err(e) => vec![render_downgraded(&e)],
                })
            }
            EcppToolCall::ListCreatedReviews => {
                Ok(match self.remote.list_created_reviews().await {
                    Ok(batches) => render_batches(&batches),
                    Err(e) => vec![render_downgraded(&e)],
                })
            }
            EcppToolCall::CreateBusinessSender(fields) => {
                let company = self.remote.create_business_sender(&fields).await?;
                Ok(vec![ContentBlock::text(format!(
                    "{} created successfully",
                    company
                ))])
            }
        }
    }
}

/// Text reported when a tool ran and failed.
pub fn execution_failure_text(tool_name: &str, err: &EcppError) -> String {
    format!("Error executing tool {}: {}", tool_name, err)
}

pub fn render_profile(profile: &Profile) -> Vec<ContentBlock> {
    vec![
        ContentBlock::text(format!("username is {}", profile.username)),
        ContentBlock::text(format!("display name is {}", profile.display_name)),
        ContentBlock::text(format!("partner is {}", profile.partner)),
        ContentBlock::text(format!("role is {}", profile.roles.join(","))),
    ]
}

pub fn render_search(search: &SenderSearch) -> Vec<ContentBlock> {
    match search {
        SenderSearch::NoData { status_code } => vec![ContentBlock::text(format!(
            "No senders data found. Response status: {}",
            status_code.as_deref().unwrap_or("unknown")
        ))],
        SenderSearch::Found(senders) if senders.is_empty() => {
            vec![ContentBlock::text(NO_SENDERS_TEXT)]
        }
        SenderSearch::Found(senders) => senders
            .iter()
            .map(|sender| match sender {
                SenderSummary::Business { company_name } => {
                    ContentBlock::text(format!("Business: {}", company_name))
                }
                SenderSummary::Individual {
                    last_name,
                    first_name,
                } => ContentBlock::text(format!("Individual: {} {}", last_name, first_name)),
            })
            .collect(),
    }
}

pub fn render_batches(batches: &[BatchSummary]) -> Vec<ContentBlock> {
    if batches.is_empty() {
        return vec![ContentBlock::text(NO_BATCHES_TEXT)];
    }
    batches
        .iter()
        .map(|batch| {
            ContentBlock::text(format!(
                "{}, {}, transfer: {}, checker: {}",
                batch.batch_id, batch.exchange_amount, batch.to_currency_code, batch.checker
            ))
        })
        .collect()
}

/// Explanatory text for a search or listing failure.
pub fn render_downgraded(err: &EcppError) -> ContentBlock {
    match err {
        EcppError::Unauthenticated => ContentBlock::text(NO_SESSION_TEXT),
        EcppError::Parse { raw_prefix, .. } => ContentBlock::text(format!(
            "Error parsing response. Raw response: {}...",
            raw_prefix
        )),
        other => ContentBlock::text(format!("An error occurred: {}", other)),
    }
}

fn is_rejection(err: &EcppError) -> bool {
    matches!(
        err,
        EcppError::InvalidArguments { .. } | EcppError::UnknownTool(_)
    )
}

#[async_trait]
impl ToolProtocol for EcppToolProtocol {
    async fn execute(
        &self,
        tool_name: &str,
        arguments: Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        match self.dispatch(tool_name, arguments).await {
            Ok(content) => Ok(ToolResult::success(content)),
            Err(e) if is_rejection(&e) => Err(Box::new(e)),
            Err(e) => {
                log::error!("Tool {} failed: {}", tool_name, e);
                Ok(ToolResult::failure(execution_failure_text(tool_name, &e)))
            }
        }
    }

    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>> {
        Ok(ecpp_tools().to_vec())
    }

    fn protocol_name(&self) -> &str {
        "ecpp"
    }
}

#[async_trait]
impl mcp::ToolHandler for EcppToolProtocol {
    async fn list_tools(&self) -> Vec<ToolInfo> {
        ecpp_tools().iter().map(ToolMetadata::to_tool_info).collect()
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError> {
        match self.dispatch(name, arguments).await {
            Ok(content) => Ok(CallToolResult::success(content)),
            Err(EcppError::UnknownTool(tool)) => Err(McpError::Rpc {
                code: error_codes::METHOD_NOT_FOUND,
                message: format!("Unknown tool: {}", tool),
            }),
            Err(e @ EcppError::InvalidArguments { .. }) => Err(McpError::invalid_params(e.to_string())),
            Err(e) => {
                log::error!("Tool {} failed: {}", name, e);
                Ok(CallToolResult::error_text(execution_failure_text(name, &e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_profile() {
        let blocks = render_profile(&Profile {
            username: "alice".into(),
            display_name: "Alice Tan".into(),
            partner: "EMQ".into(),
            roles: vec!["maker".into(), "checker".into()],
        });
        let texts: Vec<&str> = blocks.iter().filter_map(ContentBlock::as_text).collect();
        assert_eq!(
            texts,
            vec![
                "username is alice",
                "display name is Alice Tan",
                "partner is EMQ",
                "role is maker,checker"
            ]
        );
    }

    #[test]
    fn test_render_search_cases() {
        let found = render_search(&SenderSearch::Found(vec![
            SenderSummary::Business {
                company_name: "Acme Ltd".into(),
            },
            SenderSummary::Individual {
                last_name: "Tan".into(),
                first_name: "Mei".into(),
            },
        ]));
        assert_eq!(found[0].as_text(), Some("Business: Acme Ltd"));
        assert_eq!(found[1].as_text(), Some("Individual: Tan Mei"));

        let empty = render_search(&SenderSearch::Found(vec![]));
        assert_eq!(empty, vec![ContentBlock::text(NO_SENDERS_TEXT)]);

        let no_data = render_search(&SenderSearch::NoData { status_code: None });
        assert_eq!(
            no_data[0].as_text(),
            Some("No senders data found. Response status: unknown")
        );
    }

    #[test]
    fn test_render_downgraded() {
        assert_eq!(
            render_downgraded(&EcppError::Unauthenticated).as_text(),
            Some(NO_SESSION_TEXT)
        );
        assert_eq!(
            render_downgraded(&EcppError::parse("x", "<html>")).as_text(),
            Some("Error parsing response. Raw response: <html>...")
        );
        assert_eq!(
            render_downgraded(&EcppError::Transport("connection refused".into())).as_text(),
            Some("An error occurred: Transport error: connection refused")
        );
    }

    #[test]
    fn test_render_batches() {
        let blocks = render_batches(&[BatchSummary {
            batch_id: "B-1".into(),
            exchange_amount: "1500".into(),
            to_currency_code: "PHP".into(),
            checker: "bob".into(),
        }]);
        assert_eq!(
            blocks[0].as_text(),
            Some("B-1, 1500, transfer: PHP, checker: bob")
        );

        assert_eq!(render_batches(&[]), vec![ContentBlock::text(NO_BATCHES_TEXT)]);
    }
}
