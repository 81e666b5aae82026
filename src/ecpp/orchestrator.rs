//! The tool-calling conversation loop.
//!
//! [`Orchestrator::process_query`] appends the user's query, asks the model
//! for a reply, runs every tool call the reply carries (one at a time, in the
//! order the model listed them), appends each result as a tool message and
//! asks again. It stops when a reply carries no tool calls, or fails once the
//! model asks for more tool rounds than
//! [`with_max_tool_iterations`](Orchestrator::with_max_tool_iterations) allows.
//!
//! A failed query leaves the transcript as it was before the query started.
//!
//! ```rust,no_run
//! use ecpp_assistant::clients::ollama::OllamaClient;
//! use ecpp_assistant::mcp_tool_protocol::McpToolProtocol;
//! use ecpp_assistant::orchestrator::Orchestrator;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), ecpp_assistant::EcppError> {
//! let llm = Arc::new(OllamaClient::new("http://localhost:11434", "qwen2.5"));
//! let tools = Arc::new(McpToolProtocol::connect("target/release/ecpp-server").await?);
//! let mut orchestrator = Orchestrator::new(llm, tools).await?.with_max_tool_iterations(5);
//! let answer = orchestrator.process_query("Find senders named Acme").await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

use crate::ecpp::client_wrapper::{ClientWrapper, Message, Role, ToolDefinition};
use crate::ecpp::config::{EcppConfig, DEFAULT_MAX_TOOL_ITERATIONS, DEFAULT_SYSTEM_PROMPT};
use crate::ecpp::error::EcppError;
use crate::ecpp::event::{AgentEvent, EventHandler};
use crate::ecpp::tool_protocol::ToolProtocol;
use serde_json::Value;
use std::error::Error;
use std::sync::Arc;

pub const NO_RESPONSE_TEXT: &str = "No response generated";

pub struct Orchestrator {
    client: Arc<dyn ClientWrapper>,
    tools: Arc<dyn ToolProtocol>,
    tool_definitions: Vec<ToolDefinition>,
    transcript: Vec<Message>,
    max_tool_iterations: usize,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Orchestrator {
    /// Build an orchestrator advertising every tool `tools` lists.
    pub async fn new(
        client: Arc<dyn ClientWrapper>,
        tools: Arc<dyn ToolProtocol>,
    ) -> Result<Self, EcppError> {
        let tool_definitions = tools
            .list_tools()
            .await
            .map_err(tool_error)?
            .iter()
            .map(|tool| tool.to_tool_definition())
            .collect();

        Ok(Self {
            client,
            tools,
            tool_definitions,
            transcript: vec![Message::system(DEFAULT_SYSTEM_PROMPT)],
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            event_handler: None,
        })
    }

    /// Apply the prompt and iteration limit from `config`.
    pub fn with_config(self, config: &EcppConfig) -> Self {
        self.with_system_prompt(&config.system_prompt)
            .with_max_tool_iterations(config.max_tool_iterations)
    }

    /// Replace the system message that opens the transcript.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        match self.transcript.first_mut() {
            Some(first) if first.role == Role::System => first.content = prompt.to_string(),
            _ => self.transcript.insert(0, Message::system(prompt)),
        }
        self
    }

    pub fn with_max_tool_iterations(mut self, limit: usize) -> Self {
        self.max_tool_iterations = limit;
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn tool_definitions(&self) -> &[ToolDefinition] {
        &self.tool_definitions
    }

    pub fn max_tool_iterations(&self) -> usize {
        self.max_tool_iterations
    }

    /// Release the tool protocol's connection.
    pub async fn shutdown(&self) -> Result<(), EcppError> {
        self.tools.shutdown().await.map_err(tool_error)
    }

    /// Answer one user query, running tools as the model requests them.
    pub async fn process_query(&mut self, query: &str) -> Result<String, EcppError> {
        let checkpoint = self.transcript.len();
        match self.run_query(query).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                log::error!("Query failed: {}", e);
                self.transcript.truncate(checkpoint);
                Err(e)
            }
        }
    }

    async fn run_query(&mut self, query: &str) -> Result<String, EcppError> {
        self.emit(AgentEvent::QueryStarted {
            query_preview: query.chars().take(120).collect(),
        })
        .await;
        self.transcript.push(Message::user(query));

        let tools = if self.tool_definitions.is_empty() {
            None
        } else {
            Some(self.tool_definitions.clone())
        };

        let mut llm_iteration = 0;
        let mut tool_rounds = 0;
        let mut tool_calls_made = 0;

        loop {
            llm_iteration += 1;
            self.emit(AgentEvent::LLMCallStarted {
                iteration: llm_iteration,
            })
            .await;
            log::debug!(
                "LLM call {} with {} messages",
                llm_iteration,
                self.transcript.len()
            );

            let reply = self
                .client
                .send_message(&self.transcript, tools.clone())
                .await
                .map_err(llm_error)?;

            self.emit(AgentEvent::LLMCallCompleted {
                iteration: llm_iteration,
                response_length: reply.content.len(),
                tool_calls: reply.tool_calls.len(),
            })
            .await;

            let calls = reply.tool_calls.clone();
            let content = reply.content.clone();
            self.transcript.push(reply);

            if calls.is_empty() {
                let answer = if content.trim().is_empty() {
                    NO_RESPONSE_TEXT.to_string()
                } else {
                    content
                };
                self.emit(AgentEvent::QueryCompleted {
                    tool_calls_made,
                    response_length: answer.len(),
                })
                .await;
                return Ok(answer);
            }

            if tool_rounds >= self.max_tool_iterations {
                log::warn!(
                    "Model requested tools after {} rounds, giving up",
                    tool_rounds
                );
                self.emit(AgentEvent::ToolMaxIterationsReached {
                    limit: self.max_tool_iterations,
                })
                .await;
                return Err(EcppError::MaxToolIterationsExceeded(self.max_tool_iterations));
            }
            tool_rounds += 1;

            for call in calls {
                let arguments = Value::Object(call.arguments);
                self.emit(AgentEvent::ToolCallDetected {
                    tool_name: call.name.clone(),
                    arguments: arguments.clone(),
                    iteration: tool_rounds,
                })
                .await;
                log::info!("Calling tool {} with {}", call.name, arguments);

                let result = match self.tools.execute(&call.name, arguments).await {
                    Ok(result) => result,
                    Err(e) => {
                        let err = tool_error(e);
                        self.emit(AgentEvent::ToolExecutionCompleted {
                            tool_name: call.name.clone(),
                            success: false,
                            error: Some(err.to_string()),
                            iteration: tool_rounds,
                        })
                        .await;
                        return Err(err);
                    }
                };
                tool_calls_made += 1;

                let text = result.joined_text();
                self.emit(AgentEvent::ToolExecutionCompleted {
                    tool_name: call.name.clone(),
                    success: !result.is_error,
                    error: result.is_error.then(|| text.clone()),
                    iteration: tool_rounds,
                })
                .await;
                self.transcript.push(Message::tool(call.name, text));
            }
        }
    }

    async fn emit(&self, event: AgentEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_agent_event(&event).await;
        }
    }
}

/// Recover an [`EcppError`] from a boxed error, or classify it as `fallback`.
fn downcast_or(
    err: Box<dyn Error + Send + Sync>,
    fallback: fn(String) -> EcppError,
) -> EcppError {
    match err.downcast::<EcppError>() {
        Ok(ecpp) => *ecpp,
        Err(other) => fallback(other.to_string()),
    }
}

fn llm_error(err: Box<dyn Error + Send + Sync>) -> EcppError {
    downcast_or(err, EcppError::Llm)
}

fn tool_error(err: Box<dyn Error + Send + Sync>) -> EcppError {
    downcast_or(err, EcppError::Transport)
}
