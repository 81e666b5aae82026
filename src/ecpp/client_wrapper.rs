//! A ClientWrapper is a wrapper around a chat-completion endpoint.
//! It does not keep track of the conversation; the
//! [`Orchestrator`](crate::ecpp::orchestrator::Orchestrator) owns the transcript
//! and hands the full history to every call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;

/// Represents the possible roles for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    // carries the rendered output of one tool call
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: Map<String, Value>,
    /// The call exactly as the endpoint sent it (ids, indices and the like
    /// included), echoed back with the decoded arguments on the next request.
    pub wire: Option<Value>,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
            wire: None,
        }
    }

    pub fn with_wire(mut self, wire: Value) -> Self {
        self.wire = Some(wire);
        self
    }
}

/// One entry in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Tool calls requested by an assistant message, in model order.
    pub tool_calls: Vec<ToolCallRequest>,
    /// Name of the tool a [`Role::Tool`] message answers.
    pub tool_name: Option<String>,
    /// Fields of an assistant reply this crate does not model (`thinking`,
    /// for one). Sent back unchanged with the transcript.
    pub extra_fields: Map<String, Value>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_name: None,
            extra_fields: Map::new(),
        }
    }

    pub fn with_extra_fields(mut self, fields: Map<String, Value>) -> Self {
        self.extra_fields = fields;
        self
    }

    pub fn tool(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_name: Some(tool_name.into()),
            extra_fields: Map::new(),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_name: None,
            extra_fields: Map::new(),
        }
    }
}

/// Function-style tool description handed to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// Trait defining the interface to a chat endpoint.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Send the full transcript, optionally with tools, and return the
    /// assistant's reply (which may carry tool calls).
    async fn send_message(
        &self,
        messages: &[Message],
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<Message, Box<dyn Error + Send + Sync>>;

    fn model_name(&self) -> &str;
}
