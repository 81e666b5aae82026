//! Orchestrator event hooks.
//!
//! Implement [`EventHandler`] to observe each query as it runs: LLM
//! round-trips, tool calls and their outcomes, and the iteration cap.
//!
//! # Event Flow (one query with one tool round)
//!
//! ```text
//! QueryStarted
//!   └─ LLMCallStarted { iteration: 1 }
//!   └─ LLMCallCompleted { iteration: 1, tool_calls: 1 }
//!   └─ ToolCallDetected { iteration: 1 }
//!   └─ ToolExecutionCompleted { iteration: 1 }
//!   └─ LLMCallStarted { iteration: 2 }
//!   └─ LLMCallCompleted { iteration: 2, tool_calls: 0 }
//! QueryCompleted
//! ```
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use ecpp_assistant::event::{AgentEvent, EventHandler};
//!
//! struct PrintTools;
//!
//! #[async_trait]
//! impl EventHandler for PrintTools {
//!     async fn on_agent_event(&self, event: &AgentEvent) {
//!         if let AgentEvent::ToolCallDetected { tool_name, .. } = event {
//!             eprintln!("[Calling tool {}]", tool_name);
//!         }
//!     }
//! }
//! ```

use async_trait::async_trait;

/// Events emitted by the [`Orchestrator`](crate::orchestrator::Orchestrator)
/// while answering a query.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// A query was accepted and appended to the transcript.
    QueryStarted {
        /// First ~120 characters of the query.
        query_preview: String,
    },

    /// Fired before each LLM round-trip. Iteration 1 is the initial call.
    LLMCallStarted { iteration: usize },

    /// Fired after each LLM round-trip.
    LLMCallCompleted {
        iteration: usize,
        /// Character length of the assistant text.
        response_length: usize,
        /// Tool calls the model requested in this reply.
        tool_calls: usize,
    },

    /// A tool call from the model is about to run.
    ToolCallDetected {
        tool_name: String,
        arguments: serde_json::Value,
        /// 1-based tool round within the query.
        iteration: usize,
    },

    /// A tool call finished. `success` is false when the tool reported an
    /// error result or the call itself failed.
    ToolExecutionCompleted {
        tool_name: String,
        success: bool,
        error: Option<String>,
        iteration: usize,
    },

    /// The model asked for another tool round after the limit was reached.
    ToolMaxIterationsReached { limit: usize },

    /// The query produced a final answer.
    QueryCompleted {
        tool_calls_made: usize,
        response_length: usize,
    },
}

/// Receiver for [`AgentEvent`]s. The default implementation ignores them.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_agent_event(&self, _event: &AgentEvent) {}
}
