use async_trait::async_trait;
use ecpp_assistant::shell::{run_shell, BANNER, PROMPT};
use ecpp_assistant::tool_protocol::{ToolMetadata, ToolProtocol, ToolResult};
use ecpp_assistant::{ClientWrapper, EcppError, Message, Orchestrator, ToolDefinition};
use serde_json::Value;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Answers "echo: <last user message>", or fails when the query is "boom".
#[derive(Default)]
struct EchoClient {
    calls: AtomicUsize,
}

#[async_trait]
impl ClientWrapper for EchoClient {
    async fn send_message(
        &self,
        messages: &[Message],
        _tools: Option<Vec<ToolDefinition>>,
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        if last == "boom" {
            return Err(Box::new(EcppError::Llm("model crashed".into())));
        }
        Ok(Message::assistant(format!("echo: {}", last), vec![]))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

struct NoTools;

#[async_trait]
impl ToolProtocol for NoTools {
    async fn execute(
        &self,
        tool_name: &str,
        _arguments: Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        Err(Box::new(EcppError::UnknownTool(tool_name.to_string())))
    }

    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>> {
        Ok(vec![])
    }

    fn protocol_name(&self) -> &str {
        "none"
    }
}

async fn run(input: &str) -> (String, Arc<EchoClient>) {
    let client = Arc::new(EchoClient::default());
    let mut orchestrator = Orchestrator::new(client.clone(), Arc::new(NoTools))
        .await
        .unwrap();
    let mut output = Vec::new();
    run_shell(&mut orchestrator, input.as_bytes(), &mut output)
        .await
        .unwrap();
    (String::from_utf8(output).unwrap(), client)
}

#[tokio::test]
async fn test_answers_until_quit() {
    let (output, client) = run("hello\nQUIT\nnever sent\n").await;

    assert!(output.starts_with(BANNER));
    assert!(output.contains("\necho: hello\n"));
    assert!(!output.contains("never sent"));
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    assert_eq!(output.matches(PROMPT).count(), 2);
}

#[tokio::test]
async fn test_errors_are_printed_and_session_continues() {
    let (output, client) = run("boom\nafter\n").await;

    assert!(output.contains("\nError: LLM error: model crashed\n"));
    assert!(output.contains("\necho: after\n"));
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_end_of_input_exits() {
    let (output, client) = run("").await;

    assert_eq!(output, format!("{}{}", BANNER, PROMPT));
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}
