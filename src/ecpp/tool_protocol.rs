//! Tool Protocol Abstraction Layer
//!
//! Tools are described once by [`ToolMetadata`] and executed through a
//! [`ToolProtocol`]. The same descriptor renders the schema advertised to the
//! model ([`ToolMetadata::to_tool_definition`]) and the one served over MCP
//! ([`ToolMetadata::to_tool_info`]), so both sides always agree on names and
//! arguments.
//!
//! ```text
//! Orchestrator → ToolProtocol (trait) → [EcppToolProtocol (in-process) | McpToolProtocol (stdio)]
//! ```
//!
//! # Example
//!
//! ```rust
//! use ecpp_assistant::tool_protocol::{ToolMetadata, ToolParameter, ToolParameterType};
//! use serde_json::json;
//!
//! let tool = ToolMetadata::new("searchSenders", "search senders").with_parameter(
//!     ToolParameter::new("senderName", ToolParameterType::String).with_description("Sender name"),
//! );
//! assert!(tool.validate(&json!({"senderName": "Acme"})).is_ok());
//! assert!(tool.validate(&json!({"senderName": 7})).is_err());
//! ```

use crate::ecpp::client_wrapper::ToolDefinition;
use crate::ecpp::error::EcppError;
use async_trait::async_trait;
use mcp::{ContentBlock, ToolInfo};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::error::Error;

/// Represents the result of a tool execution
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Output blocks in the order the tool produced them
    pub content: Vec<ContentBlock>,
    /// Set when the tool ran but reported a failure in-band
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    /// A failure reported as a single text block.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(message)],
            is_error: true,
        }
    }

    /// Concatenate the blocks with `", "`. Non-text blocks are rendered as JSON.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(ContentBlock::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<mcp::CallToolResult> for ToolResult {
    fn from(result: mcp::CallToolResult) -> Self {
        Self {
            content: result.content,
            is_error: result.is_error,
        }
    }
}

impl From<ToolResult> for mcp::CallToolResult {
    fn from(result: ToolResult) -> Self {
        Self {
            content: result.content,
            is_error: result.is_error,
        }
    }
}

/// Defines the type of a tool parameter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ToolParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolParameterType::String => "string",
            ToolParameterType::Number => "number",
            ToolParameterType::Integer => "integer",
            ToolParameterType::Boolean => "boolean",
            ToolParameterType::Array => "array",
            ToolParameterType::Object => "object",
        }
    }

    pub fn from_schema_type(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ToolParameterType::String),
            "number" => Some(ToolParameterType::Number),
            "integer" => Some(ToolParameterType::Integer),
            "boolean" => Some(ToolParameterType::Boolean),
            "array" => Some(ToolParameterType::Array),
            "object" => Some(ToolParameterType::Object),
            _ => None,
        }
    }

    /// Whether `value` is an instance of this JSON type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ToolParameterType::String => value.is_string(),
            ToolParameterType::Number => value.is_number(),
            ToolParameterType::Integer => value.is_i64() || value.is_u64(),
            ToolParameterType::Boolean => value.is_boolean(),
            ToolParameterType::Array => value.is_array(),
            ToolParameterType::Object => value.is_object(),
        }
    }
}

/// Defines a parameter for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ToolParameterType,
    pub description: Option<String>,
    pub required: bool,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, param_type: ToolParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            required: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the argument as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Metadata about a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    /// Check `arguments` against the declared parameters.
    ///
    /// Arguments must be a JSON object (or `null`, meaning none); every
    /// required parameter must be present and non-null; every declared
    /// parameter that is present must have the declared type. Undeclared
    /// keys are left alone.
    pub fn validate(&self, arguments: &Value) -> Result<Map<String, Value>, EcppError> {
        let map = match arguments {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                return Err(EcppError::invalid_arguments(
                    &self.name,
                    format!("arguments must be an object, got {}", json_type_name(other)),
                ))
            }
        };

        for param in &self.parameters {
            match map.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(EcppError::invalid_arguments(
                        &self.name,
                        format!("missing required field '{}'", param.name),
                    ));
                }
                None | Some(Value::Null) => {}
                Some(value) if !param.param_type.matches(value) => {
                    return Err(EcppError::invalid_arguments(
                        &self.name,
                        format!(
                            "field '{}' must be of type {}, got {}",
                            param.name,
                            param.param_type.as_str(),
                            json_type_name(value)
                        ),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(map)
    }

    /// JSON schema of the arguments object.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut property = json!({ "type": param.param_type.as_str() });
            if let Some(description) = &param.description {
                property["description"] = Value::String(description.clone());
            }
            properties.insert(param.name.clone(), property);
        }
        let required: Vec<Value> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| Value::String(p.name.clone()))
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Rebuild a descriptor from an advertised schema (as served by `tools/list`).
    ///
    /// Properties with a type this layer does not model are treated as objects.
    pub fn from_json_schema(name: &str, description: &str, schema: &Value) -> Self {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut metadata = ToolMetadata::new(name, description);
        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (param_name, property) in properties {
                let param_type = property
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(ToolParameterType::from_schema_type)
                    .unwrap_or(ToolParameterType::Object);
                let mut param = ToolParameter::new(param_name.clone(), param_type);
                if let Some(text) = property.get("description").and_then(Value::as_str) {
                    param = param.with_description(text);
                }
                if required.contains(&param_name.as_str()) {
                    param = param.required();
                }
                metadata = metadata.with_parameter(param);
            }
        }
        metadata
    }

    /// Function-calling shape handed to the model.
    pub fn to_tool_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.to_json_schema(),
        }
    }

    /// Entry for an MCP `tools/list` response.
    pub fn to_tool_info(&self) -> ToolInfo {
        ToolInfo {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            input_schema: self.to_json_schema(),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Trait for implementing tool execution protocols
#[async_trait]
pub trait ToolProtocol: Send + Sync {
    /// Execute a tool with the given arguments.
    ///
    /// `Ok` results with `is_error` set are tool-level failures the model
    /// should see; `Err` means the call could not be carried out at all.
    async fn execute(
        &self,
        tool_name: &str,
        arguments: Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>>;

    /// Get metadata about available tools
    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>>;

    /// Get metadata about a specific tool
    async fn get_tool_metadata(
        &self,
        tool_name: &str,
    ) -> Result<ToolMetadata, Box<dyn Error + Send + Sync>> {
        self.list_tools()
            .await?
            .into_iter()
            .find(|tool| tool.name == tool_name)
            .ok_or_else(|| EcppError::UnknownTool(tool_name.to_string()).into())
    }

    /// Protocol identifier (e.g. "ecpp", "mcp-stdio")
    fn protocol_name(&self) -> &str;

    /// Release any connection held by the protocol
    async fn shutdown(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
