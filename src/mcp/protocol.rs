/// Wire types for MCP over JSON-RPC 2.0
///
/// Request/response envelopes, the handful of MCP payloads the server
/// speaks, and the mapping from tool failures onto JSON-RPC error codes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::storage::StorageError;
use crate::tools::ToolError;

/// Protocol revision announced in `initialize`
pub const MCP_VERSION: &str = "2024-11-05";

const JSONRPC_VERSION: &str = "2.0";

/// Incoming request or notification
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    /// Notifications carry no id
    #[serde(default)]
    pub id: Value,
    /// The method to call (e.g., "tools/call")
    pub method: String,
    pub params: Option<Value>,
}

/// Outgoing reply; exactly one of `result` and `error` is set
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Params of `tools/call`
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    /// e.g. "habit_toggle"
    pub name: String,
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
}

/// Result of `tools/call`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    pub is_error: bool,
}

/// One content block; this server only emits text
#[derive(Debug, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// Entry in the `tools/list` result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool's arguments
    pub input_schema: Value,
}

#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    pub list_changed: bool,
}

/// Params of `initialize`. Everything is optional so odd clients still connect.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitializeParams {
    pub protocol_version: String,
    pub client_info: Option<Implementation>,
}

/// Name and version of either end of the connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: Implementation,
}

pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // Server-defined codes, -32000 to -32099
    /// A habit, category or reward does not exist for this account
    pub const NOT_FOUND: i32 = -32001;
    /// Unique constraint hit (PIN, category name, completion)
    pub const DUPLICATE: i32 = -32002;
    /// A domain rule rejected the input
    pub const VALIDATION: i32 = -32003;
    /// SQLite or stored data failure
    pub const STORAGE: i32 = -32004;
    /// The tool needs a logged-in session
    pub const NOT_LOGGED_IN: i32 = -32005;
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: Some(result), error: None }
    }

    pub fn error(id: Value, code: i32, message: String, data: Option<Value>) -> Self {
        let error = JsonRpcError { code, message, data };
        Self { jsonrpc: JSONRPC_VERSION, id, result: None, error: Some(error) }
    }

    /// Error response for a failed tool call
    pub fn tool_error(id: Value, tool: &str, error: &ToolError) -> Self {
        Self::error(
            id,
            tool_error_to_json_rpc_code(error),
            error.to_string(),
            Some(json!({ "tool": tool })),
        )
    }
}

impl ToolCallResult {
    fn text(text: String, is_error: bool) -> Self {
        Self {
            content: vec![ToolContent { kind: "text", text }],
            is_error,
        }
    }

    pub fn success(text: String) -> Self {
        Self::text(text, false)
    }

    pub fn error(message: String) -> Self {
        Self::text(format!("Error: {}", message), true)
    }
}

impl ToolDefinition {
    /// Describe a tool whose arguments deserialize into `T`
    pub fn new<T: JsonSchema>(name: &str, description: &str) -> Self {
        let input_schema = serde_json::to_value(schemars::schema_for!(T))
            .unwrap_or_else(|_| json!({"type": "object"}));
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }

    /// Describe a tool that takes no arguments
    pub fn without_params(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }
}

/// Map a tool failure onto a JSON-RPC error code
pub fn tool_error_to_json_rpc_code(error: &ToolError) -> i32 {
    match error {
        ToolError::Domain(_) => error_codes::VALIDATION,
        ToolError::InvalidParams(_) => error_codes::INVALID_PARAMS,
        ToolError::NotLoggedIn => error_codes::NOT_LOGGED_IN,
        ToolError::Storage(e) => storage_error_to_json_rpc_code(e),
    }
}

fn storage_error_to_json_rpc_code(error: &StorageError) -> i32 {
    match error {
        StorageError::HabitNotFound { .. }
        | StorageError::CategoryNotFound { .. }
        | StorageError::RewardNotFound { .. } => error_codes::NOT_FOUND,
        StorageError::DuplicateEntry { .. }
        | StorageError::DuplicatePin
        | StorageError::DuplicateCategory { .. } => error_codes::DUPLICATE,
        StorageError::Query(_)
        | StorageError::Connection(_)
        | StorageError::Migration(_)
        | StorageError::Domain(_) => error_codes::STORAGE,
        StorageError::Serialization(_) => error_codes::INTERNAL_ERROR,
    }
}
