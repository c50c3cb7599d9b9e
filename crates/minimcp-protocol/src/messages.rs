//! Method payload types.
//!
//! Request params and response results for the reserved methods:
//! `initialize`, `tools/list`, `tools/call`, and `shutdown` (whose
//! acknowledgment is an empty object and needs no type here).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol version advertised during initialization.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// ============================================================================
// Initialize
// ============================================================================

/// Server identity reported in the initialize result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

/// Client identity sent in the initialize params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    pub version: String,
}

/// Tool capability marker. Carries no flags in this protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsCapability {}

/// Server capabilities advertised during initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: ToolsCapability,
}

/// `initialize` request params. Everything is optional; the server does not
/// reject clients that omit their identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitializeParams {
    /// Protocol version requested by the client.
    #[serde(
        rename = "protocolVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub protocol_version: Option<String>,
    /// Client info.
    #[serde(rename = "clientInfo", default, skip_serializing_if = "Option::is_none")]
    pub client_info: Option<ClientInfo>,
}

/// `initialize` response result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    /// Protocol version accepted.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Server info.
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
    /// Server capabilities.
    pub capabilities: ServerCapabilities,
}

// ============================================================================
// Tools
// ============================================================================

/// A registered tool: name, description, and argument schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name, unique within the registry.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool arguments.
    pub input_schema: Value,
}

/// `tools/list` response result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// Registered tools, in registration order.
    pub tools: Vec<Tool>,
}

/// `tools/call` request params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Tool name to call.
    pub name: String,
    /// Tool arguments; absent means no arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Map<String, Value>>,
}

impl CallToolParams {
    /// Creates params for calling `name` with the given arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments: if arguments.is_empty() {
                None
            } else {
                Some(arguments)
            },
        }
    }
}

/// A block of tool output content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Plain text content.
    Text {
        /// The text body.
        text: String,
    },
}

impl Content {
    /// Creates a text content block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }
}

/// `tools/call` response result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    /// Output content blocks.
    pub content: Vec<Content>,
}

impl CallToolResult {
    /// Concatenates all text blocks, newline-separated.
    #[must_use]
    pub fn text(&self) -> String {
        let parts: Vec<&str> = self
            .content
            .iter()
            .map(|block| match block {
                Content::Text { text } => text.as_str(),
            })
            .collect();
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initialize_result_shape() {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            server_info: ServerInfo {
                name: "minimcp-server".to_owned(),
                version: "0.1.0".to_owned(),
            },
            capabilities: ServerCapabilities::default(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(value["serverInfo"]["name"], "minimcp-server");
        assert_eq!(value["capabilities"], json!({"tools": {}}));
    }

    #[test]
    fn test_content_wire_shape() {
        let block = Content::text("hello");
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value, json!({"type": "text", "text": "hello"}));
    }

    #[test]
    fn test_call_tool_params_default_arguments() {
        let params: CallToolParams =
            serde_json::from_value(json!({"name": "read_file"})).unwrap();
        assert_eq!(params.name, "read_file");
        assert!(params.arguments.is_none());
    }

    #[test]
    fn test_tool_schema_key_is_snake_case() {
        let tool = Tool {
            name: "search_file".to_owned(),
            description: "Search".to_owned(),
            input_schema: json!({"type": "object"}),
        };
        let value = serde_json::to_value(&tool).unwrap();
        assert!(value.get("input_schema").is_some());
    }

    #[test]
    fn test_call_tool_result_text() {
        let result = CallToolResult {
            content: vec![Content::text("one"), Content::text("two")],
        };
        assert_eq!(result.text(), "one\ntwo");
    }

    #[test]
    fn test_initialize_params_tolerates_absent_fields() {
        let params: InitializeParams = serde_json::from_value(json!({})).unwrap();
        assert!(params.client_info.is_none());
        assert!(params.protocol_version.is_none());
    }
}
