//! Tool handler trait and argument helpers.

use minimcp_core::{RpcError, RpcResult};
use minimcp_protocol::{Content, Tool};
use serde_json::{Map, Value};

/// Handler for a registered tool.
///
/// Handlers run synchronously on the connection thread and return either
/// content blocks or an [`RpcError`] that becomes a JSON-RPC error response.
/// A panicking handler is caught at the dispatch boundary and reported as an
/// internal error; it never takes the connection down.
pub trait ToolHandler: Send + Sync {
    /// Returns the tool definition (name, description, argument schema).
    fn definition(&self) -> Tool;

    /// Calls the tool with the given arguments.
    ///
    /// The dispatcher has already checked the arguments against the
    /// definition's schema; handlers still own any validation the schema
    /// cannot express.
    fn call(&self, arguments: &Map<String, Value>) -> RpcResult<Vec<Content>>;
}

/// A boxed tool handler.
pub type BoxedToolHandler = Box<dyn ToolHandler>;

/// Reads an optional string argument, rejecting non-string values.
pub fn optional_str<'a>(
    arguments: &'a Map<String, Value>,
    key: &str,
) -> RpcResult<Option<&'a str>> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(RpcError::invalid_params(format!(
            "argument {key} must be a string"
        ))),
    }
}

/// Reads a required string argument.
pub fn required_str<'a>(arguments: &'a Map<String, Value>, key: &str) -> RpcResult<&'a str> {
    optional_str(arguments, key)?
        .ok_or_else(|| RpcError::invalid_params(format!("argument {key} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_optional_str() {
        assert_eq!(optional_str(&args(json!({})), "path").unwrap(), None);
        assert_eq!(optional_str(&args(json!({"path": null})), "path").unwrap(), None);
        assert_eq!(
            optional_str(&args(json!({"path": "/tmp/x"})), "path").unwrap(),
            Some("/tmp/x")
        );
        assert!(optional_str(&args(json!({"path": 7})), "path").is_err());
    }

    #[test]
    fn test_required_str() {
        assert_eq!(
            required_str(&args(json!({"words": "hi"})), "words").unwrap(),
            "hi"
        );
        let err = required_str(&args(json!({})), "words").unwrap_err();
        assert!(err.message.contains("words"));
    }
}
