//! JSON-RPC 2.0 message types.
//!
//! Every message on the wire is exactly one of three shapes: a request, a
//! success response, or an error response. Deserialization goes through
//! [`JsonRpcMessage::from_slice`], which enforces the shape rules and names
//! the offending field on failure; serde's untagged fallback alone would
//! happily accept a response carrying both `result` and `error`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use minimcp_core::RpcError;

/// The JSON-RPC protocol version carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC request ID.
///
/// A correlation token linking a response to its originating request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Integer ID.
    Number(i64),
    /// String ID.
    String(String),
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Number(id)
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        RequestId::String(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId::String(id.to_owned())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s}"),
        }
    }
}

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version (always "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: RequestId,
    /// Method name.
    pub method: String,
    /// Request parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Creates a new request with the given method and parameters.
    #[must_use]
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub message: String,
    /// Additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<RpcError> for JsonRpcError {
    fn from(err: RpcError) -> Self {
        Self {
            code: err.code.into(),
            message: err.message,
            data: err.data,
        }
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// JSON-RPC 2.0 response.
///
/// Exactly one of `result` and `error` is present; [`JsonRpcMessage`]
/// deserialization rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version (always "2.0").
    pub jsonrpc: String,
    /// Request ID this is responding to.
    pub id: RequestId,
    /// Result (present on success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error (present on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Creates a success response.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error response.
    #[must_use]
    pub fn error(id: RequestId, error: impl Into<JsonRpcError>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Returns true if this is an error response.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Unwraps the response into its result value or error object.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match (self.result, self.error) {
            (_, Some(err)) => Err(err),
            (Some(value), None) => Ok(value),
            // Unreachable for messages built by the constructors or decoded
            // through from_value.
            (None, None) => Ok(Value::Null),
        }
    }
}

/// A validated JSON-RPC message: a request or a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// A request.
    Request(JsonRpcRequest),
    /// A response (success or error).
    Response(JsonRpcResponse),
}

impl JsonRpcMessage {
    /// Parses and validates a message from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MessageError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(&value)
    }

    /// Validates a parsed JSON value against the three message shapes.
    pub fn from_value(value: &Value) -> Result<Self, MessageError> {
        let Some(obj) = value.as_object() else {
            return Err(MessageError::NotAnObject);
        };

        match obj.get("jsonrpc") {
            Some(Value::String(v)) if v == JSONRPC_VERSION => {}
            Some(_) => return Err(MessageError::InvalidField("jsonrpc")),
            None => return Err(MessageError::MissingField("jsonrpc")),
        }

        let id = match obj.get("id") {
            Some(Value::Number(n)) => match n.as_i64() {
                Some(n) => RequestId::Number(n),
                None => return Err(MessageError::InvalidField("id")),
            },
            Some(Value::String(s)) => RequestId::String(s.clone()),
            Some(_) => return Err(MessageError::InvalidField("id")),
            None => return Err(MessageError::MissingField("id")),
        };

        if let Some(method) = obj.get("method") {
            let method = match method.as_str() {
                Some(m) if !m.is_empty() => m.to_owned(),
                _ => return Err(MessageError::InvalidField("method")),
            };
            let params = match obj.get("params") {
                None | Some(Value::Null) => None,
                Some(params @ Value::Object(_)) => Some(params.clone()),
                Some(_) => return Err(MessageError::InvalidField("params")),
            };
            return Ok(JsonRpcMessage::Request(JsonRpcRequest {
                jsonrpc: JSONRPC_VERSION.to_owned(),
                id,
                method,
                params,
            }));
        }

        match (obj.get("result"), obj.get("error")) {
            (Some(_), Some(_)) => Err(MessageError::ResultAndError),
            (None, None) => Err(MessageError::MissingField("result or error")),
            (Some(result), None) => Ok(JsonRpcMessage::Response(JsonRpcResponse {
                jsonrpc: JSONRPC_VERSION.to_owned(),
                id,
                result: Some(result.clone()),
                error: None,
            })),
            (None, Some(error)) => {
                let error: JsonRpcError = serde_json::from_value(error.clone())
                    .map_err(|_| MessageError::InvalidField("error"))?;
                Ok(JsonRpcMessage::Response(JsonRpcResponse {
                    jsonrpc: JSONRPC_VERSION.to_owned(),
                    id,
                    result: None,
                    error: Some(error),
                }))
            }
        }
    }

    /// Returns the correlation id of the message.
    #[must_use]
    pub fn id(&self) -> &RequestId {
        match self {
            JsonRpcMessage::Request(req) => &req.id,
            JsonRpcMessage::Response(resp) => &resp.id,
        }
    }
}

impl From<JsonRpcRequest> for JsonRpcMessage {
    fn from(req: JsonRpcRequest) -> Self {
        JsonRpcMessage::Request(req)
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(resp: JsonRpcResponse) -> Self {
        JsonRpcMessage::Response(resp)
    }
}

/// Error raised when bytes do not form a valid JSON-RPC message.
#[derive(Debug)]
pub enum MessageError {
    /// The payload is not valid JSON.
    Json(serde_json::Error),
    /// The payload is valid JSON but not an object.
    NotAnObject,
    /// A required field is absent.
    MissingField(&'static str),
    /// A field is present but has the wrong type or value.
    InvalidField(&'static str),
    /// A response carries both `result` and `error`.
    ResultAndError,
}

impl std::fmt::Display for MessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageError::Json(e) => write!(f, "invalid JSON: {e}"),
            MessageError::NotAnObject => write!(f, "message is not a JSON object"),
            MessageError::MissingField(field) => write!(f, "missing field: {field}"),
            MessageError::InvalidField(field) => write!(f, "invalid field: {field}"),
            MessageError::ResultAndError => {
                write!(f, "response carries both result and error")
            }
        }
    }
}

impl std::error::Error for MessageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MessageError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MessageError {
    fn from(err: serde_json::Error) -> Self {
        MessageError::Json(err)
    }
}
