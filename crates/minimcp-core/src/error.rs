//! Error types for minimcp operations.

use serde_json::Value;

/// Reserved JSON-RPC error codes used on the wire.
///
/// The first five are the standard JSON-RPC 2.0 codes; the rest are
/// implementation-reserved codes in the `-32099..-32000` server range
/// plus the conventional "server not initialized" code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Invalid JSON was received (-32700).
    ParseError,
    /// The request object is not a valid request (-32600).
    InvalidRequest,
    /// The method does not exist (-32601).
    MethodNotFound,
    /// Invalid method parameters (-32602).
    InvalidParams,
    /// Internal server error (-32603).
    InternalError,
    /// A request arrived before `initialize` (-32002).
    NotInitialized,
    /// A referenced resource (e.g. the corpus file) does not exist (-32000).
    NotFound,
    /// Handler failure that is neither a lookup nor a parameter problem (-32001).
    ServerError,
}

impl ErrorCode {
    /// Returns the numeric wire code.
    #[must_use]
    pub fn value(self) -> i32 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::NotInitialized => -32002,
            ErrorCode::NotFound => -32000,
            ErrorCode::ServerError => -32001,
        }
    }

    /// Maps a numeric wire code back to a reserved code, if it is one.
    #[must_use]
    pub fn from_value(code: i32) -> Option<Self> {
        match code {
            -32700 => Some(ErrorCode::ParseError),
            -32600 => Some(ErrorCode::InvalidRequest),
            -32601 => Some(ErrorCode::MethodNotFound),
            -32602 => Some(ErrorCode::InvalidParams),
            -32603 => Some(ErrorCode::InternalError),
            -32002 => Some(ErrorCode::NotInitialized),
            -32000 => Some(ErrorCode::NotFound),
            -32001 => Some(ErrorCode::ServerError),
            _ => None,
        }
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.value()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCode::ParseError => "parse error",
            ErrorCode::InvalidRequest => "invalid request",
            ErrorCode::MethodNotFound => "method not found",
            ErrorCode::InvalidParams => "invalid params",
            ErrorCode::InternalError => "internal error",
            ErrorCode::NotInitialized => "server not initialized",
            ErrorCode::NotFound => "not found",
            ErrorCode::ServerError => "server error",
        };
        write!(f, "{name}")
    }
}

/// A protocol-level error with a reserved code, a human-readable message,
/// and optional structured data.
///
/// Produced by tool handlers and the dispatcher; converted into a JSON-RPC
/// error object at the server boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    /// Reserved error code.
    pub code: ErrorCode,
    /// Human-readable message sent to the peer.
    pub message: String,
    /// Optional structured error data.
    pub data: Option<Value>,
}

impl RpcError {
    /// Creates an error with the given code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attaches structured data to the error.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Request arrived before `initialize` completed.
    #[must_use]
    pub fn not_initialized() -> Self {
        Self::new(
            ErrorCode::NotInitialized,
            "server not initialized: send initialize first",
        )
    }

    /// The named method (or tool) is not registered.
    #[must_use]
    pub fn method_not_found(name: &str) -> Self {
        Self::new(ErrorCode::MethodNotFound, format!("method not found: {name}"))
    }

    /// The request parameters are missing or malformed.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    /// The request itself is malformed or out of order.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Unexpected failure inside the server; the cause is logged, not echoed.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// A referenced resource does not exist.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Handler failure outside the other categories.
    #[must_use]
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServerError, message)
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.code.value(), self.message)
    }
}

impl std::error::Error for RpcError {}

/// Result alias for operations that fail with an [`RpcError`].
pub type RpcResult<T> = Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values_are_reserved() {
        assert_eq!(ErrorCode::ParseError.value(), -32700);
        assert_eq!(ErrorCode::MethodNotFound.value(), -32601);
        assert_eq!(ErrorCode::InvalidParams.value(), -32602);
        assert_eq!(ErrorCode::NotInitialized.value(), -32002);
        assert_eq!(ErrorCode::NotFound.value(), -32000);
    }

    #[test]
    fn test_code_round_trip() {
        for code in [
            ErrorCode::ParseError,
            ErrorCode::InvalidRequest,
            ErrorCode::MethodNotFound,
            ErrorCode::InvalidParams,
            ErrorCode::InternalError,
            ErrorCode::NotInitialized,
            ErrorCode::NotFound,
            ErrorCode::ServerError,
        ] {
            assert_eq!(ErrorCode::from_value(code.value()), Some(code));
        }
        assert_eq!(ErrorCode::from_value(42), None);
    }

    #[test]
    fn test_error_display() {
        let err = RpcError::method_not_found("tools/frobnicate");
        assert!(err.to_string().contains("-32601"));
        assert!(err.to_string().contains("tools/frobnicate"));
    }

    #[test]
    fn test_with_data() {
        let err = RpcError::invalid_params("missing field")
            .with_data(serde_json::json!({"field": "words"}));
        assert_eq!(err.data.unwrap()["field"], "words");
    }
}
