//! Per-connection request dispatch.
//!
//! Each connection owns one [`Dispatcher`], a small state machine over
//! [`SessionPhase`]. Methods arriving in the wrong phase are answered with
//! error responses; the connection itself stays healthy. Handler panics are
//! caught here so a misbehaving tool can never take the connection loop
//! down.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::{debug, error, warn};
use minimcp_core::logging::targets;
use minimcp_core::{RpcError, RpcResult};
use minimcp_protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, ServerCapabilities, ServerInfo, validate,
};
use serde_json::{Map, Value};

use crate::registry::Registry;

/// Session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No `initialize` received yet; only `initialize` is accepted.
    Uninitialized,
    /// Normal operation.
    Ready,
    /// `shutdown` acknowledged; the connection closes after the final
    /// response is sent. Terminal.
    ShuttingDown,
}

/// Routes requests to handlers and enforces the session state machine.
pub struct Dispatcher {
    info: ServerInfo,
    capabilities: ServerCapabilities,
    registry: Arc<Registry>,
    phase: SessionPhase,
}

impl Dispatcher {
    pub(crate) fn new(
        info: ServerInfo,
        capabilities: ServerCapabilities,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            info,
            capabilities,
            registry,
            phase: SessionPhase::Uninitialized,
        }
    }

    /// Returns the current session phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Returns true once `shutdown` has been handled.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.phase == SessionPhase::ShuttingDown
    }

    /// Handles one request, producing exactly one response.
    pub fn dispatch(&mut self, request: &JsonRpcRequest) -> JsonRpcResponse {
        debug!(
            target: targets::DISPATCH,
            "dispatching {} (id={})", request.method, request.id
        );
        let outcome = match (self.phase, request.method.as_str()) {
            (SessionPhase::Uninitialized, "initialize") => self.initialize(request),
            (SessionPhase::Uninitialized, method) => {
                warn!(target: targets::DISPATCH, "{method} received before initialize");
                Err(RpcError::not_initialized())
            }
            (SessionPhase::ShuttingDown, method) => Err(RpcError::invalid_request(format!(
                "connection is shutting down, refusing {method}"
            ))),
            (SessionPhase::Ready, "initialize") => {
                Err(RpcError::invalid_request("already initialized"))
            }
            (SessionPhase::Ready, "shutdown" | "exit") => {
                debug!(target: targets::DISPATCH, "shutdown requested");
                self.phase = SessionPhase::ShuttingDown;
                Ok(Value::Object(Map::new()))
            }
            (SessionPhase::Ready, "tools/list") => self.list_tools(),
            (SessionPhase::Ready, "tools/call") => self.call_tool(request),
            (SessionPhase::Ready, method) => Err(RpcError::method_not_found(method)),
        };
        match outcome {
            Ok(result) => JsonRpcResponse::success(request.id.clone(), result),
            Err(err) => {
                debug!(
                    target: targets::DISPATCH,
                    "{} (id={}) failed: {err}", request.method, request.id
                );
                JsonRpcResponse::error(request.id.clone(), err)
            }
        }
    }

    fn initialize(&mut self, request: &JsonRpcRequest) -> RpcResult<Value> {
        let params: InitializeParams = parse_params_or_default(request)?;
        if let Some(client) = &params.client_info {
            debug!(
                target: targets::DISPATCH,
                "client {} v{} connected", client.name, client.version
            );
        }
        self.phase = SessionPhase::Ready;
        to_result_value(&InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            server_info: self.info.clone(),
            capabilities: self.capabilities.clone(),
        })
    }

    fn list_tools(&self) -> RpcResult<Value> {
        to_result_value(&ListToolsResult {
            tools: self.registry.tools(),
        })
    }

    fn call_tool(&self, request: &JsonRpcRequest) -> RpcResult<Value> {
        let params: CallToolParams = parse_params(request)?;
        let handler = self
            .registry
            .get(&params.name)
            .ok_or_else(|| RpcError::method_not_found(&format!("tool {}", params.name)))?;

        let arguments = params.arguments.unwrap_or_default();
        if let Err(errors) = validate(
            &handler.definition().input_schema,
            &Value::Object(arguments.clone()),
        ) {
            let detail: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Err(RpcError::invalid_params(format!(
                "invalid arguments for {}: {}",
                params.name,
                detail.join("; ")
            )));
        }

        match panic::catch_unwind(AssertUnwindSafe(|| handler.call(&arguments))) {
            Ok(Ok(content)) => to_result_value(&CallToolResult { content }),
            Ok(Err(err)) => {
                debug!(target: targets::DISPATCH, "tool {} failed: {err}", params.name);
                Err(err)
            }
            Err(payload) => {
                // The panic message is logged here and never sent to the peer.
                error!(
                    target: targets::DISPATCH,
                    "tool {} panicked: {}", params.name, panic_message(payload.as_ref())
                );
                Err(RpcError::internal(format!("tool {} failed", params.name)))
            }
        }
    }
}

/// Parses required params, failing with invalid-params when absent.
fn parse_params<T: serde::de::DeserializeOwned>(request: &JsonRpcRequest) -> RpcResult<T> {
    let params = request.params.clone().ok_or_else(|| {
        RpcError::invalid_params(format!("{} requires params", request.method))
    })?;
    serde_json::from_value(params).map_err(|e| {
        RpcError::invalid_params(format!("invalid params for {}: {e}", request.method))
    })
}

/// Parses optional params, substituting the default when absent.
fn parse_params_or_default<T: serde::de::DeserializeOwned + Default>(
    request: &JsonRpcRequest,
) -> RpcResult<T> {
    match &request.params {
        None => Ok(T::default()),
        Some(_) => parse_params(request),
    }
}

fn to_result_value<T: serde::Serialize>(result: &T) -> RpcResult<Value> {
    serde_json::to_value(result).map_err(|e| {
        error!(target: targets::DISPATCH, "result serialization failed: {e}");
        RpcError::internal("result serialization failed")
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minimcp_core::ErrorCode;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            ServerInfo {
                name: "test".to_owned(),
                version: "0.0.0".to_owned(),
            },
            ServerCapabilities::default(),
            Arc::new(Registry::new()),
        )
    }

    fn request(id: i64, method: &str) -> JsonRpcRequest {
        JsonRpcRequest::new(id, method, None)
    }

    #[test]
    fn test_phase_transitions() {
        let mut d = dispatcher();
        assert_eq!(d.phase(), SessionPhase::Uninitialized);

        let response = d.dispatch(&request(1, "initialize"));
        assert!(!response.is_error());
        assert_eq!(d.phase(), SessionPhase::Ready);

        let response = d.dispatch(&request(2, "shutdown"));
        assert!(!response.is_error());
        assert_eq!(d.phase(), SessionPhase::ShuttingDown);
    }

    #[test]
    fn test_method_before_initialize_rejected() {
        let mut d = dispatcher();
        let response = d.dispatch(&request(1, "tools/list"));
        let err = response.error.unwrap();
        assert_eq!(err.code, ErrorCode::NotInitialized.value());
        // Still uninitialized and recoverable.
        assert_eq!(d.phase(), SessionPhase::Uninitialized);
        assert!(!d.dispatch(&request(2, "initialize")).is_error());
    }

    #[test]
    fn test_method_after_shutdown_refused() {
        let mut d = dispatcher();
        d.dispatch(&request(1, "initialize"));
        d.dispatch(&request(2, "shutdown"));

        let response = d.dispatch(&request(3, "tools/list"));
        let err = response.error.unwrap();
        assert_eq!(err.code, ErrorCode::InvalidRequest.value());
    }

    #[test]
    fn test_reinitialize_rejected() {
        let mut d = dispatcher();
        d.dispatch(&request(1, "initialize"));
        let response = d.dispatch(&request(2, "initialize"));
        assert_eq!(
            response.error.unwrap().code,
            ErrorCode::InvalidRequest.value()
        );
        assert_eq!(d.phase(), SessionPhase::Ready);
    }

    #[test]
    fn test_exit_is_shutdown_alias() {
        let mut d = dispatcher();
        d.dispatch(&request(1, "initialize"));
        let response = d.dispatch(&request(2, "exit"));
        assert!(!response.is_error());
        assert!(d.is_shutting_down());
    }

    #[test]
    fn test_unknown_method() {
        let mut d = dispatcher();
        d.dispatch(&request(1, "initialize"));
        let response = d.dispatch(&request(2, "resources/list"));
        assert_eq!(
            response.error.unwrap().code,
            ErrorCode::MethodNotFound.value()
        );
    }
}
