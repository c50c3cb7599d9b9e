//! The call correlator.

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, warn};
use minimcp_core::logging::targets;
use minimcp_protocol::{
    CallToolParams, CallToolResult, ClientInfo, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcMessage, JsonRpcRequest, ListToolsResult, PROTOCOL_VERSION, RequestId, Tool,
};
use minimcp_transport::{AddrError, TcpTransport, Transport, TransportError, parse_host_port};
use serde_json::{Map, Value};

use crate::session::ClientSession;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Identity sent in the `initialize` params.
    pub client_info: ClientInfo,
    /// Give up waiting for a matching response after this many seconds.
    /// `None` blocks indefinitely.
    pub timeout_seconds: Option<f64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_info: ClientInfo {
                name: "minimcp-client".to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
            },
            timeout_seconds: None,
        }
    }
}

/// Synchronous RPC client.
///
/// Outgoing requests get a fresh id from a monotonic counter and an entry
/// in the pending table; [`Client::wait`] reads frames until the matching
/// id arrives. Responses for other outstanding ids are parked in their
/// table slot, so out-of-order delivery resolves every caller correctly;
/// responses for ids that were never issued are discarded with a warning.
pub struct Client<T: Transport> {
    transport: T,
    client_info: ClientInfo,
    next_id: i64,
    pending: HashMap<RequestId, Option<minimcp_protocol::JsonRpcResponse>>,
    session: Option<ClientSession>,
}

impl Client<TcpTransport> {
    /// Connects to a server at `HOST:PORT` (a bare `:PORT` means
    /// `127.0.0.1:PORT`).
    pub fn connect(addr: &str, config: ClientConfig) -> Result<Self, ClientError> {
        let (host, port) = parse_host_port(addr)?;
        let transport = TcpTransport::connect((host.as_str(), port))
            .map_err(|e| ClientError::Transport(TransportError::from_io(e)))?;
        if let Some(seconds) = config.timeout_seconds {
            transport
                .set_read_timeout(Some(Duration::from_secs_f64(seconds)))
                .map_err(|e| ClientError::Transport(TransportError::from_io(e)))?;
        }
        debug!(target: targets::CLIENT, "connected to {}", transport.peer_addr());
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> Client<T> {
    /// Wraps an existing transport.
    #[must_use]
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            client_info: config.client_info,
            next_id: 0,
            pending: HashMap::new(),
            session: None,
        }
    }

    /// Returns the session captured by [`Client::initialize`], if any.
    #[must_use]
    pub fn session(&self) -> Option<&ClientSession> {
        self.session.as_ref()
    }

    /// Sends a request with a fresh id and returns the id without waiting.
    pub fn send(&mut self, method: &str, params: Option<Value>) -> Result<RequestId, ClientError> {
        self.next_id += 1;
        let id = RequestId::Number(self.next_id);
        self.send_with_id(id.clone(), method, params)?;
        Ok(id)
    }

    /// Sends a request under a caller-chosen id.
    ///
    /// An id that is already outstanding is rejected rather than silently
    /// overwriting the pending entry.
    pub fn send_with_id(
        &mut self,
        id: RequestId,
        method: &str,
        params: Option<Value>,
    ) -> Result<(), ClientError> {
        if self.pending.contains_key(&id) {
            return Err(ClientError::DuplicateId(id));
        }
        let request = JsonRpcRequest::new(id.clone(), method, params);
        self.transport
            .send(&JsonRpcMessage::Request(request))
            .map_err(ClientError::from_transport)?;
        self.pending.insert(id, None);
        Ok(())
    }

    /// Blocks until the response for `id` arrives, then returns its result
    /// value or the remote error.
    pub fn wait(&mut self, id: &RequestId) -> Result<Value, ClientError> {
        if !self.pending.contains_key(id) {
            return Err(ClientError::UnknownId(id.clone()));
        }
        loop {
            // A response parked while waiting on a different id.
            if let Some(Some(_)) = self.pending.get(id) {
                if let Some(Some(response)) = self.pending.remove(id) {
                    return finish(response);
                }
            }

            let message = match self.transport.recv() {
                Ok(message) => message,
                Err(err) => {
                    let err = ClientError::from_transport(err);
                    if matches!(err, ClientError::ConnectionLost) {
                        self.pending.remove(id);
                    }
                    // A timed-out id stays pending so the caller may wait again.
                    return Err(err);
                }
            };
            let response = match message {
                JsonRpcMessage::Response(response) => response,
                JsonRpcMessage::Request(request) => {
                    warn!(
                        target: targets::CLIENT,
                        "discarding unexpected request from server: {}", request.method
                    );
                    continue;
                }
            };

            if response.id == *id {
                self.pending.remove(id);
                return finish(response);
            }
            match self.pending.get_mut(&response.id) {
                Some(slot @ None) => *slot = Some(response),
                _ => warn!(
                    target: targets::CLIENT,
                    "discarding response with unknown id {}", response.id
                ),
            }
        }
    }

    /// Sends a request and blocks for its response.
    pub fn call(&mut self, method: &str, params: Option<Value>) -> Result<Value, ClientError> {
        let id = self.send(method, params)?;
        self.wait(&id)
    }

    /// Performs the `initialize` handshake and captures the session.
    pub fn initialize(&mut self) -> Result<&ClientSession, ClientError> {
        let params = InitializeParams {
            protocol_version: Some(PROTOCOL_VERSION.to_owned()),
            client_info: Some(self.client_info.clone()),
        };
        let value = self.call("initialize", Some(to_params(&params)?))?;
        let result: InitializeResult = from_result(value)?;
        debug!(
            target: targets::CLIENT,
            "initialized against {} v{}", result.server_info.name, result.server_info.version
        );
        let session = ClientSession::new(
            result.server_info,
            result.capabilities,
            result.protocol_version,
        );
        Ok(self.session.insert(session))
    }

    /// Fetches the registered tools.
    pub fn list_tools(&mut self) -> Result<Vec<Tool>, ClientError> {
        let value = self.call("tools/list", None)?;
        let result: ListToolsResult = from_result(value)?;
        Ok(result.tools)
    }

    /// Invokes a registered tool.
    pub fn call_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult, ClientError> {
        let params = CallToolParams::new(name, arguments);
        let value = self.call("tools/call", Some(to_params(&params)?))?;
        from_result(value)
    }

    /// Requests a connection-scoped shutdown.
    pub fn shutdown(&mut self) -> Result<(), ClientError> {
        self.call("shutdown", None)?;
        Ok(())
    }

    /// Best-effort shutdown, then closes the transport.
    pub fn close(mut self) {
        if self.session.is_some() {
            if let Err(err) = self.shutdown() {
                debug!(target: targets::CLIENT, "shutdown on close failed: {err}");
            }
        }
        let _ = self.transport.close();
    }
}

fn finish(response: minimcp_protocol::JsonRpcResponse) -> Result<Value, ClientError> {
    response.into_result().map_err(ClientError::Remote)
}

fn to_params<P: serde::Serialize>(params: &P) -> Result<Value, ClientError> {
    serde_json::to_value(params).map_err(ClientError::Json)
}

fn from_result<R: serde::de::DeserializeOwned>(value: Value) -> Result<R, ClientError> {
    serde_json::from_value(value).map_err(ClientError::Json)
}

/// Client error types.
#[derive(Debug)]
pub enum ClientError {
    /// The address did not parse.
    Addr(AddrError),
    /// The stream closed before a matching response arrived.
    ConnectionLost,
    /// The configured timeout elapsed before a matching response arrived.
    TimedOut,
    /// Any other transport failure.
    Transport(TransportError),
    /// The server answered with an error response.
    Remote(JsonRpcError),
    /// The id is already outstanding.
    DuplicateId(RequestId),
    /// The id was never issued (or already resolved).
    UnknownId(RequestId),
    /// A params or result payload did not match the expected shape.
    Json(serde_json::Error),
}

impl ClientError {
    fn from_transport(err: TransportError) -> Self {
        match err {
            TransportError::Closed => ClientError::ConnectionLost,
            TransportError::TimedOut => ClientError::TimedOut,
            other => ClientError::Transport(other),
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Addr(e) => write!(f, "invalid address: {e}"),
            ClientError::ConnectionLost => write!(f, "connection lost before a response arrived"),
            ClientError::TimedOut => write!(f, "timed out waiting for a response"),
            ClientError::Transport(e) => write!(f, "transport error: {e}"),
            ClientError::Remote(e) => write!(f, "server returned an error: {e}"),
            ClientError::DuplicateId(id) => write!(f, "request id {id} is already outstanding"),
            ClientError::UnknownId(id) => write!(f, "no outstanding request with id {id}"),
            ClientError::Json(e) => write!(f, "unexpected payload shape: {e}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Addr(e) => Some(e),
            ClientError::Transport(e) => Some(e),
            ClientError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AddrError> for ClientError {
    fn from(err: AddrError) -> Self {
        ClientError::Addr(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minimcp_protocol::JsonRpcResponse;
    use minimcp_transport::{FrameCodec, StreamTransport};
    use serde_json::json;
    use std::io::Cursor;

    /// A client over an in-memory transport whose reader is preloaded with
    /// the given responses.
    fn preloaded(
        responses: &[JsonRpcResponse],
    ) -> Client<StreamTransport<Cursor<Vec<u8>>, Vec<u8>>> {
        let codec = FrameCodec::new();
        let mut input = Vec::new();
        for response in responses {
            input.extend_from_slice(
                &codec
                    .encode(&JsonRpcMessage::Response(response.clone()))
                    .unwrap(),
            );
        }
        let transport = StreamTransport::new(Cursor::new(input), Vec::new());
        Client::with_transport(transport, ClientConfig::default())
    }

    fn success(id: i64, value: Value) -> JsonRpcResponse {
        JsonRpcResponse::success(RequestId::Number(id), value)
    }

    #[test]
    fn test_call_returns_matching_result() {
        let mut client = preloaded(&[success(1, json!({"ok": true}))]);
        let value = client.call("tools/list", None).unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[test]
    fn test_out_of_order_responses_resolve_every_caller() {
        // Server answers ids 1,2,3 in the order 3,1,2.
        let mut client = preloaded(&[
            success(3, json!("third")),
            success(1, json!("first")),
            success(2, json!("second")),
        ]);

        let id1 = client.send("a", None).unwrap();
        let id2 = client.send("b", None).unwrap();
        let id3 = client.send("c", None).unwrap();

        assert_eq!(client.wait(&id1).unwrap(), json!("first"));
        assert_eq!(client.wait(&id2).unwrap(), json!("second"));
        // id3's response was parked while waiting for id1.
        assert_eq!(client.wait(&id3).unwrap(), json!("third"));
    }

    #[test]
    fn test_unknown_id_response_discarded() {
        let mut client = preloaded(&[success(99, json!("stray")), success(1, json!("mine"))]);
        assert_eq!(client.call("a", None).unwrap(), json!("mine"));
    }

    #[test]
    fn test_remote_error_raised() {
        let error = JsonRpcError {
            code: -32000,
            message: "file not found: context.txt".to_owned(),
            data: None,
        };
        let mut client = preloaded(&[JsonRpcResponse::error(RequestId::Number(1), error)]);

        match client.call("tools/call", None).unwrap_err() {
            ClientError::Remote(err) => {
                assert_eq!(err.code, -32000);
                assert!(err.message.contains("not found"));
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[test]
    fn test_connection_lost_before_response() {
        let mut client = preloaded(&[]);
        assert!(matches!(
            client.call("a", None).unwrap_err(),
            ClientError::ConnectionLost
        ));
    }

    #[test]
    fn test_duplicate_outstanding_id_rejected() {
        let mut client = preloaded(&[]);
        client
            .send_with_id(RequestId::Number(7), "a", None)
            .unwrap();
        assert!(matches!(
            client.send_with_id(RequestId::Number(7), "b", None),
            Err(ClientError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_wait_on_unknown_id() {
        let mut client = preloaded(&[]);
        assert!(matches!(
            client.wait(&RequestId::Number(1)),
            Err(ClientError::UnknownId(_))
        ));
    }

    #[test]
    fn test_ids_are_unique_and_monotonic() {
        let mut client = preloaded(&[]);
        let a = client.send("a", None).unwrap();
        let b = client.send("b", None).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, RequestId::Number(1));
        assert_eq!(b, RequestId::Number(2));
    }
}
