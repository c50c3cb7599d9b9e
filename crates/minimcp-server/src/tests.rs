//! End-to-end server tests over in-memory transports.
//!
//! Each test feeds a sequence of encoded request frames through
//! `serve_connection` and decodes the response frames the server wrote.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use minimcp_core::ErrorCode;
use minimcp_protocol::{
    JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, RequestId,
};
use minimcp_transport::{FrameCodec, StreamTransport, TransportError};
use serde_json::{Map, Value, json};

use crate::tools::{ReadFileTool, SearchFileTool};
use crate::{Corpus, Server, ToolHandler};

pub(crate) mod support {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// Writes `contents` to a unique file under the system temp dir.
    pub(crate) fn temp_corpus(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "minimcp-corpus-{}-{}.txt",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::write(&path, contents).expect("write temp corpus");
        path
    }
}

fn test_server(corpus_path: PathBuf) -> Server {
    let corpus = Arc::new(Corpus::new(corpus_path));
    Server::builder("test-server", "0.0.0")
        .tool(ReadFileTool::new(Arc::clone(&corpus)))
        .tool(SearchFileTool::new(corpus))
        .build()
}

fn initialize(id: i64) -> JsonRpcRequest {
    JsonRpcRequest::new(
        id,
        "initialize",
        Some(json!({"clientInfo": {"name": "test-client", "version": "0.0.0"}})),
    )
}

fn call_tool(id: i64, name: &str, arguments: Value) -> JsonRpcRequest {
    JsonRpcRequest::new(
        id,
        "tools/call",
        Some(json!({"name": name, "arguments": arguments})),
    )
}

/// Runs a full session: encodes `requests`, serves until the input ends or
/// shutdown, and returns the loop outcome plus the decoded responses.
fn run_session(
    server: &Server,
    requests: &[JsonRpcRequest],
) -> (Result<(), TransportError>, Vec<JsonRpcResponse>) {
    let codec = FrameCodec::new();
    let mut input = Vec::new();
    for request in requests {
        input.extend_from_slice(
            &codec
                .encode(&JsonRpcMessage::Request(request.clone()))
                .expect("encode request"),
        );
    }
    run_session_raw(server, input)
}

fn run_session_raw(
    server: &Server,
    input: Vec<u8>,
) -> (Result<(), TransportError>, Vec<JsonRpcResponse>) {
    let codec = FrameCodec::new();
    let mut transport = StreamTransport::new(Cursor::new(input), Vec::new());
    let outcome = server.serve_connection(&mut transport);

    let (_, output) = transport.into_parts();
    let mut cursor = Cursor::new(output);
    let mut responses = Vec::new();
    while let Some(message) = codec.read_frame(&mut cursor).expect("decode response") {
        match message {
            JsonRpcMessage::Response(response) => responses.push(response),
            JsonRpcMessage::Request(request) => {
                panic!("server sent a request: {}", request.method)
            }
        }
    }
    (outcome, responses)
}

fn error_code(response: &JsonRpcResponse) -> i32 {
    response.error.as_ref().expect("expected an error response").code
}

fn result_text(response: &JsonRpcResponse) -> String {
    let result = response.result.as_ref().expect("expected a success response");
    let blocks = result["content"].as_array().expect("content array");
    blocks
        .iter()
        .map(|block| block["text"].as_str().expect("text block").to_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_initialize_reports_server_metadata() {
    let server = test_server(support::temp_corpus(""));
    let (outcome, responses) = run_session(&server, &[initialize(1)]);

    outcome.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].id, RequestId::Number(1));
    let result = responses[0].result.as_ref().unwrap();
    assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(result["serverInfo"]["name"], "test-server");
    assert_eq!(result["capabilities"], json!({"tools": {}}));
}

#[test]
fn test_request_before_initialize_rejected_then_recovers() {
    let server = test_server(support::temp_corpus(""));
    let (outcome, responses) = run_session(
        &server,
        &[
            JsonRpcRequest::new(1i64, "tools/list", None),
            initialize(2),
            JsonRpcRequest::new(3i64, "tools/list", None),
        ],
    );

    outcome.unwrap();
    assert_eq!(responses.len(), 3);
    assert_eq!(error_code(&responses[0]), ErrorCode::NotInitialized.value());
    assert!(!responses[1].is_error());
    assert!(!responses[2].is_error());
}

#[test]
fn test_shutdown_acknowledged_then_connection_closes() {
    // Scenario E: the shutdown ack is the last frame; the trailing request
    // never gets a response because the connection is gone.
    let server = test_server(support::temp_corpus(""));
    let (outcome, responses) = run_session(
        &server,
        &[
            initialize(1),
            JsonRpcRequest::new(2i64, "shutdown", None),
            JsonRpcRequest::new(3i64, "tools/list", None),
        ],
    );

    outcome.unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[1].id, RequestId::Number(2));
    assert_eq!(responses[1].result, Some(json!({})));
}

#[test]
fn test_exit_closes_connection_like_shutdown() {
    let server = test_server(support::temp_corpus(""));
    let (outcome, responses) =
        run_session(&server, &[initialize(1), JsonRpcRequest::new(2i64, "exit", None)]);

    outcome.unwrap();
    assert_eq!(responses.len(), 2);
    assert!(!responses[1].is_error());
}

#[test]
fn test_unknown_method_keeps_connection_alive() {
    let server = test_server(support::temp_corpus(""));
    let (outcome, responses) = run_session(
        &server,
        &[
            initialize(1),
            JsonRpcRequest::new(2i64, "prompts/list", None),
            JsonRpcRequest::new(3i64, "tools/list", None),
        ],
    );

    outcome.unwrap();
    assert_eq!(responses.len(), 3);
    assert_eq!(error_code(&responses[1]), ErrorCode::MethodNotFound.value());
    assert!(!responses[2].is_error());
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_discovery_lists_both_tools() {
    // Scenario A.
    let server = test_server(support::temp_corpus(""));
    let (outcome, responses) =
        run_session(&server, &[initialize(1), JsonRpcRequest::new(2i64, "tools/list", None)]);

    outcome.unwrap();
    let result: ListToolsResult =
        serde_json::from_value(responses[1].result.clone().unwrap()).unwrap();
    let names: Vec<&str> = result.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["read_file", "search_file"]);
    for tool in &result.tools {
        assert!(!tool.description.is_empty());
        assert_eq!(tool.input_schema["type"], "object");
    }
}

#[test]
fn test_discovery_is_idempotent() {
    let server = test_server(support::temp_corpus(""));
    let (outcome, responses) = run_session(
        &server,
        &[
            initialize(1),
            JsonRpcRequest::new(2i64, "tools/list", None),
            JsonRpcRequest::new(3i64, "tools/list", None),
        ],
    );

    outcome.unwrap();
    assert_eq!(responses[1].result, responses[2].result);
}

// ============================================================================
// Tool calls
// ============================================================================

#[test]
fn test_read_file_returns_full_text() {
    // Scenario B.
    let server = test_server(support::temp_corpus("line one\nline two\n"));
    let (outcome, responses) =
        run_session(&server, &[initialize(1), call_tool(2, "read_file", json!({}))]);

    outcome.unwrap();
    assert_eq!(result_text(&responses[1]), "line one\nline two\n");
}

#[test]
fn test_read_file_missing_source_is_an_error_response() {
    // Scenario B, absent source: an error response, not a dead server.
    let server = test_server(PathBuf::from("/nonexistent/minimcp/context.txt"));
    let (outcome, responses) = run_session(
        &server,
        &[
            initialize(1),
            call_tool(2, "read_file", json!({})),
            JsonRpcRequest::new(3i64, "tools/list", None),
        ],
    );

    outcome.unwrap();
    assert_eq!(error_code(&responses[1]), ErrorCode::NotFound.value());
    assert!(
        responses[1]
            .error
            .as_ref()
            .unwrap()
            .message
            .contains("not found")
    );
    assert!(!responses[2].is_error());
}

#[test]
fn test_search_returns_matches_in_line_order() {
    // Scenario C: "MCP" on lines 3 and 17.
    let mut lines = vec!["filler"; 20];
    lines[2] = "MCP appears here";
    lines[16] = "and MCP again";
    let corpus = support::temp_corpus(&(lines.join("\n") + "\n"));

    let server = test_server(corpus);
    let (outcome, responses) = run_session(
        &server,
        &[initialize(1), call_tool(2, "search_file", json!({"words": "MCP"}))],
    );

    outcome.unwrap();
    assert_eq!(
        result_text(&responses[1]),
        "Matches (2) for: MCP\n3: MCP appears here\n17: and MCP again"
    );
}

#[test]
fn test_search_empty_query_rejected() {
    // Scenario D: invalid params, not a full-file dump.
    let server = test_server(support::temp_corpus("anything\n"));
    let (outcome, responses) = run_session(
        &server,
        &[initialize(1), call_tool(2, "search_file", json!({"words": ""}))],
    );

    outcome.unwrap();
    assert_eq!(error_code(&responses[1]), ErrorCode::InvalidParams.value());
}

#[test]
fn test_search_missing_required_argument_rejected() {
    let server = test_server(support::temp_corpus("anything\n"));
    let (outcome, responses) = run_session(
        &server,
        &[initialize(1), call_tool(2, "search_file", json!({}))],
    );

    outcome.unwrap();
    assert_eq!(error_code(&responses[1]), ErrorCode::InvalidParams.value());
}

#[test]
fn test_wrong_argument_type_rejected() {
    let server = test_server(support::temp_corpus("anything\n"));
    let (outcome, responses) = run_session(
        &server,
        &[initialize(1), call_tool(2, "read_file", json!({"path": 42}))],
    );

    outcome.unwrap();
    assert_eq!(error_code(&responses[1]), ErrorCode::InvalidParams.value());
}

#[test]
fn test_unknown_tool_rejected() {
    let server = test_server(support::temp_corpus(""));
    let (outcome, responses) = run_session(
        &server,
        &[initialize(1), call_tool(2, "write_file", json!({}))],
    );

    outcome.unwrap();
    assert_eq!(error_code(&responses[1]), ErrorCode::MethodNotFound.value());
}

#[test]
fn test_panicking_tool_reported_as_internal_error() {
    struct PanicTool;

    impl ToolHandler for PanicTool {
        fn definition(&self) -> minimcp_protocol::Tool {
            minimcp_protocol::Tool {
                name: "panic".to_owned(),
                description: "always panics".to_owned(),
                input_schema: json!({"type": "object"}),
            }
        }

        fn call(
            &self,
            _arguments: &Map<String, Value>,
        ) -> minimcp_core::RpcResult<Vec<minimcp_protocol::Content>> {
            panic!("secret internal detail")
        }
    }

    let server = Server::builder("test-server", "0.0.0").tool(PanicTool).build();
    let (outcome, responses) = run_session(
        &server,
        &[
            initialize(1),
            call_tool(2, "panic", json!({})),
            JsonRpcRequest::new(3i64, "tools/list", None),
        ],
    );

    outcome.unwrap();
    let err = responses[1].error.as_ref().unwrap();
    assert_eq!(err.code, ErrorCode::InternalError.value());
    // The cause is logged, never echoed to the peer.
    assert!(!err.message.contains("secret internal detail"));
    // The connection survived the panic.
    assert!(!responses[2].is_error());
}

// ============================================================================
// Framing failures
// ============================================================================

#[test]
fn test_malformed_frame_closes_connection_without_crashing() {
    let codec = FrameCodec::new();
    let server = test_server(support::temp_corpus(""));

    let mut input = codec
        .encode(&JsonRpcMessage::Request(initialize(1)))
        .unwrap();
    input.extend_from_slice(b"Content-Length: oops\r\n\r\n");

    let (outcome, responses) = run_session_raw(&server, input);
    assert!(matches!(outcome.unwrap_err(), TransportError::Codec(_)));
    // The valid request before the bad frame was still answered.
    assert_eq!(responses.len(), 1);
    assert!(!responses[0].is_error());
}

#[test]
fn test_invalid_json_payload_closes_connection() {
    let codec = FrameCodec::new();
    let server = test_server(support::temp_corpus(""));

    let mut input = codec
        .encode(&JsonRpcMessage::Request(initialize(1)))
        .unwrap();
    let garbage = b"{this is not json}";
    input.extend_from_slice(format!("Content-Length: {}\r\n\r\n", garbage.len()).as_bytes());
    input.extend_from_slice(garbage);

    let (outcome, responses) = run_session_raw(&server, input);
    assert!(matches!(outcome.unwrap_err(), TransportError::Codec(_)));
    assert_eq!(responses.len(), 1);
}

#[test]
fn test_unsolicited_response_is_discarded() {
    let codec = FrameCodec::new();
    let server = test_server(support::temp_corpus(""));

    let mut input = Vec::new();
    input.extend_from_slice(
        &codec
            .encode(&JsonRpcMessage::Response(JsonRpcResponse::success(
                RequestId::Number(99),
                json!({}),
            )))
            .unwrap(),
    );
    input.extend_from_slice(&codec.encode(&JsonRpcMessage::Request(initialize(1))).unwrap());

    let (outcome, responses) = run_session_raw(&server, input);
    outcome.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].id, RequestId::Number(1));
}
