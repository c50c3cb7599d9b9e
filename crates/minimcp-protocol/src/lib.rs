//! Protocol types for minimcp.
//!
//! This crate provides:
//! - JSON-RPC 2.0 message types with shape validation
//! - Method payload types (initialize, tools/list, tools/call)
//! - A small JSON Schema validator for tool arguments
//!
//! # Wire Format
//!
//! Messages travel as length-prefixed JSON frames:
//!
//! ```text
//! Content-Length: <decimal byte count>\r\n
//! \r\n
//! <JSON body, exactly Content-Length bytes>
//! ```
//!
//! Header framing (rather than newline-delimited JSON) keeps message
//! boundaries unambiguous even when payloads contain embedded newlines.
//! Framing itself lives in `minimcp-transport`; this crate only defines
//! what a decoded payload must look like.

#![forbid(unsafe_code)]

mod jsonrpc;
mod messages;
pub mod schema;

pub use jsonrpc::{
    JSONRPC_VERSION, JsonRpcError, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, MessageError,
    RequestId,
};
pub use messages::{
    CallToolParams, CallToolResult, ClientInfo, Content, InitializeParams, InitializeResult,
    ListToolsResult, PROTOCOL_VERSION, ServerCapabilities, ServerInfo, Tool, ToolsCapability,
};
pub use schema::{ValidationError, validate};
