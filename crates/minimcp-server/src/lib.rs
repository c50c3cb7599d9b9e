//! Server implementation for minimcp.
//!
//! This crate provides the server side of the protocol:
//! - [`ServerBuilder`] for assembling a server and its tool registry
//! - [`Registry`]: the immutable table of invocable tools
//! - [`Dispatcher`]: per-connection state machine and request routing
//! - [`serve_connection`]: the decode/dispatch/respond loop
//! - [`Corpus`] and the built-in `read_file` / `search_file` tools
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use minimcp_server::{Corpus, ReadFileTool, SearchFileTool, Server};
//!
//! let corpus = Arc::new(Corpus::new("context.txt"));
//! let server = Server::builder("minimcp-server", "0.1.0")
//!     .tool(ReadFileTool::new(Arc::clone(&corpus)))
//!     .tool(SearchFileTool::new(corpus))
//!     .build();
//! server.run_tcp("127.0.0.1:8765")?;
//! ```

#![forbid(unsafe_code)]

mod builder;
mod connection;
mod corpus;
mod dispatch;
mod handler;
mod registry;
mod tools;

#[cfg(test)]
mod tests;

pub use builder::ServerBuilder;
pub use connection::serve_connection;
pub use corpus::{Corpus, CorpusError};
pub use dispatch::{Dispatcher, SessionPhase};
pub use handler::{BoxedToolHandler, ToolHandler, optional_str, required_str};
pub use registry::Registry;
pub use tools::{ReadFileTool, SearchFileTool};

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use log::{debug, info, warn};
use minimcp_core::logging::targets;
use minimcp_protocol::{ServerCapabilities, ServerInfo};
use minimcp_transport::{AddrError, TcpTransport, Transport, parse_host_port};

/// A configured server: identity, capabilities, and the frozen registry.
pub struct Server {
    pub(crate) info: ServerInfo,
    pub(crate) capabilities: ServerCapabilities,
    pub(crate) registry: Arc<Registry>,
}

impl Server {
    /// Starts building a server with the given identity.
    #[must_use]
    pub fn builder(name: impl Into<String>, version: impl Into<String>) -> ServerBuilder {
        ServerBuilder::new(name, version)
    }

    /// Returns the server identity.
    #[must_use]
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Returns the shared tool registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Creates a fresh dispatcher for one connection.
    ///
    /// Every connection gets independent session state over the same
    /// shared registry.
    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.info.clone(),
            self.capabilities.clone(),
            Arc::clone(&self.registry),
        )
    }

    /// Serves a single already-connected transport to completion.
    pub fn serve_connection<T: Transport>(
        &self,
        transport: &mut T,
    ) -> Result<(), minimcp_transport::TransportError> {
        let mut dispatcher = self.dispatcher();
        serve_connection(transport, &mut dispatcher)
    }

    /// Binds the given `HOST:PORT` and serves connections until the process
    /// exits, one thread per connection.
    ///
    /// A failed or misbehaving connection is logged and dropped; it never
    /// stops the accept loop.
    pub fn run_tcp(&self, addr: &str) -> Result<(), ServerError> {
        let (host, port) = parse_host_port(addr)?;
        let listener = TcpListener::bind((host.as_str(), port))?;
        info!(target: targets::SERVER, "listening on {}", listener.local_addr()?);

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    warn!(target: targets::SERVER, "accept failed: {err}");
                    continue;
                }
            };
            let mut transport = match TcpTransport::from_stream(stream) {
                Ok(transport) => transport,
                Err(err) => {
                    warn!(target: targets::SERVER, "connection setup failed: {err}");
                    continue;
                }
            };
            let peer = transport.peer_addr();
            info!(target: targets::SERVER, "accepted connection from {peer}");

            let mut dispatcher = self.dispatcher();
            thread::spawn(move || {
                match serve_connection(&mut transport, &mut dispatcher) {
                    Ok(()) => debug!(target: targets::SERVER, "connection from {peer} closed"),
                    Err(err) => {
                        warn!(target: targets::SERVER, "connection from {peer} failed: {err}");
                    }
                }
                let _ = transport.close();
            });
        }
        Ok(())
    }
}

/// Server startup error.
#[derive(Debug)]
pub enum ServerError {
    /// The bind address did not parse.
    Addr(AddrError),
    /// Binding or accepting failed.
    Io(std::io::Error),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Addr(e) => write!(f, "invalid bind address: {e}"),
            ServerError::Io(e) => write!(f, "server I/O error: {e}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Addr(e) => Some(e),
            ServerError::Io(e) => Some(e),
        }
    }
}

impl From<AddrError> for ServerError {
    fn from(err: AddrError) -> Self {
        ServerError::Addr(err)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Io(err)
    }
}
