//! Server builder.

use std::sync::Arc;

use minimcp_protocol::{ServerCapabilities, ServerInfo};

use crate::handler::ToolHandler;
use crate::registry::Registry;
use crate::Server;

/// Builder assembling a [`Server`] and its tool registry.
///
/// The registry is frozen behind an `Arc` at `build` time; nothing can be
/// registered afterward.
pub struct ServerBuilder {
    info: ServerInfo,
    registry: Registry,
}

impl ServerBuilder {
    /// Creates a builder for a server with the given identity.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            registry: Registry::new(),
        }
    }

    /// Registers a tool handler.
    #[must_use]
    pub fn tool<H: ToolHandler + 'static>(mut self, handler: H) -> Self {
        self.registry.add(handler);
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            info: self.info,
            capabilities: ServerCapabilities::default(),
            registry: Arc::new(self.registry),
        }
    }
}
