//! Client session state.

use minimcp_protocol::{ServerCapabilities, ServerInfo};

/// Session metadata captured from a successful `initialize` exchange.
#[derive(Debug, Clone)]
pub struct ClientSession {
    server_info: ServerInfo,
    server_capabilities: ServerCapabilities,
    protocol_version: String,
}

impl ClientSession {
    /// Creates a session from the initialize result.
    #[must_use]
    pub fn new(
        server_info: ServerInfo,
        server_capabilities: ServerCapabilities,
        protocol_version: String,
    ) -> Self {
        Self {
            server_info,
            server_capabilities,
            protocol_version,
        }
    }

    /// Returns the server info.
    #[must_use]
    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Returns the server capabilities.
    #[must_use]
    pub fn server_capabilities(&self) -> &ServerCapabilities {
        &self.server_capabilities
    }

    /// Returns the protocol version the server answered with.
    #[must_use]
    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }
}
