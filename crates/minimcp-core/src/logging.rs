//! Logging conventions for minimcp.
//!
//! All crates log through the standard [`log`] facade. Library crates never
//! install a backend; the CLI initializes `env_logger` writing to stderr so
//! stdout stays clean for tool output.
//!
//! # Log Levels
//!
//! - **error**: unrecoverable failures (bind errors, broken transports)
//! - **warn**: recoverable issues (discarded frames, per-connection failures)
//! - **info**: lifecycle events (listen address, accepted connections)
//! - **debug**: request/response flow, dispatch decisions
//! - **trace**: wire-level frame details
//!
//! # Log Targets
//!
//! Hierarchical targets allow filtering, e.g.
//! `RUST_LOG=minimcp::server=debug,minimcp::transport=trace`.

// Re-export log macros for ergonomic use.
pub use log::{debug, error, info, trace, warn};

/// Log targets used by minimcp components.
pub mod targets {
    /// Transport and framing layer.
    pub const TRANSPORT: &str = "minimcp::transport";
    /// Server lifecycle and connection handling.
    pub const SERVER: &str = "minimcp::server";
    /// Request dispatch and tool invocation.
    pub const DISPATCH: &str = "minimcp::dispatch";
    /// Client-side correlation.
    pub const CLIENT: &str = "minimcp::client";
}
