//! Client implementation for minimcp.
//!
//! The client is strictly synchronous: [`Client::call`] writes one request
//! frame and blocks until the response with the matching id is read. The
//! pending-call table generalizes to multiple outstanding ids (see
//! [`Client::send`] / [`Client::wait`]), even though the convenience
//! wrappers only ever keep one in flight.

#![forbid(unsafe_code)]

mod client;
mod session;

pub use client::{Client, ClientConfig, ClientError};
pub use session::ClientSession;
