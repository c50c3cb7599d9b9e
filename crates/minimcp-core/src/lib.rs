//! Core types shared by every minimcp crate.
//!
//! This crate provides the fundamental building blocks:
//! - [`RpcError`] and the reserved [`ErrorCode`] table
//! - Logging conventions built on the standard [`log`] facade
//!
//! # Design Principles
//!
//! - Errors are values: handlers and dispatch return [`RpcResult`] and the
//!   server boundary converts failures into JSON-RPC error responses
//! - No runtime reflection
//! - All types support `Send + Sync`

#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::{ErrorCode, RpcError, RpcResult};
