//! Transport layer for minimcp.
//!
//! Messages travel over a byte stream as length-prefixed frames:
//!
//! ```text
//! Content-Length: <decimal byte count>\r\n
//! \r\n
//! <JSON body, exactly Content-Length bytes>
//! ```
//!
//! Both `\r\n` and bare `\n` line endings are accepted on the read side;
//! header lines other than `Content-Length` are tolerated and ignored.
//!
//! Two transports are provided:
//!
//! - [`StreamTransport`]: generic over any `Read`/`Write` pair (used by the
//!   server connection loop and by tests over in-memory buffers)
//! - [`TcpTransport`]: TCP sockets, with read-timeout support

#![forbid(unsafe_code)]

mod addr;
mod codec;
mod stream;
mod tcp;

pub use addr::{AddrError, parse_host_port};
pub use codec::{CodecError, FrameCodec};
pub use stream::StreamTransport;
pub use tcp::TcpTransport;

use minimcp_protocol::JsonRpcMessage;

/// A bidirectional message transport.
pub trait Transport {
    /// Encodes and sends one message.
    fn send(&mut self, message: &JsonRpcMessage) -> Result<(), TransportError>;

    /// Blocks until one message is received.
    ///
    /// Returns [`TransportError::Closed`] on clean end-of-stream and
    /// [`TransportError::TimedOut`] when a configured read timeout elapses.
    fn recv(&mut self) -> Result<JsonRpcMessage, TransportError>;

    /// Flushes and closes the transport.
    fn close(&mut self) -> Result<(), TransportError>;
}

/// Transport error types.
#[derive(Debug)]
pub enum TransportError {
    /// The peer closed the stream at a frame boundary.
    Closed,
    /// A configured read timeout elapsed before a frame arrived.
    TimedOut,
    /// I/O failure.
    Io(std::io::Error),
    /// Framing or payload decoding failure.
    Codec(CodecError),
}

impl TransportError {
    /// Classifies an I/O error into the transport taxonomy.
    ///
    /// Read timeouts surface as `WouldBlock` on Unix and `TimedOut` on
    /// Windows; a peer disappearing surfaces as one of the connection
    /// error kinds.
    #[must_use]
    pub fn from_io(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => TransportError::TimedOut,
            ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::UnexpectedEof => TransportError::Closed,
            _ => TransportError::Io(err),
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Closed => write!(f, "transport closed"),
            TransportError::TimedOut => write!(f, "read timed out"),
            TransportError::Io(e) => write!(f, "I/O error: {e}"),
            TransportError::Codec(e) => write!(f, "codec error: {e}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            TransportError::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for TransportError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => TransportError::from_io(e),
            other => TransportError::Codec(other),
        }
    }
}
