//! TCP transport.

use std::io::{self, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::trace;
use minimcp_core::logging::targets;
use minimcp_protocol::JsonRpcMessage;

use crate::{FrameCodec, Transport, TransportError};

/// Transport over a TCP socket.
///
/// The socket is cloned so reads can be buffered independently of writes.
/// A read timeout, when set, makes [`Transport::recv`] fail with
/// [`TransportError::TimedOut`] instead of blocking forever.
pub struct TcpTransport {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    codec: FrameCodec,
    peer: SocketAddr,
}

impl TcpTransport {
    /// Connects to the given address.
    pub fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Self::from_stream(stream)
    }

    /// Wraps an already-connected stream (e.g. from an accept loop).
    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        let peer = stream.peer_addr()?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            reader,
            writer: stream,
            codec: FrameCodec::new(),
            peer,
        })
    }

    /// Sets or clears the read timeout for `recv`.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.writer.set_read_timeout(timeout)
    }

    /// Returns the peer address.
    #[must_use]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, message: &JsonRpcMessage) -> Result<(), TransportError> {
        let frame = self.codec.encode(message)?;
        trace!(
            target: targets::TRANSPORT,
            "sending frame ({} bytes) to {}",
            frame.len(),
            self.peer
        );
        self.writer.write_all(&frame).map_err(TransportError::from_io)?;
        self.writer.flush().map_err(TransportError::from_io)?;
        Ok(())
    }

    fn recv(&mut self) -> Result<JsonRpcMessage, TransportError> {
        match self.codec.read_frame(&mut self.reader) {
            Ok(Some(message)) => Ok(message),
            Ok(None) => Err(TransportError::Closed),
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.writer.flush().map_err(TransportError::from_io)?;
        // NotConnected just means the peer hung up first.
        match self.writer.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(TransportError::from_io(e)),
        }
    }
}
