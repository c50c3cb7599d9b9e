//! Generic stream transport over any `Read`/`Write` pair.

use std::io::{BufReader, Read, Write};

use log::trace;
use minimcp_core::logging::targets;
use minimcp_protocol::JsonRpcMessage;

use crate::{FrameCodec, Transport, TransportError};

/// Transport over an arbitrary reader/writer pair.
///
/// Used by the server connection loop (over split TCP halves) and by tests
/// (over in-memory buffers).
pub struct StreamTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
    codec: FrameCodec,
}

impl<R: Read, W: Write> StreamTransport<R, W> {
    /// Creates a transport with the default codec.
    #[must_use]
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_codec(reader, writer, FrameCodec::new())
    }

    /// Creates a transport with a custom codec.
    #[must_use]
    pub fn with_codec(reader: R, writer: W, codec: FrameCodec) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            codec,
        }
    }

    /// Consumes the transport, returning the underlying reader and writer.
    pub fn into_parts(self) -> (R, W) {
        (self.reader.into_inner(), self.writer)
    }
}

impl<R: Read, W: Write> Transport for StreamTransport<R, W> {
    fn send(&mut self, message: &JsonRpcMessage) -> Result<(), TransportError> {
        let frame = self.codec.encode(message)?;
        trace!(target: targets::TRANSPORT, "sending frame ({} bytes)", frame.len());
        self.writer.write_all(&frame).map_err(TransportError::from_io)?;
        self.writer.flush().map_err(TransportError::from_io)?;
        Ok(())
    }

    fn recv(&mut self) -> Result<JsonRpcMessage, TransportError> {
        match self.codec.read_frame(&mut self.reader) {
            Ok(Some(message)) => {
                trace!(target: targets::TRANSPORT, "received message id={}", message.id());
                Ok(message)
            }
            Ok(None) => Err(TransportError::Closed),
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.writer.flush().map_err(TransportError::from_io)
    }
}
