//! Frame codec: `Content-Length` header framing.
//!
//! Header framing is used instead of newline-delimited JSON because JSON
//! payloads may legally contain embedded newlines; an explicit byte count
//! keeps message boundaries unambiguous regardless of payload content.

use std::io::BufRead;

use minimcp_protocol::{JsonRpcMessage, MessageError};

/// Default maximum frame payload size (10MB).
const DEFAULT_MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Codec for encoding/decoding length-prefixed JSON-RPC frames.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    /// Maximum allowed payload size in bytes.
    max_frame_size: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    /// Creates a codec with the default size limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Creates a codec with a custom payload size limit.
    #[must_use]
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Returns the maximum allowed payload size in bytes.
    #[must_use]
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Encodes a message into a complete frame.
    ///
    /// The length header is always computed from the serialized payload, so
    /// a length/content mismatch cannot be produced.
    pub fn encode(&self, message: &JsonRpcMessage) -> Result<Vec<u8>, CodecError> {
        let payload = serde_json::to_vec(message).map_err(MessageError::from)?;
        if payload.len() > self.max_frame_size {
            return Err(CodecError::FrameTooLarge(payload.len()));
        }
        let mut frame = format!("Content-Length: {}\r\n\r\n", payload.len()).into_bytes();
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Reads one frame from the stream.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly at a frame boundary.
    /// End-of-stream inside the headers or payload is a framing error, as is
    /// a missing, non-numeric, or negative `Content-Length`. Header lines
    /// other than `Content-Length` are ignored.
    pub fn read_frame<R: BufRead>(
        &self,
        reader: &mut R,
    ) -> Result<Option<JsonRpcMessage>, CodecError> {
        let mut declared: Option<usize> = None;
        let mut line = String::new();
        let mut at_boundary = true;

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).map_err(CodecError::Io)?;
            if bytes_read == 0 {
                if at_boundary {
                    return Ok(None);
                }
                return Err(CodecError::UnexpectedEof);
            }
            at_boundary = false;

            let header = line.trim_end_matches('\n').trim_end_matches('\r');
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.trim().eq_ignore_ascii_case("content-length") {
                    let value = value.trim();
                    let length = value
                        .parse::<usize>()
                        .map_err(|_| CodecError::InvalidContentLength(value.to_owned()))?;
                    declared = Some(length);
                }
                // Other headers are tolerated for future extensibility.
            }
        }

        let length = declared.ok_or(CodecError::MissingContentLength)?;
        if length > self.max_frame_size {
            return Err(CodecError::FrameTooLarge(length));
        }

        let mut payload = vec![0u8; length];
        reader.read_exact(&mut payload).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                CodecError::UnexpectedEof
            } else {
                CodecError::Io(e)
            }
        })?;

        let message = JsonRpcMessage::from_slice(&payload)?;
        Ok(Some(message))
    }
}

/// Codec error types.
#[derive(Debug)]
pub enum CodecError {
    /// I/O failure while reading a frame.
    Io(std::io::Error),
    /// The payload was not a valid JSON-RPC message.
    Message(MessageError),
    /// No `Content-Length` header preceded the blank line.
    MissingContentLength,
    /// The `Content-Length` value was not a non-negative integer.
    InvalidContentLength(String),
    /// The declared or serialized payload exceeds the size limit.
    FrameTooLarge(usize),
    /// The stream ended inside a frame.
    UnexpectedEof,
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Io(e) => write!(f, "I/O error: {e}"),
            CodecError::Message(e) => write!(f, "invalid message: {e}"),
            CodecError::MissingContentLength => write!(f, "missing Content-Length header"),
            CodecError::InvalidContentLength(value) => {
                write!(f, "invalid Content-Length: {value:?}")
            }
            CodecError::FrameTooLarge(size) => write!(f, "frame too large: {size} bytes"),
            CodecError::UnexpectedEof => write!(f, "stream ended inside a frame"),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Io(e) => Some(e),
            CodecError::Message(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MessageError> for CodecError {
    fn from(err: MessageError) -> Self {
        CodecError::Message(err)
    }
}
