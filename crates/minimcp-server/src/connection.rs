//! The per-connection serve loop.

use log::{debug, warn};
use minimcp_core::logging::targets;
use minimcp_protocol::JsonRpcMessage;
use minimcp_transport::{Transport, TransportError};

use crate::dispatch::Dispatcher;

/// Serves one connection to completion.
///
/// Repeatedly decodes a request, dispatches it, and sends the response,
/// until the peer closes the stream, a framing or parse error occurs, or
/// the dispatcher enters shutdown. Framing and parse errors are fatal to
/// this connection only; they are returned so the accept loop can log them
/// without ever taking the process down.
pub fn serve_connection<T: Transport>(
    transport: &mut T,
    dispatcher: &mut Dispatcher,
) -> Result<(), TransportError> {
    loop {
        let message = match transport.recv() {
            Ok(message) => message,
            Err(TransportError::Closed) => {
                debug!(target: targets::SERVER, "peer closed the connection");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let request = match message {
            JsonRpcMessage::Request(request) => request,
            JsonRpcMessage::Response(response) => {
                warn!(
                    target: targets::SERVER,
                    "discarding unsolicited response (id={})", response.id
                );
                continue;
            }
        };

        let response = dispatcher.dispatch(&request);
        transport.send(&JsonRpcMessage::Response(response))?;

        if dispatcher.is_shutting_down() {
            debug!(target: targets::SERVER, "closing connection after shutdown");
            return Ok(());
        }
    }
}
