//! Unified error type for the Halma server.

use halma_protocol::ProtocolError;
use halma_session::SessionError;
use halma_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attributes let `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum HalmaError {
    /// Binding, accepting, or talking to a connection failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A running session could not be reached.
    #[error(transparent)]
    Session(#[from] SessionError),
}
