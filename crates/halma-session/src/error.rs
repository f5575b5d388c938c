//! Error types for the session layer.

use crate::SessionId;

/// Errors returned by [`SessionHandle`](crate::SessionHandle) calls.
///
/// Rule violations by players are not errors at this level; they are
/// answered with `ServerMessage::Error` inside the match.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session actor has stopped or its command channel is closed.
    #[error("session {0} is unavailable")]
    Unavailable(SessionId),
}
