//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means a message could not be turned into (or
//! out of) bytes. Game-rule violations are not protocol errors; the session
//! answers those with `ServerMessage::Error`.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// JSON serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// JSON deserialization failed: malformed JSON, missing fields, or an
    /// unknown `type` tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The first token of a text line is not a known command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The command is known but its fields are missing or unparseable.
    #[error("malformed {command} command: {reason}")]
    Malformed {
        command: &'static str,
        reason: String,
    },

    /// The bytes are not a valid message at all (e.g. not UTF-8).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
