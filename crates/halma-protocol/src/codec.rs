//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec converts between [`WireMessage`]s and the bytes a transport
//! connection carries. The session is generic over the codec, so the same
//! match logic serves line-based TCP clients ([`TextCodec`]) and browser clients ([`JsonCodec`]).

use crate::{ProtocolError, WireMessage};

/// A codec that can encode messages to bytes and decode bytes back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a message into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: WireMessage>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a message.
    ///
    /// # Errors
    /// Returns a `ProtocolError` if the bytes are malformed, incomplete,
    /// or name an unknown command.
    fn decode<T: WireMessage>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// TextCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] for the delimiter-separated text lines classic clients
/// speak. See the `line` module docs for the format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn encode<T: WireMessage>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        Ok(value.to_line().into_bytes())
    }

    fn decode<T: WireMessage>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        let line = std::str::from_utf8(data).map_err(|e| {
            ProtocolError::InvalidMessage(format!("not UTF-8: {e}"))
        })?;
        T::from_line(line.trim_end_matches(['\r', '\n']))
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`), one object per message.
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ```rust
/// use halma_protocol::{Codec, JsonCodec, ClientMessage};
///
/// let msg: ClientMessage = JsonCodec
///     .decode(br#"{"type":"Chat","text":"good luck"}"#)
///     .unwrap();
/// assert_eq!(msg, ClientMessage::Chat { text: "good luck".into() });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: WireMessage>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: WireMessage>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
