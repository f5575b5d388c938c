//! Wire protocol for the Halma server.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Recipient`],
//!   [`GameSummary`]): the messages that travel on the wire.
//! - **Line format** ([`WireMessage`], [`tokens`]): the delimiter-separated
//!   text form of every message.
//! - **Codec** ([`Codec`] trait, [`TextCodec`], [`JsonCodec`]): how those
//!   messages are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! ```text
//! Transport (bytes) → Protocol (messages) → Session (match rules)
//! ```

mod codec;
mod error;
mod line;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use codec::TextCodec;
pub use error::ProtocolError;
pub use line::{tokens, WireMessage, SEPARATOR, TRANSCRIPT_SEPARATOR};
pub use types::{
    ClientMessage, GameSummary, PlayerStats, Recipient, ServerMessage,
};

// Re-exported so downstream crates name board types through one path.
pub use halma_board::{Coord, Player};
