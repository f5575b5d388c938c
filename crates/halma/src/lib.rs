//! # Halma
//!
//! A server for two-player Halma matches.
//!
//! Clients connect over WebSocket or line-based TCP, wait in a queue until
//! an opponent arrives, and then play one authoritative match: the server
//! validates every move, enforces turns and chain jumps, relays chat, and
//! reports the result and statistics before closing both connections.
//!
//! ```text
//! transport → lobby (MatchQueue) → session (Match + actor)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use halma::prelude::*;
//!
//! # async fn start() -> Result<(), HalmaError> {
//! let server = HalmaServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(TextCodec)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::HalmaError;
pub use handler::WAITING_TEXT;
pub use server::{HalmaServer, HalmaServerBuilder, TransportKind};

/// Convenient re-exports for embedding the server.
pub mod prelude {
    pub use crate::{HalmaError, HalmaServer, HalmaServerBuilder, TransportKind};
    pub use halma_board::{Board, Coord, MoveKind, Piece, Player};
    pub use halma_lobby::{MatchQueue, Pairing};
    #[cfg(feature = "json")]
    pub use halma_protocol::JsonCodec;
    pub use halma_protocol::{
        ClientMessage, Codec, GameSummary, PlayerStats, ProtocolError,
        Recipient, ServerMessage, TextCodec,
    };
    pub use halma_session::{
        spawn_session, Match, Outcome, SessionConfig, SessionHandle,
        SessionId, SessionState, WinReason,
    };
}
