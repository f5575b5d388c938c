//! Match sessions for the Halma server.
//!
//! A session pairs two connections with one [`Match`], the pure rule
//! engine, and drives it from a dedicated actor task until the match
//! ends. Both connections are closed when it does.
//!
//! # Key types
//!
//! - [`Match`]: turn order, chain jumps, victory and statistics
//! - [`spawn_session`]: starts the actor for a pairing
//! - [`SessionHandle`]: query or shut down a running session
//! - [`SessionState`]: lifecycle state machine
//! - [`SessionConfig`]: channel sizing

mod actor;
mod config;
mod error;
mod game;

pub use actor::{
    spawn_match, spawn_session, SessionHandle, SessionId, SessionInfo,
};
pub use config::{SessionConfig, SessionState};
pub use error::SessionError;
pub use game::{Match, Outbox, Outcome, WinReason};
