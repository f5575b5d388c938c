//! Matchmaking for the Halma server.
//!
//! [`MatchQueue`] holds connections that are waiting for an opponent and
//! hands them out two at a time as a [`Pairing`]. It is owned by whoever
//! accepts connections and shared by reference (or `Arc`) between
//! acceptor tasks.

mod queue;

pub use queue::{MatchQueue, Pairing};
