//! Halma board state and move rules.
//!
//! This crate is the pure rules engine: piece positions, move legality,
//! jump detection, and the win condition. It performs no I/O and holds no
//! locks; a [`Board`] is owned by exactly one match at a time.
//!
//! ```text
//! Board (this crate) → Session (turns, chain jumps) → Server (connections)
//! ```

mod board;
mod types;

pub use board::{Board, MoveKind};
pub use types::{Coord, InvalidPlayer, Piece, Player};
