//! Value types shared by the board and the wire protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One of the two seats in a match.
///
/// Serializes as the numeric id (`1` or `2`) the clients see.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// Both seats, in turn order.
    pub const ALL: [Player; 2] = [Player::One, Player::Two];

    /// Returns the numeric id sent on the wire.
    pub fn id(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Returns the other seat.
    pub fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.id())
    }
}

/// Returned when a number is not a valid player id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPlayer(pub u8);

impl fmt::Display for InvalidPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid player id {}", self.0)
    }
}

impl std::error::Error for InvalidPlayer {}

impl TryFrom<u8> for Player {
    type Error = InvalidPlayer;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(InvalidPlayer(other)),
        }
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> u8 {
        player.id()
    }
}

// ---------------------------------------------------------------------------
// Coord
// ---------------------------------------------------------------------------

/// A board cell address.
///
/// Signed so that anything a client sends (including negatives) can be
/// represented and then rejected by the bounds check instead of failing
/// to parse.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Returns the coordinate shifted by `(d_row, d_col)`.
    pub const fn offset(self, d_row: i32, d_col: i32) -> Self {
        Self::new(self.row + d_row, self.col + d_col)
    }

    /// Chebyshev (king-move) distance between two cells.
    pub fn distance(self, other: Coord) -> i32 {
        (self.row - other.row)
            .abs()
            .max((self.col - other.col).abs())
    }

    /// Arithmetic midpoint of two cells. Only meaningful for jumps,
    /// where both deltas are even.
    pub fn midpoint(self, other: Coord) -> Coord {
        Coord::new(
            self.row + (other.row - self.row) / 2,
            self.col + (other.col - self.col) / 2,
        )
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// A piece on the board, tagged with its owner.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Piece {
    pub owner: Player,
}

impl Piece {
    pub const fn new(owner: Player) -> Self {
        Self { owner }
    }
}
