//! Message types exchanged between the server and Halma clients.
//!
//! Every inbound line decodes to a [`ClientMessage`]; every outbound line
//! is a [`ServerMessage`]. The session decides who receives each outbound
//! message with a [`Recipient`].

use halma_board::{Coord, Player};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive a server message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Both players in the match.
    All,
    /// A single seat.
    Player(Player),
}

impl Recipient {
    /// Returns `true` if `player` is addressed.
    pub fn includes(self, player: Player) -> bool {
        match self {
            Self::All => true,
            Self::Player(p) => p == player,
        }
    }
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Requests a client may send once it has been paired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Move the piece at `from` to `to`.
    Move { from: Coord, to: Coord },

    /// Stop an offered chain of jumps and pass the turn.
    EndChainJump,

    /// Say something to the opponent.
    Chat { text: String },

    /// Concede the match.
    Forfeit,
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Move counters for one player, reported when the game ends.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct PlayerStats {
    /// Moves that were accepted (each hop of a chain counts).
    pub moves: u32,
    /// Out-of-turn or illegal move attempts.
    pub invalid_attempts: u32,
}

/// End-of-game report sent to both players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Human-readable result, e.g. "Player 1 won by reaching the goal!".
    pub outcome: String,
    pub player_one: PlayerStats,
    pub player_two: PlayerStats,
    /// Every chat line of the match, oldest first.
    pub transcript: Vec<String>,
}

/// Notifications the server sends to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Free-form status, e.g. while waiting in the queue.
    Info { text: String },

    /// You have been seated as `player`.
    Welcome { player: Player },

    /// A second player was found.
    OpponentFound,

    /// The board is set up; turn notifications follow.
    GameStart,

    /// Whose turn it is, from the receiver's point of view.
    SetTurn { your_turn: bool },

    /// Your move was applied.
    MoveAccepted { from: Coord, to: Coord },

    /// Your opponent's move was applied.
    OpponentMoved { from: Coord, to: Coord },

    /// The piece that just jumped to `at` may jump again. Send another
    /// jump from `at`, or `EndChainJump`.
    JumpOffer { at: Coord },

    /// A chat line, already prefixed with the speaker ("Player 1: hi").
    Chat { line: String },

    /// Your request was rejected.
    Error { reason: String },

    /// You won.
    Victory,

    /// You lost. `reason` is set when the loss was self-inflicted.
    Defeat { reason: Option<String> },

    /// Your opponent gave up or dropped out; you win.
    OpponentForfeited,

    /// Final statistics and chat transcript.
    GameOverStats(GameSummary),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_includes() {
        assert!(Recipient::All.includes(Player::One));
        assert!(Recipient::All.includes(Player::Two));
        assert!(Recipient::Player(Player::Two).includes(Player::Two));
        assert!(!Recipient::Player(Player::Two).includes(Player::One));
    }

    #[test]
    fn test_client_move_json_format() {
        let msg = ClientMessage::Move {
            from: Coord::new(0, 2),
            to: Coord::new(1, 3),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "Move");
        assert_eq!(json["from"]["row"], 0);
        assert_eq!(json["to"]["col"], 3);
    }

    #[test]
    fn test_server_welcome_json_uses_numeric_player() {
        let msg = ServerMessage::Welcome {
            player: Player::Two,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "Welcome");
        assert_eq!(json["player"], 2);
    }

    #[test]
    fn test_game_over_stats_json_flattens_summary() {
        let msg = ServerMessage::GameOverStats(GameSummary {
            outcome: "Player 1 won by reaching the goal!".into(),
            player_one: PlayerStats {
                moves: 30,
                invalid_attempts: 2,
            },
            player_two: PlayerStats::default(),
            transcript: vec!["Player 2: gg".into()],
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "GameOverStats");
        assert_eq!(json["player_one"]["moves"], 30);
        assert_eq!(json["transcript"][0], "Player 2: gg");
    }

    #[test]
    fn test_decode_unknown_client_type_returns_error() {
        let unknown = r#"{"type": "Teleport", "to": {"row": 1, "col": 1}}"#;
        let result: Result<ClientMessage, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }
}
