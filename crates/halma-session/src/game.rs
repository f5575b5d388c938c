//! The match rules as a pure state machine.
//!
//! [`Match`] never touches a connection. Each operation mutates the match
//! and returns the messages to deliver, in order, tagged with a
//! [`Recipient`]. The session actor is the only caller in production; tests
//! drive it directly.

use std::fmt;

use halma_board::{Board, Coord, Player};
use halma_protocol::{
    ClientMessage, GameSummary, PlayerStats, ProtocolError, Recipient,
    ServerMessage,
};

use crate::SessionState;

/// Messages produced by one match operation, in delivery order.
pub type Outbox = Vec<(Recipient, ServerMessage)>;

pub(crate) const NOT_YOUR_TURN: &str = "It is not your turn.";
pub(crate) const CHAIN_MISMATCH: &str =
    "You must continue jumping with the same piece.";
pub(crate) const INVALID_MOVE: &str = "Invalid move.";
pub(crate) const FORFEIT_REASON: &str = "You forfeited the match.";

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why a player won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinReason {
    /// The winner filled the opponent's home region.
    ReachedGoal,
    /// The loser sent a forfeit.
    Forfeit,
    /// The loser's connection dropped.
    Disconnect,
}

/// The result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Won { winner: Player, reason: WinReason },
    /// Shut down by the server without a winner.
    Aborted,
}

impl Outcome {
    /// The winning player, if any.
    pub fn winner(self) -> Option<Player> {
        match self {
            Self::Won { winner, .. } => Some(winner),
            _ => None,
        }
    }

    /// Returns `true` once the match has a result.
    pub fn is_decided(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "The game is still in progress."),
            Self::Won {
                winner,
                reason: WinReason::ReachedGoal,
            } => write!(f, "{winner} won by reaching the goal!"),
            Self::Won {
                winner,
                reason: WinReason::Forfeit,
            } => write!(f, "{winner} won because the opponent forfeited."),
            Self::Won {
                winner,
                reason: WinReason::Disconnect,
            } => write!(f, "{winner} won because the opponent disconnected."),
            Self::Aborted => write!(f, "The game ended unexpectedly."),
        }
    }
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// Authoritative state of one two-player match.
#[derive(Debug, Clone)]
pub struct Match {
    board: Board,
    state: SessionState,
    current: Player,
    /// Landing cell of the last jump while a chain is on offer.
    chain: Option<Coord>,
    stats: [PlayerStats; 2],
    transcript: Vec<String>,
    outcome: Outcome,
}

impl Default for Match {
    fn default() -> Self {
        Self::new()
    }
}

impl Match {
    /// A match on the standard starting board.
    pub fn new() -> Self {
        Self::with_board(Board::new())
    }

    /// A match that starts from an arbitrary position. Player 1 moves
    /// first.
    pub fn with_board(board: Board) -> Self {
        Self {
            board,
            state: SessionState::WaitingStart,
            current: Player::One,
            chain: None,
            stats: [PlayerStats::default(); 2],
            transcript: Vec::new(),
            outcome: Outcome::InProgress,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_player(&self) -> Player {
        self.current
    }

    /// The cell the current player must keep jumping from, if a chain is
    /// on offer.
    pub fn chain_cell(&self) -> Option<Coord> {
        self.chain
    }

    pub fn stats(&self, player: Player) -> PlayerStats {
        self.stats[slot(player)]
    }

    /// Chat lines so far, oldest first.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_ended()
    }

    /// Seats both players and announces the first turn. Only the first
    /// call has any effect.
    pub fn start(&mut self) -> Outbox {
        if !self.state.can_transition_to(SessionState::InProgress) {
            return Vec::new();
        }
        self.advance_to(SessionState::InProgress);
        self.current = Player::One;

        let mut out: Outbox = Player::ALL
            .into_iter()
            .map(|player| {
                (Recipient::Player(player), ServerMessage::Welcome { player })
            })
            .collect();
        out.push((Recipient::All, ServerMessage::OpponentFound));
        out.push((Recipient::All, ServerMessage::GameStart));
        out.extend(self.announce_turn());
        out
    }

    /// Processes one decoded request from `sender`.
    pub fn handle_message(
        &mut self,
        sender: Player,
        message: ClientMessage,
    ) -> Outbox {
        if !self.state.is_active() {
            tracing::debug!(%sender, state = %self.state, "request ignored");
            return Vec::new();
        }
        match message {
            ClientMessage::Move { from, to } => {
                self.handle_move(sender, from, to)
            }
            ClientMessage::EndChainJump => self.handle_end_chain(sender),
            ClientMessage::Chat { text } => self.handle_chat(sender, &text),
            ClientMessage::Forfeit => self.finish(Outcome::Won {
                winner: sender.opponent(),
                reason: WinReason::Forfeit,
            }),
        }
    }

    /// Answers a request that could not be decoded. Counters are left
    /// alone.
    pub fn handle_malformed(
        &mut self,
        sender: Player,
        error: &ProtocolError,
    ) -> Outbox {
        if self.state.is_ended() {
            return Vec::new();
        }
        tracing::debug!(%sender, %error, "malformed request");
        vec![(
            Recipient::Player(sender),
            ServerMessage::Error {
                reason: error.to_string(),
            },
        )]
    }

    /// The connection of `player` dropped. The opponent wins unless the
    /// match already ended.
    pub fn disconnect(&mut self, player: Player) -> Outbox {
        self.finish(Outcome::Won {
            winner: player.opponent(),
            reason: WinReason::Disconnect,
        })
    }

    /// Ends the match without a winner.
    pub fn abort(&mut self) -> Outbox {
        self.finish(Outcome::Aborted)
    }

    fn handle_move(&mut self, sender: Player, from: Coord, to: Coord) -> Outbox {
        if sender != self.current {
            self.stats[slot(sender)].invalid_attempts += 1;
            tracing::debug!(%sender, %from, %to, "move out of turn");
            return error_to(sender, NOT_YOUR_TURN);
        }
        if let Some(cell) = self.chain {
            if from != cell {
                tracing::debug!(%sender, %from, chain = %cell, "chain piece mismatch");
                return error_to(sender, CHAIN_MISMATCH);
            }
        }
        let jump_only = self.chain.is_some();
        if !self.board.is_legal_move(from, to, sender, jump_only) {
            self.stats[slot(sender)].invalid_attempts += 1;
            tracing::debug!(%sender, %from, %to, jump_only, "illegal move");
            return error_to(sender, INVALID_MOVE);
        }

        self.board.apply_move(from, to);
        self.stats[slot(sender)].moves += 1;

        let mut out = vec![
            (
                Recipient::Player(sender),
                ServerMessage::MoveAccepted { from, to },
            ),
            (
                Recipient::Player(sender.opponent()),
                ServerMessage::OpponentMoved { from, to },
            ),
        ];

        let jumped = from.distance(to) > 1;
        if jumped && self.board.can_jump_from(to) {
            self.chain = Some(to);
            out.push((
                Recipient::Player(sender),
                ServerMessage::JumpOffer { at: to },
            ));
            return out;
        }

        self.chain = None;
        out.extend(self.complete_turn());
        out
    }

    fn handle_end_chain(&mut self, sender: Player) -> Outbox {
        if self.chain.is_none() || sender != self.current {
            tracing::debug!(%sender, "end of chain jump ignored");
            return Vec::new();
        }
        self.chain = None;
        self.complete_turn()
    }

    fn handle_chat(&mut self, sender: Player, text: &str) -> Outbox {
        let line = format!("{sender}: {text}");
        self.transcript.push(line.clone());
        vec![(Recipient::All, ServerMessage::Chat { line })]
    }

    /// Either the mover has won, or the turn passes.
    fn complete_turn(&mut self) -> Outbox {
        if self.board.has_player_reached_goal(self.current) {
            return self.finish(Outcome::Won {
                winner: self.current,
                reason: WinReason::ReachedGoal,
            });
        }
        self.current = self.current.opponent();
        self.announce_turn()
    }

    fn announce_turn(&self) -> Outbox {
        Player::ALL
            .into_iter()
            .map(|player| {
                (
                    Recipient::Player(player),
                    ServerMessage::SetTurn {
                        your_turn: player == self.current,
                    },
                )
            })
            .collect()
    }

    /// Steps through [`SessionState::next`] until `target`. A match that
    /// ends before it started passes through `InProgress`.
    fn advance_to(&mut self, target: SessionState) {
        while self.state != target {
            let Some(next) = self.state.next() else {
                return;
            };
            tracing::trace!(from = %self.state, to = %next, "state transition");
            self.state = next;
        }
    }

    /// Moves to `Ended`. Only the first terminal trigger is honoured.
    fn finish(&mut self, outcome: Outcome) -> Outbox {
        if self.state.is_ended() {
            return Vec::new();
        }
        self.advance_to(SessionState::Ended);
        self.chain = None;
        self.outcome = outcome;

        let mut out = vec![(
            Recipient::All,
            ServerMessage::GameOverStats(self.summary()),
        )];
        if let Outcome::Won { winner, reason } = outcome {
            let loser = winner.opponent();
            match reason {
                WinReason::ReachedGoal => {
                    out.push((Recipient::Player(winner), ServerMessage::Victory));
                    out.push((
                        Recipient::Player(loser),
                        ServerMessage::Defeat { reason: None },
                    ));
                }
                WinReason::Forfeit => {
                    out.push((
                        Recipient::Player(winner),
                        ServerMessage::OpponentForfeited,
                    ));
                    out.push((
                        Recipient::Player(loser),
                        ServerMessage::Defeat {
                            reason: Some(FORFEIT_REASON.to_string()),
                        },
                    ));
                }
                WinReason::Disconnect => {
                    out.push((
                        Recipient::Player(winner),
                        ServerMessage::OpponentForfeited,
                    ));
                }
            }
        }
        out
    }

    fn summary(&self) -> GameSummary {
        GameSummary {
            outcome: self.outcome.to_string(),
            player_one: self.stats(Player::One),
            player_two: self.stats(Player::Two),
            transcript: self.transcript.clone(),
        }
    }
}

fn slot(player: Player) -> usize {
    match player {
        Player::One => 0,
        Player::Two => 1,
    }
}

fn error_to(player: Player, reason: &str) -> Outbox {
    vec![(
        Recipient::Player(player),
        ServerMessage::Error {
            reason: reason.to_string(),
        },
    )]
}
