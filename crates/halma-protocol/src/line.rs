//! The text line format spoken by Halma clients.
//!
//! One message per line. Fields are separated by `:`; the last field of a
//! free-text message (chat, error, info, the stats transcript) takes the
//! rest of the line, so it may itself contain `:`.
//!
//! Transcript entries are joined with `|`. Inside an entry, `|` and `\`
//! are written as `\|` and `\\`.
//!
//! ```text
//! MOVE:0:2:1:3            client asks to move (0,2) → (1,3)
//! VALID_MOVE:0:2:1:3      server accepted it
//! CHAIN_JUMP_OFFER:0:0    the piece at (0,0) may jump again
//! GAME_OVER_STATS:<outcome>:<p1 moves>:<p1 invalid>:<p2 moves>:<p2 invalid>:<chat|chat|...>
//! ```

use halma_board::{Coord, Player};
use serde::{de::DeserializeOwned, Serialize};

use crate::{ClientMessage, GameSummary, PlayerStats, ProtocolError, ServerMessage};

/// Field separator.
pub const SEPARATOR: char = ':';

/// Separator between transcript entries inside `GAME_OVER_STATS`.
pub const TRANSCRIPT_SEPARATOR: char = '|';

/// Command tokens, first field of every line.
pub mod tokens {
    // client → server
    pub const MOVE: &str = "MOVE";
    pub const END_CHAIN_JUMP: &str = "END_CHAIN_JUMP";
    pub const CHAT: &str = "CHAT";
    pub const FORFEIT: &str = "FORFEIT";

    // server → client
    pub const INFO: &str = "INFO";
    pub const WELCOME: &str = "WELCOME";
    pub const OPPONENT_FOUND: &str = "OPPONENT_FOUND";
    pub const GAME_START: &str = "GAME_START";
    pub const SET_TURN: &str = "SET_TURN";
    pub const YOUR_TURN: &str = "YOUR_TURN";
    pub const OPPONENT_TURN: &str = "OPPONENT_TURN";
    pub const VALID_MOVE: &str = "VALID_MOVE";
    pub const OPPONENT_MOVED: &str = "OPPONENT_MOVED";
    pub const CHAIN_JUMP_OFFER: &str = "CHAIN_JUMP_OFFER";
    pub const CHAT_MESSAGE: &str = "CHAT_MESSAGE";
    pub const ERROR: &str = "ERROR";
    pub const VICTORY: &str = "VICTORY";
    pub const DEFEAT: &str = "DEFEAT";
    pub const OPPONENT_FORFEIT: &str = "OPPONENT_FORFEIT";
    pub const GAME_OVER_STATS: &str = "GAME_OVER_STATS";
}

/// A message that can travel on the wire in either codec.
pub trait WireMessage: Serialize + DeserializeOwned + Sized {
    /// Renders the message as a single text line (no trailing newline).
    fn to_line(&self) -> String;

    /// Parses a single text line.
    fn from_line(line: &str) -> Result<Self, ProtocolError>;
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn malformed(command: &'static str, reason: impl Into<String>) -> ProtocolError {
    ProtocolError::Malformed {
        command,
        reason: reason.into(),
    }
}

/// Splits `"CMD:rest"` into `("CMD", Some("rest"))`.
fn split_command(line: &str) -> (&str, Option<&str>) {
    match line.split_once(SEPARATOR) {
        Some((command, rest)) => (command, Some(rest)),
        None => (line, None),
    }
}

fn require<'a>(
    command: &'static str,
    payload: Option<&'a str>,
) -> Result<&'a str, ProtocolError> {
    payload.ok_or_else(|| malformed(command, "missing payload"))
}

fn reject_payload(
    command: &'static str,
    payload: Option<&str>,
) -> Result<(), ProtocolError> {
    match payload {
        None => Ok(()),
        Some(_) => Err(malformed(command, "unexpected payload")),
    }
}

fn parse_ints<const N: usize>(
    command: &'static str,
    payload: &str,
) -> Result<[i32; N], ProtocolError> {
    let fields: Vec<&str> = payload.split(SEPARATOR).collect();
    if fields.len() != N {
        return Err(malformed(
            command,
            format!("expected {N} fields, got {}", fields.len()),
        ));
    }
    let mut out = [0; N];
    for (slot, field) in out.iter_mut().zip(fields) {
        *slot = field.trim().parse().map_err(|_| {
            malformed(command, format!("{field:?} is not an integer"))
        })?;
    }
    Ok(out)
}

fn parse_move(
    command: &'static str,
    payload: Option<&str>,
) -> Result<(Coord, Coord), ProtocolError> {
    let [r1, c1, r2, c2] = parse_ints::<4>(command, require(command, payload)?)?;
    Ok((Coord::new(r1, c1), Coord::new(r2, c2)))
}

fn move_line(command: &str, from: Coord, to: Coord) -> String {
    format!(
        "{command}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
        from.row, from.col, to.row, to.col
    )
}

fn parse_count(command: &'static str, field: &str) -> Result<u32, ProtocolError> {
    field
        .parse()
        .map_err(|_| malformed(command, format!("{field:?} is not a count")))
}

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

impl WireMessage for ClientMessage {
    fn to_line(&self) -> String {
        use tokens::*;
        match self {
            Self::Move { from, to } => move_line(MOVE, *from, *to),
            Self::EndChainJump => END_CHAIN_JUMP.to_string(),
            Self::Chat { text } => format!("{CHAT}{SEPARATOR}{text}"),
            Self::Forfeit => FORFEIT.to_string(),
        }
    }

    fn from_line(line: &str) -> Result<Self, ProtocolError> {
        use tokens::*;
        let (command, payload) = split_command(line);
        match command {
            MOVE => {
                let (from, to) = parse_move(MOVE, payload)?;
                Ok(Self::Move { from, to })
            }
            END_CHAIN_JUMP => {
                reject_payload(END_CHAIN_JUMP, payload)?;
                Ok(Self::EndChainJump)
            }
            CHAT => Ok(Self::Chat {
                text: require(CHAT, payload)?.to_string(),
            }),
            FORFEIT => {
                reject_payload(FORFEIT, payload)?;
                Ok(Self::Forfeit)
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

impl WireMessage for ServerMessage {
    fn to_line(&self) -> String {
        use tokens::*;
        match self {
            Self::Info { text } => format!("{INFO}{SEPARATOR}{text}"),
            Self::Welcome { player } => {
                format!("{WELCOME}{SEPARATOR}{}", player.id())
            }
            Self::OpponentFound => OPPONENT_FOUND.to_string(),
            Self::GameStart => GAME_START.to_string(),
            Self::SetTurn { your_turn } => {
                let whose = if *your_turn { YOUR_TURN } else { OPPONENT_TURN };
                format!("{SET_TURN}{SEPARATOR}{whose}")
            }
            Self::MoveAccepted { from, to } => move_line(VALID_MOVE, *from, *to),
            Self::OpponentMoved { from, to } => {
                move_line(OPPONENT_MOVED, *from, *to)
            }
            Self::JumpOffer { at } => format!(
                "{CHAIN_JUMP_OFFER}{SEPARATOR}{}{SEPARATOR}{}",
                at.row, at.col
            ),
            Self::Chat { line } => format!("{CHAT_MESSAGE}{SEPARATOR}{line}"),
            Self::Error { reason } => format!("{ERROR}{SEPARATOR}{reason}"),
            Self::Victory => VICTORY.to_string(),
            Self::Defeat { reason: None } => DEFEAT.to_string(),
            Self::Defeat {
                reason: Some(reason),
            } => format!("{DEFEAT}{SEPARATOR}{reason}"),
            Self::OpponentForfeited => OPPONENT_FORFEIT.to_string(),
            Self::GameOverStats(summary) => {
                let transcript = summary
                    .transcript
                    .iter()
                    .map(|entry| escape_entry(entry))
                    .collect::<Vec<_>>()
                    .join(&TRANSCRIPT_SEPARATOR.to_string());
                [
                    GAME_OVER_STATS.to_string(),
                    summary.outcome.clone(),
                    summary.player_one.moves.to_string(),
                    summary.player_one.invalid_attempts.to_string(),
                    summary.player_two.moves.to_string(),
                    summary.player_two.invalid_attempts.to_string(),
                    transcript,
                ]
                .join(&SEPARATOR.to_string())
            }
        }
    }

    fn from_line(line: &str) -> Result<Self, ProtocolError> {
        use tokens::*;
        let (command, payload) = split_command(line);
        match command {
            INFO => Ok(Self::Info {
                text: require(INFO, payload)?.to_string(),
            }),
            WELCOME => {
                let [id] = parse_ints::<1>(WELCOME, require(WELCOME, payload)?)?;
                let player = u8::try_from(id)
                    .ok()
                    .and_then(|id| Player::try_from(id).ok())
                    .ok_or_else(|| malformed(WELCOME, format!("no player {id}")))?;
                Ok(Self::Welcome { player })
            }
            OPPONENT_FOUND => Ok(Self::OpponentFound),
            GAME_START => Ok(Self::GameStart),
            SET_TURN => match require(SET_TURN, payload)? {
                YOUR_TURN => Ok(Self::SetTurn { your_turn: true }),
                OPPONENT_TURN => Ok(Self::SetTurn { your_turn: false }),
                other => Err(malformed(SET_TURN, format!("unknown turn {other:?}"))),
            },
            VALID_MOVE => {
                let (from, to) = parse_move(VALID_MOVE, payload)?;
                Ok(Self::MoveAccepted { from, to })
            }
            OPPONENT_MOVED => {
                let (from, to) = parse_move(OPPONENT_MOVED, payload)?;
                Ok(Self::OpponentMoved { from, to })
            }
            CHAIN_JUMP_OFFER => {
                let [row, col] = parse_ints::<2>(
                    CHAIN_JUMP_OFFER,
                    require(CHAIN_JUMP_OFFER, payload)?,
                )?;
                Ok(Self::JumpOffer {
                    at: Coord::new(row, col),
                })
            }
            CHAT_MESSAGE => Ok(Self::Chat {
                line: require(CHAT_MESSAGE, payload)?.to_string(),
            }),
            ERROR => Ok(Self::Error {
                reason: require(ERROR, payload)?.to_string(),
            }),
            VICTORY => Ok(Self::Victory),
            DEFEAT => Ok(Self::Defeat {
                reason: payload.map(str::to_string),
            }),
            OPPONENT_FORFEIT => Ok(Self::OpponentForfeited),
            GAME_OVER_STATS => {
                let payload = require(GAME_OVER_STATS, payload)?;
                let fields: Vec<&str> = payload.splitn(6, SEPARATOR).collect();
                let [outcome, m1, i1, m2, i2, transcript] = fields[..] else {
                    return Err(malformed(
                        GAME_OVER_STATS,
                        format!("expected 6 fields, got {}", fields.len()),
                    ));
                };
                let transcript = split_transcript(transcript);
                Ok(Self::GameOverStats(GameSummary {
                    outcome: outcome.to_string(),
                    player_one: PlayerStats {
                        moves: parse_count(GAME_OVER_STATS, m1)?,
                        invalid_attempts: parse_count(GAME_OVER_STATS, i1)?,
                    },
                    player_two: PlayerStats {
                        moves: parse_count(GAME_OVER_STATS, m2)?,
                        invalid_attempts: parse_count(GAME_OVER_STATS, i2)?,
                    },
                    transcript,
                }))
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

/// Escapes `\` and the transcript separator inside one entry.
fn escape_entry(entry: &str) -> String {
    let mut out = String::with_capacity(entry.len());
    for ch in entry.chars() {
        if ch == '\\' || ch == TRANSCRIPT_SEPARATOR {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Splits on unescaped separators and unescapes each entry.
fn split_transcript(field: &str) -> Vec<String> {
    if field.is_empty() {
        return Vec::new();
    }
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut chars = field.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => current.extend(chars.next()),
            TRANSCRIPT_SEPARATOR => entries.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    entries.push(current);
    entries
}
