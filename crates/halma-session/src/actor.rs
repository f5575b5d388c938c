//! Session actor: one Tokio task that owns a [`Match`] and both
//! connections of a pairing.
//!
//! ```text
//!  conn A ─ reader ─┐                      ┌─ writer ─ conn A
//!                   ├─► commands ─► actor ─┤
//!  conn B ─ reader ─┘   (bounded)          └─ writer ─ conn B
//!                                          (unbounded outbound queues)
//! ```
//!
//! The actor processes one command at a time, so the match needs no
//! locking. Writers drain their queue in order and close the connection
//! only when they reach the `Close` marker, which the actor enqueues after
//! the final messages of a match.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use halma_board::Player;
use halma_protocol::{
    ClientMessage, Codec, PlayerStats, ProtocolError, ServerMessage,
};
use halma_transport::{Connection, ConnectionId};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::{Match, Outbox, Outcome, SessionConfig, SessionError, SessionState};

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates a fresh process-wide id.
    pub fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Commands and handle
// ---------------------------------------------------------------------------

/// Items in a connection's outbound queue.
#[derive(Debug)]
enum Outbound {
    Message(ServerMessage),
    /// Close the connection once everything queued before it is written.
    Close,
}

/// Commands processed by the session actor, in arrival order.
enum SessionCommand {
    /// A line from a player, decoded or not.
    Inbound {
        player: Player,
        message: Result<ClientMessage, ProtocolError>,
    },

    /// The player's connection reached end-of-stream or failed.
    Disconnected { player: Player },

    /// Request a snapshot of the session.
    GetInfo { reply: oneshot::Sender<SessionInfo> },

    /// End the match without a winner.
    Shutdown,
}

/// A snapshot of session metadata.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: SessionId,
    pub state: SessionState,
    /// Whose turn it is (meaningless once ended).
    pub current_player: Player,
    pub outcome: Outcome,
    pub player_one: PlayerStats,
    pub player_two: PlayerStats,
}

/// Handle to a running session actor.
///
/// Cheap to clone. Dropping every handle does not stop the session; it
/// runs until the match ends.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    sender: mpsc::Sender<SessionCommand>,
    done: watch::Receiver<Option<Outcome>>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Requests the current session info.
    pub async fn info(&self) -> Result<SessionInfo, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Unavailable(self.id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.id))
    }

    /// Ends the match as aborted. Both players still receive the final
    /// statistics before their connections close.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::Unavailable(self.id))
    }

    /// Waits until the session has finished and both connections are
    /// closed, and returns the outcome.
    pub async fn closed(&self) -> Outcome {
        let mut done = self.done.clone();
        match done.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).unwrap_or(Outcome::Aborted),
            // The actor task went away without publishing.
            Err(_) => Outcome::Aborted,
        }
    }

    /// Returns `true` once [`closed`](Self::closed) would resolve
    /// immediately.
    pub fn is_closed(&self) -> bool {
        self.done.borrow().is_some()
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct Seat {
    player: Player,
    conn_id: ConnectionId,
    outbound: mpsc::UnboundedSender<Outbound>,
    writer: JoinHandle<()>,
}

struct SessionActor {
    id: SessionId,
    game: Match,
    seats: [Seat; 2],
    receiver: mpsc::Receiver<SessionCommand>,
    done: watch::Sender<Option<Outcome>>,
}

impl SessionActor {
    async fn run(mut self) {
        tracing::info!(
            session_id = %self.id,
            player_one = %self.seats[0].conn_id,
            player_two = %self.seats[1].conn_id,
            "session started"
        );
        let out = self.game.start();
        self.dispatch(out);

        while let Some(cmd) = self.receiver.recv().await {
            let out = match cmd {
                SessionCommand::Inbound {
                    player,
                    message: Ok(message),
                } => self.game.handle_message(player, message),
                SessionCommand::Inbound {
                    player,
                    message: Err(error),
                } => self.game.handle_malformed(player, &error),
                SessionCommand::Disconnected { player } => {
                    tracing::info!(session_id = %self.id, %player, "player disconnected");
                    self.game.disconnect(player)
                }
                SessionCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                    continue;
                }
                SessionCommand::Shutdown => {
                    tracing::info!(session_id = %self.id, "session shutting down");
                    self.game.abort()
                }
            };
            self.dispatch(out);
            if self.game.is_finished() {
                break;
            }
        }

        if !self.game.is_finished() {
            let out = self.game.abort();
            self.dispatch(out);
        }
        self.close_all().await;

        let outcome = self.game.outcome();
        tracing::info!(session_id = %self.id, %outcome, "session ended");
        self.done.send_replace(Some(outcome));
    }

    /// Queues each message on the outbound channel of every addressed
    /// seat. Sends to a writer that already exited are dropped.
    fn dispatch(&self, msgs: Outbox) {
        for (recipient, msg) in msgs {
            for seat in &self.seats {
                if recipient.includes(seat.player) {
                    let _ = seat.outbound.send(Outbound::Message(msg.clone()));
                }
            }
        }
    }

    async fn close_all(&mut self) {
        for seat in &self.seats {
            let _ = seat.outbound.send(Outbound::Close);
        }
        for seat in &mut self.seats {
            if let Err(e) = (&mut seat.writer).await {
                tracing::warn!(
                    session_id = %self.id,
                    conn_id = %seat.conn_id,
                    error = %e,
                    "writer task failed"
                );
            }
        }
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            state: self.game.state(),
            current_player: self.game.current_player(),
            outcome: self.game.outcome(),
            player_one: self.game.stats(Player::One),
            player_two: self.game.stats(Player::Two),
        }
    }
}

/// Forwards every inbound message of one connection to the actor until
/// the connection ends or the actor stops listening.
async fn read_loop<C: Connection, K: Codec>(
    session_id: SessionId,
    player: Player,
    conn: Arc<C>,
    codec: Arc<K>,
    commands: mpsc::Sender<SessionCommand>,
) {
    loop {
        let cmd = match conn.recv().await {
            Ok(Some(data)) => SessionCommand::Inbound {
                player,
                message: codec.decode(&data),
            },
            Ok(None) => SessionCommand::Disconnected { player },
            Err(e) => {
                tracing::debug!(
                    %session_id,
                    %player,
                    conn_id = %conn.id(),
                    error = %e,
                    "receive failed"
                );
                SessionCommand::Disconnected { player }
            }
        };
        let last = matches!(cmd, SessionCommand::Disconnected { .. });
        if commands.send(cmd).await.is_err() || last {
            break;
        }
    }
}

/// Writes queued messages to one connection in order, then closes it.
async fn write_loop<C: Connection, K: Codec>(
    session_id: SessionId,
    conn: Arc<C>,
    codec: Arc<K>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(item) = outbound.recv().await {
        let msg = match item {
            Outbound::Message(msg) => msg,
            Outbound::Close => break,
        };
        let bytes = match codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%session_id, error = %e, "failed to encode message");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(
                %session_id,
                conn_id = %conn.id(),
                error = %e,
                "send failed"
            );
        }
    }
    if let Err(e) = conn.close().await {
        tracing::debug!(%session_id, conn_id = %conn.id(), error = %e, "close failed");
    }
}

fn seat<C: Connection, K: Codec>(
    session_id: SessionId,
    player: Player,
    conn: C,
    codec: &Arc<K>,
    commands: &mpsc::Sender<SessionCommand>,
) -> Seat {
    let conn = Arc::new(conn);
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    tokio::spawn(read_loop(
        session_id,
        player,
        Arc::clone(&conn),
        Arc::clone(codec),
        commands.clone(),
    ));
    let conn_id = conn.id();
    let writer = tokio::spawn(write_loop(
        session_id,
        conn,
        Arc::clone(codec),
        outbound_rx,
    ));

    Seat {
        player,
        conn_id,
        outbound: outbound_tx,
        writer,
    }
}

/// Spawns a session on the standard starting board. The first connection
/// plays as Player 1.
pub fn spawn_session<C: Connection, K: Codec>(
    id: SessionId,
    players: (C, C),
    codec: Arc<K>,
    config: &SessionConfig,
) -> SessionHandle {
    spawn_match(id, Match::new(), players, codec, config)
}

/// Spawns a session that plays `game`, which must not have been started.
pub fn spawn_match<C: Connection, K: Codec>(
    id: SessionId,
    game: Match,
    players: (C, C),
    codec: Arc<K>,
    config: &SessionConfig,
) -> SessionHandle {
    let (tx, rx) = mpsc::channel(config.command_buffer.max(1));
    let (done_tx, done_rx) = watch::channel(None);

    let (first, second) = players;
    let seats = [
        seat(id, Player::One, first, &codec, &tx),
        seat(id, Player::Two, second, &codec, &tx),
    ];

    let actor = SessionActor {
        id,
        game,
        seats,
        receiver: rx,
        done: done_tx,
    };
    tokio::spawn(actor.run());

    SessionHandle {
        id,
        sender: tx,
        done: done_rx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId::new(3).to_string(), "S-3");
    }

    #[test]
    fn test_session_id_next_is_unique() {
        let a = SessionId::next();
        let b = SessionId::next();
        assert!(b > a);
    }
}
