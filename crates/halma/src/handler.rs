//! Per-connection handler: greet, queue, and (for the second player of a
//! pairing) run the session.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Send `INFO` telling the client to wait
//!   2. Enqueue the connection
//!   3. If that formed a pairing → spawn the session and wait for it

use std::sync::Arc;

use halma_lobby::MatchQueue;
use halma_protocol::{Codec, ServerMessage};
use halma_session::{spawn_session, SessionConfig, SessionId};
use halma_transport::{Connection, TransportError};

use crate::HalmaError;

/// Sent to every connection as soon as it is accepted.
pub const WAITING_TEXT: &str = "Waiting for an opponent...";

/// Handles a single connection from accept until its match is over.
///
/// Returns as soon as the connection is queued when it is the first of a
/// pairing. The task that completes a pairing owns the session until it
/// finishes.
///
/// Nothing reads a queued connection, so one that drops while waiting
/// stays in the queue and is still paired. Its session then sees
/// end-of-stream at once and the live player wins by disconnect.
pub(crate) async fn handle_connection<C, K>(
    conn: C,
    queue: Arc<MatchQueue<C>>,
    codec: Arc<K>,
    config: SessionConfig,
) -> Result<(), HalmaError>
where
    C: Connection<Error = TransportError>,
    K: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let greeting = codec.encode(&ServerMessage::Info {
        text: WAITING_TEXT.to_string(),
    })?;
    conn.send(&greeting).await?;

    let Some(pairing) = queue.enqueue(conn) else {
        tracing::info!(%conn_id, "waiting for an opponent");
        return Ok(());
    };

    let session_id = SessionId::next();
    tracing::info!(
        %session_id,
        player_one = %pairing.first.id(),
        player_two = %pairing.second.id(),
        "pairing formed"
    );

    let handle = spawn_session(session_id, pairing.into_tuple(), codec, &config);
    let outcome = handle.closed().await;
    tracing::info!(%session_id, %outcome, "session finished");
    Ok(())
}
