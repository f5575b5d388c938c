//! In-process connections backed by unbounded channels.
//!
//! [`pair`] returns the server half (a [`Connection`]) and the client half
//! ([`MemoryClient`]). Used by session and lobby tests, and handy for
//! embedding a match without sockets.

use tokio::sync::{mpsc, watch, Mutex};

use crate::{Connection, ConnectionId, TransportError};

/// Creates a connected server/client pair.
pub fn pair() -> (MemoryConnection, MemoryClient) {
    let (to_server, from_client) = mpsc::unbounded_channel();
    let (to_client, from_server) = mpsc::unbounded_channel();
    let (closed, _) = watch::channel(false);

    let conn = MemoryConnection {
        id: ConnectionId::next(),
        inbound: Mutex::new(from_client),
        outbound: std::sync::Mutex::new(Some(to_client)),
        closed,
    };
    let client = MemoryClient {
        outbound: Some(to_server),
        inbound: from_server,
    };
    (conn, client)
}

/// Server side of an in-memory connection.
pub struct MemoryConnection {
    id: ConnectionId,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    /// Dropped on close so the client observes end-of-stream.
    outbound: std::sync::Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    closed: watch::Sender<bool>,
}

impl MemoryConnection {
    /// Returns `true` once [`close`](Connection::close) has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl Connection for MemoryConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let outbound = self
            .outbound
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match outbound.as_ref() {
            Some(tx) => tx.send(data.to_vec()).map_err(|_| {
                TransportError::ConnectionClosed(format!("{} peer gone", self.id))
            }),
            None => Err(TransportError::ConnectionClosed(self.id.to_string())),
        }
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut closed = self.closed.subscribe();
        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            biased;
            _ = crate::closed(&mut closed) => Ok(None),
            msg = inbound.recv() => Ok(msg),
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.closed.send_replace(true);
        self.outbound
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Client side of an in-memory connection.
pub struct MemoryClient {
    outbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MemoryClient {
    /// Sends one message to the server. Returns `false` if either side
    /// has hung up.
    pub fn send(&self, data: impl Into<Vec<u8>>) -> bool {
        self.outbound
            .as_ref()
            .is_some_and(|tx| tx.send(data.into()).is_ok())
    }

    /// Waits for the next message from the server, or `None` once the
    /// server closed the connection and every queued message was read.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.inbound.recv().await
    }

    /// Like [`recv`](Self::recv), decoded as UTF-8 text.
    pub async fn recv_text(&mut self) -> Option<String> {
        self.recv()
            .await
            .map(|data| String::from_utf8_lossy(&data).into_owned())
    }

    /// Hangs up. The server's next `recv` returns `Ok(None)`.
    pub fn close(&mut self) {
        self.outbound = None;
    }
}
