//! Newline-delimited text over plain TCP.
//!
//! This is the classic Halma client wire: every message is one line of
//! text terminated by `\n` (a trailing `\r` is tolerated on input).
//!
//! Lines are handed up as raw bytes. Whether they are valid text is the
//! codec's call, so a bad byte in one line never ends the connection. A
//! line longer than the configured limit does.

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Default cap on the length of one inbound line, excluding the newline.
pub const DEFAULT_MAX_LINE_LEN: usize = 8 * 1024;

/// A [`Transport`] that accepts raw TCP sockets and frames them by line.
pub struct TcpLineTransport {
    listener: TcpListener,
    max_line_len: usize,
}

impl TcpLineTransport {
    /// Binds a new line transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP line transport listening");
        Ok(Self {
            listener,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        })
    }

    /// Sets the longest inbound line accepted on new connections.
    pub fn with_max_line_len(mut self, max: usize) -> Self {
        self.max_line_len = max;
        self
    }
}

impl Transport for TcpLineTransport {
    type Connection = TcpLineConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        // Small, latency-sensitive messages.
        let _ = stream.set_nodelay(true);

        let id = ConnectionId::next();
        tracing::debug!(%id, %addr, "accepted TCP connection");

        let (read, write) = stream.into_split();
        let (closed, _) = watch::channel(false);
        Ok(TcpLineConnection {
            id,
            reader: Mutex::new(BufReader::new(read)),
            max_line_len: self.max_line_len,
            writer: Mutex::new(write),
            closed,
        })
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// A single line-framed TCP connection.
pub struct TcpLineConnection {
    id: ConnectionId,
    reader: Mutex<BufReader<OwnedReadHalf>>,
    max_line_len: usize,
    writer: Mutex<OwnedWriteHalf>,
    closed: watch::Sender<bool>,
}

impl Connection for TcpLineConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        if *self.closed.borrow() {
            return Err(TransportError::ConnectionClosed(self.id.to_string()));
        }
        let mut writer = self.writer.lock().await;
        writer
            .write_all(data)
            .await
            .map_err(TransportError::SendFailed)?;
        writer
            .write_all(b"\n")
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut closed = self.closed.subscribe();
        let mut reader = self.reader.lock().await;
        tokio::select! {
            line = read_line(&mut reader, self.max_line_len) => line,
            _ = crate::closed(&mut closed) => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.closed.send_replace(true);
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Reads one `\n`-terminated line without its terminator. A final line
/// cut off by end-of-stream is still returned.
async fn read_line(
    reader: &mut BufReader<OwnedReadHalf>,
    max: usize,
) -> Result<Option<Vec<u8>>, TransportError> {
    let mut line = Vec::new();
    // One extra byte leaves room for the newline of a maximal line.
    let limit = u64::try_from(max).unwrap_or(u64::MAX).saturating_add(1);
    let n = reader
        .take(limit)
        .read_until(b'\n', &mut line)
        .await
        .map_err(TransportError::ReceiveFailed)?;
    if n == 0 {
        return Ok(None);
    }

    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    } else if line.len() > max {
        return Err(TransportError::LineTooLong { limit: max });
    }
    Ok(Some(line))
}
