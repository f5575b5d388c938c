//! `HalmaServer` builder and server loop.
//!
//! This is the entry point for running a Halma match server. It ties
//! together all the layers: transport → lobby → session.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use halma_lobby::MatchQueue;
use halma_protocol::{Codec, TextCodec};
use halma_session::SessionConfig;
use halma_transport::{
    Connection, TcpLineTransport, Transport, TransportError,
    WebSocketTransport,
};
use serde::{Deserialize, Serialize};

use crate::handler::handle_connection;
use crate::HalmaError;

/// Which network transport the server listens with.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum TransportKind {
    /// WebSocket frames, one message per text frame.
    #[default]
    WebSocket,
    /// Raw TCP, one message per `\n`-terminated line.
    Tcp,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebSocket => write!(f, "websocket"),
            Self::Tcp => write!(f, "tcp"),
        }
    }
}

/// Builder for configuring and starting a Halma server.
///
/// # Example
///
/// ```rust,no_run
/// use halma::prelude::*;
///
/// # async fn start() -> Result<(), HalmaError> {
/// let server = HalmaServer::builder()
///     .bind("0.0.0.0:7777")
///     .transport(TransportKind::Tcp)
///     .build(TextCodec)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct HalmaServerBuilder {
    bind_addr: String,
    transport: TransportKind,
    session_config: SessionConfig,
}

impl HalmaServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            transport: TransportKind::default(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the transport to listen with.
    pub fn transport(mut self, kind: TransportKind) -> Self {
        self.transport = kind;
        self
    }

    /// Sets the configuration every session is spawned with.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds the listener. Messages are encoded with `codec`.
    pub async fn build<K: Codec>(
        self,
        codec: K,
    ) -> Result<HalmaServer<K>, HalmaError> {
        let listener = match self.transport {
            TransportKind::WebSocket => Listener::WebSocket(
                WebSocketTransport::bind(&self.bind_addr).await?,
            ),
            TransportKind::Tcp => {
                Listener::Tcp(TcpLineTransport::bind(&self.bind_addr).await?)
            }
        };

        Ok(HalmaServer {
            listener,
            codec: Arc::new(codec),
            session_config: self.session_config,
        })
    }
}

impl Default for HalmaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

enum Listener {
    WebSocket(WebSocketTransport),
    Tcp(TcpLineTransport),
}

/// A bound Halma server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct HalmaServer<K: Codec> {
    listener: Listener,
    codec: Arc<K>,
    session_config: SessionConfig,
}

impl HalmaServer<TextCodec> {
    /// Creates a new builder. The codec is chosen by
    /// [`build`](HalmaServerBuilder::build).
    pub fn builder() -> HalmaServerBuilder {
        HalmaServerBuilder::new()
    }
}

impl<K: Codec> HalmaServer<K> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        match &self.listener {
            Listener::WebSocket(t) => t.local_addr(),
            Listener::Tcp(t) => t.local_addr(),
        }
    }

    /// Runs the server accept loop.
    ///
    /// Every accepted connection is greeted and queued on its own task;
    /// each completed pairing plays one session. Runs until the process
    /// is terminated.
    pub async fn run(self) -> Result<(), HalmaError> {
        let addr = self.local_addr().ok();
        match self.listener {
            Listener::WebSocket(transport) => {
                tracing::info!(?addr, transport = "websocket", "Halma server running");
                serve(transport, self.codec, self.session_config).await
            }
            Listener::Tcp(transport) => {
                tracing::info!(?addr, transport = "tcp", "Halma server running");
                serve(transport, self.codec, self.session_config).await
            }
        }
    }
}

async fn serve<T, K>(
    mut transport: T,
    codec: Arc<K>,
    config: SessionConfig,
) -> Result<(), HalmaError>
where
    T: Transport<Error = TransportError>,
    T::Connection: Connection<Error = TransportError>,
    K: Codec,
{
    let queue = Arc::new(MatchQueue::new());

    loop {
        match transport.accept().await {
            Ok(conn) => {
                let queue = Arc::clone(&queue);
                let codec = Arc::clone(&codec);
                let config = config.clone();
                tokio::spawn(async move {
                    if let Err(e) =
                        handle_connection(conn, queue, codec, config).await
                    {
                        tracing::debug!(
                            error = %e,
                            "connection ended with error"
                        );
                    }
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "accept failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_kind_default_and_display() {
        assert_eq!(TransportKind::default(), TransportKind::WebSocket);
        assert_eq!(TransportKind::Tcp.to_string(), "tcp");
    }

    #[tokio::test]
    async fn test_build_binds_ephemeral_port() {
        let server = HalmaServer::builder()
            .bind("127.0.0.1:0")
            .transport(TransportKind::Tcp)
            .build(TextCodec)
            .await
            .expect("should bind");
        assert_ne!(server.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_build_fails_on_bad_address() {
        let result = HalmaServer::builder()
            .bind("not an address")
            .build(TextCodec)
            .await;
        assert!(matches!(result, Err(HalmaError::Transport(_))));
    }

    #[cfg(feature = "json")]
    #[tokio::test]
    async fn test_builder_accepts_any_codec() {
        let server: HalmaServer<halma_protocol::JsonCodec> =
            HalmaServer::builder()
                .bind("127.0.0.1:0")
                .build(halma_protocol::JsonCodec)
                .await
                .expect("should bind");
        assert!(server.local_addr().is_ok());
    }
}
