//! Integration tests for the network transports.
//!
//! These spin up a real listener on a loopback port and talk to it with a
//! plain client, verifying framing, close semantics, and that reads and
//! writes can proceed from separate tasks.

use std::sync::Arc;
use std::time::Duration;

use halma_transport::{
    Connection, TcpLineTransport, Transport, TransportError,
    DEFAULT_MAX_LINE_LEN,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

mod tcp {
    use super::*;

    async fn accept_one() -> (halma_transport::TcpLineConnection, TcpStream) {
        accept_with_limit(DEFAULT_MAX_LINE_LEN).await
    }

    async fn accept_with_limit(
        max_line_len: usize,
    ) -> (halma_transport::TcpLineConnection, TcpStream) {
        let mut transport = TcpLineTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind")
            .with_max_line_len(max_line_len);
        let addr = transport.local_addr().expect("should have addr");

        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let client = TcpStream::connect(addr).await.expect("should connect");
        let conn = server.await.expect("accept task should complete");
        (conn, client)
    }

    #[tokio::test]
    async fn test_tcp_lines_flow_both_ways() {
        let (conn, client) = accept_one().await;
        let (read, mut write) = client.into_split();
        let mut lines = BufReader::new(read).lines();

        conn.send(b"WELCOME:1").await.expect("send should succeed");
        let line = lines.next_line().await.unwrap();
        assert_eq!(line.as_deref(), Some("WELCOME:1"));

        write.write_all(b"MOVE:0:2:1:3\r\nCHAT:hi\n").await.unwrap();
        let first = conn.recv().await.unwrap().expect("first line");
        let second = conn.recv().await.unwrap().expect("second line");
        assert_eq!(first, b"MOVE:0:2:1:3");
        assert_eq!(second, b"CHAT:hi");
    }

    #[tokio::test]
    async fn test_tcp_non_utf8_line_is_delivered_as_bytes() {
        let (conn, mut client) = accept_one().await;
        client.write_all(b"CHAT:caf\xe9\nCHAT:ok\n").await.unwrap();

        let first = conn.recv().await.expect("bad bytes are not an error");
        assert_eq!(first.as_deref(), Some(&b"CHAT:caf\xe9"[..]));
        let second = conn.recv().await.unwrap();
        assert_eq!(second.as_deref(), Some(&b"CHAT:ok"[..]));
    }

    #[tokio::test]
    async fn test_tcp_line_at_limit_is_accepted_and_longer_fails() {
        let (conn, mut client) = accept_with_limit(8).await;
        client.write_all(b"12345678\n123456789\n").await.unwrap();

        let fits = conn.recv().await.unwrap();
        assert_eq!(fits.as_deref(), Some(&b"12345678"[..]));
        let result = conn.recv().await;
        assert!(matches!(
            result,
            Err(TransportError::LineTooLong { limit: 8 })
        ));
    }

    #[tokio::test]
    async fn test_tcp_final_line_without_newline_is_returned() {
        let (conn, mut client) = accept_one().await;
        client.write_all(b"FORFEIT").await.unwrap();
        client.shutdown().await.unwrap();

        assert_eq!(conn.recv().await.unwrap().as_deref(), Some(&b"FORFEIT"[..]));
        assert!(conn.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tcp_recv_returns_none_on_client_close() {
        let (conn, client) = accept_one().await;
        drop(client);

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_tcp_close_unblocks_reader_and_client_sees_eof() {
        let (conn, client) = accept_one().await;
        let conn = Arc::new(conn);

        let reader = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        conn.send(b"GAME_OVER_STATS:done").await.unwrap();
        conn.close().await.expect("close should succeed");

        let pending = tokio::time::timeout(Duration::from_secs(1), reader)
            .await
            .expect("reader should wake on close")
            .unwrap();
        assert!(pending.unwrap().is_none());

        let mut lines = BufReader::new(client).lines();
        assert_eq!(
            lines.next_line().await.unwrap().as_deref(),
            Some("GAME_OVER_STATS:done")
        );
        assert_eq!(lines.next_line().await.unwrap(), None);
    }
}

#[cfg(feature = "websocket")]
mod websocket {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use halma_transport::WebSocketTransport;
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<TcpStream>,
    >;

    async fn accept_one() -> (halma_transport::WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have addr");

        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        let conn = server.await.expect("task should complete");
        (conn, ws)
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (server_conn, mut client_ws) = accept_one().await;
        assert!(server_conn.id().into_inner() > 0);

        // --- Server sends, client receives a text frame ---
        server_conn
            .send(b"SET_TURN:YOUR_TURN")
            .await
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_text());
        assert_eq!(msg.into_data().as_ref(), b"SET_TURN:YOUR_TURN");

        // --- Client sends, server receives ---
        client_ws
            .send(Message::text("FORFEIT".to_string()))
            .await
            .unwrap();
        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"FORFEIT");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_send_while_reader_is_blocked() {
        let (server_conn, mut client_ws) = accept_one().await;
        let server_conn = Arc::new(server_conn);

        let reader = {
            let conn = Arc::clone(&server_conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        tokio::time::timeout(
            Duration::from_secs(1),
            server_conn.send(b"OPPONENT_FOUND"),
        )
        .await
        .expect("send must not wait for the reader")
        .unwrap();
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"OPPONENT_FOUND");

        client_ws.send(Message::Close(None)).await.unwrap();
        let result = reader.await.unwrap().expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }
}
