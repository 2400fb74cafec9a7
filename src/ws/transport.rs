use crate::stream::{ClientConfig, Frame, StreamClient, Transport};
use crate::{EchoError, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::protocol::{Role, WebSocketConfig};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

/// Stream echo client speaking WebSocket
pub type WsEchoClient = StreamClient<WsTransport<MaybeTlsStream<TcpStream>>>;

/// [`Transport`] over a WebSocket connection
///
/// Text and binary messages map to [`Frame`]s; ping/pong are answered by the
/// WebSocket layer and never surface. A close frame, or the peer dropping
/// the TCP connection without one, is reported as `Ok(None)`.
pub struct WsTransport<S> {
    ws: WebSocketStream<S>,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl<S> WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(ws: WebSocketStream<S>, read_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            ws,
            read_timeout,
            write_timeout,
        }
    }

    /// Server side: wraps a stream whose HTTP upgrade has already been answered
    ///
    /// `read_buf` holds any bytes read past the end of the upgrade request.
    pub async fn from_upgraded(
        stream: S,
        read_buf: Vec<u8>,
        read_timeout: Duration,
        write_timeout: Duration,
        max_message_size: usize,
    ) -> Self {
        let ws = WebSocketStream::from_partially_read(
            stream,
            read_buf,
            Role::Server,
            Some(websocket_config(max_message_size)),
        )
        .await;
        Self::new(ws, read_timeout, write_timeout)
    }
}

impl WsTransport<MaybeTlsStream<TcpStream>> {
    /// Client side: opens a WebSocket connection to `uri`
    pub async fn connect(uri: &str, config: &ClientConfig) -> Result<Self> {
        let (ws, response) = timeout(
            config.connect_timeout,
            tokio_tungstenite::connect_async_with_config(
                uri,
                Some(websocket_config(config.max_response_size)),
                true,
            ),
        )
        .await
        .map_err(|_| EchoError::Timeout("Connection timeout".to_string()))??;

        debug!(%uri, status = %response.status(), "WebSocket connected");
        Ok(Self::new(ws, config.read_timeout, config.write_timeout))
    }
}

/// Connects a [`WsEchoClient`] to `uri`
pub async fn connect(uri: &str, config: &ClientConfig) -> Result<WsEchoClient> {
    Ok(StreamClient::new(WsTransport::connect(uri, config).await?))
}

fn websocket_config(max_message_size: usize) -> WebSocketConfig {
    let mut config = WebSocketConfig::default();
    config.max_message_size = Some(max_message_size);
    config.max_frame_size = Some(max_message_size);
    config
}

fn is_closed_error(err: &tungstenite::Error) -> bool {
    match err {
        tungstenite::Error::ConnectionClosed
        | tungstenite::Error::AlreadyClosed
        | tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
        // Peer vanished mid-stream
        tungstenite::Error::Io(e) => matches!(
            e.kind(),
            io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof
        ),
        _ => false,
    }
}

#[async_trait]
impl<S> Transport for WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, frame: Frame) -> Result<()> {
        let message = match frame {
            Frame::Text(text) => Message::Text(text),
            Frame::Binary(data) => Message::Binary(data.to_vec()),
        };
        timeout(self.write_timeout, self.ws.send(message))
            .await
            .map_err(|_| EchoError::Timeout("Write timeout".to_string()))?
            .map_err(|e| {
                if is_closed_error(&e) {
                    EchoError::ConnectionClosed
                } else {
                    EchoError::WebSocket(e)
                }
            })
    }

    async fn receive(&mut self) -> Result<Option<Frame>> {
        loop {
            let next = timeout(self.read_timeout, self.ws.next())
                .await
                .map_err(|_| EchoError::Timeout("Read timeout".to_string()))?;

            match next {
                None => return Ok(None),
                Some(Ok(Message::Text(text))) => return Ok(Some(Frame::Text(text))),
                Some(Ok(Message::Binary(data))) => return Ok(Some(Frame::Binary(data.into()))),
                Some(Ok(Message::Close(close_frame))) => {
                    debug!(?close_frame, "Received close frame");
                    return Ok(None);
                }
                Some(Ok(other)) => {
                    trace!(?other, "Skipping control frame");
                }
                Some(Err(e)) if is_closed_error(&e) => {
                    debug!(error = %e, "Peer went away");
                    return Ok(None);
                }
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.ws.close(None).await {
            Ok(()) => {}
            Err(e) if is_closed_error(&e) => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        // Wait for the peer's half of the closing handshake
        let read_timeout = self.read_timeout;
        let ws = &mut self.ws;
        let drain = async move {
            while let Some(Ok(_)) = ws.next().await {}
        };
        if timeout(read_timeout, drain).await.is_err() {
            debug!("Peer did not complete close handshake");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_abrupt_disconnects_count_as_closed() {
        for kind in [
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::UnexpectedEof,
        ] {
            assert!(is_closed_error(&tungstenite::Error::Io(io::Error::from(kind))), "{kind:?}");
        }
        assert!(is_closed_error(&tungstenite::Error::ConnectionClosed));
        assert!(!is_closed_error(&tungstenite::Error::Io(io::Error::from(
            io::ErrorKind::PermissionDenied
        ))));
        assert!(!is_closed_error(&tungstenite::Error::Utf8));
    }

    #[tokio::test]
    async fn test_reset_peer_is_reported_as_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client_stream = TcpStream::connect(addr).await.unwrap();
        let (server_stream, _) = listener.accept().await.unwrap();
        // Zero linger turns the drop below into a TCP reset
        client_stream.set_linger(Some(Duration::ZERO)).unwrap();

        let mut client = WebSocketStream::from_raw_socket(client_stream, Role::Client, None).await;
        let mut server = WsTransport::new(
            WebSocketStream::from_raw_socket(server_stream, Role::Server, None).await,
            Duration::from_secs(5),
            Duration::from_secs(5),
        );

        client.send(Message::Text("last words".to_string())).await.unwrap();
        assert_eq!(
            server.receive().await.unwrap(),
            Some(Frame::Text("last words".to_string()))
        );

        drop(client);
        assert_eq!(server.receive().await.unwrap(), None);
    }
}
