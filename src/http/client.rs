use super::codec::{HttpClientCodec, keep_alive};
use crate::common::EchoClient;
use crate::stream::ClientConfig;
use crate::{EchoError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use http::header::{CONTENT_TYPE, HOST};
use http::{Method, Request, Response, StatusCode, Uri};
use std::io;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::debug;

/// HTTP echo client
///
/// Every [`echo`](EchoClient::echo) is an independent `PUT` exchange. The
/// TCP connection underneath is kept alive and reused for the next exchange
/// unless the server asked to close it, in which case the next exchange
/// opens a fresh one.
///
/// # Examples
///
/// ```no_run
/// use echobench::{ClientConfig, EchoClient, HttpEchoClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut client = HttpEchoClient::connect("http://127.0.0.1:8888/api", ClientConfig::default()).await?;
///     println!("Server says: {}", client.probe().await?);
///
///     let reply = client.echo_string(r#"{"body":"hello, world!","idx":0}"#).await?;
///     println!("Server echoed: {reply}");
///     client.close().await?;
///     Ok(())
/// }
/// ```
pub struct HttpEchoClient {
    uri: Uri,
    host: String,
    port: u16,
    config: ClientConfig,
    conn: Option<Framed<TcpStream, HttpClientCodec>>,
}

impl HttpEchoClient {
    /// Creates a client for `uri` without connecting yet
    pub fn new(uri: &str, config: ClientConfig) -> Result<Self> {
        let uri: Uri = uri
            .parse()
            .map_err(|e| EchoError::Config(format!("Invalid URI {uri:?}: {e}")))?;
        if uri.scheme_str() != Some("http") {
            return Err(EchoError::Config(format!(
                "Unsupported scheme in {uri}: only http is supported"
            )));
        }
        let host = uri
            .host()
            .ok_or_else(|| EchoError::Config(format!("Missing host in {uri}")))?
            .to_string();
        let port = uri.port_u16().unwrap_or(80);

        Ok(Self {
            uri,
            host,
            port,
            config,
            conn: None,
        })
    }

    /// Creates a client and opens its first connection
    pub async fn connect(uri: &str, config: ClientConfig) -> Result<Self> {
        let mut client = Self::new(uri, config)?;
        client.channel().await?;
        Ok(client)
    }

    /// Whether a kept-alive connection is currently held
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    async fn open(&self) -> Result<Framed<TcpStream, HttpClientCodec>> {
        let stream = timeout(
            self.config.connect_timeout,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        .map_err(|_| EchoError::Timeout("Connection timeout".to_string()))??;
        stream.set_nodelay(true)?;
        debug!(host = %self.host, port = self.port, "HTTP connection opened");
        Ok(Framed::new(
            stream,
            HttpClientCodec::new(self.config.max_response_size),
        ))
    }

    async fn channel(&mut self) -> Result<&mut Framed<TcpStream, HttpClientCodec>> {
        if self.conn.is_none() {
            self.conn = Some(self.open().await?);
        }
        self.conn.as_mut().ok_or(EchoError::ConnectionClosed)
    }

    fn request(&self, method: Method, body: Bytes) -> Result<Request<Bytes>> {
        let mut builder = Request::builder()
            .method(method)
            .uri(self.uri.clone())
            .header(HOST, format!("{}:{}", self.host, self.port));
        if !body.is_empty() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        builder.body(body).map_err(|e| EchoError::Http(e.to_string()))
    }

    /// Performs one request/response exchange on the pooled connection
    ///
    /// Any failure drops the pooled connection so a late reply can never be
    /// read as the answer to a later request. If a reused connection turns
    /// out to have been closed by the server before it answered, the
    /// request is sent once more on a fresh connection.
    pub async fn exchange(&mut self, method: Method, body: Bytes) -> Result<Response<Bytes>> {
        let reused = self.conn.is_some();
        match self.attempt(method.clone(), body.clone()).await {
            Err(e) if reused && is_stale_connection(&e) => {
                debug!(error = %e, "Pooled connection went stale, reconnecting");
                self.attempt(method, body).await
            }
            outcome => outcome,
        }
    }

    async fn attempt(&mut self, method: Method, body: Bytes) -> Result<Response<Bytes>> {
        let request = self.request(method, body)?;
        let outcome = self.round_trip(request).await;
        match &outcome {
            Ok(response) if !keep_alive(response.version(), response.headers()) => {
                debug!("Server closed keep-alive connection");
                self.conn = None;
            }
            Ok(_) => {}
            Err(_) => self.conn = None,
        }
        outcome
    }

    async fn round_trip(&mut self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let write_timeout = self.config.write_timeout;
        let read_timeout = self.config.read_timeout;
        let conn = self.channel().await?;

        timeout(write_timeout, conn.send(request))
            .await
            .map_err(|_| EchoError::Timeout("Write timeout".to_string()))??;

        match timeout(read_timeout, conn.next())
            .await
            .map_err(|_| EchoError::Timeout("Read timeout".to_string()))?
        {
            Some(response) => Ok(response?),
            None => Err(EchoError::ConnectionClosed),
        }
    }

    /// Sends the bare `GET` probe and returns the server's acknowledgement text
    pub async fn probe(&mut self) -> Result<String> {
        let response = self.exchange(Method::GET, Bytes::new()).await?;
        let body = successful_body(response)?;
        String::from_utf8(body.to_vec()).map_err(|e| EchoError::MalformedPayload(e.to_string()))
    }
}

/// Whether `err` means the server had already dropped the connection
fn is_stale_connection(err: &EchoError) -> bool {
    match err {
        EchoError::ConnectionClosed => true,
        EchoError::Io(e) => matches!(
            e.kind(),
            io::ErrorKind::BrokenPipe
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::UnexpectedEof
        ),
        _ => false,
    }
}

fn successful_body(response: Response<Bytes>) -> Result<Bytes> {
    if response.status() != StatusCode::OK {
        return Err(EchoError::Http(format!(
            "unexpected status {}: {}",
            response.status(),
            String::from_utf8_lossy(response.body())
        )));
    }
    Ok(response.into_body())
}

#[async_trait]
impl EchoClient for HttpEchoClient {
    async fn echo(&mut self, data: Bytes) -> Result<Bytes> {
        let response = self.exchange(Method::PUT, data).await?;
        successful_body(response)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            let mut stream = conn.into_inner();
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "Error shutting down HTTP connection");
            }
        }
        Ok(())
    }
}
