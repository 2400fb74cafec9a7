use super::ServerConfig;
use crate::http::codec::keep_alive;
use crate::http::responder::text_response;
use crate::http::{HttpServerCodec, RequestEchoResponder};
use crate::stream::StreamEchoResponder;
use crate::ws::WsTransport;
use crate::ws::handshake::{is_upgrade_request, upgrade_response};
use crate::{EchoError, Result};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use http::header::CONNECTION;
use http::{Response, StatusCode};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::{signal, time::timeout};
use tokio_util::codec::Framed;
use tracing::{Instrument, debug, error, info, warn};

/// Path of the request/response endpoint
pub const API_PATH: &str = "/api";
/// Path of the streaming endpoint
pub const WS_PATH: &str = "/ws";

/// Echo server serving both connection styles on one port
///
/// `GET /api` and `PUT /api` are answered by a [`RequestEchoResponder`];
/// `GET /ws` is upgraded to a WebSocket and handed to a
/// [`StreamEchoResponder`] for the rest of the connection's life. Every
/// accepted connection runs in its own task and shares nothing with the
/// others.
///
/// # Examples
///
/// Server with graceful shutdown:
///
/// ```no_run
/// use echobench::server::{EchoServer, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = EchoServer::new(ServerConfig::default());
///     let shutdown_signal = server.shutdown_signal();
///
///     let server_handle = tokio::spawn(async move { server.run().await });
///
///     // Do other work...
///
///     let _ = shutdown_signal.send(());
///     server_handle.await??;
///     Ok(())
/// }
/// ```
pub struct EchoServer {
    config: ServerConfig,
    responder: RequestEchoResponder,
    shutdown_signal: Arc<tokio::sync::broadcast::Sender<()>>,
}

impl EchoServer {
    /// Creates a new echo server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_signal, _) = tokio::sync::broadcast::channel(1);
        Self {
            config,
            responder: RequestEchoResponder::new(),
            shutdown_signal: Arc::new(shutdown_signal),
        }
    }

    /// Returns a shutdown signal sender that can be used to gracefully shutdown the server
    pub fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()> {
        self.shutdown_signal.as_ref().clone()
    }

    /// Binds the configured address and serves until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await.map_err(|e| {
            EchoError::Config(format!("Failed to bind {}: {e}", self.config.bind_addr))
        })?;
        self.serve(listener).await
    }

    /// Serves connections from an already bound listener until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, "Echo server listening");

        let connection_count = Arc::new(AtomicUsize::new(0));
        let mut shutdown_rx = self.shutdown_signal.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let current_count = connection_count.load(Ordering::SeqCst);
                            if current_count >= self.config.max_connections {
                                warn!(%addr, current = current_count, limit = self.config.max_connections, "Connection rejected: limit reached");
                                continue;
                            }

                            let new_count = connection_count.fetch_add(1, Ordering::SeqCst) + 1;
                            info!(%addr, current = new_count, "Accepted connection");

                            if let Err(e) = stream.set_nodelay(true) {
                                debug!(%addr, error = %e, "Failed to set TCP_NODELAY");
                            }

                            let config = self.config.clone();
                            let responder = self.responder;
                            let connection_count = connection_count.clone();
                            let span = tracing::info_span!("connection", %addr);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, config, responder).instrument(span).await {
                                    error!(%addr, error = %e, "Error handling connection");
                                }
                                let final_count = connection_count.fetch_sub(1, Ordering::SeqCst) - 1;
                                info!(%addr, current = final_count, "Connection closed");
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping server");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Received internal shutdown signal, stopping server");
                    break;
                }
            }
        }

        info!("Echo server stopped");
        Ok(())
    }
}

/// What the router decided to do with one request
enum Route {
    Reply(Response<Bytes>),
    Upgrade(Response<Bytes>),
}

fn route(request: &http::Request<Bytes>, responder: &RequestEchoResponder) -> Route {
    match request.uri().path() {
        API_PATH => Route::Reply(responder.handle(request)),
        WS_PATH if is_upgrade_request(request) => match upgrade_response(request) {
            Ok(response) => Route::Upgrade(response),
            Err(reason) => {
                warn!(%reason, "Rejecting WebSocket upgrade");
                Route::Reply(text_response(StatusCode::BAD_REQUEST, reason))
            }
        },
        WS_PATH => Route::Reply(text_response(
            StatusCode::BAD_REQUEST,
            "Expected a WebSocket upgrade request".to_string(),
        )),
        path => Route::Reply(text_response(
            StatusCode::NOT_FOUND,
            format!("No route for {path}"),
        )),
    }
}

async fn send_response(
    framed: &mut Framed<TcpStream, HttpServerCodec>,
    response: Response<Bytes>,
    config: &ServerConfig,
) -> Result<()> {
    timeout(config.write_timeout, framed.send(response))
        .await
        .map_err(|_| EchoError::Timeout("Write timeout".to_string()))??;
    Ok(())
}

/// Serves HTTP exchanges on one connection until it closes or is upgraded
async fn handle_connection(
    stream: TcpStream,
    config: ServerConfig,
    responder: RequestEchoResponder,
) -> Result<()> {
    let mut framed = Framed::new(stream, HttpServerCodec::new(config.max_body_size));

    loop {
        let request = match timeout(config.read_timeout, framed.next()).await {
            Ok(Some(Ok(request))) => request,
            Ok(Some(Err(e))) => {
                warn!(error = %e, "Malformed HTTP request");
                let mut response = text_response(e.status(), e.to_string());
                response
                    .headers_mut()
                    .insert(CONNECTION, http::HeaderValue::from_static("close"));
                return send_response(&mut framed, response, &config).await;
            }
            Ok(None) => {
                debug!("Client closed connection");
                return Ok(());
            }
            Err(_) => {
                warn!("Read timeout");
                return Ok(());
            }
        };

        debug!(method = %request.method(), path = request.uri().path(), size = request.body().len(), "Received request");

        match route(&request, &responder) {
            Route::Reply(mut response) => {
                let keep = keep_alive(request.version(), request.headers());
                if !keep {
                    response
                        .headers_mut()
                        .insert(CONNECTION, http::HeaderValue::from_static("close"));
                }
                send_response(&mut framed, response, &config).await?;
                if !keep {
                    return Ok(());
                }
            }
            Route::Upgrade(response) => {
                send_response(&mut framed, response, &config).await?;
                let parts = framed.into_parts();
                let transport = WsTransport::from_upgraded(
                    parts.io,
                    parts.read_buf.to_vec(),
                    config.read_timeout,
                    config.write_timeout,
                    config.max_body_size,
                )
                .await;

                info!("WebSocket connection opened");
                return match StreamEchoResponder::new(transport).run().await {
                    Ok(echoed) => {
                        info!(echoed, "WebSocket connection closed");
                        Ok(())
                    }
                    Err(e) => {
                        info!(error = %e, "WebSocket connection closed");
                        Err(e)
                    }
                };
            }
        }
    }
}
