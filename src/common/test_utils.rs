use crate::server::{EchoServer, ServerConfig};
use crate::{EchoError, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Starts an echo server on an ephemeral loopback port for tests
///
/// The listener is bound before this returns, so clients can connect to the
/// returned address straight away. `config.bind_addr` is ignored. The
/// returned sender stops the server gracefully; aborting the handle also
/// works.
pub async fn spawn_test_server(
    config: ServerConfig,
) -> Result<(JoinHandle<Result<()>>, SocketAddr, broadcast::Sender<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| EchoError::Config(format!("Failed to bind listener: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| EchoError::Config(format!("Failed to get local address: {e}")))?;

    let server = EchoServer::new(ServerConfig {
        bind_addr: addr,
        ..config
    });
    let shutdown = server.shutdown_signal();

    let server_handle = tokio::spawn(async move { server.serve(listener).await });

    Ok((server_handle, addr, shutdown))
}
