use crate::{EchoError, Result};
use async_trait::async_trait;
use bytes::Bytes;

/// Common trait for echo clients
///
/// One call to [`echo`](EchoClient::echo) is one round-trip: the payload is
/// sent and the call resolves with the single reply the server produced for
/// it. Both the WebSocket stream client and the HTTP client implement this,
/// which is what lets the benchmark drivers share one measurement loop.
#[async_trait]
pub trait EchoClient: Send {
    /// Sends data to the echo server and returns the echoed response
    async fn echo(&mut self, data: Bytes) -> Result<Bytes>;

    /// Releases the underlying channel
    ///
    /// Called exactly once by whoever opened the client, on every exit path.
    async fn close(&mut self) -> Result<()>;

    /// Sends a string and returns the echoed string
    async fn echo_string(&mut self, data: &str) -> Result<String> {
        let response = self.echo(Bytes::copy_from_slice(data.as_bytes())).await?;
        String::from_utf8(response.to_vec()).map_err(|e| EchoError::MalformedPayload(e.to_string()))
    }
}
