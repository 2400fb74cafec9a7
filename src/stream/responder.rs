use super::Transport;
use crate::{EchoError, Result};
use tracing::{debug, info, trace, warn};

/// Echoes every frame of one persistent connection back to its sender
///
/// Owns the transport for its whole life. Frames are written back in the
/// order they arrived and the next frame is not read until the previous one
/// has been written. The loop ends when the peer closes, when the transport
/// reports an error, or when the transport's read timeout fires; in every
/// case the transport is closed before [`run`](Self::run) returns.
///
/// # Examples
///
/// ```
/// use echobench::stream::{memory, Frame, StreamEchoResponder, Transport};
///
/// # tokio_test::block_on(async {
/// let (mut client, server) = memory::pair(8);
/// let responder = tokio::spawn(StreamEchoResponder::new(server).run());
///
/// client.send(Frame::Text("ping".into())).await.unwrap();
/// assert_eq!(client.receive().await.unwrap(), Some(Frame::Text("ping".into())));
///
/// client.close().await.unwrap();
/// assert_eq!(responder.await.unwrap().unwrap(), 1);
/// # });
/// ```
pub struct StreamEchoResponder<T: Transport> {
    transport: T,
}

impl<T: Transport> StreamEchoResponder<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Runs the echo loop to completion and returns how many frames were echoed
    pub async fn run(mut self) -> Result<u64> {
        let outcome = self.echo_frames().await;
        if let Err(e) = self.transport.close().await {
            debug!(error = %e, "Error closing stream after echo loop");
        }
        outcome
    }

    async fn echo_frames(&mut self) -> Result<u64> {
        let mut echoed = 0u64;

        loop {
            let frame = match self.transport.receive().await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!(echoed, "Peer closed stream");
                    return Ok(echoed);
                }
                Err(EchoError::Timeout(reason)) => {
                    warn!(echoed, %reason, "Read timeout");
                    return Ok(echoed);
                }
                Err(e) => return Err(e),
            };

            let size = frame.len();
            trace!(size, "Received frame");
            match self.transport.send(frame).await {
                Ok(()) => {}
                Err(EchoError::ConnectionClosed) => {
                    info!(echoed, "Peer closed stream before echo was written");
                    return Ok(echoed);
                }
                Err(e) => return Err(e),
            }
            echoed += 1;
            trace!(size, "Echoed frame");
        }
    }
}
