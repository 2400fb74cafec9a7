//! In-process transport pair
//!
//! Two [`MemoryTransport`] ends joined by bounded channels. Used to exercise
//! responders and drivers without sockets.

use super::{Frame, Transport};
use crate::{EchoError, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// One end of an in-memory channel created by [`pair`]
#[derive(Debug)]
pub struct MemoryTransport {
    tx: Option<mpsc::Sender<Frame>>,
    rx: mpsc::Receiver<Frame>,
}

/// Creates two connected ends, each buffering up to `capacity` frames
pub fn pair(capacity: usize) -> (MemoryTransport, MemoryTransport) {
    let (a_tx, b_rx) = mpsc::channel(capacity);
    let (b_tx, a_rx) = mpsc::channel(capacity);
    (
        MemoryTransport {
            tx: Some(a_tx),
            rx: a_rx,
        },
        MemoryTransport {
            tx: Some(b_tx),
            rx: b_rx,
        },
    )
}

impl MemoryTransport {
    /// Whether `close` has been called on this end
    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, frame: Frame) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(EchoError::ConnectionClosed)?;
        tx.send(frame).await.map_err(|_| EchoError::ConnectionClosed)
    }

    async fn receive(&mut self) -> Result<Option<Frame>> {
        Ok(self.rx.recv().await)
    }

    async fn close(&mut self) -> Result<()> {
        self.tx = None;
        self.rx.close();
        Ok(())
    }
}
