use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// One message on a persistent bidirectional channel
///
/// The echo path never looks inside a frame; text and binary are kept apart
/// only so a text frame goes back out as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}

impl Frame {
    /// Wraps a payload as text when it is valid UTF-8, binary otherwise
    pub fn from_payload(payload: Bytes) -> Self {
        match std::str::from_utf8(&payload) {
            Ok(text) => Frame::Text(text.to_owned()),
            Err(_) => Frame::Binary(payload),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Frame::Text(text) => text.as_bytes(),
            Frame::Binary(data) => data,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Frame::Text(text) => Bytes::from(text),
            Frame::Binary(data) => data,
        }
    }
}

/// A persistent, ordered, bidirectional message channel
///
/// Implementations own the connection. `receive` yields `Ok(None)` once the
/// peer has closed the channel (cleanly or not); that is the close event,
/// not an error. Frames come out of `receive` in the order the peer sent
/// them.
#[async_trait]
pub trait Transport: Send {
    /// Sends one frame
    async fn send(&mut self, frame: Frame) -> Result<()>;

    /// Waits for the next frame, or `None` when the peer has gone away
    async fn receive(&mut self) -> Result<Option<Frame>>;

    /// Closes the channel; further sends fail
    async fn close(&mut self) -> Result<()>;
}
