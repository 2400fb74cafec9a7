use crate::{EchoError, Result};
use serde::{Deserialize, Serialize};

/// One echo round-trip payload
///
/// Serialized as a JSON object with `body` first and `idx` second, so the
/// encoding of a given message is always the same byte sequence. The same
/// encoding is used for HTTP bodies and WebSocket text frames.
///
/// # Examples
///
/// ```
/// use echobench::EchoMessage;
///
/// let message = EchoMessage::new("hello, world!", 7);
/// let encoded = message.encode().unwrap();
/// assert_eq!(encoded, r#"{"body":"hello, world!","idx":7}"#);
/// assert_eq!(EchoMessage::decode(encoded.as_bytes()).unwrap(), message);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EchoMessage {
    pub body: String,
    pub idx: u64,
}

impl EchoMessage {
    pub fn new(body: impl Into<String>, idx: u64) -> Self {
        Self {
            body: body.into(),
            idx,
        }
    }

    /// Encodes the message into its canonical text form
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| EchoError::MalformedPayload(e.to_string()))
    }

    /// Decodes a message, rejecting anything that is not exactly `{body, idx}`
    pub fn decode(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| EchoError::MalformedPayload(e.to_string()))
    }
}
