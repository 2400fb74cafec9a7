use crate::bench::{Mode, Stage};
use crate::http::codec::HttpCodecError;
use thiserror::Error;

/// Error types for the echobench library
#[derive(Error, Debug)]
pub enum EchoError {
    /// Socket-level errors (bind, connect, read, write)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket protocol or handshake errors
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// HTTP framing errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// A request or reply body could not be decoded into an `EchoMessage`
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The channel was used after it was closed
    #[error("Connection already closed")]
    ConnectionClosed,

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A benchmark run could not establish or keep its connection
    #[error("{mode} run failed to {stage}: {reason}")]
    Connection {
        mode: Mode,
        stage: Stage,
        reason: String,
    },

    /// The reply to a round-trip differed from what was sent
    #[error("{mode} echo mismatch at round-trip {idx}: sent {sent}, received {received}")]
    EchoMismatch {
        mode: Mode,
        idx: u64,
        sent: String,
        received: String,
    },
}

impl From<HttpCodecError> for EchoError {
    fn from(err: HttpCodecError) -> Self {
        match err {
            HttpCodecError::Io(e) => EchoError::Io(e),
            other => EchoError::Http(other.to_string()),
        }
    }
}

/// Result type for the echobench library
pub type Result<T> = std::result::Result<T, EchoError>;

pub mod bench;
pub mod common;
pub mod http;
pub mod server;
pub mod stream;
pub mod ws;

// Re-export main types for convenience
pub use bench::{BenchmarkResult, Harness, RequestBenchmarkDriver, StreamBenchmarkDriver};
pub use common::{EchoClient, EchoMessage, RunConfig};
pub use http::{HttpEchoClient, RequestEchoResponder};
pub use server::{EchoServer, ServerConfig};
pub use stream::{ClientConfig, ClientConfigBuilder, StreamClient, StreamEchoResponder, Transport};
pub use ws::WsTransport;
