//! WebSocket transport
//!
//! Client connections are opened with [`connect`]; server connections are
//! built from a TCP stream after the router has answered the upgrade with
//! [`handshake::upgrade_response`].

pub mod handshake;
pub mod transport;

pub use transport::{WsEchoClient, WsTransport, connect};
