//! Persistent-connection echo functionality
//!
//! This module provides the transport abstraction every streaming connection
//! goes through, the server-side responder that echoes a whole stream, and
//! the client that drives round-trips over it. Concrete transports live in
//! [`crate::ws`] and [`memory`].

pub mod client;
pub mod memory;
pub mod responder;
pub mod transport;

pub use client::{ClientConfig, ClientConfigBuilder, StreamClient};
pub use memory::MemoryTransport;
pub use responder::StreamEchoResponder;
pub use transport::{Frame, Transport};
