//! Common types and traits used across the echobench library
//!
//! This module contains the wire message, the run configuration and the
//! client-side round-trip trait shared by every connection style.

pub mod config;
pub mod message;
pub mod test_utils;
pub mod traits;

pub use config::RunConfig;
pub use message::EchoMessage;
pub use test_utils::spawn_test_server;
pub use traits::EchoClient;
