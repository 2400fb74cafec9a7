//! Echo server
//!
//! One TCP listener serving the HTTP endpoint and the WebSocket endpoint.

pub mod config;
pub mod echo_server;


pub use config::ServerConfig;
pub use echo_server::{API_PATH, EchoServer, WS_PATH};
