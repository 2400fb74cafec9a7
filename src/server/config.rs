use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the echo server
///
/// # Examples
///
/// ```
/// use echobench::server::ServerConfig;
/// use std::time::Duration;
///
/// let config = ServerConfig {
///     bind_addr: "127.0.0.1:8888".parse().unwrap(),
///     max_connections: 100,
///     read_timeout: Duration::from_secs(30),
///     write_timeout: Duration::from_secs(30),
///     max_body_size: 64 * 1024,
/// };
/// ```
///
/// Using the default configuration:
///
/// ```
/// use echobench::server::ServerConfig;
///
/// let config = ServerConfig::default();
/// assert_eq!(config.bind_addr.port(), 8888);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Idle time after which a connection is dropped
    pub read_timeout: Duration,
    /// Write timeout for connections
    pub write_timeout: Duration,
    /// Largest HTTP body or WebSocket message accepted
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8888)),
            max_connections: 1000,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}
