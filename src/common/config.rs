/// Configuration for one benchmark session
///
/// Built once at process start and handed by value to the harness; every
/// driver run reads from it and nothing mutates it afterwards.
///
/// # Examples
///
/// ```
/// use echobench::common::RunConfig;
///
/// let config = RunConfig {
///     host: "127.0.0.1".to_string(),
///     port: 8888,
///     message_count: 1000,
///     payload_body: "hello, world!".to_string(),
/// };
/// assert_eq!(config.ws_uri(), "ws://127.0.0.1:8888/ws");
/// assert_eq!(config.http_uri(), "http://127.0.0.1:8888/api");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Server host name or address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Number of round-trips per driver run
    pub message_count: u64,
    /// `body` field of every message sent
    pub payload_body: String,
}

impl RunConfig {
    /// URI of the streaming endpoint
    pub fn ws_uri(&self) -> String {
        format!("ws://{}:{}/ws", self.host, self.port)
    }

    /// URI of the request/response endpoint
    pub fn http_uri(&self) -> String {
        format!("http://{}:{}/api", self.host, self.port)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
            message_count: 1000,
            payload_body: "hello, world!".to_string(),
        }
    }
}
