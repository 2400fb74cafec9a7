use super::{Frame, Transport};
use crate::common::EchoClient;
use crate::{EchoError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Transport-level bounds for client connections
///
/// Drivers apply no timeouts of their own; whichever transport a client runs
/// on enforces these.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Read timeout for a single reply
    pub read_timeout: Duration,
    /// Write timeout for a single request
    pub write_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Maximum response size to prevent memory exhaustion
    pub max_response_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_response_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Builder for client configuration
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn max_response_size(mut self, size: usize) -> Self {
        self.config.max_response_size = size;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Echo client over any persistent [`Transport`]
///
/// Each [`echo`](EchoClient::echo) sends one frame and waits for exactly one
/// frame back; round-trips are never pipelined.
pub struct StreamClient<T: Transport> {
    transport: T,
}

impl<T: Transport> StreamClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: Transport> EchoClient for StreamClient<T> {
    async fn echo(&mut self, data: Bytes) -> Result<Bytes> {
        self.transport.send(Frame::from_payload(data)).await?;
        match self.transport.receive().await? {
            Some(frame) => Ok(frame.into_bytes()),
            None => Err(EchoError::ConnectionClosed),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{StreamEchoResponder, memory};

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfigBuilder::new()
            .read_timeout(Duration::from_secs(60))
            .write_timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_millis(100))
            .max_response_size(1024 * 1024)
            .build();

        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert_eq!(config.write_timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_millis(100));
        assert_eq!(config.max_response_size, 1024 * 1024);
    }

    #[tokio::test]
    async fn test_echo_over_memory_transport() {
        let (client, server) = memory::pair(4);
        let responder = tokio::spawn(StreamEchoResponder::new(server).run());

        let mut client = StreamClient::new(client);
        assert_eq!(client.echo_string("Hello, stream!").await.unwrap(), "Hello, stream!");
        let binary = Bytes::from_static(&[0xff, 0x00, 0xfe]);
        assert_eq!(client.echo(binary.clone()).await.unwrap(), binary);

        client.close().await.unwrap();
        assert!(client.transport().is_closed());
        assert_eq!(responder.await.unwrap().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_echo_fails_when_peer_gone() {
        let (client, mut server) = memory::pair(4);
        server.close().await.unwrap();

        let mut client = StreamClient::new(client);
        assert!(matches!(
            client.echo(Bytes::from_static(b"anyone?")).await,
            Err(EchoError::ConnectionClosed)
        ));
    }
}
