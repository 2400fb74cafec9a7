use super::{BenchmarkResult, Mode, Stage};
use crate::common::{EchoClient, EchoMessage};
use crate::http::HttpEchoClient;
use crate::stream::ClientConfig;
use crate::{EchoError, Result, ws};
use bytes::Bytes;
use tokio::time::Instant;
use tracing::{debug, info, warn};

fn connection_error(mode: Mode, stage: Stage, err: EchoError) -> EchoError {
    EchoError::Connection {
        mode,
        stage,
        reason: err.to_string(),
    }
}

/// Runs `count` sequential round-trips, checking every reply
async fn round_trips<C: EchoClient + ?Sized>(
    client: &mut C,
    mode: Mode,
    count: u64,
    payload_body: &str,
) -> Result<()> {
    for idx in 0..count {
        let message = EchoMessage::new(payload_body, idx);
        let encoded = message.encode()?;

        let reply = client
            .echo(Bytes::from(encoded.clone()))
            .await
            .map_err(|e| connection_error(mode, Stage::RoundTrip(idx), e))?;

        match EchoMessage::decode(&reply) {
            Ok(echoed) if echoed == message => {}
            _ => {
                return Err(EchoError::EchoMismatch {
                    mode,
                    idx,
                    sent: encoded,
                    received: String::from_utf8_lossy(&reply).into_owned(),
                });
            }
        }
    }
    Ok(())
}

/// Measures `count` round-trips over an already open client, then closes it
///
/// The clock covers only the round-trip loop. The client is closed whether
/// the loop succeeded or not; on failure no result is produced.
pub async fn drive<C: EchoClient>(
    mode: Mode,
    mut client: C,
    count: u64,
    payload_body: &str,
) -> Result<BenchmarkResult> {
    debug!(%mode, count, "Starting measured loop");
    let start = Instant::now();
    let outcome = round_trips(&mut client, mode, count, payload_body).await;
    let elapsed = start.elapsed();

    if let Err(e) = client.close().await {
        warn!(%mode, error = %e, "Failed to close connection after run");
    }
    outcome?;

    let result = BenchmarkResult::new(mode, count, elapsed);
    info!(%mode, count, elapsed_seconds = result.elapsed_seconds, rate_hz = result.rate_hz, "Run complete");
    Ok(result)
}

/// Benchmarks round-trips over one persistent WebSocket connection
#[derive(Debug, Clone, Default)]
pub struct StreamBenchmarkDriver {
    config: ClientConfig,
}

impl StreamBenchmarkDriver {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Opens a connection to `uri` and drives `count` round-trips over it
    pub async fn run(&self, uri: &str, count: u64, payload_body: &str) -> Result<BenchmarkResult> {
        let client = ws::connect(uri, &self.config)
            .await
            .map_err(|e| connection_error(Mode::Stream, Stage::Connect, e))?;
        drive(Mode::Stream, client, count, payload_body).await
    }
}

/// Benchmarks independent HTTP `PUT` exchanges
#[derive(Debug, Clone, Default)]
pub struct RequestBenchmarkDriver {
    config: ClientConfig,
}

impl RequestBenchmarkDriver {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Drives `count` request/response exchanges against `uri`
    pub async fn run(&self, uri: &str, count: u64, payload_body: &str) -> Result<BenchmarkResult> {
        let client = HttpEchoClient::connect(uri, self.config.clone())
            .await
            .map_err(|e| connection_error(Mode::Request, Stage::Connect, e))?;
        drive(Mode::Request, client, count, payload_body).await
    }
}
