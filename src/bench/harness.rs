use super::{BenchmarkResult, RequestBenchmarkDriver, StreamBenchmarkDriver};
use crate::Result;
use crate::common::RunConfig;
use crate::stream::ClientConfig;
use tracing::info;

/// Runs one benchmark session: the streaming phase, then the HTTP phase
///
/// Each result is handed to the reporter as soon as its run finishes, so a
/// failure in a later phase does not hide the samples already taken.
#[derive(Debug, Clone)]
pub struct Harness {
    run: RunConfig,
    client: ClientConfig,
    skip_http: bool,
}

impl Harness {
    pub fn new(run: RunConfig, client: ClientConfig) -> Self {
        Self {
            run,
            client,
            skip_http: false,
        }
    }

    /// Leaves out the HTTP request/response phase
    pub fn skip_http(mut self, skip: bool) -> Self {
        self.skip_http = skip;
        self
    }

    pub async fn run<F>(&self, mut report: F) -> Result<Vec<BenchmarkResult>>
    where
        F: FnMut(&BenchmarkResult),
    {
        let mut results = Vec::new();
        let count = self.run.message_count;
        let body = self.run.payload_body.as_str();

        let uri = self.run.ws_uri();
        info!(%uri, count, "Running WebSocket benchmark");
        let result = StreamBenchmarkDriver::new(self.client.clone())
            .run(&uri, count, body)
            .await?;
        report(&result);
        results.push(result);

        if self.skip_http {
            info!("Skipping HTTP benchmark");
            return Ok(results);
        }

        let uri = self.run.http_uri();
        info!(%uri, count, "Running HTTP benchmark");
        let result = RequestBenchmarkDriver::new(self.client.clone())
            .run(&uri, count, body)
            .await?;
        report(&result);
        results.push(result);

        Ok(results)
    }
}
