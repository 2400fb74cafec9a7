//! Benchmark drivers
//!
//! Both drivers run the same measured loop: build `EchoMessage{body, idx}`,
//! send it, wait for its echo, and require the decoded echo to equal what
//! was sent before starting the next round-trip. They differ only in how
//! the channel underneath is opened.

pub mod driver;
pub mod harness;
pub mod result;

use std::fmt;

pub use driver::{RequestBenchmarkDriver, StreamBenchmarkDriver, drive};
pub use harness::Harness;
pub use result::BenchmarkResult;

/// Connection style a run measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Persistent WebSocket connection
    Stream,
    /// Independent HTTP `PUT` exchanges
    Request,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Stream => write!(f, "WebSocket"),
            Mode::Request => write!(f, "HTTP PUT"),
        }
    }
}

/// Point in a run where a connection failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    RoundTrip(u64),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Connect => write!(f, "connect"),
            Stage::RoundTrip(idx) => write!(f, "complete round-trip {idx}"),
        }
    }
}
