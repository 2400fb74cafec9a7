use super::Mode;
use std::fmt;
use std::time::Duration;

/// Throughput sample produced by one driver run
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkResult {
    pub mode: Mode,
    /// Round-trips completed
    pub count: u64,
    /// Wall-clock time of the measured loop
    pub elapsed_seconds: f64,
    /// `count / elapsed_seconds`
    pub rate_hz: f64,
}

impl BenchmarkResult {
    pub fn new(mode: Mode, count: u64, elapsed: Duration) -> Self {
        Self::from_secs(mode, count, elapsed.as_secs_f64())
    }

    /// Builds a result from a measured loop time
    ///
    /// The rate is `0.0` when there is nothing to divide: no round-trips, or
    /// a loop too fast for the clock to register.
    pub fn from_secs(mode: Mode, count: u64, elapsed_seconds: f64) -> Self {
        let rate_hz = if count == 0 || elapsed_seconds <= 0.0 {
            0.0
        } else {
            count as f64 / elapsed_seconds
        };
        Self {
            mode,
            count,
            elapsed_seconds,
            rate_hz,
        }
    }
}

impl fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: sent and received {} messages in {:.2} secs, rate = {:.2} Hz",
            self.mode, self.count, self.elapsed_seconds, self.rate_hz
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_is_plain_division() {
        let result = BenchmarkResult::from_secs(Mode::Stream, 1000, 2.0);
        assert_eq!(result.rate_hz, 500.0);

        let result = BenchmarkResult::new(Mode::Request, 3, Duration::from_millis(1500));
        assert_eq!(result.elapsed_seconds, 1.5);
        assert_eq!(result.rate_hz, 2.0);
    }

    #[test]
    fn test_zero_count_has_zero_rate() {
        let result = BenchmarkResult::new(Mode::Stream, 0, Duration::ZERO);
        assert_eq!(result.rate_hz, 0.0);
    }

    #[test]
    fn test_unmeasurably_fast_run_has_finite_rate() {
        let result = BenchmarkResult::new(Mode::Stream, 5, Duration::ZERO);
        assert_eq!(result.count, 5);
        assert_eq!(result.rate_hz, 0.0);
        assert!(result.to_string().ends_with("rate = 0.00 Hz"));
    }

    #[test]
    fn test_report_line() {
        let result = BenchmarkResult::from_secs(Mode::Stream, 1000, 0.25);
        assert_eq!(
            result.to_string(),
            "WebSocket: sent and received 1000 messages in 0.25 secs, rate = 4000.00 Hz"
        );

        let result = BenchmarkResult::from_secs(Mode::Request, 10, 4.0);
        assert_eq!(
            result.to_string(),
            "HTTP PUT: sent and received 10 messages in 4.00 secs, rate = 2.50 Hz"
        );
    }
}
