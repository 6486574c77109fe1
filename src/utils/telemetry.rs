// file: src/utils/telemetry.rs
// description: request timing and batch throughput metrics
// reference: https://docs.rs/tracing

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Measures one operation; latency reported to audit comes from here.
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        debug!("{} started", operation);
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        info!("{} finished in {}ms", self.operation, elapsed.as_millis());
        elapsed
    }

    pub fn checkpoint(&self, message: &str) {
        debug!("{}: {} (+{}ms)", self.operation, message, self.elapsed_ms());
    }

    pub fn warn_if_slow(&self, threshold: Duration, message: &str) {
        let elapsed = self.elapsed();
        if elapsed > threshold {
            warn!(
                "{} was slow: {} took {}ms, over the {}ms budget",
                self.operation,
                message,
                elapsed.as_millis(),
                threshold.as_millis()
            );
        }
    }
}

/// Wall-clock throughput plus per-question latency spread for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub operation: String,
    pub questions: usize,
    pub wall_ms: u64,
    pub questions_per_sec: f64,
    pub median_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl PerformanceMetrics {
    /// `latencies_ms` holds one entry per answered question, in any order.
    pub fn from_latencies(operation: &str, latencies_ms: &[u64], wall: Duration) -> Self {
        let wall_secs = wall.as_secs_f64();
        let questions_per_sec = if wall_secs > 0.0 {
            latencies_ms.len() as f64 / wall_secs
        } else {
            0.0
        };

        let mut sorted = latencies_ms.to_vec();
        sorted.sort_unstable();

        Self {
            operation: operation.to_string(),
            questions: sorted.len(),
            wall_ms: wall.as_millis() as u64,
            questions_per_sec,
            median_latency_ms: sorted.get(sorted.len() / 2).copied().unwrap_or(0),
            max_latency_ms: sorted.last().copied().unwrap_or(0),
        }
    }

    pub fn format(&self) -> String {
        format!(
            "{}: {} questions in {}ms ({:.2}/sec, median {}ms, max {}ms)",
            self.operation,
            self.questions,
            self.wall_ms,
            self.questions_per_sec,
            self.median_latency_ms,
            self.max_latency_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_from_latencies() {
        let metrics =
            PerformanceMetrics::from_latencies("batch", &[900, 100, 300, 500], Duration::from_secs(2));
        assert_eq!(metrics.questions, 4);
        assert_eq!(metrics.questions_per_sec, 2.0);
        assert_eq!(metrics.median_latency_ms, 500);
        assert_eq!(metrics.max_latency_ms, 900);
        assert_eq!(
            metrics.format(),
            "batch: 4 questions in 2000ms (2.00/sec, median 500ms, max 900ms)"
        );
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = PerformanceMetrics::from_latencies("batch", &[], Duration::ZERO);
        assert_eq!(metrics.questions_per_sec, 0.0);
        assert_eq!(metrics.median_latency_ms, 0);
        assert_eq!(metrics.max_latency_ms, 0);
    }

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::new("rag");
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10);
        timer.checkpoint("halfway");
        let elapsed = timer.finish();
        assert!(elapsed >= Duration::from_millis(10));
    }
}
