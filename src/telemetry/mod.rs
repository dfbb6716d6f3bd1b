//! Pool metrics.
//!
//! With the `telemetry` feature enabled, workers record counters and latency
//! histograms into a shared [`Metrics`]. Without it, a no-op stub with the
//! same recording API is compiled in so call sites stay unconditional.

#[cfg(feature = "telemetry")]
pub mod metrics;

#[cfg(feature = "telemetry")]
pub use metrics::{Metrics, MetricsSnapshot};

// Stub implementation when telemetry is disabled
#[cfg(not(feature = "telemetry"))]
pub mod metrics {
    #[derive(Debug, Clone, Default)]
    pub struct Metrics;

    impl Metrics {
        pub fn new() -> Self { Self }
        pub fn record_submitted(&self) {}
        pub fn record_rejected(&self) {}
        pub fn record_task_execution(&self, _: u64) {}
        pub fn record_task_panic(&self) {}
        pub fn record_queue_wait(&self, _: u64) {}
        pub fn record_idle_time(&self, _: u64) {}
    }
}

#[cfg(not(feature = "telemetry"))]
pub use metrics::Metrics;
