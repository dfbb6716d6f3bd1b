//! Metrics collection for pool monitoring.

use hdrhistogram::Histogram;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// one hour in nanoseconds
const MAX_TRACKED_NS: u64 = 3_600_000_000_000;

/// Pool metrics collector, shared by every worker of one pool.
#[derive(Debug)]
pub struct Metrics {
    tasks_submitted: AtomicU64,
    tasks_rejected: AtomicU64,
    tasks_executed: AtomicU64,
    tasks_panicked: AtomicU64,

    idle_time_ns: AtomicU64,
    busy_time_ns: AtomicU64,
    queue_wait_ns: AtomicU64,

    // execution time per task
    latency_histogram: RwLock<Histogram<u64>>,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        let histogram = Histogram::new_with_max(MAX_TRACKED_NS, 3)
            .expect("histogram bounds are constant and valid");

        Self {
            tasks_submitted: AtomicU64::new(0),
            tasks_rejected: AtomicU64::new(0),
            tasks_executed: AtomicU64::new(0),
            tasks_panicked: AtomicU64::new(0),
            idle_time_ns: AtomicU64::new(0),
            busy_time_ns: AtomicU64::new(0),
            queue_wait_ns: AtomicU64::new(0),
            latency_histogram: RwLock::new(histogram),
            start_time: Instant::now(),
        }
    }

    pub fn record_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a submission refused because the pool was stopped
    pub fn record_rejected(&self) {
        self.tasks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished task (successful or not) and how long it ran
    pub fn record_task_execution(&self, duration_ns: u64) {
        self.tasks_executed.fetch_add(1, Ordering::Relaxed);
        self.busy_time_ns.fetch_add(duration_ns, Ordering::Relaxed);

        let _ = self
            .latency_histogram
            .write()
            .record(duration_ns.min(MAX_TRACKED_NS));
    }

    pub fn record_task_panic(&self) {
        self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Record time a task spent queued before a worker claimed it
    pub fn record_queue_wait(&self, duration_ns: u64) {
        self.queue_wait_ns.fetch_add(duration_ns, Ordering::Relaxed);
    }

    /// Record time a worker spent blocked waiting for work
    pub fn record_idle_time(&self, duration_ns: u64) {
        self.idle_time_ns.fetch_add(duration_ns, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let histogram = self.latency_histogram.read();
        let tasks_executed = self.tasks_executed.load(Ordering::Relaxed);
        let queue_wait_ns = self.queue_wait_ns.load(Ordering::Relaxed);

        MetricsSnapshot {
            timestamp: Instant::now(),
            uptime: self.start_time.elapsed(),
            tasks_submitted: self.tasks_submitted.load(Ordering::Relaxed),
            tasks_rejected: self.tasks_rejected.load(Ordering::Relaxed),
            tasks_executed,
            tasks_panicked: self.tasks_panicked.load(Ordering::Relaxed),
            idle_time_ns: self.idle_time_ns.load(Ordering::Relaxed),
            busy_time_ns: self.busy_time_ns.load(Ordering::Relaxed),
            avg_queue_wait_ns: if tasks_executed > 0 {
                queue_wait_ns / tasks_executed
            } else {
                0
            },
            avg_latency_ns: if histogram.len() > 0 {
                histogram.mean() as u64
            } else {
                0
            },
            p50_latency_ns: histogram.value_at_quantile(0.50),
            p95_latency_ns: histogram.value_at_quantile(0.95),
            p99_latency_ns: histogram.value_at_quantile(0.99),
            max_latency_ns: histogram.max(),
        }
    }

    pub fn reset(&self) {
        self.tasks_submitted.store(0, Ordering::Relaxed);
        self.tasks_rejected.store(0, Ordering::Relaxed);
        self.tasks_executed.store(0, Ordering::Relaxed);
        self.tasks_panicked.store(0, Ordering::Relaxed);
        self.idle_time_ns.store(0, Ordering::Relaxed);
        self.busy_time_ns.store(0, Ordering::Relaxed);
        self.queue_wait_ns.store(0, Ordering::Relaxed);
        self.latency_histogram.write().reset();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub timestamp: Instant,
    pub uptime: Duration,
    pub tasks_submitted: u64,
    pub tasks_rejected: u64,
    pub tasks_executed: u64,
    pub tasks_panicked: u64,
    pub idle_time_ns: u64,
    pub busy_time_ns: u64,
    pub avg_queue_wait_ns: u64,
    pub avg_latency_ns: u64,
    pub p50_latency_ns: u64,
    pub p95_latency_ns: u64,
    pub p99_latency_ns: u64,
    pub max_latency_ns: u64,
}

impl MetricsSnapshot {
    /// Fraction of worker time spent running tasks (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        let total_time = self.idle_time_ns + self.busy_time_ns;
        if total_time == 0 {
            return 0.0;
        }
        self.busy_time_ns as f64 / total_time as f64
    }

    pub fn tasks_per_second(&self) -> f64 {
        let seconds = self.uptime.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.tasks_executed as f64 / seconds
    }

    /// Submitted tasks that have not finished yet
    pub fn in_flight(&self) -> u64 {
        self.tasks_submitted.saturating_sub(self.tasks_executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_basic() {
        let metrics = Metrics::new();

        metrics.record_submitted();
        metrics.record_submitted();
        metrics.record_task_execution(1000);
        metrics.record_task_execution(2000);
        metrics.record_task_panic();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tasks_submitted, 2);
        assert_eq!(snapshot.tasks_executed, 2);
        assert_eq!(snapshot.tasks_panicked, 1);
        assert_eq!(snapshot.in_flight(), 0);
        assert!(snapshot.avg_latency_ns > 0);
    }

    #[test]
    fn test_queue_wait_average() {
        let metrics = Metrics::new();

        metrics.record_queue_wait(100);
        metrics.record_queue_wait(300);
        metrics.record_task_execution(10);
        metrics.record_task_execution(10);

        assert_eq!(metrics.snapshot().avg_queue_wait_ns, 200);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = Metrics::new();

        metrics.record_task_execution(1000);
        metrics.record_rejected();
        assert_eq!(metrics.snapshot().tasks_executed, 1);

        metrics.reset();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tasks_executed, 0);
        assert_eq!(snapshot.tasks_rejected, 0);
    }

    #[test]
    fn test_utilization() {
        let mut snapshot = MetricsSnapshot {
            timestamp: Instant::now(),
            uptime: Duration::from_secs(1),
            tasks_submitted: 0,
            tasks_rejected: 0,
            tasks_executed: 0,
            tasks_panicked: 0,
            idle_time_ns: 1_000_000_000,
            busy_time_ns: 1_000_000_000,
            avg_queue_wait_ns: 0,
            avg_latency_ns: 0,
            p50_latency_ns: 0,
            p95_latency_ns: 0,
            p99_latency_ns: 0,
            max_latency_ns: 0,
        };

        assert_eq!(snapshot.utilization(), 0.5);

        snapshot.busy_time_ns = 3_000_000_000;
        assert_eq!(snapshot.utilization(), 0.75);
    }
}
