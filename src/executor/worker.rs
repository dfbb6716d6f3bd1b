// worker thread loop
use super::queue::TaskQueue;
use super::task::{Outcome, Task};
use crate::telemetry::Metrics;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub type WorkerId = usize;

// stats for each worker
#[derive(Debug, Default)]
pub struct WorkerState {
    pub tasks_executed: AtomicU64,
    pub tasks_panicked: AtomicU64,
    pub idle_time_ns: AtomicU64,
}

impl WorkerState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Point-in-time copy of one worker's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub id: WorkerId,
    pub tasks_executed: u64,
    pub tasks_panicked: u64,
    pub idle_time_ns: u64,
}

impl WorkerStats {
    pub(crate) fn read(id: WorkerId, state: &WorkerState) -> Self {
        Self {
            id,
            tasks_executed: state.tasks_executed.load(Ordering::Relaxed),
            tasks_panicked: state.tasks_panicked.load(Ordering::Relaxed),
            idle_time_ns: state.idle_time_ns.load(Ordering::Relaxed),
        }
    }
}

pub(crate) struct Worker {
    pub id: WorkerId,
    pub state: Arc<WorkerState>,
    pub metrics: Arc<Metrics>,
}

impl Worker {
    pub fn new(id: WorkerId, metrics: Arc<Metrics>) -> Self {
        Self {
            id,
            state: Arc::new(WorkerState::new()),
            metrics,
        }
    }

    // main loop: block for a task, run it, repeat until the queue says stop
    pub fn run(&self, queue: &TaskQueue) {
        tracing::trace!(worker = self.id, "worker started");

        loop {
            let idle_since = Instant::now();
            let Some(task) = queue.pop_blocking() else {
                break;
            };

            let idle_ns = idle_since.elapsed().as_nanos() as u64;
            self.state.idle_time_ns.fetch_add(idle_ns, Ordering::Relaxed);
            self.metrics.record_idle_time(idle_ns);

            self.execute_task(task);
        }

        tracing::trace!(worker = self.id, "worker stopped");
    }

    fn execute_task(&self, task: Task) {
        let tid = task.id;
        let start = Instant::now();
        self.metrics
            .record_queue_wait(start.duration_since(task.enqueue_time).as_nanos() as u64);

        // Task bodies catch their own panics; this guards the plumbing around
        // them so the thread survives no matter what.
        let outcome = match catch_unwind(AssertUnwindSafe(|| task.invoke())) {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::error!(worker = self.id, task = %tid, "task escaped panic isolation");
                Outcome::Panicked
            }
        };

        self.metrics
            .record_task_execution(start.elapsed().as_nanos() as u64);
        self.state.tasks_executed.fetch_add(1, Ordering::Relaxed);

        if outcome == Outcome::Panicked {
            self.state.tasks_panicked.fetch_add(1, Ordering::Relaxed);
            self.metrics.record_task_panic();
        }
    }
}
