use super::panic_handler::{PanicHandler, PanicStrategy};
use super::promise::{self, TaskHandle};
use super::queue::TaskQueue;
use super::task::{Outcome, Task, TaskId};
use super::worker::{Worker, WorkerId, WorkerState, WorkerStats};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::telemetry::Metrics;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

#[cfg(feature = "telemetry")]
use crate::telemetry::MetricsSnapshot;

#[cfg(target_os = "linux")]
fn pin_thread_to_core(core_id: usize) {
    let core_id = core_id % num_cpus::get().max(1);
    unsafe {
        let mut cpuset: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core_id, &mut cpuset);
        let result = libc::sched_setaffinity(
            0, // current thread
            std::mem::size_of::<libc::cpu_set_t>(),
            &cpuset,
        );
        if result != 0 {
            let current = thread::current();
            tracing::warn!(
                thread = current.name().unwrap_or("unknown"),
                core_id,
                "failed to pin worker to core"
            );
        }
    }
}

/// A fixed set of worker threads fed from one shared FIFO queue.
///
/// Tasks are run to completion in submission order per dequeue. Shutdown
/// (explicit or on drop) stops intake, lets the workers drain everything
/// already queued and joins them.
///
/// ```no_run
/// use drainpool::WorkerPool;
///
/// let pool = WorkerPool::new(4)?;
/// let handle = pool.submit(|| 6 * 7)?;
/// assert_eq!(handle.wait()?, 42);
/// # Ok::<(), drainpool::Error>(())
/// ```
pub struct WorkerPool {
    lifecycle: Mutex<Lifecycle>,
    terminated: Condvar,
    worker_threads: Vec<ThreadId>,
    states: Vec<(WorkerId, Arc<WorkerState>)>,
    queue: Arc<TaskQueue>,
    panic_handler: Arc<PanicHandler>,
    metrics: Arc<Metrics>,
    num_threads: usize,
}

// Join bookkeeping. Exactly one caller joins; everyone else waits on
// `WorkerPool::terminated` until `joined` is set.
#[derive(Debug, Default)]
struct Lifecycle {
    threads: Vec<JoinHandle<()>>,
    joining: bool,
    joined: bool,
}

impl WorkerPool {
    /// Create a pool with `num_threads` workers and default settings.
    pub fn new(num_threads: usize) -> Result<Self> {
        Self::with_config(&Config::with_threads(num_threads))
    }

    pub fn with_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let num_threads = config.worker_threads();
        if num_threads == 0 {
            return Err(Error::config("need at least 1 thread"));
        }

        let queue = Arc::new(TaskQueue::new());
        let panic_handler = Arc::new(PanicHandler::new(config.panic_strategy));
        let metrics = Arc::new(Metrics::new());

        let mut threads = Vec::with_capacity(num_threads);
        let mut states = Vec::with_capacity(num_threads);

        for id in 0..num_threads {
            let worker = Worker::new(id, metrics.clone());
            states.push((id, worker.state.clone()));

            let queue_clone = queue.clone();
            let name = format!("{}-{}", config.thread_name_prefix, id);

            let mut builder = thread::Builder::new().name(name);

            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            let pin_workers = config.pin_workers;
            let spawned = builder.spawn(move || {
                #[cfg(target_os = "linux")]
                if pin_workers {
                    pin_thread_to_core(id);
                }
                #[cfg(not(target_os = "linux"))]
                let _ = pin_workers;

                worker.run(&queue_clone);
            });

            match spawned {
                Ok(thread) => threads.push(thread),
                Err(e) => {
                    tracing::error!(worker = id, error = %e, "failed to spawn worker thread");
                    // don't leak the workers that did start
                    queue.close();
                    for thread in threads {
                        let _ = thread.join();
                    }
                    return Err(Error::executor(format!("spawn failed: {}", e)));
                }
            }
        }

        tracing::debug!(num_threads, "worker pool started");

        let worker_threads = threads.iter().map(|t| t.thread().id()).collect();

        Ok(Self {
            lifecycle: Mutex::new(Lifecycle {
                threads,
                ..Lifecycle::default()
            }),
            terminated: Condvar::new(),
            worker_threads,
            states,
            queue,
            panic_handler,
            metrics,
            num_threads,
        })
    }

    /// Queue `f` and return a handle to its eventual result.
    ///
    /// Never blocks on the task itself. Fails with [`Error::PoolStopped`]
    /// once shutdown has begun, in which case `f` is never run.
    pub fn submit<F, T>(&self, f: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let id = TaskId::next();
        let (promise, handle) = promise::channel(id);
        let handler = self.panic_handler.clone();

        let task = Task::with_id(id, move || {
            let result = handler.execute(Some(id), f);
            let outcome = Outcome::of(&result);
            promise.fulfill(result);
            outcome
        });

        self.enqueue(task)?;
        Ok(handle)
    }

    /// Bind `args` to `f` now and run `f(args)` on a worker later.
    ///
    /// Multiple arguments are passed as a tuple.
    pub fn submit_with<F, A, T>(&self, f: F, args: A) -> Result<TaskHandle<T>>
    where
        F: FnOnce(A) -> T + Send + 'static,
        A: Send + 'static,
        T: Send + 'static,
    {
        self.submit(move || f(args))
    }

    /// Queue `f` without a result handle.
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let id = TaskId::next();
        let handler = self.panic_handler.clone();

        let task = Task::with_id(id, move || Outcome::of(&handler.execute(Some(id), f)));

        self.enqueue(task)
    }

    fn enqueue(&self, task: Task) -> Result<()> {
        match self.queue.push(task) {
            Ok(()) => {
                self.metrics.record_submitted();
                Ok(())
            }
            Err(e) => {
                self.metrics.record_rejected();
                Err(e)
            }
        }
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Number of tasks waiting for a worker.
    pub fn queued_tasks(&self) -> usize {
        self.queue.len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.queue.is_stopped()
    }

    /// Total panics captured from task bodies so far.
    pub fn panic_count(&self) -> usize {
        self.panic_handler.panic_count()
    }

    pub fn panic_strategy(&self) -> PanicStrategy {
        self.panic_handler.strategy()
    }

    pub fn worker_stats(&self) -> Vec<WorkerStats> {
        self.states
            .iter()
            .map(|(id, state)| WorkerStats::read(*id, state))
            .collect()
    }

    #[cfg(feature = "telemetry")]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Zero the pool-wide metrics. Per-worker stats are not affected.
    #[cfg(feature = "telemetry")]
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    /// Stop accepting tasks, let the workers drain the queue, and join them.
    ///
    /// Every caller returns only after all workers have exited, including
    /// callers that race with one another. The one exception is a call made
    /// from one of this pool's own workers: it cannot wait for itself, so it
    /// only stops intake and returns; the workers are joined by the next
    /// caller from outside the pool (or by drop).
    pub fn shutdown(&self) {
        if self.queue.close() {
            tracing::debug!(queued = self.queue.len(), "worker pool shutting down");
        }

        if self.worker_threads.contains(&thread::current().id()) {
            tracing::debug!("shutdown called from a worker; leaving the join to the owner");
            return;
        }

        let threads = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.joining {
                while !lifecycle.joined {
                    self.terminated.wait(&mut lifecycle);
                }
                return;
            }
            lifecycle.joining = true;
            std::mem::take(&mut lifecycle.threads)
        };

        for thread in threads {
            if thread.join().is_err() {
                tracing::error!("worker thread panicked outside of a task");
            }
        }

        self.lifecycle.lock().joined = true;
        self.terminated.notify_all();

        tracing::debug!("worker pool stopped");
    }

    /// Whether every worker thread has been joined.
    pub fn is_terminated(&self) -> bool {
        self.lifecycle.lock().joined
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("num_threads", &self.num_threads)
            .field("queued_tasks", &self.queued_tasks())
            .field("is_shutdown", &self.is_shutdown())
            .finish()
    }
}
