//! Task execution infrastructure.
//!
//! This module provides the worker pool and the pieces it is built from:
//! the shared task queue, worker threads, the per-task result channel and
//! panic capture.

pub mod panic_handler;
pub mod pool;
pub mod promise;
pub(crate) mod queue;
pub mod task;
pub mod worker;

pub use panic_handler::{PanicHandler, PanicStrategy, TaskFailure};
pub use pool::WorkerPool;
pub use promise::TaskHandle;
pub use task::TaskId;
pub use worker::{WorkerId, WorkerStats};
