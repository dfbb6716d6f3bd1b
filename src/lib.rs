//! drainpool - a bounded worker-thread pool
//!
//! A fixed number of long-lived worker threads pull tasks from one shared
//! FIFO queue and run them to completion. Every submission returns a
//! [`TaskHandle`] through which the caller later collects the task's value,
//! or the panic it raised.
//!
//! # Quick Start
//!
//! ```no_run
//! use drainpool::prelude::*;
//!
//! let pool = WorkerPool::new(4)?;
//!
//! let handles: Vec<_> = (0..8u64)
//!     .map(|i| pool.submit(move || i * i))
//!     .collect::<Result<_>>()?;
//!
//! let squares: Vec<u64> = handles
//!     .into_iter()
//!     .map(TaskHandle::wait)
//!     .collect::<Result<_>>()?;
//!
//! assert_eq!(squares[3], 9);
//! # Ok::<(), drainpool::Error>(())
//! ```
//!
//! # Behaviour
//!
//! - **Bounded concurrency**: at most `num_threads` tasks run at once; the
//!   queue itself is unbounded.
//! - **FIFO dispatch**: tasks are handed to workers oldest first.
//! - **Panic isolation**: a panicking task fails only its own handle, the
//!   worker keeps running.
//! - **Drain on shutdown**: shutting down (or dropping) the pool refuses new
//!   work with [`Error::PoolStopped`] but still runs everything already
//!   queued before the workers are joined.
//! - **Telemetry**: counters and latency histograms (feature `telemetry`)

// Lint configuration
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod telemetry;

// Re-export key types at crate root
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use executor::{PanicStrategy, TaskFailure, TaskHandle, TaskId, WorkerPool, WorkerStats};
