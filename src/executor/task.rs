//! Type-erased units of work.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// How a task body finished, as reported back to the worker that ran it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Completed,
    Panicked,
}

impl Outcome {
    pub fn of<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            Outcome::Completed
        } else {
            Outcome::Panicked
        }
    }
}

/// A zero-argument closure queued for a worker.
///
/// Whatever the caller submitted (callable, bound arguments and the promise
/// that receives the outcome) is erased behind a single `invoke`.
pub(crate) struct Task {
    pub(crate) id: TaskId,
    func: Box<dyn FnOnce() -> Outcome + Send + 'static>,
    pub(crate) enqueue_time: Instant,
}

impl Task {
    #[cfg(test)]
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Outcome + Send + 'static,
    {
        Self::with_id(TaskId::next(), f)
    }

    pub fn with_id<F>(id: TaskId, f: F) -> Self
    where
        F: FnOnce() -> Outcome + Send + 'static,
    {
        Task {
            id,
            func: Box::new(f),
            enqueue_time: Instant::now(),
        }
    }

    /// Run the task body, consuming it.
    pub fn invoke(self) -> Outcome {
        (self.func)()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("enqueue_time", &self.enqueue_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let a = TaskId::next();
        let b = TaskId::next();
        assert!(b > a);
        assert_ne!(a, b);
    }

    #[test]
    fn test_invoke_runs_body_once() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let task = Task::new(move || {
            flag.store(true, Ordering::SeqCst);
            Outcome::Completed
        });

        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(task.invoke(), Outcome::Completed);
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_outcome_of_result() {
        assert_eq!(Outcome::of(&Ok::<u8, ()>(1)), Outcome::Completed);
        assert_eq!(Outcome::of(&Err::<u8, ()>(())), Outcome::Panicked);
    }

    #[test]
    fn test_display() {
        let id = TaskId(7);
        assert_eq!(id.to_string(), "task-7");
        assert_eq!(id.as_u64(), 7);
    }
}
