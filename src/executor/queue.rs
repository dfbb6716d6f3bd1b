//! Shared FIFO of pending tasks.
//!
//! The queue and the stop flag live under one lock so that "empty and
//! stopped" is observed atomically by workers, and "stopped" is observed
//! atomically by submitters. A single condition variable signals both new
//! work (one waiter) and shutdown (all waiters).

use super::task::Task;
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

#[derive(Debug, Default)]
struct QueueState {
    tasks: VecDeque<Task>,
    stopped: bool,
}

#[derive(Debug, Default)]
pub(crate) struct TaskQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to the tail and wake one idle worker.
    ///
    /// Fails with [`Error::PoolStopped`] once [`close`](Self::close) has run;
    /// the rejected task is dropped without being invoked.
    pub fn push(&self, task: Task) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.stopped {
                return Err(Error::PoolStopped);
            }
            state.tasks.push_back(task);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Block until a task is available or the queue is closed and empty.
    ///
    /// Queued tasks are handed out even after close, oldest first. `None`
    /// means the queue is closed and fully drained.
    pub fn pop_blocking(&self) -> Option<Task> {
        let mut state = self.state.lock();
        loop {
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            if state.stopped {
                return None;
            }
            // may wake spuriously; the loop re-checks both conditions
            self.available.wait(&mut state);
        }
    }

    /// Set the stop flag and wake every blocked worker.
    ///
    /// Returns `true` only for the call that actually flipped the flag.
    pub fn close(&self) -> bool {
        let first = {
            let mut state = self.state.lock();
            !std::mem::replace(&mut state.stopped, true)
        };
        self.available.notify_all();
        first
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.state.lock().tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::task::Outcome;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn recording_task(log: &Arc<Mutex<Vec<usize>>>, n: usize) -> Task {
        let log = log.clone();
        Task::new(move || {
            log.lock().push(n);
            Outcome::Completed
        })
    }

    #[test]
    fn test_fifo_order() {
        let queue = TaskQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            queue.push(recording_task(&log, i)).unwrap();
        }
        assert_eq!(queue.len(), 5);

        for _ in 0..5 {
            queue.pop_blocking().unwrap().invoke();
        }

        assert_eq!(*log.lock(), vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_push_after_close_fails() {
        let queue = TaskQueue::new();
        assert!(queue.close());

        let result = queue.push(Task::new(|| Outcome::Completed));
        assert!(matches!(result, Err(Error::PoolStopped)));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_close_is_idempotent() {
        let queue = TaskQueue::new();
        assert!(!queue.is_stopped());
        assert!(queue.close());
        assert!(!queue.close());
        assert!(queue.is_stopped());
    }

    #[test]
    fn test_drains_before_terminal_signal() {
        let queue = TaskQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        queue.push(recording_task(&log, 1)).unwrap();
        queue.push(recording_task(&log, 2)).unwrap();
        queue.close();

        while let Some(task) = queue.pop_blocking() {
            task.invoke();
        }

        assert_eq!(*log.lock(), vec![1, 2]);
        assert!(queue.pop_blocking().is_none());
    }

    #[test]
    fn test_blocked_pop_woken_by_push() {
        let queue = Arc::new(TaskQueue::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || {
                let task = queue.pop_blocking().expect("task");
                task.invoke();
            })
        };

        thread::sleep(Duration::from_millis(20));
        queue.push(recording_task(&log, 42)).unwrap();
        consumer.join().unwrap();

        assert_eq!(*log.lock(), vec![42]);
    }

    #[test]
    fn test_close_wakes_all_waiters() {
        let queue = Arc::new(TaskQueue::new());

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let queue = queue.clone();
                thread::spawn(move || queue.pop_blocking().is_none())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        queue.close();

        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
    }
}
