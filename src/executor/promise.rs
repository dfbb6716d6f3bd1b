//! One-shot result channel between a worker and the submitting caller.

use super::panic_handler::TaskFailure;
use super::task::TaskId;
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

enum Slot<T> {
    Pending,
    Fulfilled(T),
    Failed(TaskFailure),
    Abandoned,
    // value moved out by `TaskHandle::wait`
    Taken,
}

impl<T> Slot<T> {
    fn is_pending(&self) -> bool {
        matches!(self, Slot::Pending)
    }
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

/// Create a linked promise/handle pair for the task `id`.
pub(crate) fn channel<T>(id: TaskId) -> (Promise<T>, TaskHandle<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot::Pending),
        ready: Condvar::new(),
    });

    (
        Promise {
            shared: shared.clone(),
        },
        TaskHandle { id, shared },
    )
}

/// Write side, owned by the queued task.
pub(crate) struct Promise<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Promise<T> {
    pub fn fulfill(self, outcome: std::result::Result<T, TaskFailure>) {
        self.complete(match outcome {
            Ok(value) => Slot::Fulfilled(value),
            Err(failure) => Slot::Failed(failure),
        });
    }

    fn complete(&self, outcome: Slot<T>) {
        {
            let mut slot = self.shared.slot.lock();
            if !slot.is_pending() {
                return;
            }
            *slot = outcome;
        }
        self.shared.ready.notify_all();
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        // no-op when already fulfilled
        self.complete(Slot::Abandoned);
    }
}

/// Caller-held handle to the eventual result of a submitted task.
///
/// Returned by [`WorkerPool::submit`](crate::WorkerPool::submit). The task
/// runs whether or not the handle is kept; dropping it just discards the
/// result.
pub struct TaskHandle<T> {
    id: TaskId,
    shared: Arc<Shared<T>>,
}

impl<T> TaskHandle<T> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Non-blocking check for whether the task has completed.
    pub fn is_finished(&self) -> bool {
        !self.shared.slot.lock().is_pending()
    }

    /// Block until the task completes and take its result.
    ///
    /// A panic in the task body comes back as [`Error::TaskFailed`].
    pub fn wait(self) -> Result<T> {
        let mut slot = self.shared.slot.lock();
        while slot.is_pending() {
            self.shared.ready.wait(&mut slot);
        }

        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Fulfilled(value) => Ok(value),
            Slot::Failed(failure) => Err(Error::TaskFailed(failure)),
            Slot::Pending | Slot::Abandoned | Slot::Taken => Err(Error::TaskAbandoned),
        }
    }

    /// Wait up to `timeout` for completion. Returns `true` if the task has
    /// finished, in which case [`get`](Self::get) or [`wait`](Self::wait)
    /// will not block.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut slot = self.shared.slot.lock();
        while slot.is_pending() {
            if self.shared.ready.wait_until(&mut slot, deadline).timed_out() {
                return !slot.is_pending();
            }
        }
        true
    }
}

impl<T: Clone> TaskHandle<T> {
    /// Block until the task completes and return a copy of its result.
    ///
    /// Can be called any number of times; every call observes the same
    /// outcome.
    pub fn get(&self) -> Result<T> {
        let mut slot = self.shared.slot.lock();
        while slot.is_pending() {
            self.shared.ready.wait(&mut slot);
        }

        match &*slot {
            Slot::Fulfilled(value) => Ok(value.clone()),
            Slot::Failed(failure) => Err(Error::TaskFailed(failure.clone())),
            Slot::Pending | Slot::Abandoned | Slot::Taken => Err(Error::TaskAbandoned),
        }
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn failure(msg: &str) -> TaskFailure {
        TaskFailure {
            message: msg.to_string(),
            task_id: None,
            worker: None,
        }
    }

    #[test]
    fn test_fulfilled_value() {
        let (promise, handle) = channel::<u32>(TaskId::next());
        assert!(!handle.is_finished());

        promise.fulfill(Ok(5));

        assert!(handle.is_finished());
        assert_eq!(handle.wait().unwrap(), 5);
    }

    #[test]
    fn test_failure_is_reraised() {
        let (promise, handle) = channel::<u32>(TaskId::next());
        promise.fulfill(Err(failure("boom")));

        match handle.wait() {
            Err(Error::TaskFailed(f)) => assert_eq!(f.message, "boom"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_get_is_idempotent() {
        let (promise, handle) = channel::<String>(TaskId::next());
        promise.fulfill(Ok("done".to_string()));

        assert_eq!(handle.get().unwrap(), "done");
        assert_eq!(handle.get().unwrap(), "done");
        assert_eq!(handle.wait().unwrap(), "done");
    }

    #[test]
    fn test_get_failure_is_idempotent() {
        let (promise, handle) = channel::<u8>(TaskId::next());
        promise.fulfill(Err(failure("nope")));

        for _ in 0..3 {
            let err = handle.get().unwrap_err();
            assert_eq!(err.task_failure().unwrap().message, "nope");
        }
    }

    #[test]
    fn test_dropped_promise_abandons() {
        let (promise, handle) = channel::<u8>(TaskId::next());
        drop(promise);

        assert!(handle.is_finished());
        assert!(matches!(handle.wait(), Err(Error::TaskAbandoned)));
    }

    #[test]
    fn test_wait_blocks_until_fulfilled() {
        let (promise, handle) = channel::<usize>(TaskId::next());

        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            promise.fulfill(Ok(99));
        });

        assert_eq!(handle.wait().unwrap(), 99);
        producer.join().unwrap();
    }

    #[test]
    fn test_wait_timeout() {
        let (promise, handle) = channel::<()>(TaskId::next());

        assert!(!handle.wait_timeout(Duration::from_millis(10)));

        promise.fulfill(Ok(()));
        assert!(handle.wait_timeout(Duration::from_millis(10)));
    }
}
