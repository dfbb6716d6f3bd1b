use super::task::TaskId;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

/// What to do, beyond capturing it, when a task body panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanicStrategy {
    /// The failure is only visible through the task's handle.
    #[default]
    Isolate,
    /// Also emit a `tracing` warning with the panic message.
    LogAndContinue,
}

pub struct PanicHandler {
    strategy: PanicStrategy,
    panic_count: AtomicUsize,
}

impl PanicHandler {
    pub fn new(strategy: PanicStrategy) -> Self {
        Self {
            strategy,
            panic_count: AtomicUsize::new(0),
        }
    }

    /// Run `f`, turning a panic into a [`TaskFailure`] instead of unwinding
    /// into the caller.
    pub fn execute<F, R>(&self, task_id: Option<TaskId>, f: F) -> Result<R, TaskFailure>
    where
        F: FnOnce() -> R,
    {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => Ok(result),
            Err(payload) => {
                self.panic_count.fetch_add(1, Ordering::Relaxed);

                let failure = TaskFailure::from_payload(payload, task_id);

                if self.strategy == PanicStrategy::LogAndContinue {
                    tracing::warn!(
                        task = ?failure.task_id,
                        worker = failure.worker.as_deref().unwrap_or("unknown"),
                        "task panicked: {}",
                        failure.message
                    );
                }

                Err(failure)
            }
        }
    }

    pub fn panic_count(&self) -> usize {
        self.panic_count.load(Ordering::Relaxed)
    }

    pub fn strategy(&self) -> PanicStrategy {
        self.strategy
    }
}

impl Default for PanicHandler {
    fn default() -> Self {
        Self::new(PanicStrategy::default())
    }
}

impl fmt::Debug for PanicHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicHandler")
            .field("strategy", &self.strategy)
            .field("panic_count", &self.panic_count())
            .finish()
    }
}

/// A panic captured while running a task body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub message: String,
    pub task_id: Option<TaskId>,
    /// Name of the thread the task was running on.
    pub worker: Option<String>,
}

impl TaskFailure {
    pub(crate) fn from_payload(payload: Box<dyn Any + Send>, task_id: Option<TaskId>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };

        Self {
            message,
            task_id,
            worker: std::thread::current().name().map(str::to_owned),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.task_id {
            Some(id) => write!(f, "{} panicked: {}", id, self.message),
            None => write!(f, "panicked: {}", self.message),
        }
    }
}

impl std::error::Error for TaskFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_handler_isolate() {
        let handler = PanicHandler::new(PanicStrategy::Isolate);

        let result: Result<(), _> = handler.execute(None, || {
            panic!("test panic");
        });

        let failure = result.unwrap_err();
        assert_eq!(failure.message(), "test panic");
        assert_eq!(handler.panic_count(), 1);
    }

    #[test]
    fn test_panic_handler_success() {
        let handler = PanicHandler::new(PanicStrategy::Isolate);

        let result = handler.execute(None, || 42);

        assert_eq!(result.unwrap(), 42);
        assert_eq!(handler.panic_count(), 0);
    }

    #[test]
    fn test_formatted_panic_message() {
        let handler = PanicHandler::default();
        let id = TaskId::next();

        let result: Result<(), _> = handler.execute(Some(id), || panic!("bad index {}", 3));

        let failure = result.unwrap_err();
        assert_eq!(failure.message, "bad index 3");
        assert_eq!(failure.task_id, Some(id));
        assert_eq!(failure.to_string(), format!("{} panicked: bad index 3", id));
    }

    #[test]
    fn test_non_string_payload() {
        let handler = PanicHandler::default();

        let result: Result<(), _> =
            handler.execute(None, || std::panic::panic_any(17_u32));

        assert_eq!(result.unwrap_err().message, "unknown panic");
    }

    #[test]
    fn test_panic_counter() {
        let handler = PanicHandler::new(PanicStrategy::LogAndContinue);

        for _ in 0..5 {
            let _ = handler.execute(None, || {
                panic!("test");
            });
        }

        assert_eq!(handler.panic_count(), 5);
        assert_eq!(handler.strategy(), PanicStrategy::LogAndContinue);
    }
}
