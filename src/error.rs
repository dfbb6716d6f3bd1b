use crate::executor::TaskFailure;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("submit on stopped pool")]
    PoolStopped,

    #[error("task failed: {0}")]
    TaskFailed(TaskFailure),

    #[error("task was dropped before it could run")]
    TaskAbandoned,

    #[error("config error: {0}")]
    Config(String),

    #[error("executor error: {0}")]
    Executor(String),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    /// Returns the captured failure if this error came out of a task body.
    pub fn task_failure(&self) -> Option<&TaskFailure> {
        match self {
            Error::TaskFailed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn is_pool_stopped(&self) -> bool {
        matches!(self, Error::PoolStopped)
    }
}
