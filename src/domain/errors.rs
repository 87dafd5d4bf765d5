//! Domain errors. Returned by ports, tasks and use cases.
//!
//! Adapters map engine status codes and infrastructure errors into these.

use thiserror::Error;

/// Status codes reported by the engine boundary for every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Ok,
    Error,
    Invalid,
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// User- or signal-initiated. Not a failure: callers exit with success.
    #[error("Operation cancelled")]
    Cancelled,

    /// The engine reported a failure with a human-readable message.
    #[error("{0}")]
    Engine(String),

    /// Interactive input ran out of retries.
    #[error("{0}")]
    Input(String),

    /// Use of a destroyed or moved-from engine handle. Programming error.
    #[error("Invalid engine handle: {0}")]
    InvalidHandle(String),

    /// Login flow reached a state this client cannot continue from.
    #[error("{0}")]
    Login(String),

    #[error("{0}")]
    Io(String),
}

impl TaskError {
    /// Map an engine status to a result. `last_error` is consulted only for
    /// [`EngineStatus::Error`].
    pub fn from_status(
        status: EngineStatus,
        context: &str,
        last_error: impl FnOnce() -> Option<String>,
    ) -> Result<(), TaskError> {
        match status {
            EngineStatus::Ok => Ok(()),
            EngineStatus::Error => Err(TaskError::Engine(
                last_error().unwrap_or_else(|| "unknown".to_string()),
            )),
            EngineStatus::Cancelled => Err(TaskError::Cancelled),
            EngineStatus::Invalid => Err(TaskError::InvalidHandle(context.to_string())),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskError::Cancelled)
    }
}
