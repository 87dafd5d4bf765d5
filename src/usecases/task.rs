//! Cancellable units of background work driven by [`TaskRunner`].
//!
//! A task's `run` executes on a blocking worker thread; `cancel` and
//! `poll_progress` are called from the driving loop while `run` is in flight.
//!
//! [`TaskRunner`]: crate::usecases::TaskRunner

use std::future::Future;
use std::time::Duration;

use crate::domain::TaskError;
use crate::shared::ProgressValue;

pub trait Task: Send + Sync + 'static {
    type Output: Send + 'static;

    /// Label for the spinner line. Stable for the task's lifetime.
    fn description(&self) -> &str;

    /// Perform the work. Blocking. A cancel acknowledged by the engine must come
    /// back as `Err(TaskError::Cancelled)`.
    fn run(&self) -> Result<Self::Output, TaskError>;

    /// Request cooperative cancellation. Callable any number of times from any
    /// thread; the engine-level cancel fires at most once. Never blocks on `run`.
    fn cancel(&self);
}

/// A task that also publishes a pollable progress payload.
pub trait ProgressTask: Task {
    type Progress: Clone + Send + Sync + 'static;

    /// Slot the background work writes into.
    fn progress(&self) -> &ProgressValue<Self::Progress>;

    /// Latest progress, waiting at most `within` for an update not yet seen.
    /// A timeout returns the last known value.
    fn poll_progress(&self, within: Duration) -> impl Future<Output = Self::Progress> + Send {
        self.progress().read_with_timeout(within)
    }
}
