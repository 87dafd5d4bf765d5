//! Session calls (login steps) wrapped as cancellable tasks.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::TaskError;
use crate::ports::SessionPort;
use crate::shared::CancelGate;
use crate::usecases::task::Task;

/// Runs one blocking call against the session. Cancelling it cancels the
/// session's in-flight call, once.
pub struct SessionTask<F> {
    description: String,
    session: Arc<dyn SessionPort>,
    call: F,
    cancel_gate: CancelGate,
}

impl<F, R> SessionTask<F>
where
    F: Fn(&dyn SessionPort) -> Result<R, TaskError> + Send + Sync + 'static,
    R: Send + 'static,
{
    pub fn new(session: Arc<dyn SessionPort>, description: impl Into<String>, call: F) -> Self {
        Self {
            description: description.into(),
            session,
            call,
            cancel_gate: CancelGate::new(),
        }
    }
}

impl<F, R> Task for SessionTask<F>
where
    F: Fn(&dyn SessionPort) -> Result<R, TaskError> + Send + Sync + 'static,
    R: Send + 'static,
{
    type Output = R;

    fn description(&self) -> &str {
        &self.description
    }

    fn run(&self) -> Result<R, TaskError> {
        (self.call)(self.session.as_ref())
    }

    fn cancel(&self) {
        self.cancel_gate.fire_once(|| {
            info!(task = %self.description, "cancelling session call");
            if let Err(e) = self.session.cancel() {
                warn!(task = %self.description, error = %e, "session cancel failed");
            }
        });
    }
}
