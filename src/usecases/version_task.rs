//! Release check run at startup.

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::TaskError;
use crate::ports::ReleasePort;
use crate::usecases::runner::TaskRunner;
use crate::usecases::task::Task;

pub const NEW_VERSION_NOTICE: &str = "A new version is available.";

/// Asks the release channel whether a newer build exists. Not cancellable:
/// the check is short and `cancel` does nothing.
pub struct VersionCheckTask {
    release: Arc<dyn ReleasePort>,
}

impl VersionCheckTask {
    pub fn new(release: Arc<dyn ReleasePort>) -> Self {
        Self { release }
    }
}

impl Task for VersionCheckTask {
    type Output = bool;

    fn description(&self) -> &str {
        "Checking for updates"
    }

    fn run(&self) -> Result<bool, TaskError> {
        self.release.has_new_version()
    }

    fn cancel(&self) {}
}

/// Run the check behind a spinner and print a notice when a newer build
/// exists. Failures are logged and otherwise ignored.
pub async fn check_for_updates<W: Write>(
    runner: &mut TaskRunner<W>,
    release: Arc<dyn ReleasePort>,
) -> bool {
    match runner.run(Arc::new(VersionCheckTask::new(release))).await {
        Ok(true) => {
            println!("{NEW_VERSION_NOTICE}\n");
            true
        }
        Ok(false) => {
            debug!("no newer version");
            false
        }
        Err(e) => {
            warn!(error = %e, "version check failed");
            false
        }
    }
}
