//! Backup and restore flows: resolve the directory, check disk space, run the
//! transfer behind a progress bar.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{HumanBytes, HumanDuration};
use tracing::{info, warn};

use crate::domain::{Operation, TaskError};
use crate::ports::{InputPort, SessionPort};
use crate::shared::paths::{available_space, expand_cli_path, resolve_against};
use crate::usecases::runner::TaskRunner;
use crate::usecases::transfer_task::TransferTask;

#[cfg(windows)]
const EXAMPLE_DIR: &str = "%USERPROFILE%\\Documents";
#[cfg(not(windows))]
const EXAMPLE_DIR: &str = "~/Documents";

/// Outcome of a finished transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub operation: Operation,
    pub path: PathBuf,
    pub elapsed: Duration,
}

pub struct TransferService {
    session: Arc<dyn SessionPort>,
    input: Arc<dyn InputPort>,
    /// Relative directories are resolved against this one.
    base_dir: PathBuf,
}

impl TransferService {
    pub fn new(session: Arc<dyn SessionPort>, input: Arc<dyn InputPort>, base_dir: PathBuf) -> Self {
        Self {
            session,
            input,
            base_dir,
        }
    }

    pub async fn run<W: Write>(
        &self,
        runner: &mut TaskRunner<W>,
        operation: Operation,
        dir: Option<&str>,
    ) -> Result<TransferReport, TaskError> {
        match operation {
            Operation::Backup => self.backup(runner, dir).await,
            Operation::Restore => self.restore(runner, dir).await,
        }
    }

    /// Export the account into `export_dir` (prompted when absent).
    pub async fn backup<W: Write>(
        &self,
        runner: &mut TaskRunner<W>,
        export_dir: Option<&str>,
    ) -> Result<TransferReport, TaskError> {
        let path = self.resolve_dir(
            export_dir,
            "Please input desired export path.",
            "Export Path",
        )?;
        std::fs::create_dir_all(&path).map_err(|e| {
            TaskError::Io(format!(
                "Failed to create export directory '{}': {e}",
                path.display()
            ))
        })?;

        let task = TransferTask::backup(self.session.new_backup(&path)?);
        let expected = task.expected_disk_usage().map_err(|e| match e {
            TaskError::Engine(msg) => {
                TaskError::Engine(format!("Could not get expected disk usage: {msg}"))
            }
            other => other,
        })?;
        let available = available_space(&path)
            .map_err(|e| TaskError::Io(format!("Failed to get free space info: {e}")))?;
        if !self.confirm_space(expected, available)? {
            info!("export aborted for lack of disk space");
            return Err(TaskError::Cancelled);
        }
        runner.check_quit()?;

        println!("Starting Export - Path={}", task.path().display());
        let elapsed = run_timed(runner, task, "Failed to export").await?;
        println!("Export Finished ({})", HumanDuration(elapsed));

        Ok(TransferReport {
            operation: Operation::Backup,
            path,
            elapsed,
        })
    }

    /// Restore the account from the backup stored in `backup_dir` (prompted when absent).
    pub async fn restore<W: Write>(
        &self,
        runner: &mut TaskRunner<W>,
        backup_dir: Option<&str>,
    ) -> Result<TransferReport, TaskError> {
        let path = self.resolve_dir(
            backup_dir,
            "Please input the path of the backup to restore.",
            "Backup Path",
        )?;
        if !path.is_dir() {
            return Err(TaskError::Input(format!(
                "Backup directory '{}' does not exist",
                path.display()
            )));
        }

        let task = TransferTask::restore(self.session.new_restore(&path)?);
        runner.check_quit()?;

        println!("Starting Restore - Path={}", task.path().display());
        let elapsed = run_timed(runner, task, "Failed to restore").await?;
        println!("Restore Finished ({})", HumanDuration(elapsed));

        Ok(TransferReport {
            operation: Operation::Restore,
            path,
            elapsed,
        })
    }

    fn resolve_dir(
        &self,
        raw: Option<&str>,
        hint: &str,
        label: &str,
    ) -> Result<PathBuf, TaskError> {
        let path = match raw.filter(|r| !r.is_empty()) {
            Some(raw) => expand_cli_path(raw)?,
            None => {
                println!("{hint} E.g.: {EXAMPLE_DIR}");
                self.input.read_path(label)?
            }
        };
        Ok(resolve_against(path, &self.base_dir))
    }

    /// `true` when there is room, or the user accepts the shortfall.
    fn confirm_space(&self, expected: u64, available: Option<u64>) -> Result<bool, TaskError> {
        let Some(available) = available else {
            return Ok(true);
        };
        if expected <= available {
            return Ok(true);
        }
        warn!(expected, available, "not enough free space");
        println!(
            "This operation requires at least {} of free space, but the destination volume only has {} available.",
            HumanBytes(expected),
            HumanBytes(available)
        );
        println!("Type 'Yes' to continue or 'No' to abort in the prompt below.\n");
        self.input.read_yes_no("Do you wish to proceed")
    }
}

async fn run_timed<W: Write>(
    runner: &mut TaskRunner<W>,
    task: TransferTask,
    context: &str,
) -> Result<Duration, TaskError> {
    let started = Instant::now();
    runner
        .run_with_progress(Arc::new(task))
        .await
        .map_err(|e| match e {
            TaskError::Engine(msg) => TaskError::Engine(format!("{context}: {msg}")),
            other => other,
        })?;
    Ok(started.elapsed())
}
