//! Outbound ports. Application calls into the account engine.
//!
//! Every call is blocking: the engine runs the work on the caller's thread and
//! returns when it is done, cancelled or failed. Tasks call these from the
//! background execution context, never from the driving loop.

use std::path::{Path, PathBuf};

use crate::domain::{LoginState, Percent, TaskError};

/// Receives progress from inside the engine's execution context.
/// One value per invocation, called synchronously by the engine.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, percent: Percent);
}

/// Connectivity callbacks registered with the engine at session creation.
pub trait NetworkObserver: Send + Sync {
    fn on_network_lost(&self);
    fn on_network_restored(&self);
}

/// Account session: login state machine and factory for transfers.
pub trait SessionPort: Send + Sync {
    fn login(&self, username: &str, password: &str) -> Result<LoginState, TaskError>;

    fn login_totp(&self, code: &str) -> Result<LoginState, TaskError>;

    fn login_mailbox_password(&self, password: &str) -> Result<LoginState, TaskError>;

    fn login_state(&self) -> Result<LoginState, TaskError>;

    /// Request cancellation of whatever session call is in flight. Not idempotent
    /// on the engine side; callers go through a cancel gate.
    fn cancel(&self) -> Result<(), TaskError>;

    /// Create a backup of the account into `export_dir`. Requires a logged-in session.
    fn new_backup(&self, export_dir: &Path) -> Result<Box<dyn TransferPort>, TaskError>;

    /// Create a restore from the backup stored in `backup_dir`. Requires a logged-in session.
    fn new_restore(&self, backup_dir: &Path) -> Result<Box<dyn TransferPort>, TaskError>;
}

/// One backup or restore operation.
pub trait TransferPort: Send + Sync {
    /// Run to completion, reporting progress into `sink`. Returns
    /// `Err(TaskError::Cancelled)` once the engine acknowledges a cancel.
    fn start(&self, sink: &dyn ProgressSink) -> Result<(), TaskError>;

    fn cancel(&self) -> Result<(), TaskError>;

    /// Directory the transfer writes to (backup) or reads from (restore).
    fn path(&self) -> PathBuf;

    /// Estimate of bytes written to disk by this transfer.
    fn expected_disk_usage(&self) -> Result<u64, TaskError>;
}

/// Release channel of the tool itself.
pub trait ReleasePort: Send + Sync {
    fn has_new_version(&self) -> Result<bool, TaskError>;
}
