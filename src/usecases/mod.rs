//! Application use cases. Orchestrate domain logic via ports.

pub mod auth_service;
pub mod runner;
pub mod session_task;
pub mod task;
pub mod transfer_service;
pub mod transfer_task;
pub mod version_task;

#[cfg(test)]
pub(crate) mod testing;

pub use auth_service::{AuthService, MAX_LOGIN_ATTEMPTS};
pub use runner::{NETWORK_LOST_TEXT, TaskRunner};
pub use session_task::SessionTask;
pub use task::{ProgressTask, Task};
pub use transfer_service::{TransferReport, TransferService};
pub use transfer_task::{BACKUP_DESCRIPTION, RESTORE_DESCRIPTION, TransferTask};
pub use version_task::{NEW_VERSION_NOTICE, VersionCheckTask, check_for_updates};
