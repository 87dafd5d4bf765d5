//! Inbound port. Interactive input requested by use cases from the user.

use std::path::PathBuf;

use crate::domain::TaskError;

/// Number of attempts every prompt gets before giving up with `TaskError::Input`.
pub const INPUT_RETRIES: usize = 3;

/// Input port: prompts answered by the person at the terminal.
///
/// Every method retries up to [`INPUT_RETRIES`] times on empty or invalid
/// answers and returns `TaskError::Cancelled` when the prompt is interrupted.
pub trait InputPort: Send + Sync {
    fn read_text(&self, label: &str) -> Result<String, TaskError>;

    /// Same as `read_text` with echo disabled.
    fn read_secret(&self, label: &str) -> Result<String, TaskError>;

    /// A directory path, `~`-expanded. Existing non-directories are rejected.
    fn read_path(&self, label: &str) -> Result<PathBuf, TaskError>;

    fn read_yes_no(&self, label: &str) -> Result<bool, TaskError>;
}
