//! Process-wide signals polled by the task runner.

/// Externally owned quit / connectivity flags.
///
/// Both methods are polled from the driving loop at least twice a second and
/// must be cheap and free of side effects.
pub trait AppStatePort: Send + Sync {
    fn should_quit(&self) -> bool;

    fn network_lost(&self) -> bool;
}
