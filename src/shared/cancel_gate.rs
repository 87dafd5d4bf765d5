//! One-shot gate around a task's cancellation routine.

use std::sync::atomic::{AtomicBool, Ordering};

/// Runs the guarded action at most once for the gate's lifetime, no matter how
/// many threads call [`CancelGate::fire_once`] or how often.
///
/// Losing callers return immediately; they never wait for the winner's action.
#[derive(Debug, Default)]
pub struct CancelGate {
    fired: AtomicBool,
}

impl CancelGate {
    pub const fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
        }
    }

    /// Run `action` if this is the first call. Returns whether it ran.
    pub fn fire_once(&self, action: impl FnOnce()) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        action();
        true
    }
}
