//! Implements AppStatePort and NetworkObserver for the CLI process.
//!
//! The quit flag is raised by Ctrl-C; the connectivity flag follows the
//! engine's network callbacks.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::ports::{AppStatePort, NetworkObserver};

pub const CTRL_C_MESSAGE: &str = "Received Ctrl+C, exiting as soon as possible";

#[derive(Debug, Default)]
pub struct CliAppState {
    quit: AtomicBool,
    network_lost: AtomicBool,
}

impl CliAppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the quit flag. Returns `true` only for the call that raised it.
    pub fn request_quit(&self) -> bool {
        !self.quit.swap(true, Ordering::SeqCst)
    }

    /// Handle one Ctrl+C, whether it came as a signal or as a key press
    /// inside a raw-mode prompt. Raises quit; only the call that raised it
    /// writes the acknowledgment to `out`.
    pub fn interrupt<W: Write>(&self, out: &mut W) -> bool {
        if !self.request_quit() {
            return false;
        }
        info!("quit requested");
        let _ = writeln!(out, "\n{CTRL_C_MESSAGE}");
        let _ = out.flush();
        true
    }

    /// Listen for Ctrl-C for the rest of the process. Every delivery raises the
    /// quit flag; the acknowledgment is printed on the first one only.
    pub fn listen_for_ctrl_c(self: &Arc<Self>) -> JoinHandle<()> {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                    return;
                }
                state.interrupt(&mut io::stdout());
            }
        })
    }
}

impl AppStatePort for CliAppState {
    fn should_quit(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    fn network_lost(&self) -> bool {
        self.network_lost.load(Ordering::SeqCst)
    }
}

impl NetworkObserver for CliAppState {
    fn on_network_lost(&self) {
        if !self.network_lost.swap(true, Ordering::SeqCst) {
            warn!("network lost");
        }
    }

    fn on_network_restored(&self) {
        if self.network_lost.swap(false, Ordering::SeqCst) {
            info!("network restored");
        }
    }
}
