//! Single-slot progress mailbox shared between a background task and the
//! driving loop.
//!
//! The writer never blocks: each write replaces the stored value and wakes the
//! reader. The reader waits for a value it has not seen yet, bounded by a
//! timeout, and then returns whatever is current. Intermediate values may be
//! coalesced; the latest write is always observable.

use std::time::Duration;

use tokio::sync::{Mutex, watch};

pub struct ProgressValue<P> {
    tx: watch::Sender<P>,
    /// Cursor of the reader: tracks which write it has already seen.
    rx: Mutex<watch::Receiver<P>>,
}

impl<P> ProgressValue<P>
where
    P: Clone + Send + Sync,
{
    pub fn new(initial: P) -> Self {
        let (tx, rx) = watch::channel(initial);
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Store `value`, replacing any unread value. Safe to call from a blocking thread.
    pub fn write(&self, value: P) {
        self.tx.send_replace(value);
    }

    /// Wait until a value newer than the last read arrives or `timeout` elapses,
    /// then return the current value. Timing out is not an error.
    pub async fn read_with_timeout(&self, timeout: Duration) -> P {
        let mut rx = self.rx.lock().await;
        // The sender lives in `self`, so the channel cannot close under us.
        if !rx.has_changed().unwrap_or(true) {
            let _ = tokio::time::timeout(timeout, rx.changed()).await;
        }
        rx.borrow_and_update().clone()
    }

    /// Current value without waiting and without marking it as read.
    pub fn latest(&self) -> P {
        self.tx.borrow().clone()
    }
}

impl<P> Default for ProgressValue<P>
where
    P: Clone + Default + Send + Sync,
{
    fn default() -> Self {
        Self::new(P::default())
    }
}
