//! Backup / restore transfers as progress tasks.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::domain::{Percent, TaskError};
use crate::ports::{ProgressSink, TransferPort};
use crate::shared::{CancelGate, ProgressValue};
use crate::usecases::task::{ProgressTask, Task};

pub const BACKUP_DESCRIPTION: &str = "Export Mail";
pub const RESTORE_DESCRIPTION: &str = "Restore Mail";

/// Drives one engine transfer. The engine's progress callback writes into the
/// task's progress slot; the runner reads it.
pub struct TransferTask {
    description: &'static str,
    transfer: Box<dyn TransferPort>,
    progress: ProgressValue<Percent>,
    cancel_gate: CancelGate,
}

impl TransferTask {
    pub fn backup(transfer: Box<dyn TransferPort>) -> Self {
        Self::new(BACKUP_DESCRIPTION, transfer)
    }

    pub fn restore(transfer: Box<dyn TransferPort>) -> Self {
        Self::new(RESTORE_DESCRIPTION, transfer)
    }

    fn new(description: &'static str, transfer: Box<dyn TransferPort>) -> Self {
        Self {
            description,
            transfer,
            progress: ProgressValue::default(),
            cancel_gate: CancelGate::new(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.transfer.path()
    }

    pub fn expected_disk_usage(&self) -> Result<u64, TaskError> {
        self.transfer.expected_disk_usage()
    }
}

impl ProgressSink for TransferTask {
    fn on_progress(&self, percent: Percent) {
        debug!(task = self.description, percent, "progress");
        self.progress.write(percent);
    }
}

impl Task for TransferTask {
    type Output = ();

    fn description(&self) -> &str {
        self.description
    }

    fn run(&self) -> Result<(), TaskError> {
        self.transfer.start(self)
    }

    fn cancel(&self) {
        self.cancel_gate.fire_once(|| {
            info!(task = self.description, "cancelling transfer");
            if let Err(e) = self.transfer.cancel() {
                warn!(task = self.description, error = %e, "transfer cancel failed");
            }
        });
    }
}

impl ProgressTask for TransferTask {
    type Progress = Percent;

    fn progress(&self) -> &ProgressValue<Percent> {
        &self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    struct StubTransfer {
        values: Vec<Percent>,
        cancels: Arc<AtomicUsize>,
        cancelled: AtomicBool,
    }

    impl TransferPort for StubTransfer {
        fn start(&self, sink: &dyn ProgressSink) -> Result<(), TaskError> {
            for &v in &self.values {
                if self.cancelled.load(Ordering::SeqCst) {
                    return Err(TaskError::Cancelled);
                }
                sink.on_progress(v);
            }
            Ok(())
        }

        fn cancel(&self) -> Result<(), TaskError> {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            self.cancelled.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn path(&self) -> PathBuf {
            Path::new("/tmp/export").to_path_buf()
        }

        fn expected_disk_usage(&self) -> Result<u64, TaskError> {
            Ok(4096)
        }
    }

    fn stub(values: &[Percent]) -> (Box<dyn TransferPort>, Arc<AtomicUsize>) {
        let cancels = Arc::new(AtomicUsize::new(0));
        let transfer = StubTransfer {
            values: values.to_vec(),
            cancels: Arc::clone(&cancels),
            cancelled: AtomicBool::new(false),
        };
        (Box::new(transfer), cancels)
    }

    #[tokio::test]
    async fn engine_progress_lands_in_the_slot() {
        let (transfer, _) = stub(&[0.0, 50.0, 100.0]);
        let task = TransferTask::backup(transfer);

        task.run().unwrap();

        assert_eq!(task.description(), BACKUP_DESCRIPTION);
        assert_eq!(task.poll_progress(Duration::from_millis(10)).await, 100.0);
    }

    #[test]
    fn cancel_reaches_engine_once() {
        let (transfer, cancels) = stub(&[10.0, 20.0]);
        let task = TransferTask::restore(transfer);

        for _ in 0..5 {
            task.cancel();
        }

        assert_eq!(cancels.load(Ordering::SeqCst), 1);
        assert_eq!(task.run(), Err(TaskError::Cancelled));
        assert_eq!(task.description(), RESTORE_DESCRIPTION);
    }

    #[test]
    fn exposes_transfer_metadata() {
        let (transfer, _) = stub(&[]);
        let task = TransferTask::backup(transfer);
        assert_eq!(task.path(), PathBuf::from("/tmp/export"));
        assert_eq!(task.expected_disk_usage(), Ok(4096));
    }
}
