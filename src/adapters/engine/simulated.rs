//! Simulated account engine for development and tests.
//!
//! Implements the session, transfer and release ports without network access.
//! Blocking calls sleep in short slices so a cancel request is honored within
//! a few milliseconds, mirroring the native engine's cooperative cancellation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{EngineStatus, LoginState, TaskError};
use crate::ports::{NetworkObserver, ProgressSink, ReleasePort, SessionPort, TransferPort};

/// File written into the export directory by a simulated backup.
pub const MANIFEST_FILE: &str = "backup-manifest.json";

const SLICE: Duration = Duration::from_millis(5);

/// Credentials and login steps the simulated account expects.
/// `None` for username/password accepts any non-empty value.
#[derive(Debug, Clone, Default)]
pub struct SimulatedAccount {
    pub username: Option<String>,
    pub password: Option<String>,
    /// When set, login continues with a TOTP step expecting this code.
    pub totp: Option<String>,
    /// When set, login continues with a mailbox password step.
    pub mailbox_password: Option<String>,
    pub human_verification: bool,
}

/// Shape of every transfer created by the engine.
#[derive(Debug, Clone)]
pub struct TransferPlan {
    pub steps: u32,
    pub step_delay: Duration,
    pub expected_disk_usage: u64,
    /// Fail with this message when reaching the given step.
    pub fail_at: Option<(u32, String)>,
    /// Report connectivity loss at this step, restored three steps later.
    pub network_flap_at: Option<u32>,
}

impl Default for TransferPlan {
    fn default() -> Self {
        Self {
            steps: 40,
            step_delay: Duration::from_millis(150),
            expected_disk_usage: 64 * 1024 * 1024,
            fail_at: None,
            network_flap_at: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BackupManifest {
    version: u32,
    account: String,
    created_at: DateTime<Utc>,
    items: u32,
}

pub struct SimulatedEngine {
    account: SimulatedAccount,
    step_delay: Duration,
    plan: TransferPlan,
    newer_release: bool,
    observer: Option<Arc<dyn NetworkObserver>>,
    login_state: Mutex<LoginState>,
    logged_in_as: Mutex<Option<String>>,
    cancelled: AtomicBool,
    cancel_calls: AtomicUsize,
}

impl SimulatedEngine {
    /// `step_delay` is the simulated latency of every session call.
    pub fn new(account: SimulatedAccount, step_delay: Duration) -> Self {
        Self {
            account,
            step_delay,
            plan: TransferPlan::default(),
            newer_release: false,
            observer: None,
            login_state: Mutex::new(LoginState::LoggedOut),
            logged_in_as: Mutex::new(None),
            cancelled: AtomicBool::new(false),
            cancel_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_plan(mut self, plan: TransferPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn NetworkObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_newer_release(mut self, newer: bool) -> Self {
        self.newer_release = newer;
        self
    }

    /// How many times `SessionPort::cancel` reached the engine.
    pub fn session_cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    fn state(&self) -> MutexGuard<'_, LoginState> {
        self.login_state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn expect_state(&self, expected: LoginState) -> Result<(), TaskError> {
        let current = *self.state();
        if current != expected {
            return Err(TaskError::Engine(format!(
                "unexpected login state {current:?}, expected {expected:?}"
            )));
        }
        Ok(())
    }

    fn advance(&self, next: LoginState) -> LoginState {
        *self.state() = next;
        info!(state = ?next, "simulated login state");
        next
    }

    /// State following a completed step, given which steps remain.
    fn after_password(&self) -> LoginState {
        if self.account.human_verification {
            LoginState::AwaitingHv
        } else if self.account.totp.is_some() {
            LoginState::AwaitingTotp
        } else {
            self.after_totp()
        }
    }

    fn after_totp(&self) -> LoginState {
        if self.account.mailbox_password.is_some() {
            LoginState::AwaitingMailboxPassword
        } else {
            LoginState::LoggedIn
        }
    }

    fn require_logged_in(&self) -> Result<String, TaskError> {
        if *self.state() != LoginState::LoggedIn {
            return Err(TaskError::Engine("not logged in".into()));
        }
        Ok(self
            .logged_in_as
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .unwrap_or_default())
    }

    fn transfer(&self, kind: TransferKind, path: &Path) -> Result<Box<dyn TransferPort>, TaskError> {
        let account = self.require_logged_in()?;
        Ok(Box::new(SimulatedTransfer {
            kind,
            path: path.to_path_buf(),
            account,
            plan: self.plan.clone(),
            observer: self.observer.clone(),
            cancelled: AtomicBool::new(false),
        }))
    }
}

impl SessionPort for SimulatedEngine {
    fn login(&self, username: &str, password: &str) -> Result<LoginState, TaskError> {
        sleep_unless(&self.cancelled, self.step_delay)?;
        let matches = |expected: &Option<String>, given: &str| {
            !given.is_empty() && expected.as_deref().is_none_or(|e| e == given)
        };
        if !matches(&self.account.username, username) || !matches(&self.account.password, password)
        {
            warn!(username, "simulated login rejected");
            return Err(TaskError::Engine(
                "Incorrect login credentials. Please try again.".into(),
            ));
        }
        *self
            .logged_in_as
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(username.to_string());
        Ok(self.advance(self.after_password()))
    }

    fn login_totp(&self, code: &str) -> Result<LoginState, TaskError> {
        self.expect_state(LoginState::AwaitingTotp)?;
        sleep_unless(&self.cancelled, self.step_delay)?;
        if self.account.totp.as_deref() != Some(code) {
            return Err(TaskError::Engine("Incorrect TOTP code".into()));
        }
        Ok(self.advance(self.after_totp()))
    }

    fn login_mailbox_password(&self, password: &str) -> Result<LoginState, TaskError> {
        self.expect_state(LoginState::AwaitingMailboxPassword)?;
        sleep_unless(&self.cancelled, self.step_delay)?;
        if self.account.mailbox_password.as_deref() != Some(password) {
            return Err(TaskError::Engine("Incorrect mailbox password".into()));
        }
        Ok(self.advance(LoginState::LoggedIn))
    }

    fn login_state(&self) -> Result<LoginState, TaskError> {
        Ok(*self.state())
    }

    fn cancel(&self) -> Result<(), TaskError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn new_backup(&self, export_dir: &Path) -> Result<Box<dyn TransferPort>, TaskError> {
        self.transfer(TransferKind::Backup, export_dir)
    }

    fn new_restore(&self, backup_dir: &Path) -> Result<Box<dyn TransferPort>, TaskError> {
        self.transfer(TransferKind::Restore, backup_dir)
    }
}

impl ReleasePort for SimulatedEngine {
    fn has_new_version(&self) -> Result<bool, TaskError> {
        sleep_unless(&self.cancelled, self.step_delay)?;
        Ok(self.newer_release)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransferKind {
    Backup,
    Restore,
}

struct SimulatedTransfer {
    kind: TransferKind,
    path: PathBuf,
    account: String,
    plan: TransferPlan,
    observer: Option<Arc<dyn NetworkObserver>>,
    cancelled: AtomicBool,
}

impl SimulatedTransfer {
    fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }

    fn read_manifest(&self) -> Result<BackupManifest, TaskError> {
        let raw = fs::read_to_string(self.manifest_path()).map_err(|e| {
            TaskError::Engine(format!("no backup found in '{}': {e}", self.path.display()))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| TaskError::Engine(format!("corrupt backup manifest: {e}")))
    }

    fn write_manifest(&self) -> Result<(), TaskError> {
        let manifest = BackupManifest {
            version: 1,
            account: self.account.clone(),
            created_at: Utc::now(),
            items: self.plan.steps,
        };
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| TaskError::Engine(e.to_string()))?;
        fs::write(self.manifest_path(), json)
            .map_err(|e| TaskError::Engine(format!("write manifest: {e}")))
    }

    fn flap_network(&self) -> Result<(), TaskError> {
        let Some(observer) = &self.observer else {
            return Ok(());
        };
        observer.on_network_lost();
        let waited = sleep_unless(&self.cancelled, self.plan.step_delay * 3);
        observer.on_network_restored();
        waited
    }
}

impl TransferPort for SimulatedTransfer {
    fn start(&self, sink: &dyn ProgressSink) -> Result<(), TaskError> {
        if self.kind == TransferKind::Restore {
            let manifest = self.read_manifest()?;
            info!(account = %manifest.account, items = manifest.items, "restoring simulated backup");
        }

        let steps = self.plan.steps.max(1);
        sink.on_progress(0.0);
        for step in 1..=steps {
            sleep_unless(&self.cancelled, self.plan.step_delay)?;
            if self.plan.network_flap_at == Some(step) {
                self.flap_network()?;
            }
            if let Some((at, msg)) = &self.plan.fail_at {
                if *at == step {
                    return TaskError::from_status(EngineStatus::Error, "transfer", || {
                        Some(msg.clone())
                    });
                }
            }
            sink.on_progress(step as f32 * 100.0 / steps as f32);
        }

        if self.kind == TransferKind::Backup {
            self.write_manifest()?;
        }
        Ok(())
    }

    fn cancel(&self) -> Result<(), TaskError> {
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn expected_disk_usage(&self) -> Result<u64, TaskError> {
        Ok(self.plan.expected_disk_usage)
    }
}

/// Sleep for `total`, returning `Cancelled` as soon as `flag` is raised.
fn sleep_unless(flag: &AtomicBool, total: Duration) -> Result<(), TaskError> {
    TaskError::from_status(wait_in_slices(flag, total), "simulated engine", || None)
}

fn wait_in_slices(flag: &AtomicBool, total: Duration) -> EngineStatus {
    let deadline = Instant::now() + total;
    loop {
        if flag.load(Ordering::SeqCst) {
            return EngineStatus::Cancelled;
        }
        let now = Instant::now();
        if now >= deadline {
            return EngineStatus::Ok;
        }
        std::thread::sleep(SLICE.min(deadline - now));
    }
}
