//! Domain entities. Pure data structures shared by ports and use cases.
//!
//! No terminal or engine types here.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Progress payload reported by transfer operations, in percent (0..=100).
pub type Percent = f32;

/// Where the engine's login state machine currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginState {
    #[default]
    LoggedOut,
    AwaitingTotp,
    /// Human verification. Not supported by this client.
    AwaitingHv,
    AwaitingMailboxPassword,
    LoggedIn,
}

/// Top-level operation selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operation {
    #[default]
    Backup,
    Restore,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown operation '{0}' (expected one of: backup, restore)")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backup" => Ok(Operation::Backup),
            "restore" => Ok(Operation::Restore),
            other => Err(UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Backup => f.write_str("backup"),
            Operation::Restore => f.write_str("restore"),
        }
    }
}

/// Credentials collected from flags / env before the login flow starts.
/// Empty strings are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct LoginCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub totp: Option<String>,
    pub mailbox_password: Option<String>,
}

impl LoginCredentials {
    pub fn new(
        username: Option<String>,
        password: Option<String>,
        totp: Option<String>,
        mailbox_password: Option<String>,
    ) -> Self {
        Self {
            username: non_empty(username),
            password: non_empty(password),
            totp: non_empty(totp),
            mailbox_password: non_empty(mailbox_password),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
