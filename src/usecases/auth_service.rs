//! Handle the login flow: password, TOTP and mailbox password steps.
//!
//! Each engine call runs as a session task behind a spinner. Values come from
//! the command line first and interactive prompts last.

use std::io::Write;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{LoginCredentials, LoginState, TaskError};
use crate::ports::{InputPort, SessionPort};
use crate::usecases::runner::TaskRunner;
use crate::usecases::session_task::SessionTask;

/// Failed password logins tolerated before giving up.
pub const MAX_LOGIN_ATTEMPTS: usize = 3;

pub struct AuthService {
    session: Arc<dyn SessionPort>,
    input: Arc<dyn InputPort>,
    credentials: LoginCredentials,
}

impl AuthService {
    pub fn new(
        session: Arc<dyn SessionPort>,
        input: Arc<dyn InputPort>,
        credentials: LoginCredentials,
    ) -> Self {
        Self {
            session,
            input,
            credentials,
        }
    }

    /// Drive the session to `LoggedIn`.
    ///
    /// Password failures are printed and retried up to [`MAX_LOGIN_ATTEMPTS`]
    /// times; failures in later steps end the flow. A raised quit flag ends it
    /// with `Cancelled`.
    pub async fn run_auth_flow<W: Write>(
        &self,
        runner: &mut TaskRunner<W>,
    ) -> Result<(), TaskError> {
        let mut state = self.session.login_state()?;
        let mut attempts = 0;

        while state != LoginState::LoggedIn {
            runner.check_quit()?;
            if attempts >= MAX_LOGIN_ATTEMPTS {
                return Err(TaskError::Login(
                    "Failed to login: Max attempts reached".into(),
                ));
            }

            state = match state {
                LoginState::LoggedOut => {
                    let username = resolve(&self.credentials.username, || {
                        self.input.read_text("Username")
                    })?;
                    runner.check_quit()?;
                    let password = resolve(&self.credentials.password, || {
                        self.input.read_secret("Password")
                    })?;
                    runner.check_quit()?;

                    info!(username = %username, attempt = attempts + 1, "logging in");
                    let task = SessionTask::new(
                        Arc::clone(&self.session),
                        "Logging In",
                        move |s: &dyn SessionPort| s.login(&username, &password),
                    );
                    match runner.run(Arc::new(task)).await {
                        Ok(next) => {
                            attempts = 0;
                            next
                        }
                        Err(TaskError::Engine(msg)) => {
                            warn!(error = %msg, "login failed");
                            eprintln!("Failed to login: {msg}");
                            attempts += 1;
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                }
                LoginState::AwaitingTotp => {
                    let code =
                        resolve(&self.credentials.totp, || self.input.read_secret("TOTP Code"))?;
                    runner.check_quit()?;
                    let task = SessionTask::new(
                        Arc::clone(&self.session),
                        "Submitting TOTP",
                        move |s: &dyn SessionPort| s.login_totp(&code),
                    );
                    runner
                        .run(Arc::new(task))
                        .await
                        .map_err(|e| step_failure("Failed to submit totp code", e))?
                }
                LoginState::AwaitingHv => {
                    return Err(TaskError::Login("HV: Not yet implemented".into()));
                }
                LoginState::AwaitingMailboxPassword => {
                    let password = resolve(&self.credentials.mailbox_password, || {
                        self.input.read_secret("Mailbox Password")
                    })?;
                    runner.check_quit()?;
                    let task = SessionTask::new(
                        Arc::clone(&self.session),
                        "Unlocking Mailbox",
                        move |s: &dyn SessionPort| s.login_mailbox_password(&password),
                    );
                    runner
                        .run(Arc::new(task))
                        .await
                        .map_err(|e| step_failure("Failed to set mailbox password", e))?
                }
                LoginState::LoggedIn => LoginState::LoggedIn,
            };
            info!(state = ?state, "login state");
        }

        Ok(())
    }
}

/// Command-line value when present, otherwise ask.
fn resolve(
    value: &Option<String>,
    ask: impl FnOnce() -> Result<String, TaskError>,
) -> Result<String, TaskError> {
    match value {
        Some(v) => Ok(v.clone()),
        None => ask(),
    }
}

/// Engine failures in a login step end the flow as a login error.
fn step_failure(context: &str, e: TaskError) -> TaskError {
    match e {
        TaskError::Engine(msg) => TaskError::Login(format!("{context}: {msg}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::CliAppState;
    use crate::adapters::engine::{SimulatedAccount, SimulatedEngine};
    use crate::usecases::testing::{ScriptedInput, runner};
    use std::time::Duration;

    fn session(account: SimulatedAccount) -> Arc<SimulatedEngine> {
        Arc::new(SimulatedEngine::new(account, Duration::from_millis(1)))
    }

    fn credentials(user: &str, password: &str) -> LoginCredentials {
        LoginCredentials::new(Some(user.into()), Some(password.into()), None, None)
    }

    #[tokio::test]
    async fn command_line_credentials_skip_prompts() {
        let engine = session(SimulatedAccount::default());
        let input = ScriptedInput::new(&[]);
        let state = Arc::new(CliAppState::new());
        let service = AuthService::new(
            engine.clone(),
            input.clone(),
            credentials("user@example.com", "pw"),
        );

        service.run_auth_flow(&mut runner(&state)).await.unwrap();

        assert_eq!(engine.login_state(), Ok(LoginState::LoggedIn));
        assert!(input.asked().is_empty());
    }

    #[tokio::test]
    async fn missing_values_are_prompted() {
        let engine = session(SimulatedAccount::default());
        let input = ScriptedInput::new(&["user@example.com", "pw"]);
        let state = Arc::new(CliAppState::new());
        let service = AuthService::new(engine.clone(), input.clone(), LoginCredentials::default());

        service.run_auth_flow(&mut runner(&state)).await.unwrap();

        assert_eq!(input.asked(), vec!["Username", "Password"]);
    }

    #[tokio::test]
    async fn gives_up_after_three_failed_logins() {
        let engine = session(SimulatedAccount {
            password: Some("right".into()),
            ..Default::default()
        });
        let input = ScriptedInput::new(&["wrong", "wrong", "wrong", "right"]);
        let state = Arc::new(CliAppState::new());
        let service = AuthService::new(
            engine.clone(),
            input.clone(),
            LoginCredentials::new(Some("user@example.com".into()), None, None, None),
        );

        let err = service.run_auth_flow(&mut runner(&state)).await.unwrap_err();

        assert_eq!(
            err,
            TaskError::Login("Failed to login: Max attempts reached".into())
        );
        assert_eq!(input.asked().len(), 3);
        assert_eq!(engine.login_state(), Ok(LoginState::LoggedOut));
    }

    #[tokio::test]
    async fn second_attempt_may_succeed() {
        let engine = session(SimulatedAccount {
            password: Some("right".into()),
            ..Default::default()
        });
        let input = ScriptedInput::new(&["wrong", "right"]);
        let state = Arc::new(CliAppState::new());
        let service = AuthService::new(
            engine.clone(),
            input,
            LoginCredentials::new(Some("user@example.com".into()), None, None, None),
        );

        service.run_auth_flow(&mut runner(&state)).await.unwrap();
        assert_eq!(engine.login_state(), Ok(LoginState::LoggedIn));
    }

    #[tokio::test]
    async fn totp_and_mailbox_password_steps() {
        let engine = session(SimulatedAccount {
            totp: Some("123456".into()),
            mailbox_password: Some("mbox".into()),
            ..Default::default()
        });
        let input = ScriptedInput::new(&["123456", "mbox"]);
        let state = Arc::new(CliAppState::new());
        let service = AuthService::new(
            engine.clone(),
            input.clone(),
            credentials("user@example.com", "pw"),
        );

        service.run_auth_flow(&mut runner(&state)).await.unwrap();

        assert_eq!(input.asked(), vec!["TOTP Code", "Mailbox Password"]);
        assert_eq!(engine.login_state(), Ok(LoginState::LoggedIn));
    }

    #[tokio::test]
    async fn wrong_totp_ends_the_flow() {
        let engine = session(SimulatedAccount {
            totp: Some("123456".into()),
            ..Default::default()
        });
        let input = ScriptedInput::new(&[]);
        let state = Arc::new(CliAppState::new());
        let service = AuthService::new(
            engine,
            input,
            LoginCredentials::new(
                Some("user@example.com".into()),
                Some("pw".into()),
                Some("000000".into()),
                None,
            ),
        );

        let err = service.run_auth_flow(&mut runner(&state)).await.unwrap_err();
        assert!(
            matches!(&err, TaskError::Login(msg) if msg.starts_with("Failed to submit totp code")),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn human_verification_is_unsupported() {
        let engine = session(SimulatedAccount {
            human_verification: true,
            ..Default::default()
        });
        let state = Arc::new(CliAppState::new());
        let service = AuthService::new(
            engine,
            ScriptedInput::new(&[]),
            credentials("user@example.com", "pw"),
        );

        let err = service.run_auth_flow(&mut runner(&state)).await.unwrap_err();
        assert_eq!(err, TaskError::Login("HV: Not yet implemented".into()));
    }

    #[tokio::test]
    async fn quit_before_login_is_cancelled() {
        let engine = session(SimulatedAccount::default());
        let input = ScriptedInput::new(&["user@example.com", "pw"]);
        let state = Arc::new(CliAppState::new());
        state.request_quit();
        let service = AuthService::new(engine.clone(), input.clone(), LoginCredentials::default());

        let err = service.run_auth_flow(&mut runner(&state)).await.unwrap_err();

        assert_eq!(err, TaskError::Cancelled);
        assert!(input.asked().is_empty());
        assert_eq!(engine.login_state(), Ok(LoginState::LoggedOut));
    }
}
