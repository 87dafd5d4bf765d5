//! Implements InputPort. Inquire-based interactive prompts.
//!
//! Falls back to plain line reads when stdin is not a terminal.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use inquire::ui::{Color, RenderConfig, Styled};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use tracing::debug;

use crate::adapters::app_state::CliAppState;
use crate::domain::TaskError;
use crate::ports::{INPUT_RETRIES, InputPort};
use crate::shared::paths::expand_cli_path;

const EMPTY_VALUE: &str = "Value can't be empty";
const NOT_A_DIRECTORY: &str = "Path is not a directory";
const YES_NO_CHOICES: &str = "Value must be one of: Y, y, Yes, yes, N, n, No, no";

/// Applies the prompt theme for all subsequent inquire prompts.
pub fn apply_theme() {
    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new(">").with_fg(Color::LightCyan))
        .with_answered_prompt_prefix(Styled::new("✓").with_fg(Color::LightGreen));
    inquire::set_global_render_config(config);
}

/// Terminal prompts. Errors from validation go to stderr.
///
/// Inquire reads keys in raw mode, so Ctrl+C at a prompt never reaches the
/// signal listener; it is forwarded to the app state here instead.
pub struct TerminalInput {
    interactive: bool,
    state: Arc<CliAppState>,
}

impl TerminalInput {
    pub fn new(state: Arc<CliAppState>) -> Self {
        Self {
            interactive: io::stdin().is_terminal(),
            state,
        }
    }

    fn ask(&self, label: &str, secret: bool) -> Result<String, TaskError> {
        if !self.interactive {
            return read_line(label);
        }
        let answer = if secret {
            Password::new(label)
                .without_confirmation()
                .with_display_mode(PasswordDisplayMode::Hidden)
                .prompt()
        } else {
            Text::new(label).prompt()
        };
        answer.map_err(|e| prompt_failure(&self.state, label, e, &mut io::stdout()))
    }
}

impl InputPort for TerminalInput {
    fn read_text(&self, label: &str) -> Result<String, TaskError> {
        with_retries(label, || self.ask(label, false), |v| Ok(v.to_owned()), report)
    }

    fn read_secret(&self, label: &str) -> Result<String, TaskError> {
        with_retries(label, || self.ask(label, true), |v| Ok(v.to_owned()), report)
    }

    fn read_path(&self, label: &str) -> Result<PathBuf, TaskError> {
        with_retries(label, || self.ask(label, false), validate_dir, report)
    }

    fn read_yes_no(&self, label: &str) -> Result<bool, TaskError> {
        with_retries(
            label,
            || self.ask(label, false),
            |v| parse_yes_no(v).ok_or_else(|| YES_NO_CHOICES.to_owned()),
            report,
        )
    }
}

/// Ask up to [`INPUT_RETRIES`] times. Empty answers and validation errors are
/// reported and retried; read errors (e.g. `Cancelled`) end the loop at once.
fn with_retries<T>(
    label: &str,
    mut read: impl FnMut() -> Result<String, TaskError>,
    mut validate: impl FnMut(&str) -> Result<T, String>,
    mut report: impl FnMut(&str),
) -> Result<T, TaskError> {
    for attempt in 1..=INPUT_RETRIES {
        let value = read()?;
        if value.is_empty() {
            report(EMPTY_VALUE);
            continue;
        }
        match validate(&value) {
            Ok(v) => return Ok(v),
            Err(msg) => {
                debug!(label, attempt, "rejected input");
                report(&msg);
            }
        }
    }
    Err(TaskError::Input(format!("Failed read value for '{label}'")))
}

fn parse_yes_no(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

fn validate_dir(value: &str) -> Result<PathBuf, String> {
    let path = expand_cli_path(value).map_err(|e| e.to_string())?;
    if path.exists() && !path.is_dir() {
        return Err(NOT_A_DIRECTORY.to_owned());
    }
    Ok(path)
}

fn report(msg: &str) {
    eprintln!("{msg}");
}

fn read_line(label: &str) -> Result<String, TaskError> {
    let mut out = io::stdout();
    write!(out, "{label}: ")
        .and_then(|_| out.flush())
        .map_err(|e| TaskError::Io(e.to_string()))?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| TaskError::Io(e.to_string()))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

/// Map a prompt error; an interrupted prompt counts as a Ctrl+C.
fn prompt_failure<W: Write>(
    state: &CliAppState,
    label: &str,
    e: InquireError,
    out: &mut W,
) -> TaskError {
    if matches!(e, InquireError::OperationInterrupted) {
        state.interrupt(out);
    }
    map_inquire(label, e)
}

fn map_inquire(label: &str, e: InquireError) -> TaskError {
    match e {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            TaskError::Cancelled
        }
        InquireError::IO(e) => TaskError::Io(e.to_string()),
        other => TaskError::Input(format!("Failed read value for '{label}': {other}")),
    }
}
