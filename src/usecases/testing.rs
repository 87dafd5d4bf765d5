//! Test doubles shared by the use case tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::adapters::CliAppState;
use crate::domain::TaskError;
use crate::ports::{AppStatePort, InputPort};
use crate::usecases::TaskRunner;

pub const CADENCE: Duration = Duration::from_millis(5);

/// Answers prompts from a script and records every label asked.
#[derive(Default)]
pub struct ScriptedInput {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedInput {
    pub fn new(answers: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            asked: Mutex::default(),
        })
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    fn next(&self, label: &str) -> Result<String, TaskError> {
        self.asked.lock().unwrap().push(label.to_owned());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TaskError::Input(format!("Failed read value for '{label}'")))
    }
}

impl InputPort for ScriptedInput {
    fn read_text(&self, label: &str) -> Result<String, TaskError> {
        self.next(label)
    }

    fn read_secret(&self, label: &str) -> Result<String, TaskError> {
        self.next(label)
    }

    fn read_path(&self, label: &str) -> Result<PathBuf, TaskError> {
        self.next(label).map(PathBuf::from)
    }

    fn read_yes_no(&self, label: &str) -> Result<bool, TaskError> {
        self.next(label).map(|a| a == "yes")
    }
}

pub fn runner(state: &Arc<CliAppState>) -> TaskRunner<Vec<u8>> {
    let state: Arc<dyn AppStatePort> = Arc::clone(state) as Arc<dyn AppStatePort>;
    TaskRunner::with_writer(state, CADENCE, Vec::new(), false)
}
