//! Foreground driving loop for background tasks.
//!
//! The runner launches a task on the blocking pool and, on a fixed cadence,
//! checks the quit flag (cancelling the task), renders a spinner or progress
//! bar, and detects completion. It never blocks longer than one cycle, so the
//! line keeps animating while a cancelled task winds down.

use std::io::{self, IsTerminal, Stdout, Write};
use std::panic;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::adapters::ui::{BAR_MAX_WIDTH, ProgressBar, Spinner, StatusLine, Tone};
use crate::domain::{Percent, TaskError};
use crate::ports::AppStatePort;
use crate::usecases::task::{ProgressTask, Task};

/// Label shown instead of the task description while connectivity is lost.
pub const NETWORK_LOST_TEXT: &str = "Can't connect to servers. Retrying...";

pub struct TaskRunner<W: Write = Stdout> {
    state: Arc<dyn AppStatePort>,
    cadence: Duration,
    line: StatusLine<W>,
}

impl TaskRunner<Stdout> {
    /// Runner drawing on stdout, colored when stdout is a terminal.
    pub fn stdout(state: Arc<dyn AppStatePort>, cadence: Duration) -> Self {
        let out = io::stdout();
        let styled = out.is_terminal();
        Self::with_writer(state, cadence, out, styled)
    }
}

impl<W: Write> TaskRunner<W> {
    pub fn with_writer(
        state: Arc<dyn AppStatePort>,
        cadence: Duration,
        out: W,
        styled: bool,
    ) -> Self {
        Self {
            state,
            cadence,
            line: StatusLine::new(out, styled),
        }
    }

    pub fn writer(&self) -> &W {
        self.line.get_ref()
    }

    /// `Err(Cancelled)` once quit has been requested.
    pub fn check_quit(&self) -> Result<(), TaskError> {
        if self.state.should_quit() {
            return Err(TaskError::Cancelled);
        }
        Ok(())
    }

    /// Drive `task` to completion with a spinner labelled by its description.
    pub async fn run<T: Task>(&mut self, task: Arc<T>) -> Result<T::Output, TaskError> {
        let description = task.description().to_owned();
        info!(task = %description, "task started");

        let mut handle = launch(&task);
        let mut spinner = Spinner::new();
        let label_width = description
            .chars()
            .count()
            .max(NETWORK_LOST_TEXT.chars().count());
        self.line.set_width(label_width + 2);

        let joined = loop {
            if self.state.should_quit() {
                task.cancel();
            } else {
                let (label, tone) = if self.state.network_lost() {
                    (NETWORK_LOST_TEXT, Tone::Warning)
                } else {
                    (description.as_str(), Tone::Normal)
                };
                self.draw(&format!("{} {label}", spinner.next_frame()), tone);
            }

            // Wakes as soon as the task completes, otherwise after one cycle.
            if let Ok(joined) = tokio::time::timeout(self.cadence, &mut handle).await {
                break joined;
            }
        };

        self.end_line();
        settle(&description, joined)
    }

    /// Drive `task` to completion with a progress bar fed by `poll_progress`.
    pub async fn run_with_progress<T>(&mut self, task: Arc<T>) -> Result<T::Output, TaskError>
    where
        T: ProgressTask<Progress = Percent>,
    {
        let description = task.description().to_owned();
        info!(task = %description, "task started");

        let mut handle = launch(&task);
        let mut spinner = Spinner::new();
        let mut bar = ProgressBar::new();
        self.line
            .set_width(BAR_MAX_WIDTH.max(NETWORK_LOST_TEXT.chars().count() + 2));

        let joined = loop {
            if self.state.should_quit() {
                task.cancel();
                if let Ok(joined) = tokio::time::timeout(self.cadence, &mut handle).await {
                    break joined;
                }
                continue;
            }

            // Bounded progress wait, then a non-blocking completion check.
            let progress = task.poll_progress(self.cadence).await;
            bar.update(progress);
            if self.state.network_lost() {
                let frame = format!("{} {NETWORK_LOST_TEXT}", spinner.next_frame());
                self.draw(&frame, Tone::Warning);
            } else {
                let frame = bar.value().to_owned();
                self.draw(&frame, Tone::Normal);
            }

            if handle.is_finished() {
                break (&mut handle).await;
            }
        };

        if !self.state.should_quit() && !self.state.network_lost() {
            bar.update(task.progress().latest());
            let frame = bar.value().to_owned();
            self.draw(&frame, Tone::Normal);
        }
        self.end_line();
        settle(&description, joined)
    }

    fn draw(&mut self, frame: &str, tone: Tone) {
        if let Err(e) = self.line.draw(frame, tone) {
            debug!(error = %e, "status line write failed");
        }
    }

    fn end_line(&mut self) {
        if let Err(e) = self.line.finish() {
            debug!(error = %e, "status line write failed");
        }
    }
}

fn launch<T: Task>(task: &Arc<T>) -> JoinHandle<Result<T::Output, TaskError>> {
    let task = Arc::clone(task);
    tokio::task::spawn_blocking(move || task.run())
}

/// Unwrap the joined result. Failures come back unchanged; a panic in the
/// background work resumes on this thread.
fn settle<R>(
    description: &str,
    joined: Result<Result<R, TaskError>, JoinError>,
) -> Result<R, TaskError> {
    match joined {
        Ok(Ok(value)) => {
            info!(task = %description, "task finished");
            Ok(value)
        }
        Ok(Err(TaskError::Cancelled)) => {
            info!(task = %description, "task cancelled");
            Err(TaskError::Cancelled)
        }
        Ok(Err(e)) => {
            warn!(task = %description, error = %e, "task failed");
            Err(e)
        }
        Err(e) if e.is_panic() => panic::resume_unwind(e.into_panic()),
        Err(e) => {
            warn!(task = %description, error = %e, "background execution aborted");
            Err(TaskError::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{CancelGate, ProgressValue};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const CADENCE: Duration = Duration::from_millis(15);

    #[derive(Default)]
    struct TestState {
        quit: AtomicBool,
        lost_script: Mutex<VecDeque<bool>>,
    }

    impl TestState {
        fn with_network_script(script: &[bool]) -> Self {
            Self {
                quit: AtomicBool::new(false),
                lost_script: Mutex::new(script.iter().copied().collect()),
            }
        }
    }

    impl AppStatePort for TestState {
        fn should_quit(&self) -> bool {
            self.quit.load(Ordering::SeqCst)
        }

        fn network_lost(&self) -> bool {
            self.lost_script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(false)
        }
    }

    /// Writes `steps` into its progress slot, one per `step_delay`.
    struct TestTask {
        description: String,
        steps: Vec<Percent>,
        step_delay: Duration,
        failure: Option<TaskError>,
        wait_for_cancel: bool,
        panic_with: Option<&'static str>,
        cancelled: AtomicBool,
        engine_cancels: AtomicUsize,
        gate: CancelGate,
        progress: ProgressValue<Percent>,
    }

    impl TestTask {
        fn new(description: &str, steps: &[Percent], step_delay: Duration) -> Self {
            Self {
                description: description.to_string(),
                steps: steps.to_vec(),
                step_delay,
                failure: None,
                wait_for_cancel: false,
                panic_with: None,
                cancelled: AtomicBool::new(false),
                engine_cancels: AtomicUsize::new(0),
                gate: CancelGate::new(),
                progress: ProgressValue::default(),
            }
        }
    }

    impl Task for TestTask {
        type Output = usize;

        fn description(&self) -> &str {
            &self.description
        }

        fn run(&self) -> Result<usize, TaskError> {
            for &step in &self.steps {
                if self.cancelled.load(Ordering::SeqCst) {
                    return Err(TaskError::Cancelled);
                }
                std::thread::sleep(self.step_delay);
                self.progress.write(step);
            }
            if let Some(msg) = self.panic_with {
                panic!("{msg}");
            }
            if self.wait_for_cancel {
                while !self.cancelled.load(Ordering::SeqCst) {
                    std::thread::sleep(Duration::from_millis(2));
                }
                return Err(TaskError::Cancelled);
            }
            match &self.failure {
                Some(e) => Err(e.clone()),
                None => Ok(self.steps.len()),
            }
        }

        fn cancel(&self) {
            self.gate.fire_once(|| {
                self.engine_cancels.fetch_add(1, Ordering::SeqCst);
                self.cancelled.store(true, Ordering::SeqCst);
            });
        }
    }

    impl ProgressTask for TestTask {
        type Progress = Percent;

        fn progress(&self) -> &ProgressValue<Percent> {
            &self.progress
        }
    }

    fn runner(state: Arc<TestState>) -> TaskRunner<Vec<u8>> {
        TaskRunner::with_writer(state, CADENCE, Vec::new(), false)
    }

    fn output(runner: &TaskRunner<Vec<u8>>) -> String {
        String::from_utf8(runner.writer().clone()).unwrap()
    }

    fn frames(out: &str) -> Vec<String> {
        out.trim_end_matches('\n')
            .split('\r')
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn plain_task_renders_spinner_and_returns_value() {
        let state = Arc::new(TestState::default());
        let mut runner = runner(Arc::clone(&state));
        let task = Arc::new(TestTask::new(
            "Sleeping",
            &[0.0],
            Duration::from_millis(50),
        ));

        let result = runner.run(Arc::clone(&task)).await;

        assert_eq!(result, Ok(1));
        let out = output(&runner);
        assert!(out.starts_with("\r- Sleeping"), "output: {out:?}");
        assert_eq!(out.matches('\n').count(), 1);
        assert!(out.ends_with('\n'));
    }

    #[tokio::test]
    async fn progress_task_final_poll_sees_last_value() {
        let state = Arc::new(TestState::default());
        let mut runner = runner(Arc::clone(&state));
        let task = Arc::new(TestTask::new(
            "Export Mail",
            &[0.0, 50.0, 100.0],
            Duration::from_millis(20),
        ));

        let result = runner.run_with_progress(Arc::clone(&task)).await;

        assert_eq!(result, Ok(3));
        assert_eq!(task.poll_progress(Duration::from_millis(10)).await, 100.0);
        let out = output(&runner);
        let last = frames(&out).pop().unwrap();
        assert!(last.starts_with("[100.00%]["), "last frame: {last:?}");
    }

    #[tokio::test]
    async fn quit_cancels_exactly_once_and_runner_terminates() {
        let state = Arc::new(TestState::default());
        let mut runner = runner(Arc::clone(&state));
        let mut task = TestTask::new("Logging In", &[], Duration::ZERO);
        task.wait_for_cancel = true;
        let task = Arc::new(task);

        let quitter = {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(60)).await;
                state.quit.store(true, Ordering::SeqCst);
            })
        };

        let result = runner.run(Arc::clone(&task)).await;
        quitter.await.unwrap();

        assert_eq!(result, Err(TaskError::Cancelled));
        assert_eq!(task.engine_cancels.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn quit_during_progress_task_cancels_once() {
        let state = Arc::new(TestState::default());
        state.quit.store(true, Ordering::SeqCst);
        let mut runner = runner(Arc::clone(&state));
        // Enough steps that the task is still running after several cycles.
        let task = Arc::new(TestTask::new(
            "Export Mail",
            &[10.0; 50],
            Duration::from_millis(5),
        ));

        let result = runner.run_with_progress(Arc::clone(&task)).await;

        assert_eq!(result, Err(TaskError::Cancelled));
        assert_eq!(task.engine_cancels.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn engine_failure_is_returned_unchanged() {
        let state = Arc::new(TestState::default());
        let mut runner = runner(Arc::clone(&state));
        let mut task = TestTask::new("Export Mail", &[10.0], Duration::from_millis(5));
        task.failure = Some(TaskError::Engine("disk full".into()));

        let result = runner.run_with_progress(Arc::new(task)).await;

        assert_eq!(result, Err(TaskError::Engine("disk full".into())));
    }

    #[tokio::test]
    async fn plain_runner_returns_engine_failure_unchanged() {
        let state = Arc::new(TestState::default());
        let mut runner = runner(Arc::clone(&state));
        let mut task = TestTask::new("Logging In", &[], Duration::ZERO);
        task.failure = Some(TaskError::Engine("Incorrect login credentials".into()));

        let err = runner.run(Arc::new(task)).await.unwrap_err();

        assert_eq!(err, TaskError::Engine("Incorrect login credentials".into()));
        assert_eq!(err.to_string(), "Incorrect login credentials");
    }

    #[tokio::test]
    async fn network_lost_label_is_padded_to_constant_width() {
        let state = Arc::new(TestState::with_network_script(&[true, true, true]));
        let mut runner = runner(Arc::clone(&state));
        let task = Arc::new(TestTask::new(
            "Logging In",
            &[0.0],
            Duration::from_millis(120),
        ));

        runner.run(task).await.unwrap();

        let out = output(&runner);
        let frames = frames(&out);
        assert!(frames.len() >= 4, "frames: {frames:?}");
        for frame in &frames[..3] {
            assert!(frame.contains(NETWORK_LOST_TEXT), "frame: {frame:?}");
        }
        assert!(frames[3].contains("Logging In"));
        let width = NETWORK_LOST_TEXT.len() + 2;
        for frame in &frames {
            assert_eq!(frame.chars().count(), width, "frame: {frame:?}");
        }
    }

    #[tokio::test]
    async fn progress_bar_and_network_label_share_one_width() {
        let state = Arc::new(TestState::with_network_script(&[false, true, true, true]));
        let mut runner = runner(Arc::clone(&state));
        let task = Arc::new(TestTask::new(
            "Export Mail",
            &[100.0; 5],
            Duration::from_millis(20),
        ));

        runner.run_with_progress(task).await.unwrap();

        let out = output(&runner);
        let frames = frames(&out);
        assert!(
            frames.iter().any(|f| f.contains(NETWORK_LOST_TEXT)),
            "frames: {frames:?}"
        );
        let last = frames.last().unwrap();
        assert!(last.starts_with("[100.00%]["), "last frame: {last:?}");
        for frame in &frames {
            assert_eq!(frame.chars().count(), BAR_MAX_WIDTH, "frame: {frame:?}");
        }
    }

    #[tokio::test]
    #[should_panic(expected = "engine blew up")]
    async fn panic_in_background_work_resumes_on_join() {
        let state = Arc::new(TestState::default());
        let mut runner = runner(state);
        let mut task = TestTask::new("Logging In", &[], Duration::ZERO);
        task.panic_with = Some("engine blew up");

        let _ = runner.run(Arc::new(task)).await;
    }
}
