//! Spinner and progress-bar state for the task runner's status line.

use std::fmt::Write as _;

use crate::domain::Percent;

/// Number of segments in the progress bar.
pub const BAR_SEGMENTS: usize = 50;

/// Widest rendering, reached at 100%: `[100.00%]` plus the bracketed segments.
pub const BAR_MAX_WIDTH: usize = "[100.00%]".len() + BAR_SEGMENTS + 2;

const SPIN_STATES: [char; 4] = ['-', '\\', '|', '/'];

/// Four-state ASCII spinner. Each call to `next_frame` advances one frame.
#[derive(Debug, Default)]
pub struct Spinner {
    state: usize,
}

impl Spinner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_frame(&mut self) -> char {
        let frame = SPIN_STATES[self.state];
        self.state = (self.state + 1) % SPIN_STATES.len();
        frame
    }
}

/// `[05.25%][|||||      ...]`
///
/// The percentage is reformatted on every update; the bar segments are rebuilt
/// only when the number of filled segments changes.
#[derive(Debug)]
pub struct ProgressBar {
    filled: Option<usize>,
    bar: String,
    value: String,
}

impl ProgressBar {
    pub fn new() -> Self {
        let mut pb = Self {
            filled: None,
            bar: String::with_capacity(BAR_SEGMENTS + 2),
            value: String::with_capacity(BAR_SEGMENTS + 12),
        };
        pb.update(0.0);
        pb
    }

    /// Feed a new percentage. Returns whether the bar segments were rebuilt.
    pub fn update(&mut self, progress: Percent) -> bool {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 100.0)
        };
        let filled = ((progress * BAR_SEGMENTS as f32) / 100.0).ceil() as usize;

        let rebuilt = self.filled != Some(filled);
        if rebuilt {
            self.filled = Some(filled);
            self.bar.clear();
            self.bar.push('[');
            for i in 0..BAR_SEGMENTS {
                self.bar.push(if i < filled { '|' } else { ' ' });
            }
            self.bar.push(']');
        }

        self.value.clear();
        // Zero-padded below 10%: [05.00%]
        let _ = write!(self.value, "[{progress:05.2}%]");
        self.value.push_str(&self.bar);
        rebuilt
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn filled(&self) -> usize {
        self.filled.unwrap_or(0)
    }
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self::new()
    }
}
