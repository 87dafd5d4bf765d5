pub mod banner;
pub mod progress;
pub mod status_line;
pub mod tui;

pub use progress::{BAR_MAX_WIDTH, BAR_SEGMENTS, ProgressBar, Spinner};
pub use status_line::{StatusLine, Tone};
pub use tui::TerminalInput;

/// Prints the welcome banner and applies the theme for all subsequent inquire prompts.
/// Call once at startup (e.g. in main after tracing init).
pub fn init_ui() {
    banner::print_welcome();
    tui::apply_theme();
}
