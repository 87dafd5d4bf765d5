//! Single, carriage-return-redrawn terminal line used by the task runner.
//!
//! Every frame is padded with spaces to a fixed width so switching between a
//! short and a long label never leaves stale characters behind.

use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Print, Stylize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Warning,
}

pub struct StatusLine<W: Write> {
    out: W,
    width: usize,
    styled: bool,
}

impl<W: Write> StatusLine<W> {
    /// `styled` enables ANSI colors; pass `false` for pipes and tests.
    pub fn new(out: W, styled: bool) -> Self {
        Self {
            out,
            width: 0,
            styled,
        }
    }

    /// Width every frame is padded to until the next call.
    pub fn set_width(&mut self, width: usize) {
        self.width = width;
    }

    /// Redraw the line with `text`, padded to the current width.
    pub fn draw(&mut self, text: &str, tone: Tone) -> io::Result<()> {
        let visible = text.chars().count();
        let pad = " ".repeat(self.width.saturating_sub(visible));
        queue!(self.out, Print('\r'))?;
        if self.styled && tone == Tone::Warning {
            queue!(self.out, Print(text.yellow()))?;
        } else {
            queue!(self.out, Print(text))?;
        }
        queue!(self.out, Print(pad))?;
        self.out.flush()
    }

    /// Terminate the line.
    pub fn finish(&mut self) -> io::Result<()> {
        queue!(self.out, Print('\n'))?;
        self.out.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &StatusLine<Vec<u8>>) -> String {
        String::from_utf8(line.get_ref().clone()).unwrap()
    }

    #[test]
    fn frames_are_padded_to_width() {
        let mut line = StatusLine::new(Vec::new(), false);
        line.set_width(10);
        line.draw("abc", Tone::Normal).unwrap();
        line.draw("abcdefghij", Tone::Normal).unwrap();
        assert_eq!(text(&line), "\rabc       \rabcdefghij");
    }

    #[test]
    fn longer_text_is_not_truncated() {
        let mut line = StatusLine::new(Vec::new(), false);
        line.set_width(2);
        line.draw("abcd", Tone::Warning).unwrap();
        assert_eq!(text(&line), "\rabcd");
    }

    #[test]
    fn unstyled_warning_has_no_escape_codes() {
        let mut line = StatusLine::new(Vec::new(), false);
        line.draw("lost", Tone::Warning).unwrap();
        assert!(!text(&line).contains('\x1b'));
    }

    #[test]
    fn finish_ends_the_line() {
        let mut line = StatusLine::new(Vec::new(), false);
        line.draw("x", Tone::Normal).unwrap();
        line.finish().unwrap();
        assert_eq!(text(&line), "\rx\n");
    }
}
