//! Startup banner with a vertical gradient (ET-EXPORT).
//! Uses figlet's built-in standard font; plain text when it can't render.

use crossterm::QueueableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{self, IsTerminal, Write, stdout};

const TITLE: &str = "ET-EXPORT";

/// Deep violet (#6d4aff).
const VIOLET: (u8, u8, u8) = (0x6d, 0x4a, 0xff);
/// Light cyan (#1ed1e8).
const CYAN: (u8, u8, u8) = (0x1e, 0xd1, 0xe8);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let mix = |x: u8, y: u8| (f64::from(x) * (1.0 - t) + f64::from(y) * t).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

fn render_title() -> Option<String> {
    let font = FIGfont::standard().ok()?;
    let figure = font.convert(TITLE)?;
    Some(figure.to_string())
}

/// Prints the title art, then the version line. Colors only on a terminal.
pub fn print_welcome() {
    let mut out = stdout();
    let styled = out.is_terminal();
    if let Err(e) = write_welcome(&mut out, render_title().as_deref(), styled) {
        tracing::debug!(error = %e, "banner write failed");
    }
}

fn write_welcome<W: Write>(out: &mut W, art: Option<&str>, styled: bool) -> io::Result<()> {
    let art = art.unwrap_or(TITLE);
    let lines: Vec<&str> = art.lines().filter(|l| !l.trim().is_empty()).collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        if styled {
            let t = if total <= 1 {
                1.0
            } else {
                i as f64 / (total - 1) as f64
            };
            let (r, g, b) = lerp_rgb(VIOLET, CYAN, t);
            out.queue(SetForegroundColor(Color::Rgb { r, g, b }))?;
        }
        out.queue(Print(line))?.queue(Print("\n"))?;
        if styled {
            out.queue(ResetColor)?;
        }
    }

    out.queue(Print(format!(
        "Account Export Tool v{}\n\n",
        env!("CARGO_PKG_VERSION")
    )))?;
    out.flush()
}
