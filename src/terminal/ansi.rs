//! ANSI escape sequence encoding and SGR mouse decoding.
//!
//! Pure functions. Writers take any `impl Write` and propagate its errors;
//! string helpers return owned `String`s for callers that build lines
//! before handing them to the compositor.
//!
//! Screen positions are 0-indexed in this API and converted to the
//! 1-indexed coordinates the terminal expects.

use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::LazyLock;

use ratatui::style::{Color, Modifier, Style};
use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const RESET: &str = "\x1b[0m";

const MOUSE_ON: &[u8] = b"\x1b[?1000h\x1b[?1006h";
const MOUSE_OFF: &[u8] = b"\x1b[?1000l\x1b[?1006l";

static ANSI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b(?:\[[0-?]*[ -/]*[@-~]|\][^\x07\x1b]*(?:\x07|\x1b\\)|[78])")
        .expect("ANSI pattern is a valid regex")
});

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Save the cursor position and attributes (DECSC).
pub fn save_cursor(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b7")
}

/// Restore the cursor saved by [`save_cursor`] (DECRC).
pub fn restore_cursor(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b8")
}

/// Move the cursor to `(row, col)` with CUP.
pub fn cursor_to(w: &mut impl Write, row: u16, col: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(row) + 1, u32::from(col) + 1)
}

// ─── Mouse tracking ──────────────────────────────────────────────────────────

/// Enable button tracking with SGR extended reports (DEC 1000 + 1006).
pub fn enable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(MOUSE_ON)
}

/// Disable the tracking enabled by [`enable_mouse`].
pub fn disable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(MOUSE_OFF)
}

// ─── Style ───────────────────────────────────────────────────────────────────

/// Encode a ratatui [`Style`] as one SGR sequence.
///
/// Returns an empty string for the default style so unstyled text carries
/// no escape codes at all.
pub fn sgr(style: Style) -> String {
    let mut params: Vec<String> = Vec::new();

    let modifiers = style.add_modifier;
    for (flag, code) in [
        (Modifier::BOLD, "1"),
        (Modifier::DIM, "2"),
        (Modifier::ITALIC, "3"),
        (Modifier::UNDERLINED, "4"),
        (Modifier::SLOW_BLINK, "5"),
        (Modifier::RAPID_BLINK, "6"),
        (Modifier::REVERSED, "7"),
        (Modifier::HIDDEN, "8"),
        (Modifier::CROSSED_OUT, "9"),
    ] {
        if modifiers.contains(flag) {
            params.push(code.to_string());
        }
    }
    if let Some(fg) = style.fg {
        params.push(color_param(fg, false));
    }
    if let Some(bg) = style.bg {
        params.push(color_param(bg, true));
    }

    if params.is_empty() {
        String::new()
    } else {
        format!("\x1b[{}m", params.join(";"))
    }
}

/// Wrap `text` in the SGR codes for `style`, resetting afterwards.
pub fn styled(text: &str, style: Style) -> String {
    let open = sgr(style);
    if open.is_empty() {
        text.to_string()
    } else {
        format!("{open}{text}{RESET}")
    }
}

/// Write the SGR sequence for `style`.
pub fn set_style(w: &mut impl Write, style: Style) -> io::Result<()> {
    w.write_all(sgr(style).as_bytes())
}

/// Reset all SGR attributes (SGR 0).
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(RESET.as_bytes())
}

fn color_param(color: Color, background: bool) -> String {
    let base: u8 = if background { 40 } else { 30 };
    let bright: u8 = if background { 100 } else { 90 };
    let extended = if background { 48 } else { 38 };
    match color {
        Color::Reset => (base + 9).to_string(),
        Color::Black => base.to_string(),
        Color::Red => (base + 1).to_string(),
        Color::Green => (base + 2).to_string(),
        Color::Yellow => (base + 3).to_string(),
        Color::Blue => (base + 4).to_string(),
        Color::Magenta => (base + 5).to_string(),
        Color::Cyan => (base + 6).to_string(),
        Color::Gray => (base + 7).to_string(),
        Color::DarkGray => bright.to_string(),
        Color::LightRed => (bright + 1).to_string(),
        Color::LightGreen => (bright + 2).to_string(),
        Color::LightYellow => (bright + 3).to_string(),
        Color::LightBlue => (bright + 4).to_string(),
        Color::LightMagenta => (bright + 5).to_string(),
        Color::LightCyan => (bright + 6).to_string(),
        Color::White => (bright + 7).to_string(),
        Color::Indexed(idx) => format!("{extended};5;{idx}"),
        Color::Rgb(r, g, b) => format!("{extended};2;{r};{g};{b}"),
    }
}

// ─── Measurement ─────────────────────────────────────────────────────────────

/// Remove escape sequences, leaving only printable text.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_PATTERN.replace_all(text, "")
}

/// Width in terminal cells with escape sequences excluded.
pub fn visible_width(text: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(text).as_ref())
}

/// Right-pad `text` with spaces to `width` visible cells.
pub fn pad_visible(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(visible_width(text));
    let mut out = String::with_capacity(text.len() + pad);
    out.push_str(text);
    out.extend(std::iter::repeat_n(' ', pad));
    out
}

/// Cut `text` to at most `max` visible cells. Escape sequences are kept;
/// the caller is expected to reset styles afterwards.
pub fn truncate_visible(text: &str, max: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut used = 0;
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            out.push(ch);
            if let Some(next) = chars.next() {
                out.push(next);
                if next == '[' {
                    for param in chars.by_ref() {
                        out.push(param);
                        if ('@'..='~').contains(&param) {
                            break;
                        }
                    }
                }
            }
            continue;
        }
        let cells = ch.width().unwrap_or(0);
        if used + cells > max {
            break;
        }
        used += cells;
        out.push(ch);
    }
    out
}

// ─── SGR mouse reports ───────────────────────────────────────────────────────

/// A decoded `ESC [ < b ; col ; row (M|m)` report.
///
/// `column` and `row` are 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseReport {
    pub button: u16,
    pub column: u16,
    pub row: u16,
    pub pressed: bool,
}

/// Outcome of decoding one report at the start of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A complete report and the number of bytes it consumed.
    Report(MouseReport, usize),
    /// The buffer ends before the report terminator.
    Incomplete,
    /// Not a valid report; skip this many bytes.
    Invalid(usize),
}

/// Decode a single SGR mouse report at the start of `buf`.
pub fn decode_sgr_mouse(buf: &[u8]) -> Decoded {
    const PREFIX: &[u8] = b"\x1b[<";
    if buf.len() < PREFIX.len() {
        return if PREFIX.starts_with(buf) {
            Decoded::Incomplete
        } else {
            Decoded::Invalid(1)
        };
    }
    if !buf.starts_with(PREFIX) {
        return Decoded::Invalid(1);
    }

    let start = PREFIX.len();
    let mut end = start;
    while end < buf.len() {
        match buf[end] {
            b'M' | b'm' => break,
            b'0'..=b'9' | b';' => end += 1,
            // A new report started before this one ended.
            0x1b => return Decoded::Invalid(end),
            _ => return Decoded::Invalid(end + 1),
        }
    }
    if end >= buf.len() {
        return Decoded::Incomplete;
    }

    let consumed = end + 1;
    let Ok(params) = std::str::from_utf8(&buf[start..end]) else {
        return Decoded::Invalid(consumed);
    };
    let mut fields = params.split(';').map(str::parse::<u16>);
    let (Some(Ok(button)), Some(Ok(col)), Some(Ok(row)), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Decoded::Invalid(consumed);
    };

    Decoded::Report(
        MouseReport {
            button,
            column: col.saturating_sub(1),
            row: row.saturating_sub(1),
            pressed: buf[end] == b'M',
        },
        consumed,
    )
}

/// Decode every complete SGR mouse report in a raw input chunk.
///
/// Non-mouse bytes, malformed reports and a truncated trailing report are
/// dropped.
pub fn decode_mouse_reports(buf: &[u8]) -> Vec<MouseReport> {
    let mut reports = Vec::new();
    let mut pos = 0;
    while pos < buf.len() {
        if buf[pos] != 0x1b {
            pos += 1;
            continue;
        }
        match decode_sgr_mouse(&buf[pos..]) {
            Decoded::Report(report, consumed) => {
                reports.push(report);
                pos += consumed;
            }
            Decoded::Incomplete => break,
            Decoded::Invalid(skip) => pos += skip,
        }
    }
    reports
}
