//! Keyboard and mouse decoding into [`Command`]s.
//!
//! Decoding is stateless. The caller picks a [`KeyContext`] from the
//! current application state and the decoder looks the event up in that
//! context's table.

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::terminal::ansi::{MouseReport, decode_mouse_reports};

/// Lines moved by one wheel notch.
pub const MOUSE_SCROLL_LINES: usize = 3;

const WHEEL_UP: u16 = 64;
const WHEEL_DOWN: u16 = 65;

/// Everything the user can ask the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    GotoTop,
    GotoBottom,
    ToggleSelector,
    SelectorUp,
    SelectorDown,
    SelectorConfirm,
    CloseOverlay,
    ToggleMouseCapture,
    ToggleInfo,
    Edit,
    Refresh,
    Quit,
}

/// Which binding table applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    /// No overlay open.
    Normal,
    /// File selector open.
    Selector,
    /// Info panel open.
    Info,
}

type Binding = (KeyCode, KeyModifiers, Command);

const NONE: KeyModifiers = KeyModifiers::NONE;
const CTRL: KeyModifiers = KeyModifiers::CONTROL;

const NORMAL_KEYS: &[Binding] = &[
    (KeyCode::Char('q'), NONE, Command::Quit),
    (KeyCode::Char('c'), CTRL, Command::Quit),
    (KeyCode::Up, NONE, Command::ScrollUp(1)),
    (KeyCode::Char('k'), NONE, Command::ScrollUp(1)),
    (KeyCode::Down, NONE, Command::ScrollDown(1)),
    (KeyCode::Char('j'), NONE, Command::ScrollDown(1)),
    (KeyCode::PageUp, NONE, Command::PageUp),
    (KeyCode::Char('b'), NONE, Command::PageUp),
    (KeyCode::PageDown, NONE, Command::PageDown),
    (KeyCode::Char(' '), NONE, Command::PageDown),
    (KeyCode::Char('g'), NONE, Command::GotoTop),
    (KeyCode::Home, NONE, Command::GotoTop),
    (KeyCode::Char('G'), NONE, Command::GotoBottom),
    (KeyCode::End, NONE, Command::GotoBottom),
    (KeyCode::Tab, NONE, Command::ToggleSelector),
    (KeyCode::Char('i'), NONE, Command::ToggleInfo),
    (KeyCode::Char('m'), NONE, Command::ToggleMouseCapture),
    (KeyCode::Char('e'), NONE, Command::Edit),
    (KeyCode::Char('r'), NONE, Command::Refresh),
];

/// Checked before [`NORMAL_KEYS`] while the selector is open.
const SELECTOR_KEYS: &[Binding] = &[
    (KeyCode::Up, NONE, Command::SelectorUp),
    (KeyCode::Char('k'), NONE, Command::SelectorUp),
    (KeyCode::Down, NONE, Command::SelectorDown),
    (KeyCode::Char('j'), NONE, Command::SelectorDown),
    (KeyCode::Enter, NONE, Command::SelectorConfirm),
    (KeyCode::Tab, NONE, Command::CloseOverlay),
    (KeyCode::Esc, NONE, Command::CloseOverlay),
];

const INFO_KEYS: &[Binding] = &[
    (KeyCode::Esc, NONE, Command::CloseOverlay),
    (KeyCode::Char('i'), NONE, Command::CloseOverlay),
    (KeyCode::Char('q'), NONE, Command::Quit),
    (KeyCode::Char('c'), CTRL, Command::Quit),
    (KeyCode::Char('m'), NONE, Command::ToggleMouseCapture),
];

fn lookup(table: &[Binding], code: KeyCode, modifiers: KeyModifiers) -> Option<Command> {
    table
        .iter()
        .find(|(key, mods, _)| *key == code && *mods == modifiers)
        .map(|(_, _, command)| *command)
}

/// Map a key press to a command in `context`.
///
/// Releases are ignored. Shift is ignored for character keys, since it
/// is already reflected in the character.
///
/// # Example
///
/// ```
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
/// use canvas_tui::input::{decode_key, Command, KeyContext};
///
/// let down = KeyEvent::new(KeyCode::Down, KeyModifiers::NONE);
/// assert_eq!(decode_key(KeyContext::Normal, down), Some(Command::ScrollDown(1)));
/// assert_eq!(decode_key(KeyContext::Selector, down), Some(Command::SelectorDown));
/// assert_eq!(decode_key(KeyContext::Info, down), None);
/// ```
pub fn decode_key(context: KeyContext, key: KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let modifiers = match key.code {
        KeyCode::Char(_) => key.modifiers - KeyModifiers::SHIFT,
        _ => key.modifiers,
    };

    match context {
        KeyContext::Normal => lookup(NORMAL_KEYS, key.code, modifiers),
        KeyContext::Selector => lookup(SELECTOR_KEYS, key.code, modifiers).or_else(|| {
            lookup(NORMAL_KEYS, key.code, modifiers)
                .filter(|command| !matches!(command, Command::ToggleInfo))
        }),
        KeyContext::Info => lookup(INFO_KEYS, key.code, modifiers),
    }
}

/// Map a decoded mouse report to a command in `context`.
///
/// Only plain wheel up/down are bound; the info panel suppresses them.
pub const fn decode_mouse(context: KeyContext, report: MouseReport) -> Option<Command> {
    if matches!(context, KeyContext::Info) {
        return None;
    }
    match report.button {
        WHEEL_UP => Some(Command::ScrollUp(MOUSE_SCROLL_LINES)),
        WHEEL_DOWN => Some(Command::ScrollDown(MOUSE_SCROLL_LINES)),
        _ => None,
    }
}

/// Decode all mouse commands in a raw input chunk.
///
/// Malformed and truncated reports are dropped.
pub fn decode_mouse_bytes(context: KeyContext, buf: &[u8]) -> Vec<Command> {
    decode_mouse_reports(buf)
        .into_iter()
        .filter_map(|report| decode_mouse(context, report))
        .collect()
}

/// Re-encode a crossterm mouse event as the SGR report it was parsed
/// from, so both input paths share [`decode_mouse`].
pub fn report_from_event(event: MouseEvent) -> MouseReport {
    let button_code = |button: MouseButton| match button {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
    };
    let (base, pressed) = match event.kind {
        MouseEventKind::Down(button) => (button_code(button), true),
        MouseEventKind::Up(button) => (button_code(button), false),
        MouseEventKind::Drag(button) => (32 + button_code(button), true),
        MouseEventKind::Moved => (35, true),
        MouseEventKind::ScrollUp => (WHEEL_UP, true),
        MouseEventKind::ScrollDown => (WHEEL_DOWN, true),
        MouseEventKind::ScrollLeft => (66, true),
        MouseEventKind::ScrollRight => (67, true),
    };

    let mut button = base;
    if event.modifiers.contains(KeyModifiers::SHIFT) {
        button += 4;
    }
    if event.modifiers.contains(KeyModifiers::ALT) {
        button += 8;
    }
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        button += 16;
    }

    MouseReport {
        button,
        column: event.column,
        row: event.row,
        pressed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, modifiers: KeyModifiers) -> MouseEvent {
        MouseEvent {
            kind,
            column: 3,
            row: 7,
            modifiers,
        }
    }

    #[test]
    fn test_sgr_wheel_reports() {
        assert_eq!(
            decode_mouse_bytes(KeyContext::Normal, b"\x1b[<64;10;5M"),
            vec![Command::ScrollUp(3)]
        );
        assert_eq!(
            decode_mouse_bytes(KeyContext::Normal, b"\x1b[<65;10;5M"),
            vec![Command::ScrollDown(3)]
        );
        assert!(decode_mouse_bytes(KeyContext::Normal, b"\x1b[<2;10;5M").is_empty());
    }

    #[test]
    fn test_partial_and_garbage_mouse_bytes_are_dropped() {
        assert!(decode_mouse_bytes(KeyContext::Normal, b"\x1b[<64;10").is_empty());
        assert!(decode_mouse_bytes(KeyContext::Normal, b"\x1b[<;;M\x1b[<x").is_empty());
        assert_eq!(
            decode_mouse_bytes(KeyContext::Normal, b"\x1b[<64;1\x1b[<65;1;1M"),
            vec![Command::ScrollDown(3)]
        );
    }

    #[test]
    fn test_info_context_suppresses_wheel() {
        assert!(decode_mouse_bytes(KeyContext::Info, b"\x1b[<64;10;5M").is_empty());
    }

    #[test]
    fn test_normal_bindings() {
        assert_eq!(decode_key(KeyContext::Normal, key(KeyCode::Char('q'))), Some(Command::Quit));
        assert_eq!(
            decode_key(KeyContext::Normal, KeyEvent::new(KeyCode::Char('c'), CTRL)),
            Some(Command::Quit)
        );
        assert_eq!(decode_key(KeyContext::Normal, key(KeyCode::Char('c'))), None);
        assert_eq!(decode_key(KeyContext::Normal, key(KeyCode::PageDown)), Some(Command::PageDown));
        assert_eq!(decode_key(KeyContext::Normal, key(KeyCode::Tab)), Some(Command::ToggleSelector));
        assert_eq!(decode_key(KeyContext::Normal, key(KeyCode::Enter)), None);
    }

    #[test]
    fn test_shift_is_ignored_for_characters() {
        let shifted = KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT);
        assert_eq!(decode_key(KeyContext::Normal, shifted), Some(Command::GotoBottom));
        assert_eq!(decode_key(KeyContext::Normal, key(KeyCode::Char('g'))), Some(Command::GotoTop));
    }

    #[test]
    fn test_release_events_are_ignored() {
        let mut release = key(KeyCode::Char('q'));
        release.kind = KeyEventKind::Release;
        assert_eq!(decode_key(KeyContext::Normal, release), None);
    }

    #[test]
    fn test_selector_reroutes_navigation() {
        assert_eq!(decode_key(KeyContext::Selector, key(KeyCode::Up)), Some(Command::SelectorUp));
        assert_eq!(
            decode_key(KeyContext::Selector, key(KeyCode::Enter)),
            Some(Command::SelectorConfirm)
        );
        assert_eq!(
            decode_key(KeyContext::Selector, key(KeyCode::Esc)),
            Some(Command::CloseOverlay)
        );
        assert_eq!(
            decode_key(KeyContext::Selector, key(KeyCode::Tab)),
            Some(Command::CloseOverlay)
        );
        // Falls back to the normal table, without opening a second overlay.
        assert_eq!(decode_key(KeyContext::Selector, key(KeyCode::PageUp)), Some(Command::PageUp));
        assert_eq!(decode_key(KeyContext::Selector, key(KeyCode::Char('i'))), None);
    }

    #[test]
    fn test_info_suppresses_scrolling() {
        for code in [KeyCode::Up, KeyCode::Down, KeyCode::PageDown, KeyCode::Char('G')] {
            assert_eq!(decode_key(KeyContext::Info, key(code)), None);
        }
        assert_eq!(decode_key(KeyContext::Info, key(KeyCode::Esc)), Some(Command::CloseOverlay));
        assert_eq!(
            decode_key(KeyContext::Info, key(KeyCode::Char('i'))),
            Some(Command::CloseOverlay)
        );
        assert_eq!(decode_key(KeyContext::Info, key(KeyCode::Char('q'))), Some(Command::Quit));
    }

    #[test]
    fn test_crossterm_wheel_maps_like_raw_reports() {
        let up = report_from_event(mouse(MouseEventKind::ScrollUp, KeyModifiers::NONE));
        assert_eq!(up.button, 64);
        assert_eq!((up.column, up.row), (3, 7));
        assert_eq!(decode_mouse(KeyContext::Normal, up), Some(Command::ScrollUp(3)));

        let down = report_from_event(mouse(MouseEventKind::ScrollDown, KeyModifiers::NONE));
        assert_eq!(decode_mouse(KeyContext::Selector, down), Some(Command::ScrollDown(3)));
    }

    #[test]
    fn test_modified_and_button_events_are_ignored() {
        let shifted = report_from_event(mouse(MouseEventKind::ScrollUp, KeyModifiers::SHIFT));
        assert_eq!(shifted.button, 68);
        assert_eq!(decode_mouse(KeyContext::Normal, shifted), None);

        let click =
            report_from_event(mouse(MouseEventKind::Down(MouseButton::Right), KeyModifiers::NONE));
        assert_eq!(click.button, 2);
        assert_eq!(decode_mouse(KeyContext::Normal, click), None);
    }
}
